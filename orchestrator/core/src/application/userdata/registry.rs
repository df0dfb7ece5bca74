// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Userdata Registry - Strategy Selection by Class Name
//
// Holds the userdata strategies by class name and picks the one a request
// asks for. Built once from configuration and shared read-only.

use super::{DefaultUserData, StandardUserData, UserData, UserDataError};
use crate::domain::engine_config::{EngineConfigSpec, DEFAULT_USERDATA_CLASS};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `additionalParams` key naming the userdata script of a request
pub const USERDATA_PATH_PARAM: &str = "lcm-operation-user-data";
/// `additionalParams` key naming the userdata class of a request
pub const USERDATA_CLASS_PARAM: &str = "lcm-operation-user-data-class";

/// Registry of userdata strategies keyed by class name
pub struct UserDataRegistry {
    strategies: HashMap<String, Arc<dyn UserData>>,
    default_class: String,
}

impl UserDataRegistry {
    /// Empty registry falling back to `default_class`
    pub fn new(default_class: impl Into<String>) -> Self {
        Self {
            strategies: HashMap::new(),
            default_class: default_class.into(),
        }
    }

    /// Registry holding both built-in strategies
    pub fn with_builtin(default_class: impl Into<String>) -> Self {
        let mut registry = Self::new(default_class);
        registry.register(Arc::new(DefaultUserData));
        registry.register(Arc::new(StandardUserData));
        registry
    }

    /// Create registry from engine configuration
    pub fn from_config(spec: &EngineConfigSpec) -> Self {
        info!("Initializing userdata registry");
        let registry = Self::with_builtin(spec.default_userdata.clone());

        if registry.get(&registry.default_class).is_none() {
            warn!(
                "Default userdata class '{}' is not registered, falling back to {}",
                registry.default_class, DEFAULT_USERDATA_CLASS
            );
            return Self {
                default_class: DEFAULT_USERDATA_CLASS.to_string(),
                ..registry
            };
        }

        info!("Default userdata class: {}", registry.default_class);
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn UserData>) {
        let class = strategy.class_name().to_string();
        debug!("Registering userdata class: {}", class);
        self.strategies.insert(class, strategy);
    }

    pub fn get(&self, class: &str) -> Option<Arc<dyn UserData>> {
        self.strategies.get(class).cloned()
    }

    pub fn default_strategy(&self) -> Result<Arc<dyn UserData>, UserDataError> {
        self.get(&self.default_class)
            .ok_or_else(|| UserDataError::UnknownClass(self.default_class.clone()))
    }

    /// Strategy for a request's `additionalParams`.
    ///
    /// Neither key set selects the default strategy. Setting only one of the
    /// two is an error.
    pub fn select(&self, additional_params: &Map<String, Value>) -> Result<Arc<dyn UserData>, UserDataError> {
        let path = additional_params.get(USERDATA_PATH_PARAM);
        let class = additional_params.get(USERDATA_CLASS_PARAM);

        match (path, class) {
            (None, None) => self.default_strategy(),
            (Some(path), Some(class)) => {
                let class = class
                    .as_str()
                    .ok_or_else(|| UserDataError::UnknownClass(class.to_string()))?;
                debug!(script = %path, class, "Selecting userdata class");
                self.get(class)
                    .ok_or_else(|| UserDataError::UnknownClass(class.to_string()))
            }
            _ => Err(UserDataError::UserdataMissing),
        }
    }

    /// Registered class names, sorted
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }
}
