// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod param_extractor;
pub mod param_resolver;
pub mod managed_links;
pub mod userdata;
pub mod stack_builder;

// Re-export the entry points for convenience
pub use stack_builder::{stack_name, StackBuildError, StackBuilder};
pub use userdata::{UserData, UserDataError, UserDataRegistry};
