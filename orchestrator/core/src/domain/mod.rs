// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Snapshots consumed by the engine and the value types it produces.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Lifecycle requests, grants, instance snapshot, descriptor
//!   view, templates and the index naming scheme

pub mod tree;
pub mod template;
pub mod index;
pub mod ext_link;
pub mod grant;
pub mod lcm_request;
pub mod vnf_instance;
pub mod vnfd;
pub mod stack;
pub mod engine_config;
