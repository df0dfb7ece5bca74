// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! VNF LCM Template Parameterization Engine
//!
//! Turns a lifecycle request, the persisted instance snapshot, a grant and a
//! VNF package into a concrete infrastructure template plus its `nfv`
//! parameter map, and produces the matching rollback artifacts.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Synchronous, side-effect free rendering of stack fields

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
