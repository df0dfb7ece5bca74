// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod vnfd_loader;

pub use vnfd_loader::{CsarDirectoryRepository, InMemoryVnfdRepository, VnfdLoader};
