// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seam between workers and the resources they own.

pub mod config;
pub mod resource;

pub use config::LocatableConfig;
pub use resource::Resource;
