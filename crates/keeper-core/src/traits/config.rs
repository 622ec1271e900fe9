// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration types that point at a storage location.

use std::path::{Path, PathBuf};

/// A resource configuration whose storage location can be swapped.
///
/// Lets a worker be opened from a bare file path: the location replaces the
/// one in the default configuration, or in `Self::default()` when no default
/// is set.
pub trait LocatableConfig: Clone + Default {
    /// Returns a copy of this configuration pointing at `path`.
    fn with_location(self, path: PathBuf) -> Self;

    /// The storage location, if the configuration has one.
    fn location(&self) -> Option<&Path>;
}
