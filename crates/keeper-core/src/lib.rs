// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Keeper background resource workers.
//!
//! This crate provides the error taxonomy, the [`Resource`] collaborator
//! trait that every managed resource implements, and the small set of types
//! shared by workers, queues, and their observers.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BoxError, KeeperError, SharedError};
pub use traits::{LocatableConfig, Resource};
pub use types::{WorkerId, WorkerState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeper_error_has_all_variants() {
        let _no_config = KeeperError::NoConfiguration;
        let _open = KeeperError::open("test");
        let _refresh = KeeperError::refresh("test");
        let _generic = KeeperError::generic("test");
        let _disposed = KeeperError::Disposed;
        let _timeout = KeeperError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        let _config = KeeperError::Config("test".into());
    }

    #[test]
    fn worker_state_display_round_trip() {
        use std::str::FromStr;

        let variants = [
            WorkerState::Opening,
            WorkerState::Ready,
            WorkerState::Failed,
            WorkerState::Disposed,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = WorkerState::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
        assert_eq!(WorkerState::Opening.to_string(), "opening");
    }

    #[test]
    fn worker_state_serialization() {
        let json = serde_json::to_string(&WorkerState::Failed).expect("should serialize");
        assert_eq!(json, "\"failed\"");
    }

    #[test]
    fn terminal_states() {
        assert!(!WorkerState::Opening.is_terminal());
        assert!(!WorkerState::Ready.is_terminal());
        assert!(WorkerState::Failed.is_terminal());
        assert!(WorkerState::Disposed.is_terminal());
    }

    #[test]
    fn worker_id_display() {
        assert_eq!(WorkerId(7).to_string(), "worker-7");
    }
}
