// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable holder for the fallback resource configuration.
//!
//! Workers opened without an explicit configuration read the holder they
//! were given at open time. Nothing here is a process global: callers that
//! want one share a single `Arc<DefaultConfig<C>>`.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Optional, settable fallback configuration.
///
/// Reads are lock-free and may happen on any worker thread.
pub struct DefaultConfig<C> {
    inner: ArcSwapOption<C>,
}

impl<C> DefaultConfig<C> {
    /// An empty holder.
    pub fn new() -> Self {
        Self {
            inner: ArcSwapOption::const_empty(),
        }
    }

    /// A holder pre-filled with `config`.
    pub fn with(config: C) -> Self {
        Self {
            inner: ArcSwapOption::from_pointee(config),
        }
    }

    /// Replaces the default. `None` clears it.
    pub fn set(&self, config: Option<C>) {
        self.inner.store(config.map(Arc::new));
    }

    /// Clears the default.
    pub fn clear(&self) {
        self.inner.store(None);
    }

    /// Clears the default and returns the previous value.
    pub fn take(&self) -> Option<Arc<C>> {
        self.inner.swap(None)
    }

    /// Returns `true` when a default is set.
    pub fn is_set(&self) -> bool {
        self.inner.load().is_some()
    }
}

impl<C: Clone> DefaultConfig<C> {
    /// A copy of the current default, if any.
    pub fn get(&self) -> Option<C> {
        self.inner.load_full().map(|c| C::clone(&c))
    }

    /// Resolves the effective configuration: `explicit`, then the default.
    pub fn resolve(&self, explicit: Option<C>) -> Option<C> {
        explicit.or_else(|| self.get())
    }
}

impl<C> Default for DefaultConfig<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for DefaultConfig<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultConfig")
            .field("config", &self.inner.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_holder_resolves_to_explicit_only() {
        let defaults: DefaultConfig<String> = DefaultConfig::new();
        assert!(!defaults.is_set());
        assert_eq!(defaults.resolve(None), None);
        assert_eq!(
            defaults.resolve(Some("explicit".into())),
            Some("explicit".to_string())
        );
    }

    #[test]
    fn explicit_wins_over_default() {
        let defaults = DefaultConfig::with("default".to_string());
        assert_eq!(
            defaults.resolve(Some("explicit".into())),
            Some("explicit".to_string())
        );
        assert_eq!(defaults.resolve(None), Some("default".to_string()));
    }

    #[test]
    fn set_take_and_clear() {
        let defaults = DefaultConfig::new();
        defaults.set(Some(1u32));
        assert_eq!(defaults.get(), Some(1));

        let previous = defaults.take();
        assert_eq!(previous.as_deref(), Some(&1));
        assert!(!defaults.is_set());

        defaults.set(Some(2));
        defaults.set(None);
        assert_eq!(defaults.get(), None);
    }
}
