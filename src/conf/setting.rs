//! Tri-state configuration fields.

use serde::Serialize;

/// A record field that remembers whether it was ever set.
///
/// Unset is distinct from every legal value, so merge can tell "explicitly
/// zero" apart from "never touched". Serializes as `null` while unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Setting<T>(Option<T>);

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Setting<T> {
    pub const fn unset() -> Self {
        Self(None)
    }

    pub fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.0.as_mut()
    }

    /// Store a value; last write wins.
    pub fn set(&mut self, value: T) {
        self.0 = Some(value);
    }

    /// Mutable access, initialising from `init` when unset.
    pub fn get_or_insert_with(&mut self, init: impl FnOnce() -> T) -> &mut T {
        self.0.get_or_insert_with(init)
    }
}

impl<T: Clone> Setting<T> {
    /// Fill an unset field from `parent`, falling back to `default`.
    ///
    /// A field that is already set is never touched, so repeated merges
    /// give the same result as one.
    pub fn merge(&mut self, parent: Option<&Setting<T>>, default: T) {
        self.merge_with(parent, || default);
    }

    /// Like [`Setting::merge`] with a lazily built default.
    pub fn merge_with(&mut self, parent: Option<&Setting<T>>, default: impl FnOnce() -> T) {
        if self.0.is_some() {
            return;
        }
        self.0 = Some(match parent.and_then(|p| p.0.clone()) {
            Some(value) => value,
            None => default(),
        });
    }

    /// Fill an unset field from `parent` only; no default is applied.
    pub fn inherit(&mut self, parent: Option<&Setting<T>>) {
        if self.0.is_none() {
            self.0 = parent.and_then(|p| p.0.clone());
        }
    }
}

impl<T: Copy> Setting<T> {
    /// The value, or `fallback` while unset.
    pub fn value_or(&self, fallback: T) -> T {
        self.0.unwrap_or(fallback)
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
