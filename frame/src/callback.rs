//! Handler references with stable identity.
//!
//! A [`Callback`] compares equal only to clones of itself, so a render tree
//! built twice from the same provider state compares equal, while a handler
//! re-created per render would not.

use std::fmt;
use std::sync::Arc;

/// Shared, cheaply clonable `Fn()` handler.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn() + Send + Sync>);

impl Callback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A handler that does nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Call the handler.
    pub fn invoke(&self) {
        (self.0)();
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}
