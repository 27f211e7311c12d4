//! Scope guards for running cleanup work when a scope exits.
//!
//! Two guards are provided:
//!
//! - [`ScopeGuard`] - holds a single action, run on drop unless cleared
//! - [`MultiGuard`] - holds an ordered batch of actions, all run on drop
//!
//! Guards are the building block for transactional code: arm a guard with the
//! undo step, perform the fallible work, and clear the guard once the work
//! has succeeded.
//!
//! # Example
//!
//! ```
//! use tether_core::guard::ScopeGuard;
//! use std::cell::Cell;
//!
//! let rolled_back = Cell::new(false);
//! {
//!     let mut guard = ScopeGuard::new(|| rolled_back.set(true));
//!     // ... work that might bail out early ...
//!     guard.clear(); // success: nothing to undo
//! }
//! assert!(!rolled_back.get());
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::logging::targets;

type Action<'a> = Box<dyn FnOnce() + 'a>;

/// Runs one stored action when dropped, unless cleared or replaced.
///
/// The action runs at most once. If it panics, the panic propagates to the
/// scope that drops the guard; a panic raised while that scope is already
/// unwinding aborts the process, so actions should not panic.
///
/// # Related
///
/// - [`MultiGuard`] - the same idea for several actions
#[must_use = "a scope guard runs its action when dropped; binding it to `_` drops it immediately"]
pub struct ScopeGuard<'a> {
    action: Option<Action<'a>>,
}

impl<'a> ScopeGuard<'a> {
    /// Create a guard that runs `action` when it goes out of scope.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// Discard the stored action; dropping the guard becomes a no-op.
    pub fn clear(&mut self) {
        self.action = None;
    }

    /// Discard the stored action and store `action` in its place.
    pub fn replace<F>(&mut self, action: F)
    where
        F: FnOnce() + 'a,
    {
        self.action = Some(Box::new(action));
    }

    /// Whether an action is currently stored.
    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl fmt::Debug for ScopeGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("armed", &self.is_armed())
            .finish()
    }
}

/// Runs an ordered batch of actions when dropped, unless cleared.
///
/// Actions run in insertion order. Every action is run even if an earlier one
/// panics: the first panic is captured and re-raised once the batch has
/// finished. When the guard is dropped during unwinding, panics from its
/// actions are swallowed instead, so the batch still completes without
/// aborting.
///
/// # Example
///
/// ```
/// use tether_core::guard::MultiGuard;
/// use std::cell::RefCell;
///
/// let log = RefCell::new(Vec::new());
/// {
///     let mut guard = MultiGuard::new();
///     guard.append(|| log.borrow_mut().push("close first"));
///     guard.append(|| log.borrow_mut().push("close second"));
/// }
/// assert_eq!(*log.borrow(), vec!["close first", "close second"]);
/// ```
#[must_use = "a multi guard runs its actions when dropped; binding it to `_` drops it immediately"]
#[derive(Default)]
pub struct MultiGuard<'a> {
    actions: Vec<Action<'a>>,
}

impl<'a> MultiGuard<'a> {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Create a guard holding `action` as its first entry.
    pub fn with<F>(action: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        let mut guard = Self::new();
        guard.append(action);
        guard
    }

    /// Append an action to the end of the batch.
    pub fn append<F>(&mut self, action: F)
    where
        F: FnOnce() + 'a,
    {
        self.actions.push(Box::new(action));
    }

    /// Discard every stored action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Number of stored actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no action is stored.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Drop for MultiGuard<'_> {
    fn drop(&mut self) {
        let mut first_panic = None;
        for action in self.actions.drain(..) {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
                first_panic.get_or_insert(payload);
            }
        }

        if let Some(payload) = first_panic {
            if std::thread::panicking() {
                tracing::error!(
                    target: targets::GUARD,
                    "cleanup action panicked while unwinding; panic swallowed"
                );
            } else {
                panic::resume_unwind(payload);
            }
        }
    }
}

impl fmt::Debug for MultiGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiGuard")
            .field("actions", &self.actions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_scope_guard_executes() {
        let executed = Cell::new(false);
        {
            let _guard = ScopeGuard::new(|| executed.set(true));
            assert!(!executed.get());
        }
        assert!(executed.get());
    }

    #[test]
    fn test_scope_guard_cleared() {
        let executed = Cell::new(false);
        {
            let mut guard = ScopeGuard::new(|| executed.set(true));
            assert!(guard.is_armed());
            guard.clear();
            assert!(!guard.is_armed());
        }
        assert!(!executed.get());
    }

    #[test]
    fn test_scope_guard_replaced() {
        let first = Cell::new(false);
        let second = Cell::new(false);
        {
            let mut guard = ScopeGuard::new(|| first.set(true));
            guard.replace(|| second.set(true));
            assert!(!first.get());
            assert!(!second.get());
        }
        assert!(!first.get());
        assert!(second.get());
    }

    #[test]
    fn test_scope_guard_runs_once_on_unwind() {
        let count = Cell::new(0);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = ScopeGuard::new(|| count.set(count.get() + 1));
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_scope_guard_action_panic_reaches_dropping_scope() {
        let count = Cell::new(0);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let guard = ScopeGuard::new(|| {
                count.set(count.get() + 1);
                panic!("cleanup failed");
            });
            drop(guard);
        }));
        let payload = result.expect_err("action panic should propagate");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"cleanup failed"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_multi_guard_empty() {
        let guard = MultiGuard::new();
        assert!(guard.is_empty());
        drop(guard);
    }

    #[test]
    fn test_multi_guard_one_action() {
        let executed = Cell::new(false);
        {
            let mut guard = MultiGuard::new();
            guard.append(|| executed.set(true));
            assert!(!executed.get());
        }
        assert!(executed.get());
    }

    #[test]
    fn test_multi_guard_insertion_order() {
        let log = RefCell::new(Vec::new());
        {
            let mut guard = MultiGuard::with(|| log.borrow_mut().push(1));
            guard.append(|| log.borrow_mut().push(2));
            guard.append(|| log.borrow_mut().push(3));
            assert_eq!(guard.len(), 3);
        }
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_multi_guard_cleared() {
        let first = Cell::new(false);
        let second = Cell::new(false);
        {
            let mut guard = MultiGuard::new();
            guard.append(|| first.set(true));
            guard.append(|| second.set(true));
            guard.clear();
        }
        assert!(!first.get());
        assert!(!second.get());
    }

    #[test]
    fn test_multi_guard_runs_all_after_panic() {
        let later = Cell::new(false);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut guard = MultiGuard::new();
            guard.append(|| panic!("first action fails"));
            guard.append(|| later.set(true));
        }));
        assert!(result.is_err());
        assert!(later.get());
    }

    #[test]
    fn test_multi_guard_swallows_action_panic_while_unwinding() {
        let later = Cell::new(false);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut guard = MultiGuard::new();
            guard.append(|| panic!("cleanup failed"));
            guard.append(|| later.set(true));
            panic!("outer");
        }));
        let payload = result.expect_err("outer panic should propagate");
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"outer"));
        assert!(later.get());
    }
}
