//! Cancellation scopes for in-flight cart requests.
//!
//! A shopper owns a root scope; each cart line gets a child. Closing a scope
//! closes everything below it and wakes every request waiting there.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

/// Cancellation handle. Clones observe the same scope.
#[derive(Clone, Debug)]
pub struct CancelScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    closed: watch::Sender<bool>,
    /// Open descendants to close along with this scope.
    children: Mutex<Vec<Weak<ScopeInner>>>,
    /// Held so that a close from above still reaches this scope when the
    /// intermediate handles are gone.
    _parent: Option<Arc<ScopeInner>>,
}

impl ScopeInner {
    fn new(closed: bool, parent: Option<Arc<Self>>) -> Self {
        let (tx, _rx) = watch::channel(closed);
        Self {
            closed: tx,
            children: Mutex::new(Vec::new()),
            _parent: parent,
        }
    }

    fn close(&self) {
        let children = {
            let mut children = self
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.closed.send_replace(true);
            std::mem::take(&mut *children)
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            child.close();
        }
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelScope {
    /// A new open root scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner::new(false, None)),
        }
    }

    /// A scope that closes on its own or when `self` (or any scope above
    /// it) closes. A child of a closed scope starts closed.
    #[must_use]
    pub fn child(&self) -> Self {
        let mut children = self
            .inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let child = Arc::new(ScopeInner::new(
            *self.inner.closed.borrow(),
            Some(Arc::clone(&self.inner)),
        ));
        if !*child.closed.borrow() {
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        Self { inner: child }
    }

    /// Close this scope and every scope below it. Idempotent.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Whether this scope has been closed, directly or from above.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Resolves once the scope is closed.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.closed.subscribe();
        // `self` keeps the sender alive, so this only returns once the flag
        // is set.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn test_close_wakes_waiters() {
        let scope = CancelScope::new();
        let waiter = scope.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        scope.close();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .expect("task should not panic");
        assert!(scope.is_closed());
    }

    #[tokio::test]
    async fn test_parent_close_cancels_child() {
        let root = CancelScope::new();
        let child = root.child();
        assert!(!child.is_closed());

        root.close();
        assert!(child.is_closed());
        tokio::time::timeout(Duration::from_secs(1), child.cancelled())
            .await
            .expect("child should observe parent close");
    }

    #[tokio::test]
    async fn test_child_close_leaves_parent_open() {
        let root = CancelScope::new();
        let child = root.child();
        child.close();

        assert!(child.is_closed());
        assert!(!root.is_closed());
    }

    #[tokio::test]
    async fn test_root_close_reaches_grandchildren() {
        let root = CancelScope::new();
        let grandchild = root.child().child();

        root.close();

        assert!(grandchild.is_closed());
        tokio::time::timeout(Duration::from_secs(1), grandchild.cancelled())
            .await
            .expect("grandchild should observe root close");
    }

    #[test]
    fn test_child_of_closed_scope_starts_closed() {
        let root = CancelScope::new();
        root.close();
        assert!(root.child().is_closed());
    }
}
