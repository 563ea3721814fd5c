//! OptionsMonitor - in-memory push source of `RouterOptions`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use contracts::{OptionsListener, OptionsSource, RouterOptions, Subscription};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::debug;

#[derive(Default)]
struct MonitorInner {
    current: RwLock<RouterOptions>,
    /// Held from the write until every listener returned
    notify: ReentrantMutex<()>,
    listeners: Mutex<Vec<(u64, OptionsListener)>>,
    next_id: AtomicU64,
}

/// Holds the current options and notifies subscribers on every change
///
/// Cloning shares the same state. Listeners run synchronously on the thread
/// that calls [`set`](Self::set). Concurrent `set` calls are serialized, so
/// listeners see changes in the order they were written. A listener may call
/// `set` again on the same thread.
#[derive(Clone, Default)]
pub struct OptionsMonitor {
    inner: Arc<MonitorInner>,
}

impl OptionsMonitor {
    pub fn new(initial: RouterOptions) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                current: RwLock::new(initial),
                ..MonitorInner::default()
            }),
        }
    }

    /// Replace the current options and notify every listener
    pub fn set(&self, options: RouterOptions) {
        let _notify = self.inner.notify.lock();
        *self.inner.current.write() = options.clone();

        let listeners: Vec<OptionsListener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!(listeners = listeners.len(), "Options changed");
        for listener in listeners {
            listener(&options);
        }
    }

    /// Replace the options only if they differ; returns whether they did
    pub fn set_if_changed(&self, options: RouterOptions) -> bool {
        let _notify = self.inner.notify.lock();
        if *self.inner.current.read() == options {
            return false;
        }
        self.set(options);
        true
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

impl OptionsSource for OptionsMonitor {
    fn current(&self) -> RouterOptions {
        self.inner.current.read().clone()
    }

    fn subscribe(&self, listener: OptionsListener) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, listener));

        let weak: Weak<MonitorInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().retain(|(other, _)| *other != id);
            }
        })
    }
}

impl std::fmt::Debug for OptionsMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsMonitor")
            .field("current", &*self.inner.current.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
