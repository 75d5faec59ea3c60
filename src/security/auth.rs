//! Anonymous-only auth stub.
//!
//! Holds the signed-in user and a list of state observers. Observers run
//! after the state change, outside the observer lock, each isolated from
//! panics in the others.

use crate::core::config::AuthConfig;
use crate::core::error::Error;
use crate::security::user::User;
use crate::{log_info, log_warn};
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Callback receiving the new signed-in user (`None` after sign-out)
pub type AuthObserverFn = dyn Fn(Option<User>) + Send + Sync;

/// Callback receiving auth failures
pub type AuthErrorFn = dyn Fn(Error) + Send + Sync;

struct Observer {
    id: u64,
    on_change: Arc<AuthObserverFn>,
    on_error: Option<Arc<AuthErrorFn>>,
}

type ObserverList = Mutex<Vec<Arc<Observer>>>;

/// Auth handle
pub struct Auth {
    uuid: Uuid,
    anonymous_user: User,
    current_user: RwLock<Option<User>>,
    observers: Arc<ObserverList>,
    next_id: AtomicU64,
}

impl Auth {
    /// Create an auth stub that signs in as the configured anonymous user
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            anonymous_user: User::anonymous(
                config.anonymous_uid.clone(),
                config.anonymous_display_name.clone(),
            ),
            current_user: RwLock::new(None),
            observers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// The process-wide auth handle
    pub fn global() -> &'static Auth {
        crate::core::app_state::Emulator::global().auth()
    }

    /// Stable identifier of this handle
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Currently signed-in user
    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().clone()
    }

    /// Sign in as the fixed anonymous user and notify observers
    pub async fn sign_in_anonymously(&self) -> User {
        let user = self.anonymous_user.clone();
        *self.current_user.write() = Some(user.clone());
        log_info!("Signed in anonymously as {}", user.uid);
        self.notify(Some(user.clone()));
        tokio::task::yield_now().await;
        user
    }

    /// Sign out and notify observers
    pub async fn sign_out(&self) {
        let previous = self.current_user.write().take();
        if let Some(user) = previous {
            log_info!("Signed out {}", user.uid);
        }
        self.notify(None);
        tokio::task::yield_now().await;
    }

    /// Register an observer of sign-in state.
    ///
    /// In the anonymous flow the only failure is the observer itself
    /// panicking. `on_error` then receives [`Error::ListenerPanicked`] in the
    /// same tick, after `observer` has already run up to the panic. This is
    /// the one case where both callbacks see the same notification.
    pub fn on_auth_state_changed<F>(
        &self,
        observer: F,
        on_error: Option<Arc<AuthErrorFn>>,
    ) -> AuthObserverHandle
    where
        F: Fn(Option<User>) + Send + Sync + 'static,
    {
        let observer = Arc::new(Observer {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            on_change: Arc::new(observer),
            on_error,
        });
        let id = observer.id;
        self.observers.lock().push(observer);
        AuthObserverHandle {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Sign out silently and drop every observer
    pub fn reset(&self) {
        *self.current_user.write() = None;
        self.observers.lock().clear();
    }

    fn notify(&self, user: Option<User>) {
        let observers: Vec<Arc<Observer>> = self.observers.lock().clone();
        for observer in observers {
            let on_change = Arc::clone(&observer.on_change);
            let next = user.clone();
            if catch_unwind(AssertUnwindSafe(|| on_change(next))).is_err() {
                log_warn!("Auth observer {} panicked", observer.id);
                if let Some(on_error) = &observer.on_error {
                    let error = Error::ListenerPanicked {
                        event: "auth_state_changed".to_string(),
                        path: String::new(),
                    };
                    let _ = catch_unwind(AssertUnwindSafe(|| on_error(error)));
                }
            }
        }
    }
}

/// Handle returned by [`Auth::on_auth_state_changed`]
pub struct AuthObserverHandle {
    id: u64,
    observers: Weak<ObserverList>,
}

impl AuthObserverHandle {
    /// Remove the observer. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.lock().retain(|observer| observer.id != self.id);
        }
    }
}
