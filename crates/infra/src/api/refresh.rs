//! Single-flight credential renewal
//!
//! Any number of rejected calls may ask for a fresh credential at once; at
//! most one renewal call is ever in flight. Callers arriving while it runs
//! queue behind it and all receive the same outcome, in arrival order.
//!
//! The renewal itself runs on its own task, so a caller that is cancelled
//! (dropped future, aborted task) neither aborts the renewal nor prevents
//! the other waiters from being released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use storefront_domain::AccessCredential;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::credential_store::CredentialStore;
use super::errors::AuthError;
use super::renewal::CredentialRenewer;
use super::session::{SessionEvent, SessionEvents};

type RenewalOutcome = Result<AccessCredential, AuthError>;
type Waiter = oneshot::Sender<RenewalOutcome>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

/// Coordinates credential renewal across concurrent callers
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    state: Mutex<RefreshState>,
    renewer: Arc<dyn CredentialRenewer>,
    store: CredentialStore,
    timeout: Duration,
    events: SessionEvents,
    renewals: AtomicU64,
}

impl RefreshCoordinator {
    /// Create an idle coordinator that renews through `renewer`, bounded by
    /// `timeout`, and settles into `store`.
    pub fn new(
        renewer: Arc<dyn CredentialRenewer>,
        store: CredentialStore,
        timeout: Duration,
        events: SessionEvents,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                state: Mutex::new(RefreshState::Idle),
                renewer,
                store,
                timeout,
                events,
                renewals: AtomicU64::new(0),
            }),
        }
    }

    /// Obtain a credential to replay a call that was rejected while carrying
    /// `presented`.
    ///
    /// Joins the in-flight renewal if there is one. Otherwise, when the store
    /// already holds a different credential than the rejected one (a renewal
    /// finished after that call went out), that credential is returned
    /// without contacting the server. Only then is a new renewal started.
    ///
    /// On failure the store has been cleared and a
    /// [`SessionEvent::Ended`] has been emitted.
    pub async fn refresh_or_wait(
        &self,
        presented: Option<&AccessCredential>,
    ) -> Result<AccessCredential, AuthError> {
        // Load outside the state lock; the check below only reads memory.
        self.inner.store.get().await;
        let (sender, receiver) = oneshot::channel();

        let start_renewal = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    debug!(waiters = waiters.len() + 1, "Joining in-flight renewal");
                    waiters.push(sender);
                    false
                }
                RefreshState::Idle => {
                    if let Some(current) = self.inner.store.cached() {
                        if presented != Some(&current) {
                            debug!("Credential already renewed since the rejected call");
                            return Ok(current);
                        }
                    }
                    *state = RefreshState::Refreshing { waiters: vec![sender] };
                    true
                }
            }
        };

        if start_renewal {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run_renewal().await });
        }

        receiver.await.unwrap_or_else(|_| {
            Err(AuthError::RefreshFailed("Renewal ended without a result".to_string()))
        })
    }

    /// Number of renewal calls started since construction.
    pub fn renewal_count(&self) -> u64 {
        self.inner.renewals.load(Ordering::SeqCst)
    }

    /// Whether a renewal is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.state.lock(), RefreshState::Refreshing { .. })
    }
}

impl CoordinatorInner {
    async fn run_renewal(&self) {
        let attempt = self.renewals.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt, "Renewing access credential");

        let renewer = Arc::clone(&self.renewer);
        let mut task = tokio::spawn(async move { renewer.renew().await });

        let outcome = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(credential))) => Ok(credential),
            Ok(Ok(Err(err))) => Err(AuthError::RefreshFailed(err.to_string())),
            Ok(Err(join_err)) => {
                Err(AuthError::RefreshFailed(format!("Renewal task failed: {}", join_err)))
            }
            Err(_) => {
                task.abort();
                Err(AuthError::RefreshFailed(format!(
                    "Renewal timed out after {:?}",
                    self.timeout
                )))
            }
        };

        self.settle(outcome).await;
    }

    async fn settle(&self, outcome: RenewalOutcome) {
        // Memory swap and return to Idle happen under one lock so no caller
        // can observe Idle with the old credential still in place. Durable
        // storage is written after the lock is released.
        let waiters = {
            let mut state = self.state.lock();
            self.store.cache(outcome.as_ref().ok().cloned());
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };
        self.store.persist().await;

        let released = waiters.len();
        for waiter in waiters {
            // receiver gone means that caller was cancelled
            let _ = waiter.send(outcome.clone());
        }

        match outcome {
            Ok(_) => {
                info!(waiters = released, "Access credential renewed");
                self.events.emit(SessionEvent::Renewed);
            }
            Err(err) => {
                warn!(waiters = released, error = %err, "Credential renewal failed, session ended");
                self.events.emit(SessionEvent::Ended { reason: err.to_string() });
            }
        }
    }
}
