//! Session lifecycle notifications
//!
//! The embedding application subscribes to learn when the session ends (the
//! renewal ticket was refused) so it can clear UI state and route to sign-in.

use storefront_domain::constants::SESSION_EVENT_CAPACITY;
use tokio::sync::broadcast;
use tracing::debug;

/// Session lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A renewal succeeded and a new credential is in place
    Renewed,
    /// Renewal failed; the credential store has been cleared
    Ended {
        /// Why the renewal failed
        reason: String,
    },
}

/// Broadcast fan-out of [`SessionEvent`]s, cheap to clone
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create a channel with no subscribers yet.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self { sender }
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers; having none is fine.
    pub fn emit(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            debug!("No session event subscribers");
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let events = SessionEvents::new();
        let mut receiver = events.subscribe();

        events.emit(SessionEvent::Renewed);
        events.emit(SessionEvent::Ended { reason: "ticket expired".to_string() });

        assert_eq!(receiver.recv().await.unwrap(), SessionEvent::Renewed);
        assert_eq!(
            receiver.recv().await.unwrap(),
            SessionEvent::Ended { reason: "ticket expired".to_string() }
        );
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        SessionEvents::new().emit(SessionEvent::Renewed);
    }
}
