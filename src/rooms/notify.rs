use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MembershipChanged {
    pub room_id: Uuid,
}

/// Best-effort fan-out of membership changes. Admission never waits on this
/// and never fails because of it; a send with no listeners is just logged.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<MembershipChanged>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    pub fn membership_changed(&self, room_id: Uuid) {
        if self.tx.send(MembershipChanged { room_id }).is_err() {
            tracing::debug!(room = %room_id, "membership change dropped, no listeners");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MembershipChanged> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_changes() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        let room_id = Uuid::now_v7();
        notifier.membership_changed(room_id);

        assert_eq!(rx.recv().await.unwrap().room_id, room_id);
    }

    #[test]
    fn send_without_listeners_is_fine() {
        Notifier::new(8).membership_changed(Uuid::now_v7());
    }
}
