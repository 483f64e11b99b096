use tokio::sync::broadcast;

use hearth_types::events::Notice;

const CHANNEL_CAPACITY: usize = 1024;

/// Best-effort fan-out of committed facts to whoever is listening.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to notices. Slow receivers observe `Lagged` and lose
    /// the oldest entries.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Publish a notice. Never blocks; dropped when nobody is subscribed.
    pub fn publish(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
