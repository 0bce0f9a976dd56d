use std::time::Duration;
use tokio::time::Instant;

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(2000);

/// A message shown to the user. `id` grows with every `notify` call so a
/// front end can tell a repeated message from one it already displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

/// Single-slot, self-expiring message surface. A new message replaces the
/// pending one and restarts its visibility window.
#[derive(Debug)]
pub struct NotificationSlot {
    ttl: Duration,
    next_id: u64,
    current: Option<SlotEntry>,
}

#[derive(Debug)]
struct SlotEntry {
    notice: Notice,
    expires_at: Instant,
}

impl NotificationSlot {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 0,
            current: None,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) -> &Notice {
        self.next_id += 1;
        let entry = self.current.insert(SlotEntry {
            notice: Notice {
                id: self.next_id,
                message: message.into(),
            },
            expires_at: Instant::now() + self.ttl,
        });
        &entry.notice
    }

    /// The visible notice, if its window has not elapsed.
    pub fn current(&self) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| &entry.notice)
    }

    pub fn is_visible(&self) -> bool {
        self.current().is_some()
    }

    pub fn next_expiry(&self) -> Option<Duration> {
        self.current
            .as_ref()
            .and_then(|entry| entry.expires_at.checked_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Total number of messages ever posted.
    pub fn posted(&self) -> u64 {
        self.next_id
    }
}

impl Default for NotificationSlot {
    fn default() -> Self {
        Self::new(NOTIFICATION_TTL)
    }
}
