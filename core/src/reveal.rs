//! Progressive disclosure of a textual response, one user-perceived character
//! (grapheme cluster) per tick.

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use std::time::Duration;
use tokio::task::JoinHandle;
use unicode_segmentation::UnicodeSegmentation;

pub const REVEAL_INTERVAL: Duration = Duration::from_millis(30);

/// Offset into a fixed target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    target: String,
    /// Byte offset at which each grapheme ends.
    ends: Vec<usize>,
    offset: usize,
}

impl Reveal {
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        let ends = target
            .grapheme_indices(true)
            .map(|(start, grapheme)| start + grapheme.len())
            .collect();
        Self {
            target,
            ends,
            offset: 0,
        }
    }

    /// Reveals one more grapheme and returns it, or `None` once complete.
    pub fn advance(&mut self) -> Option<&str> {
        let end = *self.ends.get(self.offset)?;
        let start = self.displayed().len();
        self.offset += 1;
        Some(&self.target[start..end])
    }

    pub fn displayed(&self) -> &str {
        match self.offset {
            0 => "",
            n => &self.target[..self.ends[n - 1]],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.offset == self.ends.len()
    }
}

/// Drives a [`Reveal`] from a repeating tick task. The task only emits
/// [`AppEvent::RevealTick`]; the text advances when the session handles it.
#[derive(Debug)]
pub struct Revealer {
    interval: Duration,
    active: Option<ActiveReveal>,
    displayed: String,
    revealed_for: Option<u64>,
}

#[derive(Debug)]
struct ActiveReveal {
    response_id: u64,
    reveal: Reveal,
    ticker: JoinHandle<()>,
}

impl Revealer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: None,
            displayed: String::new(),
            revealed_for: None,
        }
    }

    /// Starts revealing `target` from offset zero, cancelling whatever was in
    /// progress.
    pub fn start(&mut self, response_id: u64, target: &str, tx: &AppEventSender) {
        self.reset();
        self.revealed_for = Some(response_id);
        if target.is_empty() {
            return;
        }
        let interval = self.interval;
        let tx = tx.clone();
        let ticker = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if tx.is_closed() {
                    break;
                }
                tx.send(AppEvent::RevealTick { response_id });
            }
        });
        self.active = Some(ActiveReveal {
            response_id,
            reveal: Reveal::new(target),
            ticker,
        });
    }

    /// Handles one tick. Returns whether the displayed text grew; ticks for
    /// any other response are ignored.
    pub fn on_tick(&mut self, response_id: u64) -> bool {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.response_id == response_id)
        else {
            return false;
        };
        let grew = match active.reveal.advance() {
            Some(grapheme) => {
                self.displayed.push_str(grapheme);
                true
            }
            None => false,
        };
        if active.reveal.is_complete() {
            self.halt();
        }
        grew
    }

    /// Stops the ticker and freezes the displayed prefix. The same response is
    /// never resumed.
    pub fn halt(&mut self) {
        if let Some(active) = self.active.take() {
            active.ticker.abort();
        }
    }

    /// Cancels any reveal and forgets the displayed text.
    pub fn reset(&mut self) {
        self.halt();
        self.displayed.clear();
        self.revealed_for = None;
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    pub fn is_revealing(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a reveal was ever started for this response.
    pub fn has_started(&self, response_id: u64) -> bool {
        self.revealed_for == Some(response_id)
    }
}

impl Default for Revealer {
    fn default() -> Self {
        Self::new(REVEAL_INTERVAL)
    }
}

impl Drop for Revealer {
    fn drop(&mut self) {
        self.halt();
    }
}
