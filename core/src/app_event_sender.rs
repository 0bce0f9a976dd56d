use crate::app_event::AppEvent;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Clone, Debug)]
pub struct AppEventSender {
    pub app_event_tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub fn new(app_event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { app_event_tx }
    }

    pub fn send(&self, event: AppEvent) {
        if let Err(e) = self.app_event_tx.send(event) {
            tracing::error!("failed to send event: {e}");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.app_event_tx.is_closed()
    }
}
