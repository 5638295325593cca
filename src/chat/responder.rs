use crate::chat::ChatOwner;
use crate::event::AppEvent;
use std::sync::mpsc;
use tokio::runtime::Handle;
use tokio::time::{self, Duration};
use tracing::debug;

/// Delivers assistant turns back to the UI loop after a cosmetic delay.
/// Every scheduled turn is delivered; there is no cancellation.
#[derive(Clone)]
pub struct Responder {
    runtime_handle: Handle,
    tx: mpsc::Sender<AppEvent>,
    delay: Duration,
}

impl Responder {
    pub fn new(runtime_handle: Handle, tx: mpsc::Sender<AppEvent>, delay: Duration) -> Self {
        Self {
            runtime_handle,
            tx,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&self, owner: ChatOwner, input: String) {
        let event = AppEvent::AssistantTurnDue { owner, input };
        if self.delay.is_zero() {
            if self.tx.send(event).is_err() {
                debug!("assistant turn dropped: event channel closed");
            }
            return;
        }

        let tx = self.tx.clone();
        let delay = self.delay;
        self.runtime_handle.spawn(async move {
            time::sleep(delay).await;
            if tx.send(event).is_err() {
                debug!("assistant turn dropped: event channel closed");
            }
        });
    }
}
