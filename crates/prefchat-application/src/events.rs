use prefchat_core::event::AppEvent;
use tokio::sync::mpsc;

/// Cloneable handle for publishing [`AppEvent`]s to the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct EventPublisher {
    sender: Option<mpsc::UnboundedSender<AppEvent>>,
}

impl EventPublisher {
    pub fn new(sender: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A publisher that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: AppEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(event).is_err() {
            tracing::trace!("[events] Receiver dropped, event discarded");
        }
    }
}

/// Creates a publisher and the receiving end the front end drains.
pub fn channel() -> (EventPublisher, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventPublisher::new(tx), rx)
}
