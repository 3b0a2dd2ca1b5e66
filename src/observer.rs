//! Interface state observer
//!
//! Watches the AWDL interface independently of client requests and
//! publishes a typed event whenever its observed state changes, so the UI
//! can resynchronize after changes it did not initiate (another tool, a
//! system daemon, the interface disappearing). Subscribers treat these
//! events as the source of truth for display rather than inferring state
//! from their own last request.

use crate::platform::AwdlControl;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// A change in the observed interface state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceEvent {
    /// The interface is present and its up/down state changed.
    AwdlChanged(bool),
    /// The interface disappeared or can no longer be read.
    AwdlMissing,
}

/// Polls the platform primitive and broadcasts state transitions.
///
/// Subscribe before spawning [`InterfaceObserver::run`]; dropping a
/// receiver unsubscribes it.
pub struct InterfaceObserver {
    control: Arc<dyn AwdlControl>,
    poll_interval: Duration,
    events: broadcast::Sender<InterfaceEvent>,
}

impl InterfaceObserver {
    pub fn new(control: Arc<dyn AwdlControl>, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            control,
            poll_interval,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InterfaceEvent> {
        self.events.subscribe()
    }

    /// Poll until the task is dropped. Only transitions are published;
    /// the state at startup is primed silently.
    pub async fn run(self) {
        let mut last = observe(&*self.control);

        loop {
            tokio::time::sleep(self.poll_interval).await;

            let current = observe(&*self.control);
            if current != last {
                let event = match current {
                    Some(up) => InterfaceEvent::AwdlChanged(up),
                    None => InterfaceEvent::AwdlMissing,
                };
                debug!("Interface state changed: {:?}", event);
                // Send fails only while nothing is subscribed; keep polling
                let _ = self.events.send(event);
                last = current;
            }
        }
    }
}

/// One observation: `Some(up)` when the interface is present and
/// readable, `None` otherwise.
fn observe(control: &dyn AwdlControl) -> Option<bool> {
    if !control.has_awdl() {
        return None;
    }
    control.is_awdl_up().ok()
}
