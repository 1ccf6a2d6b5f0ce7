use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::BookingEvent;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for booking changes, one channel per organization.
///
/// A booking UI subscribes for the organization it shows and re-runs the
/// availability query whenever an event arrives.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<BookingEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to an organization's events. Creates the channel if needed.
    pub fn subscribe(&self, organization_id: &str) -> broadcast::Receiver<BookingEvent> {
        let sender = self
            .channels
            .entry(organization_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, organization_id: &str, event: &BookingEvent) {
        if let Some(sender) = self.channels.get(organization_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Drop an organization's channel; current receivers see it closed.
    pub fn remove(&self, organization_id: &str) {
        self.channels.remove(organization_id);
    }
}
