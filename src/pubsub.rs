use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Capacity of each channel's broadcast buffer. Slow subscribers lag rather than
/// block publishers.
const CHANNEL_CAPACITY: usize = 1024;

/// Server wide publish/subscribe registry. Cheap to clone.
#[derive(Clone, Default)]
pub struct PubSub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Bytes>>>>,
}

impl PubSub {
    pub fn new() -> PubSub {
        PubSub::default()
    }

    /// Returns a receiver for `channel`, creating the channel on first use.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<Bytes> {
        let mut channels = self.channels.lock();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes `message` and returns how many subscribers received it.
    pub fn publish(&self, channel: &str, message: Bytes) -> usize {
        let mut channels = self.channels.lock();
        let Some(sender) = channels.get(channel) else {
            return 0;
        };

        match sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                // Every subscriber is gone.
                channels.remove(channel);
                0
            }
        }
    }

    /// Names of channels that currently have at least one subscriber.
    pub fn channels(&self) -> Vec<String> {
        let channels = self.channels.lock();
        let mut names = channels
            .iter()
            .filter(|(_, sender)| sender.receiver_count() > 0)
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}
