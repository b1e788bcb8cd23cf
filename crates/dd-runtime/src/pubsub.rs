//! A minimal publish/subscribe channel.
//!
//! Subscribers are keyed by id within a channel, so re-subscribing the
//! same id replaces the callback. Publishing is synchronous and
//! fire-and-forget: every currently subscribed callback is called once,
//! in unspecified order.

use std::collections::HashMap;

/// The channel inventory mutations are announced on.
pub const INVENTORY_CHANNEL: &str = "inventory";

/// The message published after every inventory mutation. It carries no
/// payload; subscribers re-query the inventory.
pub const INVENTORY_CHANGED: &str = "inventoryChanged";

type Callback = Box<dyn FnMut(&str)>;

/// A mapping from channel name to named subscriber callbacks.
#[derive(Default)]
pub struct MessageCenter {
    channels: HashMap<String, HashMap<String, Callback>>,
}

impl MessageCenter {
    /// Create an empty message center.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `subscriber` to `channel`. An existing subscription
    /// under the same id is replaced.
    pub fn subscribe(
        &mut self,
        channel: impl Into<String>,
        subscriber: impl Into<String>,
        callback: impl FnMut(&str) + 'static,
    ) {
        self.channels
            .entry(channel.into())
            .or_default()
            .insert(subscriber.into(), Box::new(callback));
    }

    /// Remove `subscriber` from `channel`, if subscribed.
    pub fn unsubscribe(&mut self, channel: &str, subscriber: &str) {
        if let Some(subscribers) = self.channels.get_mut(channel) {
            subscribers.remove(subscriber);
        }
    }

    /// Call every subscriber of `channel` with `message`.
    pub fn publish(&mut self, channel: &str, message: &str) {
        if let Some(subscribers) = self.channels.get_mut(channel) {
            for callback in subscribers.values_mut() {
                callback(message);
            }
        }
    }
}
