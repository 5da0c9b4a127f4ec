// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Input events and listener subscriptions.
//!
//! The host forwards raw pointer/keyboard input as [`InputEvent`]s addressed
//! to a [`Target`]. An event is only acted upon if some active tool has
//! subscribed to that target and channel. Subscriptions are handles: dropping
//! one removes its listeners, so a tool's listeners live exactly as long as
//! the tool's session.

use crate::util::geometry::Point;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Bit set in [`PointerEvent::buttons`] while the primary button is held.
pub const PRIMARY_BUTTON: u8 = 1;

/// Pointer position in surface pixels plus held buttons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pos: Point,
    pub buttons: u8,
}

impl PointerEvent {
    /// True when exactly the primary button is held.
    pub fn primary_only(&self) -> bool {
        self.buttons == PRIMARY_BUTTON
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    PointerEnter,
    PointerLeave,
    KeyDown(Key),
}

impl InputEvent {
    pub fn channel(&self) -> Channel {
        match self {
            InputEvent::PointerDown(_) => Channel::PointerDown,
            InputEvent::PointerMove(_) => Channel::PointerMove,
            InputEvent::PointerUp(_) => Channel::PointerUp,
            InputEvent::PointerEnter => Channel::PointerEnter,
            InputEvent::PointerLeave => Channel::PointerLeave,
            InputEvent::KeyDown(_) => Channel::KeyDown,
        }
    }
}

/// Kind of event a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerEnter,
    PointerLeave,
    KeyDown,
}

/// All pointer channels, for tools that want the full set.
pub const POINTER_CHANNELS: [Channel; 5] = [
    Channel::PointerDown,
    Channel::PointerMove,
    Channel::PointerUp,
    Channel::PointerEnter,
    Channel::PointerLeave,
];

/// Element an event is delivered to.
///
/// Events on the surface or a text area bubble: the host delivers them to
/// the element first and then to `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Surface,
    /// Overlay region of a text annotation; the number identifies the
    /// region so a rebuilt one gets fresh listeners
    TextArea(u32),
    Document,
}

#[derive(Debug)]
struct Listener {
    id: u64,
    target: Target,
    channel: Channel,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Listener registry shared with the subscriptions it hands out.
#[derive(Debug, Default)]
pub struct EventHub {
    registry: Rc<RefCell<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach listeners for `channels` on `target`.
    pub fn subscribe(&self, target: Target, channels: &[Channel]) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let mut ids = Vec::with_capacity(channels.len());
        for &channel in channels {
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push(Listener { id, target, channel });
            ids.push(id);
        }
        log::trace!("Subscribed {:?} to {:?}", target, channels);

        Subscription {
            ids,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn is_listening(&self, target: Target, channel: Channel) -> bool {
        self.registry
            .borrow()
            .listeners
            .iter()
            .any(|l| l.target == target && l.channel == channel)
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Handle to a group of listeners; dropping it detaches them.
#[derive(Debug)]
pub struct Subscription {
    ids: Vec<u64>,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .listeners
                .retain(|l| !self.ids.contains(&l.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_releases_listeners() {
        let hub = EventHub::new();
        let subscription = hub.subscribe(Target::Surface, &POINTER_CHANNELS);
        assert!(hub.is_listening(Target::Surface, Channel::PointerMove));
        assert_eq!(hub.listener_count(), 5);

        drop(subscription);
        assert!(!hub.is_listening(Target::Surface, Channel::PointerMove));
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_subscriptions_are_independent() {
        let hub = EventHub::new();
        let document = hub.subscribe(Target::Document, &[Channel::KeyDown]);
        let area = hub.subscribe(Target::TextArea(1), &[Channel::PointerDown]);

        drop(area);
        assert!(hub.is_listening(Target::Document, Channel::KeyDown));
        assert!(!hub.is_listening(Target::TextArea(1), Channel::PointerDown));
        drop(document);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_hub_is_harmless() {
        let hub = EventHub::new();
        let subscription = hub.subscribe(Target::Surface, &[Channel::PointerUp]);
        drop(hub);
        drop(subscription);
    }
}
