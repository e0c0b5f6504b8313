//! Input events captured outside the tick loop.
//!
//! Producers (touch handlers, orientation listeners) push events from any
//! thread; the simulation drains them at the start of each tick.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;

use crate::orientation::{InterfaceOrientation, gravity_from_accelerometer};

/// One pointer or gravity update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ContactBegan(Vec2),
    ContactMoved(Vec2),
    ContactEnded,
    /// Orientation-corrected gravity direction. Zero means unknown.
    Gravity(Vec2),
}

/// Shared FIFO of pending input. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    inner: Arc<Mutex<VecDeque<InputEvent>>>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event to be applied at the next tick.
    pub fn push(&self, event: InputEvent) {
        self.inner.lock().push_back(event);
    }

    /// Converts a raw accelerometer sample and queues the resulting gravity.
    pub fn push_accelerometer(&self, accel: Vec2, orientation: InterfaceOrientation, scale: f32) {
        self.push(InputEvent::Gravity(gravity_from_accelerometer(accel, orientation, scale)));
    }

    /// Drain all pending events in arrival order.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let queue = InputQueue::new();
        queue.push(InputEvent::ContactBegan(Vec2::new(1.0, 2.0)));
        queue.push(InputEvent::ContactMoved(Vec2::new(3.0, 4.0)));
        queue.push(InputEvent::ContactEnded);

        let events = queue.drain();
        assert_eq!(
            events,
            vec![
                InputEvent::ContactBegan(Vec2::new(1.0, 2.0)),
                InputEvent::ContactMoved(Vec2::new(3.0, 4.0)),
                InputEvent::ContactEnded,
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clones_share_queue_across_threads() {
        let queue = InputQueue::new();
        let producer = queue.clone();
        std::thread::spawn(move || {
            for i in 0..10u8 {
                producer.push(InputEvent::ContactMoved(Vec2::splat(f32::from(i))));
            }
        })
        .join()
        .unwrap();
        assert_eq!(queue.len(), 10);
    }

    #[test]
    fn test_accelerometer_sample_becomes_gravity() {
        let queue = InputQueue::new();
        queue.push_accelerometer(Vec2::new(0.0, -1.0), InterfaceOrientation::Portrait, 1.0);
        queue.push_accelerometer(Vec2::new(0.0, -1.0), InterfaceOrientation::Unknown, 1.0);
        assert_eq!(
            queue.drain(),
            vec![InputEvent::Gravity(Vec2::new(0.0, 1.0)), InputEvent::Gravity(Vec2::ZERO)]
        );
    }
}
