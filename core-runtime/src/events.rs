//! # Event Bus
//!
//! Delivery channel for every externally observable engine state change,
//! built on `tokio::sync::broadcast`.
//!
//! The engine emits exactly one event per logical state change and never
//! invokes subscribers concurrently with themselves; how an event reaches a
//! single-threaded UI context (channel forward, event-loop post) is the
//! embedding application's concern.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, QueueEvent};
//!
//! let bus = EventBus::new(100);
//! let mut updates = bus.subscribe();
//!
//! bus.emit(CoreEvent::Queue(QueueEvent::Cleared)).ok();
//! ```
//!
//! Slow subscribers receive `RecvError::Lagged` instead of blocking
//! publishers; `RecvError::Closed` signals shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Queue membership and per-item state changes
    Queue(QueueEvent),
    /// Scheduler run lifecycle
    Run(RunEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Run(e) => e.description(),
        }
    }
}

// ============================================================================
// Queue Events
// ============================================================================

/// Events emitted by the queue store and thumbnail pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// A new item joined the queue.
    ItemAdded {
        /// Identity key of the item.
        key: String,
        /// Item title, for display without a store round-trip.
        title: String,
        /// Order index assigned at insertion.
        order_index: u64,
    },
    /// An item left the queue.
    ItemRemoved {
        /// Identity key of the removed item.
        key: String,
    },
    /// The item at a position was swapped for another.
    ItemReplaced {
        /// Position that was swapped.
        position: usize,
        /// Identity key of the removed item.
        old_key: String,
        /// Identity key of the inserted item.
        new_key: String,
    },
    /// Every item was removed.
    Cleared,
    /// Every item's result text was cleared ahead of a re-run.
    ResultsReset,
    /// A thumbnail became available for an item.
    ThumbnailReady {
        /// Identity key of the item.
        key: String,
    },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::ItemAdded { .. } => "Item added to queue",
            QueueEvent::ItemRemoved { .. } => "Item removed from queue",
            QueueEvent::ItemReplaced { .. } => "Queue item replaced",
            QueueEvent::Cleared => "Queue cleared",
            QueueEvent::ResultsReset => "Queue results reset",
            QueueEvent::ThumbnailReady { .. } => "Thumbnail ready",
        }
    }
}

// ============================================================================
// Run Events
// ============================================================================

/// Events emitted by the job scheduler during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RunEvent {
    /// A run started.
    Started {
        /// Unique identifier for this run.
        run_id: String,
        /// Number of items snapshotted for the run.
        total: usize,
        /// Number of workers executing commands.
        workers: usize,
    },
    /// A worker claimed an item and launched its command.
    ItemStarted {
        /// The run this belongs to.
        run_id: String,
        /// Identity key of the item.
        key: String,
    },
    /// An item reached a terminal status.
    ItemFinished {
        /// The run this belongs to.
        run_id: String,
        /// Identity key of the item.
        key: String,
        /// Terminal status as a string ("success", "warning", "error").
        status: String,
        /// Captured command output or failure description.
        result: Option<String>,
    },
    /// The run finished, ran out of items, or was cancelled.
    Completed {
        /// The run this belongs to.
        run_id: String,
        /// Items that finished with success status.
        success: u64,
        /// Items that finished with warning status.
        warning: u64,
        /// Items that finished with error status.
        error: u64,
        /// Whether the run stopped due to cancellation.
        cancelled: bool,
    },
}

impl RunEvent {
    fn description(&self) -> &str {
        match self {
            RunEvent::Started { .. } => "Run started",
            RunEvent::ItemStarted { .. } => "Item execution started",
            RunEvent::ItemFinished { .. } => "Item execution finished",
            RunEvent::Completed { .. } => "Run completed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to engine events.
///
/// Uses `tokio::sync::broadcast` internally: clone the bus for multiple
/// producers, call [`subscribe`](EventBus::subscribe) for each independent
/// consumer.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber before the subscriber starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are none. Publishers treat that error as "nobody is
    /// listening" and ignore it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events. Past events are
    /// not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Queue(QueueEvent::Cleared)).is_err());
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Queue(QueueEvent::ItemAdded {
            key: "deezer:123".to_string(),
            title: "Test Track".to_string(),
            order_index: 0,
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for _ in 0..5 {
            bus.emit(CoreEvent::Queue(QueueEvent::Cleared)).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_event_serialization_round_trip() {
        let event = CoreEvent::Run(RunEvent::Completed {
            run_id: "run-1".to_string(),
            success: 8,
            warning: 1,
            error: 1,
            cancelled: false,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("run-1"));
        let decoded: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Queue(QueueEvent::ItemRemoved {
            key: "spotify:9".to_string(),
        });
        assert_eq!(event.description(), "Item removed from queue");
    }
}
