//! Fan-out of auction events to WebSocket subscribers.
//!
//! One process-wide tokio broadcast channel carries every event, tagged
//! with its auction; each connection filters down to the rooms it joined.
//! Broadcast semantics give the best-effort contract for free: a receiver
//! that lags just drops events and the client reconciles by refetching.

use sba_core::models::{AuctionEvent, AuctionId};
use sba_core::ports::EventSink;
use tokio::sync::broadcast;

/// An event tagged with its scope.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// The auction room the event belongs to.
    pub auction_id: AuctionId,
    /// Whether the event also goes to clients outside the room.
    pub global: bool,
    /// The event itself.
    pub event: AuctionEvent,
}

/// The process-wide event channel.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<Envelope>,
}

impl EventHub {
    /// Create a hub buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe a new connection.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

impl EventSink for EventHub {
    fn publish(&self, auction_id: AuctionId, event: AuctionEvent) {
        // a send error just means nobody is listening
        let _ = self.tx.send(Envelope {
            auction_id,
            global: false,
            event,
        });
    }

    fn broadcast(&self, auction_id: AuctionId, event: AuctionEvent) {
        let _ = self.tx.send(Envelope {
            auction_id,
            global: true,
            event,
        });
    }
}
