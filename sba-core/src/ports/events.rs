use crate::models::{AuctionEvent, AuctionId};

/// Best-effort fan-out of auction events to realtime subscribers.
///
/// Publishing never fails and never blocks the engine; subscribers that
/// lag or disconnect simply miss events and reconcile by refetching state.
pub trait EventSink: Clone + Send + Sync + 'static {
    /// Deliver to the auction's room.
    fn publish(&self, auction_id: AuctionId, event: AuctionEvent);

    /// Deliver to the auction's room and to every connected client.
    fn broadcast(&self, auction_id: AuctionId, event: AuctionEvent);
}

/// An event sink that drops everything. Handy for tests and batch tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _auction_id: AuctionId, _event: AuctionEvent) {}

    fn broadcast(&self, _auction_id: AuctionId, _event: AuctionEvent) {}
}
