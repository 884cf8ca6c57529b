//! Domain events raised by the aggregates.
//!
//! Aggregates buffer events on mutation; the owning layer drains them with
//! `take_events` and reacts (stock refresh, logging) without the aggregate
//! holding callbacks.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

/// Cart contents changed. Any of these should trigger a fresh stock
/// snapshot fetch for the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    LineAdded { product_id: String, quantity: u32 },
    QuantityChanged { product_id: String, quantity: u32 },
    LineRemoved { product_id: String },
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderEvent {
    Created { order_id: String, order_number: u64 },
    Paid { order_id: String },
    Cancelled { order_id: String },
}
