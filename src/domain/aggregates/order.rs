//! Order aggregate.
//!
//! Orders are created from a cart at checkout initiation and back the
//! order-history surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub image: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    id: String,
    order_number: u64,
    customer_id: String,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    subtotal: Money,
    total: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order has no lines")]
    NoLines,
    #[error("delivered orders cannot be cancelled")]
    CannotCancel,
}

impl Order {
    /// Snapshot the cart's lines into a pending order.
    pub fn from_cart(
        order_number: u64,
        customer_id: impl Into<String>,
        cart: &Cart,
    ) -> Result<Self, OrderError> {
        Self::from_lines(order_number, customer_id, cart.lines())
    }

    /// Build a pending order from a point-in-time copy of cart lines (the
    /// checkout flow snapshots lines before calling the payment provider).
    /// Shipping and tax are settled by the provider, so the total equals
    /// the subtotal here.
    pub fn from_lines(
        order_number: u64,
        customer_id: impl Into<String>,
        cart_lines: &[CartLine],
    ) -> Result<Self, OrderError> {
        if cart_lines.is_empty() {
            return Err(OrderError::NoLines);
        }
        let lines: Vec<OrderLine> = cart_lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product_id.clone(),
                name: l.name.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price.clone(),
                line_total: l.line_total(),
                image: l.image.clone(),
            })
            .collect();
        let currency = cart_lines[0].unit_price.currency().to_string();
        let subtotal = cart_lines
            .iter()
            .fold(Money::zero(&currency), |acc, l| acc.add(&l.line_total()).unwrap_or(acc));
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();
        let mut order = Self {
            id: id.clone(),
            order_number,
            customer_id: customer_id.into(),
            status: OrderStatus::Pending,
            lines,
            total: subtotal.clone(),
            subtotal,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise(OrderEvent::Created { order_id: id, order_number });
        Ok(order)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order_number(&self) -> u64 {
        self.order_number
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn total(&self) -> &Money {
        &self.total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn mark_paid(&mut self) {
        self.status = OrderStatus::Paid;
        self.touch();
        self.raise(OrderEvent::Paid { order_id: self.id.clone() });
    }

    pub fn ship(&mut self) {
        self.status = OrderStatus::Shipped;
        self.touch();
    }

    pub fn deliver(&mut self) {
        self.status = OrderStatus::Delivered;
        self.touch();
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status == OrderStatus::Delivered {
            return Err(OrderError::CannotCancel);
        }
        self.status = OrderStatus::Cancelled;
        self.touch();
        self.raise(OrderEvent::Cancelled { order_id: self.id.clone() });
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: OrderEvent) {
        self.events.push(DomainEvent::Order(event));
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
