//! Cart aggregate.
//!
//! The cart is an explicit store object owned by one client session. Every
//! mutation goes through a method here and raises a [`CartEvent`] so the
//! owning layer can react without the cart holding callbacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::Money;

/// One line in the cart. The unit price is captured at add-to-cart time and
/// does not track later catalog price changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub image: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    session_id: String,
    lines: Vec<CartLine>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("line not found in cart")]
    LineNotFound,
    /// Setting quantity to zero is rejected; removal is a distinct
    /// operation.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

impl Cart {
    pub fn for_session(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            lines: vec![],
            created_at: now,
            updated_at: now,
            events: vec![],
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals. Lines in a cart share one currency, so the fold
    /// cannot hit a mismatch in practice.
    pub fn subtotal(&self) -> Money {
        let currency = self
            .lines
            .first()
            .map(|l| l.unit_price.currency().to_string())
            .unwrap_or_else(|| "TZS".to_string());
        self.lines
            .iter()
            .fold(Money::zero(&currency), |acc, l| acc.add(&l.line_total()).unwrap_or(acc))
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add a line, merging quantities when the product is already present.
    /// The existing line keeps its captured price and image.
    pub fn add_line(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let product_id = line.product_id.clone();
        let quantity = line.quantity;
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.lines.push(line),
        }
        self.touch();
        self.raise(CartEvent::LineAdded { product_id, quantity });
        Ok(())
    }

    /// Replace a line's quantity. Zero is rejected; use [`Cart::remove_line`]
    /// to drop a line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::LineNotFound)?;
        line.quantity = quantity;
        self.touch();
        self.raise(CartEvent::QuantityChanged { product_id: product_id.to_string(), quantity });
        Ok(())
    }

    pub fn remove_line(&mut self, product_id: &str) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound);
        }
        self.touch();
        self.raise(CartEvent::LineRemoved { product_id: product_id.to_string() });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.touch();
        self.raise(CartEvent::Cleared);
    }

    /// Drain events raised since the last call.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise(&mut self, event: CartEvent) {
        self.events.push(DomainEvent::Cart(event));
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(product_id: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            product_id: product_id.into(),
            name: format!("Product {product_id}"),
            unit_price: Money::tzs(price),
            quantity,
            image: None,
        }
    }

    #[test]
    fn add_merges_quantities_for_same_product() {
        let mut cart = Cart::for_session("s1");
        cart.add_line(line("p1", 10_000, 2)).unwrap();
        cart.add_line(line("p1", 10_000, 1)).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line("p1").unwrap().quantity, 3);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let mut cart = Cart::for_session("s1");
        cart.add_line(line("p1", 10_000, 2)).unwrap();
        cart.add_line(line("p2", 5_000, 1)).unwrap();
        assert_eq!(cart.subtotal().amount(), Decimal::from(25_000));
    }

    #[test]
    fn zero_quantity_is_rejected_not_treated_as_removal() {
        let mut cart = Cart::for_session("s1");
        cart.add_line(line("p1", 10_000, 2)).unwrap();
        assert_eq!(cart.set_quantity("p1", 0), Err(CartError::ZeroQuantity));
        // The line is untouched.
        assert_eq!(cart.line("p1").unwrap().quantity, 2);
        assert_eq!(cart.add_line(line("p2", 1_000, 0)), Err(CartError::ZeroQuantity));
    }

    #[test]
    fn remove_is_a_distinct_operation() {
        let mut cart = Cart::for_session("s1");
        cart.add_line(line("p1", 10_000, 2)).unwrap();
        cart.remove_line("p1").unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.remove_line("p1"), Err(CartError::LineNotFound));
    }

    #[test]
    fn set_quantity_requires_existing_line() {
        let mut cart = Cart::for_session("s1");
        assert_eq!(cart.set_quantity("ghost", 2), Err(CartError::LineNotFound));
    }

    #[test]
    fn mutations_raise_events() {
        let mut cart = Cart::for_session("s1");
        cart.add_line(line("p1", 10_000, 1)).unwrap();
        cart.set_quantity("p1", 4).unwrap();
        cart.remove_line("p1").unwrap();
        cart.clear();

        let events: Vec<_> = cart
            .take_events()
            .into_iter()
            .map(|e| match e {
                DomainEvent::Cart(c) => c,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(
            events,
            vec![
                CartEvent::LineAdded { product_id: "p1".into(), quantity: 1 },
                CartEvent::QuantityChanged { product_id: "p1".into(), quantity: 4 },
                CartEvent::LineRemoved { product_id: "p1".into() },
                CartEvent::Cleared,
            ]
        );
        assert!(cart.take_events().is_empty());
    }
}
