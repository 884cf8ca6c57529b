//! Checkout initiation: stock gate and payment-session creation.
//!
//! The reconciler's `has_issues` flag is the sole gate checked before the
//! payment provider is invoked. The gate is a pure precondition check; there
//! is no retry, the shopper resolves the mismatch and resubmits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::cart::{Cart, CartLine};
use crate::domain::stock::{reconcile, CartStockReport, StockSync};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    /// The stock snapshot fetch is still outstanding (or never ran);
    /// absence of data is not confirmed availability.
    #[error("stock snapshot not loaded yet")]
    StockPending,
    #[error("cart has stock conflicts; adjust quantities and retry")]
    StockConflict,
    /// Payment-provider failure, surfaced verbatim to the shopper.
    #[error("checkout session failed: {0}")]
    Gateway(String),
}

/// Refuse checkout while the snapshot is loading or any line has a stock
/// issue. On success, returns the clean reconciliation report.
pub fn checkout_gate(cart: &Cart, sync: &StockSync) -> Result<CartStockReport, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if sync.is_loading() {
        return Err(CheckoutError::StockPending);
    }
    let snapshot = sync.snapshot().ok_or(CheckoutError::StockPending)?;
    let report = reconcile(cart.lines(), snapshot);
    if report.has_issues {
        return Err(CheckoutError::StockConflict);
    }
    Ok(report)
}

/// Hosted payment session returned by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

/// External payment collaborator.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        lines: &[CartLine],
    ) -> Result<CheckoutSession, CheckoutError>;
}

/// Stand-in provider for demo and test runs: issues a unique hosted-payment
/// URL without talking to a real processor.
#[derive(Clone, Debug)]
pub struct MockCheckoutGateway {
    base_url: String,
}

impl MockCheckoutGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

impl Default for MockCheckoutGateway {
    fn default() -> Self {
        Self::new("https://pay.invalid/session")
    }
}

#[async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    async fn create_checkout_session(
        &self,
        lines: &[CartLine],
    ) -> Result<CheckoutSession, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), Uuid::new_v4());
        Ok(CheckoutSession { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::StockSnapshot;
    use crate::domain::value_objects::Money;

    fn cart_with(product_id: &str, quantity: u32) -> Cart {
        let mut cart = Cart::for_session("s1");
        cart.add_line(CartLine {
            product_id: product_id.into(),
            name: product_id.into(),
            unit_price: Money::tzs(10_000),
            quantity,
            image: None,
        })
        .unwrap();
        cart
    }

    fn loaded(levels: &[(&str, u32)]) -> StockSync {
        let mut sync = StockSync::new();
        let token = sync.begin_fetch();
        let snapshot: StockSnapshot =
            levels.iter().map(|(id, s)| (id.to_string(), *s)).collect();
        sync.complete(token, snapshot);
        sync
    }

    #[test]
    fn gate_refuses_empty_cart() {
        let cart = Cart::for_session("s1");
        let sync = loaded(&[]);
        assert!(matches!(checkout_gate(&cart, &sync), Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn gate_refuses_while_snapshot_loading() {
        let cart = cart_with("p1", 1);
        let mut sync = StockSync::new();
        assert!(matches!(checkout_gate(&cart, &sync), Err(CheckoutError::StockPending)));
        sync.begin_fetch();
        assert!(matches!(checkout_gate(&cart, &sync), Err(CheckoutError::StockPending)));
    }

    #[test]
    fn gate_refuses_on_stock_conflict() {
        let cart = cart_with("p1", 5);
        let sync = loaded(&[("p1", 2)]);
        assert!(matches!(checkout_gate(&cart, &sync), Err(CheckoutError::StockConflict)));
    }

    #[test]
    fn gate_passes_clean_cart() {
        let cart = cart_with("p1", 2);
        let sync = loaded(&[("p1", 2)]);
        let report = checkout_gate(&cart, &sync).unwrap();
        assert!(!report.has_issues);
    }

    #[tokio::test]
    async fn mock_gateway_issues_session_urls() {
        let gateway = MockCheckoutGateway::default();
        let cart = cart_with("p1", 1);
        let session = gateway.create_checkout_session(cart.lines()).await.unwrap();
        assert!(session.url.starts_with("https://pay.invalid/session/"));
    }
}
