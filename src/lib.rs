//! Headless storefront service.
//!
//! ## Features
//! - Product catalog browsing with category/search filters
//! - Variant/SKU resolution (option matrix -> effective price/stock/image)
//! - Per-session cart with stock reconciliation against live snapshots
//! - Checkout initiation gated on a clean stock report
//! - Order history
//!
//! The domain logic under [`domain`] is pure and stateless given its inputs;
//! the HTTP layer in [`api`] owns session state and fetch orchestration.

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod error;

pub use catalog::{Catalog, CatalogQuery, StockSource};
pub use checkout::{checkout_gate, CheckoutError, CheckoutGateway, CheckoutSession};
pub use domain::aggregates::{
    Cart, CartError, CartLine, Order, OrderStatus, Product, ResolvedSku, Selection, Sku,
    VariantOption,
};
pub use domain::stock::{reconcile, CartStockReport, StockInfo, StockSnapshot, StockSync};
pub use domain::value_objects::{Money, SkuCode};
pub use error::ServiceError;
