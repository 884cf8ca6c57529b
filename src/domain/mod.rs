//! Storefront domain: catalog entries, cart, orders, stock reconciliation.

pub mod aggregates;
pub mod events;
pub mod stock;
pub mod value_objects;
