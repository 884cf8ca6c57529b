//! Aggregates module

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartLine};
pub use order::{Order, OrderError, OrderLine, OrderStatus};
pub use product::{
    Brand, Category, Product, ResolvedSku, Selection, Sku, VariantOption,
    UnmatchedSelectionPolicy, UNMATCHED_SELECTION_POLICY,
};
