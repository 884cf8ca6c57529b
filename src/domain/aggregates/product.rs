//! Product catalog entry and variant/SKU resolution.
//!
//! A product may declare variant options (e.g. Color, Storage) whose values
//! compose by Cartesian product. Each purchasable combination is a [`Sku`]
//! carrying optional price/stock/image overrides. [`Product::resolve_sku`]
//! maps the shopper's current [`Selection`] to the effective price, stock
//! and image.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::value_objects::{Money, SkuCode};

/// Catalog category a product belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub slug: String,
}

/// Brand reference attached to a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// A named axis of choice with its ordered allowed values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    pub values: Vec<String>,
}

/// A concrete purchasable unit for one variant combination.
///
/// Overrides are independent: a SKU may override price without overriding
/// stock, and vice versa. An absent override inherits the product base field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    /// Display code, e.g. `"Blue|256GB"`.
    pub code: SkuCode,
    /// Structured option name -> value map. Matching runs against this,
    /// never against `code`.
    pub options: BTreeMap<String, String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub image: Option<String>,
}

impl Sku {
    /// Build a SKU from option values in declared-option order. The display
    /// code joins the values with `|`.
    pub fn from_values<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = BTreeMap::new();
        let mut parts = Vec::new();
        for (name, value) in pairs {
            options.insert(name.to_string(), value.to_string());
            parts.push(value.to_string());
        }
        // An empty pair list only occurs in malformed seed data.
        let code = SkuCode::new(parts.join("|")).unwrap_or_else(|_| SkuCode::placeholder());
        Self { code, options, price: None, stock: None, image: None }
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Base price, inherited by SKUs without a price override.
    pub price: Money,
    /// Base stock, inherited by SKUs without a stock override.
    pub stock: u32,
    pub images: Vec<String>,
    pub category: Option<Category>,
    pub brand: Option<Brand>,
    pub variants: Vec<VariantOption>,
    pub skus: Vec<Sku>,
    /// Display discount, 0-100. Drives the compare-at price.
    pub discount_percentage: Option<u8>,
    pub featured: bool,
}

/// What the resolver does when no SKU matches every selected option value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnmatchedSelectionPolicy {
    /// Fall back to the first SKU in the product's list. Favors
    /// availability over strict correctness; resolution never fails.
    FirstSku,
}

/// Active fallback policy for unmatched selections. Named so the leniency
/// reads as intentional rather than as missing validation.
pub const UNMATCHED_SELECTION_POLICY: UnmatchedSelectionPolicy =
    UnmatchedSelectionPolicy::FirstSku;

/// The shopper's current choice, one value per declared variant option.
/// Transient per product view; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(BTreeMap<String, String>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default selection for a product: the first allowed value of every
    /// declared option.
    pub fn initial(product: &Product) -> Self {
        let mut map = BTreeMap::new();
        for option in &product.variants {
            if let Some(first) = option.values.first() {
                map.insert(option.name.clone(), first.clone());
            }
        }
        Self(map)
    }

    pub fn select(&mut self, option: impl Into<String>, value: impl Into<String>) {
        self.0.insert(option.into(), value.into());
    }

    pub fn get(&self, option: &str) -> Option<&str> {
        self.0.get(option).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Selection {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Effective price/stock/image for the current selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSku {
    /// Code of the SKU the resolution landed on, `None` when the product
    /// base fields were used.
    pub code: Option<SkuCode>,
    pub price: Money,
    pub stock: u32,
    pub image: Option<String>,
}

impl Product {
    /// True iff the SKU's structured option map carries exactly the selected
    /// value for every declared variant option.
    fn sku_matches(&self, sku: &Sku, selection: &Selection) -> bool {
        self.variants.iter().all(|option| {
            match (sku.options.get(&option.name), selection.get(&option.name)) {
                (Some(have), Some(want)) => have.as_str() == want,
                _ => false,
            }
        })
    }

    /// Resolve the current selection to an effective price/stock/image.
    ///
    /// Products without declared variants, and products without SKUs,
    /// resolve to their own base fields. An unmatched selection falls back
    /// per [`UNMATCHED_SELECTION_POLICY`]; resolution never fails.
    pub fn resolve_sku(&self, selection: &Selection) -> ResolvedSku {
        if self.variants.is_empty() || self.skus.is_empty() {
            return ResolvedSku {
                code: None,
                price: self.price.clone(),
                stock: self.stock,
                image: self.images.first().cloned(),
            };
        }

        let matched = self.skus.iter().find(|sku| self.sku_matches(sku, selection));
        let sku = match matched {
            Some(sku) => sku,
            None => match UNMATCHED_SELECTION_POLICY {
                UnmatchedSelectionPolicy::FirstSku => &self.skus[0],
            },
        };

        ResolvedSku {
            code: Some(sku.code.clone()),
            price: sku.price.clone().unwrap_or_else(|| self.price.clone()),
            stock: sku.stock.unwrap_or(self.stock),
            image: sku.image.clone().or_else(|| self.images.first().cloned()),
        }
    }

    /// Pre-discount price for display, derived from the resolved price and
    /// the product's discount percentage.
    pub fn compare_at_price(&self, resolved: &ResolvedSku) -> Option<Money> {
        let percent = self.discount_percentage.unwrap_or(0);
        resolved.price.undiscounted(percent)
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> Product {
        let mut skus = Vec::new();
        for color in ["Red", "Blue"] {
            for storage in ["128GB", "256GB"] {
                let mut sku = Sku::from_values([("Color", color), ("Storage", storage)])
                    .with_stock(4);
                if storage == "256GB" {
                    sku = sku.with_price(Money::tzs(1_100_000));
                }
                if color == "Blue" {
                    sku = sku.with_image(format!("/img/phone-{}.png", color.to_lowercase()));
                }
                skus.push(sku);
            }
        }
        Product {
            id: "p1".into(),
            slug: "phone".into(),
            name: "Phone".into(),
            description: String::new(),
            price: Money::tzs(1_000_000),
            stock: 10,
            images: vec!["/img/phone.png".into()],
            category: None,
            brand: None,
            variants: vec![
                VariantOption { name: "Color".into(), values: vec!["Red".into(), "Blue".into()] },
                VariantOption {
                    name: "Storage".into(),
                    values: vec!["128GB".into(), "256GB".into()],
                },
            ],
            skus,
            discount_percentage: None,
            featured: false,
        }
    }

    fn simple() -> Product {
        Product {
            id: "p2".into(),
            slug: "cable".into(),
            name: "Cable".into(),
            description: String::new(),
            price: Money::tzs(25_000),
            stock: 3,
            images: vec!["/img/cable.png".into()],
            category: None,
            brand: None,
            variants: vec![],
            skus: vec![],
            discount_percentage: Some(20),
            featured: false,
        }
    }

    #[test]
    fn no_variants_resolves_to_base_fields() {
        let product = simple();
        let resolved = product.resolve_sku(&Selection::new());
        assert_eq!(resolved.code, None);
        assert_eq!(resolved.price, Money::tzs(25_000));
        assert_eq!(resolved.stock, 3);
        assert_eq!(resolved.image.as_deref(), Some("/img/cable.png"));
    }

    #[test]
    fn exact_match_picks_the_combination_sku() {
        let product = phone();
        let selection: Selection =
            [("Color", "Blue"), ("Storage", "256GB")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.code.as_ref().unwrap().as_str(), "Blue|256GB");
        assert_eq!(resolved.price, Money::tzs(1_100_000));
        assert_eq!(resolved.stock, 4);
    }

    #[test]
    fn overrides_are_independent() {
        let product = phone();
        // Red|128GB has a stock override but no price override.
        let selection: Selection =
            [("Color", "Red"), ("Storage", "128GB")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.price, Money::tzs(1_000_000)); // inherited base
        assert_eq!(resolved.stock, 4); // overridden
    }

    #[test]
    fn unmatched_selection_falls_back_to_first_sku() {
        let product = phone();
        let selection: Selection =
            [("Color", "Green"), ("Storage", "1TB")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(
            resolved.code.as_ref().unwrap(),
            &product.skus[0].code,
        );
    }

    #[test]
    fn incomplete_selection_falls_back_to_first_sku() {
        let product = phone();
        let selection: Selection = [("Color", "Blue")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.code.as_ref().unwrap(), &product.skus[0].code);
    }

    #[test]
    fn value_prefixes_do_not_cross_match() {
        // "128GB" must not match a "1280GB" SKU even though it is a prefix.
        let mut product = phone();
        product.variants[1].values = vec!["1280GB".into(), "128GB".into()];
        product.skus = vec![
            Sku::from_values([("Color", "Red"), ("Storage", "1280GB")]).with_stock(1),
            Sku::from_values([("Color", "Red"), ("Storage", "128GB")]).with_stock(2),
        ];
        let selection: Selection =
            [("Color", "Red"), ("Storage", "128GB")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.code.as_ref().unwrap().as_str(), "Red|128GB");
        assert_eq!(resolved.stock, 2);
    }

    #[test]
    fn sku_from_no_values_gets_a_placeholder_code() {
        let sku = Sku::from_values(std::iter::empty::<(&str, &str)>());
        assert_eq!(sku.code.as_str(), "-");
        assert!(sku.options.is_empty());
    }

    #[test]
    fn sku_image_overrides_product_image() {
        let product = phone();
        let selection: Selection =
            [("Color", "Blue"), ("Storage", "128GB")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.image.as_deref(), Some("/img/phone-blue.png"));

        let selection: Selection =
            [("Color", "Red"), ("Storage", "128GB")].into_iter().collect();
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.image.as_deref(), Some("/img/phone.png"));
    }

    #[test]
    fn initial_selection_takes_first_value_of_each_option() {
        let product = phone();
        let selection = Selection::initial(&product);
        assert_eq!(selection.get("Color"), Some("Red"));
        assert_eq!(selection.get("Storage"), Some("128GB"));
        let resolved = product.resolve_sku(&selection);
        assert_eq!(resolved.code.as_ref().unwrap().as_str(), "Red|128GB");
    }

    #[test]
    fn compare_at_price_uses_discount_percentage() {
        let product = simple();
        let resolved = product.resolve_sku(&Selection::new());
        let compare_at = product.compare_at_price(&resolved).unwrap();
        assert_eq!(compare_at, Money::tzs(31_250));

        let undiscounted = phone();
        let resolved = undiscounted.resolve_sku(&Selection::initial(&undiscounted));
        assert!(undiscounted.compare_at_price(&resolved).is_none());
    }
}
