//! In-memory product catalog and the stock snapshot source.
//!
//! The catalog is seeded once at startup ([`Catalog::demo`]) and read-only
//! afterwards. It also serves as the [`StockSource`] the cart layer queries
//! for fresh snapshots.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::aggregates::product::{Brand, Category, Product, Sku, VariantOption};
use crate::domain::stock::StockSnapshot;
use crate::domain::value_objects::Money;

/// List query, mirroring the public catalog endpoint's parameters.
#[derive(Clone, Debug, Default)]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Category slug filter.
    pub category: Option<String>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: u32,
}

#[derive(Debug, Clone, Error)]
pub enum StockFetchError {
    #[error("stock source unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator returning current stock for a set of product ids.
/// Unknown ids are omitted from the snapshot, not reported as zero.
#[async_trait]
pub trait StockSource: Send + Sync {
    async fn fetch(&self, product_ids: &[String]) -> Result<StockSnapshot, StockFetchError>;
}

pub struct Catalog {
    products: Vec<Product>,
    by_id: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_slug = HashMap::new();
        for (idx, product) in products.iter().enumerate() {
            by_id.insert(product.id.clone(), idx);
            by_slug.insert(product.slug.clone(), idx);
        }
        Self { products, by_id, by_slug }
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.by_id.get(id).map(|&idx| &self.products[idx])
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&Product> {
        self.by_slug.get(slug).map(|&idx| &self.products[idx])
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn list(&self, query: &CatalogQuery) -> Page<&Product> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100) as usize;
        let search = query.search.as_deref().map(str::to_lowercase);

        let filtered: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| match &query.category {
                Some(slug) => p.category.as_ref().is_some_and(|c| &c.slug == slug),
                None => true,
            })
            .filter(|p| match &search {
                Some(needle) => p.name.to_lowercase().contains(needle),
                None => true,
            })
            .collect();

        let total = filtered.len();
        let start = (page as usize - 1).saturating_mul(per_page);
        let data = filtered.into_iter().skip(start).take(per_page).collect();
        Page { data, total, page }
    }

    pub fn categories(&self) -> Vec<Category> {
        let mut seen = HashMap::new();
        for product in &self.products {
            if let Some(category) = &product.category {
                seen.entry(category.slug.clone()).or_insert_with(|| category.clone());
            }
        }
        let mut categories: Vec<Category> = seen.into_values().collect();
        categories.sort_by(|a, b| a.slug.cmp(&b.slug));
        categories
    }

    pub fn brands(&self) -> Vec<Brand> {
        let mut seen = HashMap::new();
        for product in &self.products {
            if let Some(brand) = &product.brand {
                seen.entry(brand.slug.clone()).or_insert_with(|| brand.clone());
            }
        }
        let mut brands: Vec<Brand> = seen.into_values().collect();
        brands.sort_by(|a, b| a.slug.cmp(&b.slug));
        brands
    }

    /// Current base stock for the requested ids. Unknown ids are omitted.
    pub fn stock_levels(&self, product_ids: &[String]) -> StockSnapshot {
        product_ids
            .iter()
            .filter_map(|id| self.get(id).map(|p| (id.clone(), p.stock)))
            .collect()
    }
}

#[async_trait]
impl StockSource for Catalog {
    async fn fetch(&self, product_ids: &[String]) -> Result<StockSnapshot, StockFetchError> {
        Ok(self.stock_levels(product_ids))
    }
}

// --- demo seed -------------------------------------------------------------

fn category(id: &str, title: &str) -> Category {
    Category { id: format!("cat-{id}"), title: title.into(), slug: id.into() }
}

fn brand(slug: &str, name: &str) -> Brand {
    Brand { id: format!("brand-{slug}"), name: name.into(), slug: slug.into() }
}

fn base_product(slug: &str, name: &str, price: i64, stock: u32) -> Product {
    Product {
        id: format!("prod-{slug}"),
        slug: slug.into(),
        name: name.into(),
        description: String::new(),
        price: Money::tzs(price),
        stock,
        images: vec![format!("/products/{slug}.png")],
        category: None,
        brand: None,
        variants: vec![],
        skus: vec![],
        discount_percentage: None,
        featured: false,
    }
}

/// Color x Storage matrix for phone-like products, with per-storage price
/// bumps. Per-SKU stock is deterministic so tests stay stable.
fn phone_matrix(base_price: i64) -> (Vec<VariantOption>, Vec<Sku>) {
    let colors = ["Graphite", "Silver", "Gold", "Blue"];
    let storages = [("128GB", 0), ("256GB", 100_000), ("512GB", 250_000)];
    let variants = vec![
        VariantOption {
            name: "Color".into(),
            values: colors.iter().map(|c| c.to_string()).collect(),
        },
        VariantOption {
            name: "Storage".into(),
            values: storages.iter().map(|(s, _)| s.to_string()).collect(),
        },
    ];
    let mut skus = Vec::new();
    for (ci, color) in colors.iter().enumerate() {
        for (si, (storage, bump)) in storages.iter().enumerate() {
            let stock = (((ci + si) % 4) * 3) as u32;
            skus.push(
                Sku::from_values([("Color", *color), ("Storage", *storage)])
                    .with_price(Money::tzs(base_price + bump))
                    .with_stock(stock),
            );
        }
    }
    (variants, skus)
}

/// Chip x RAM matrix for laptop-like products.
fn laptop_matrix(base_price: i64) -> (Vec<VariantOption>, Vec<Sku>) {
    let chips = ["M1", "M2", "M3"];
    let rams = [("8GB", 0), ("16GB", 200_000), ("32GB", 450_000)];
    let variants = vec![
        VariantOption { name: "Chip".into(), values: chips.iter().map(|c| c.to_string()).collect() },
        VariantOption { name: "RAM".into(), values: rams.iter().map(|(r, _)| r.to_string()).collect() },
    ];
    let mut skus = Vec::new();
    for chip in chips {
        for (ram, bump) in rams {
            skus.push(
                Sku::from_values([("Chip", chip), ("RAM", ram)])
                    .with_price(Money::tzs(base_price + bump))
                    .with_stock(5),
            );
        }
    }
    (variants, skus)
}

impl Catalog {
    /// Demo catalog: a handful of products covering every storefront path
    /// (variant matrices, discounts, low stock, out of stock).
    pub fn demo() -> Self {
        let mobiles = category("mobiles", "Mobiles");
        let laptops = category("laptops", "Laptops");
        let audio = category("audio", "Audio");
        let gaming = category("gaming", "Gaming");
        let accessories = category("accessories", "Accessories");
        let software = category("software", "Software");

        let apple = brand("apple", "Apple");
        let samsung = brand("samsung", "Samsung");
        let sony = brand("sony", "Sony");
        let hp = brand("hp", "HP");
        let dji = brand("dji", "DJI");

        let mut products = Vec::new();

        let mut p = base_product("iphone-15-pro", "iPhone 15 Pro", 2_800_000, 12);
        p.category = Some(mobiles.clone());
        p.brand = Some(apple.clone());
        (p.variants, p.skus) = phone_matrix(2_800_000);
        p.featured = true;
        products.push(p);

        let mut p = base_product("galaxy-s24-ultra", "Samsung Galaxy S24 Ultra", 2_400_000, 8);
        p.category = Some(mobiles);
        p.brand = Some(samsung);
        (p.variants, p.skus) = phone_matrix(2_400_000);
        products.push(p);

        let mut p = base_product("macbook-air-m3", "MacBook Air", 3_200_000, 6);
        p.category = Some(laptops.clone());
        p.brand = Some(apple);
        (p.variants, p.skus) = laptop_matrix(3_200_000);
        p.featured = true;
        products.push(p);

        let mut p = base_product("sony-wh-1000xm5", "Sony WH-1000XM5 Headphones", 850_000, 15);
        p.category = Some(audio);
        p.brand = Some(sony.clone());
        p.discount_percentage = Some(10);
        products.push(p);

        // Out of stock on purpose.
        let mut p = base_product("playstation-5", "PlayStation 5 Console", 1_900_000, 0);
        p.category = Some(gaming);
        p.brand = Some(sony);
        products.push(p);

        // Low stock on purpose.
        let mut p = base_product("hp-spectre-x360", "HP Spectre x360", 2_900_000, 4);
        p.category = Some(laptops);
        p.brand = Some(hp);
        p.discount_percentage = Some(15);
        products.push(p);

        let mut p = base_product("dji-mini-4-pro", "DJI Mini 4 Pro Drone", 1_600_000, 6);
        p.category = Some(accessories);
        p.brand = Some(dji);
        products.push(p);

        let mut p = base_product("office-365-family", "Office 365 Family License", 220_000, 999);
        p.category = Some(software);
        products.push(p);

        Self::new(products)
    }
}
