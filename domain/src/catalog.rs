use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Brand filter value that matches every product
pub const ALL_BRANDS: &str = "All";

pub type ProductId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpecEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    #[schema(value_type = u32)]
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    /// Whole dollars, never negative
    pub price: f64,
    pub image: String,
    pub short_description: String,
    /// Display order is significant
    pub specs: Vec<SpecEntry>,
    pub in_stock: bool,
}

impl Product {
    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.short_description.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PriceBucket {
    #[default]
    All,
    #[serde(rename = "under-300")]
    Under300,
    #[serde(rename = "300-600")]
    Between300And600,
    #[serde(rename = "above-600")]
    Above600,
}

impl PriceBucket {
    pub const ALL: [PriceBucket; 4] = [
        PriceBucket::All,
        PriceBucket::Under300,
        PriceBucket::Between300And600,
        PriceBucket::Above600,
    ];

    #[must_use]
    pub fn contains(self, price: f64) -> bool {
        match self {
            PriceBucket::All => true,
            PriceBucket::Under300 => price < 300.0,
            PriceBucket::Between300And600 => (300.0..=600.0).contains(&price),
            PriceBucket::Above600 => price > 600.0,
        }
    }

    /// Value used in query strings
    #[must_use]
    pub fn as_param(self) -> &'static str {
        match self {
            PriceBucket::All => "all",
            PriceBucket::Under300 => "under-300",
            PriceBucket::Between300And600 => "300-600",
            PriceBucket::Above600 => "above-600",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PriceBucket::All => "All",
            PriceBucket::Under300 => "Under $300",
            PriceBucket::Between300And600 => "$300 - $600",
            PriceBucket::Above600 => "Above $600",
        }
    }
}

impl fmt::Display for PriceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown price range: {0}")]
pub struct UnknownPriceBucket(pub String);

impl FromStr for PriceBucket {
    type Err = UnknownPriceBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        PriceBucket::ALL
            .into_iter()
            .find(|bucket| {
                bucket.as_param().eq_ignore_ascii_case(s) || bucket.label().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| UnknownPriceBucket(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// `ALL_BRANDS` or an exact brand name
    pub brand: String,
    pub price_bucket: PriceBucket,
    pub query: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            brand: ALL_BRANDS.to_string(),
            price_bucket: PriceBucket::All,
            query: String::new(),
        }
    }
}

impl FilterState {
    #[must_use]
    pub fn accepts(&self, product: &Product) -> bool {
        if self.brand != ALL_BRANDS && product.brand != self.brand {
            return false;
        }
        if !self.query.is_empty() && !product.matches_query(&self.query) {
            return false;
        }
        self.price_bucket.contains(product.price)
    }
}

/// `"All"` followed by each distinct brand in first-seen order
#[must_use]
pub fn available_brands(products: &[Product]) -> Vec<String> {
    let mut brands = vec![ALL_BRANDS.to_string()];
    for product in products {
        if !brands[1..].contains(&product.brand) {
            brands.push(product.brand.clone());
        }
    }
    brands
}

/// Products passing every active filter, in catalog order
#[must_use]
pub fn apply_filters<'a>(products: &'a [Product], filter: &FilterState) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|product| filter.accepts(product))
        .collect()
}

/// Clicking the open card closes it; clicking another card opens that one instead
#[must_use]
pub fn toggle_expand(current: Option<ProductId>, clicked: ProductId) -> Option<ProductId> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_stock())
    }
}

impl Catalog {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    #[must_use]
    pub fn brands(&self) -> Vec<String> {
        available_brands(&self.products)
    }

    #[must_use]
    pub fn filter(&self, filter: &FilterState) -> Vec<&Product> {
        apply_filters(&self.products, filter)
    }
}

fn specs(entries: &[(&str, &str)]) -> Vec<SpecEntry> {
    entries
        .iter()
        .map(|(name, value)| SpecEntry {
            name: (*name).to_string(),
            value: (*value).to_string(),
        })
        .collect()
}

/// The phones currently on display
#[must_use]
pub fn default_stock() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            title: "Xperia Pro Max".to_string(),
            brand: "Sony".to_string(),
            price: 799.0,
            image: "/static/images/xperia-pro-max.webp".to_string(),
            short_description: "Large screen, excellent camera, long battery life.".to_string(),
            specs: specs(&[
                ("Screen", "6.7\" OLED"),
                ("RAM", "8 GB"),
                ("Storage", "256 GB"),
                ("Battery", "5000 mAh"),
            ]),
            in_stock: true,
        },
        Product {
            id: 2,
            title: "Galaxy Nova".to_string(),
            brand: "Samsung".to_string(),
            price: 599.0,
            image: "/static/images/galaxy-nova.jpg".to_string(),
            short_description: "Powerful processor, great display for media.".to_string(),
            specs: specs(&[
                ("Screen", "6.4\" AMOLED"),
                ("RAM", "6 GB"),
                ("Storage", "128 GB"),
                ("Battery", "4300 mAh"),
            ]),
            in_stock: true,
        },
        Product {
            id: 3,
            title: "Pixel Lite".to_string(),
            brand: "Google".to_string(),
            price: 349.0,
            image: "/static/images/pixel-lite.webp".to_string(),
            short_description: "Clean Android experience, fast updates.".to_string(),
            specs: specs(&[
                ("Screen", "6.1\" LCD"),
                ("RAM", "4 GB"),
                ("Storage", "64 GB"),
                ("Battery", "3100 mAh"),
            ]),
            in_stock: false,
        },
        Product {
            id: 4,
            title: "OnePlus Swift".to_string(),
            brand: "OnePlus".to_string(),
            price: 449.0,
            image: "/static/images/oneplus-swift.webp".to_string(),
            short_description: "Fast charging, smooth performance.".to_string(),
            specs: specs(&[
                ("Screen", "6.5\" Fluid"),
                ("RAM", "8 GB"),
                ("Storage", "128 GB"),
                ("Battery", "4500 mAh"),
            ]),
            in_stock: true,
        },
    ]
}
