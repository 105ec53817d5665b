//! Product reference data and the read-only catalog

use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::value_objects::Money;

/// A sellable product. Immutable once seeded; the cart never writes stock back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews: u32,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: id.into(), name: name.into(), price, image: String::new(), description: String::new(),
            category: String::new(), stock, rating: 0.0, reviews: 0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
}

/// Read-only product listing consumed by the cart. Product ids are unique.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Catalog { products: Vec<Product> }

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        for (i, p) in products.iter().enumerate() {
            if products[..i].iter().any(|q| q.id == p.id) {
                return Err(CatalogError::DuplicateId(p.id.clone()));
            }
        }
        Ok(Self { products })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }
    pub fn find(&self, id: &str) -> Option<&Product> { self.products.iter().find(|p| p.id == id) }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| p.category.eq_ignore_ascii_case(category))
    }

    pub fn in_stock(&self) -> impl Iterator<Item = &Product> { self.products.iter().filter(|p| p.is_in_stock()) }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for p in &self.products {
            if !seen.contains(&p.category.as_str()) { seen.push(&p.category); }
        }
        seen
    }
}

impl TryFrom<Vec<Product>> for Catalog {
    type Error = CatalogError;
    fn try_from(products: Vec<Product>) -> Result<Self, Self::Error> { Self::new(products) }
}

impl From<Catalog> for Vec<Product> {
    fn from(catalog: Catalog) -> Self { catalog.products }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate product id {0}")]
    DuplicateId(String),
    #[error("malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}
