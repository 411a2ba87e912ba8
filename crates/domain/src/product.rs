//! The Product inventory record.

use common::TenantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{Money, ProductId};

/// A catalog product with its stock counter.
///
/// `stock` never goes negative: a decrement only commits when the
/// pre-decrement stock covers the requested quantity, checked and
/// applied as one exclusive unit by the inventory ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,

    /// Tenant that owns this product.
    pub tenant_id: TenantId,

    /// The seller who listed the product.
    pub seller_id: Uuid,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Current catalog price per unit.
    pub price: Money,

    /// Units available.
    pub stock: u32,
}

impl Product {
    /// Creates a new product listing.
    pub fn new(
        tenant_id: TenantId,
        seller_id: Uuid,
        name: impl Into<String>,
        description: Option<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: ProductId::new(),
            tenant_id,
            seller_id,
            name: name.into(),
            description,
            price,
            stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_gets_unique_id() {
        let a = Product::new(
            "uni-a".into(),
            Uuid::new_v4(),
            "Widget",
            None,
            Money::from_cents(500),
            10,
        );
        let b = Product::new(
            "uni-a".into(),
            Uuid::new_v4(),
            "Widget",
            None,
            Money::from_cents(500),
            10,
        );
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn product_serialization_roundtrip() {
        let product = Product::new(
            "uni-a".into(),
            Uuid::new_v4(),
            "Widget",
            Some("A fine widget".to_string()),
            Money::from_cents(500),
            10,
        );
        let json = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, deserialized);
    }
}
