//! Catalog products as returned by the Neotech API.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product in the catalog. Read-only to the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Absolute image URL.
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserialize() {
        let json = r#"{
            "id": 3,
            "name": "Quantum Headset",
            "description": "Noise cancelling",
            "price": 249.99,
            "image": "https://cdn.example.com/headset.png"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.price, Price::from_cents(24_999));
    }

    #[test]
    fn test_product_requires_integer_id() {
        let json = r#"{"id":"abc","name":"x","description":"y","price":1,"image":"z"}"#;
        assert!(serde_json::from_str::<Product>(json).is_err());
    }
}
