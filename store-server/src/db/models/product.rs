//! Product Model

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

/// Product ID type
pub type ProductId = RecordId;

/// Closed set of carried watch brands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brand {
    Rolex,
    #[serde(rename = "Patek Philippe")]
    PatekPhilippe,
    #[serde(rename = "Audemars Piguet")]
    AudemarsPiguet,
    Cartier,
}

impl Brand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Brand::Rolex => "Rolex",
            Brand::PatekPhilippe => "Patek Philippe",
            Brand::AudemarsPiguet => "Audemars Piguet",
            Brand::Cartier => "Cartier",
        }
    }
}

impl std::fmt::Display for Brand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer review embedded in a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Product model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<ProductId>,
    pub name: String,
    pub brand: Brand,
    pub price: f64,
    pub stock: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub brand: Brand,
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Stock must be non-negative"))]
    pub stock: Option<i32>,
    #[validate(length(max = 500, message = "Description is limited to 500 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Brand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Stock must be non-negative"))]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Description is limited to 500 characters"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

/// Review submission payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewCreate {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 500, message = "Comment must be 1-500 characters"))]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&Brand::PatekPhilippe).unwrap(),
            "\"Patek Philippe\""
        );
        assert_eq!(
            serde_json::from_str::<Brand>("\"Audemars Piguet\"").unwrap(),
            Brand::AudemarsPiguet
        );
    }

    #[test]
    fn unknown_brand_is_rejected() {
        assert!(serde_json::from_str::<Brand>("\"Omega\"").is_err());
    }

    #[test]
    fn review_payload_bounds() {
        use validator::Validate;

        let ok = ReviewCreate {
            rating: 5,
            comment: "Beautiful dial".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_rating = ReviewCreate {
            rating: 6,
            comment: "x".to_string(),
        };
        assert!(bad_rating.validate().is_err());

        let empty_comment = ReviewCreate {
            rating: 3,
            comment: String::new(),
        };
        assert!(empty_comment.validate().is_err());
    }
}
