use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    pub id: i64,             // Unique ID for the product
    pub name: String,        // Product name
    pub description: String, // Short description of the product
    pub price: f64,          // Price in whole currency units
}

/// A product together with its review aggregates, as served by the API
/// and the product pages. `average_rating` is `None` until the first
/// review lands; it is rounded to one decimal.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProductWithRating {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}
