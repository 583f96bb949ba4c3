// src/models/review.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Review {
    pub id: i64,
    pub product: i64,       // ID of the product the review is associated with
    pub user: i64,          // ID of the user who submitted the review
    pub rating: u8,         // 1 to 5
    pub feedback: String,   // Free-form feedback text
    pub created_at: String, // RFC 3339 UTC timestamp
}

/// Review joined with the author's username, for the product detail page.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReviewWithAuthor {
    pub id: i64,
    pub rating: u8,
    pub feedback: String,
    pub created_at: String,
    pub username: String,
}
