//! Order record.
//!
//! The `orders` table is reshaped by out-of-band revisions: the baseline
//! carries `created_at`, a later revision replaces it with `price`. Both
//! fields are therefore optional here.

use serde::{Deserialize, Serialize};

pub type OrderId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_name: String,
    pub quantity: i64,
    /// Epoch milliseconds; present while the baseline shape is active.
    pub created_at: Option<i64>,
    /// Present once the `orders_price` revision is applied.
    pub price: Option<f64>,
}
