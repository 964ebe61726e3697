use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderSide;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub price: f64,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide, // aggressor side
}
