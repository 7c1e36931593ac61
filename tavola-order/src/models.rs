use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A placed food order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub first_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        first_name: String,
        phone: String,
        email: Option<String>,
        items: Vec<OrderItem>,
        total: f64,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name,
            phone,
            email,
            items,
            total,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of `qty * price` over all lines.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|item| item.qty as f64 * item.price).sum()
    }
}

/// One cart line: a dish, optionally paired with a combo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_id: String,
    pub name: String,
    pub qty: u32,
    pub price: f64,
    pub combo_id: Option<String>,
    pub combo_name: Option<String>,
}

/// Order as received from a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
    pub total: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub menu_id: Option<String>,
    pub name: Option<String>,
    pub qty: Option<i64>,
    pub price: Option<f64>,
    pub combo_id: Option<String>,
    pub combo_name: Option<String>,
}
