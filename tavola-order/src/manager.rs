use std::sync::Arc;

use tavola_catalog::Menu;
use tavola_core::validation::{require_fields, validate_email, validate_phone};
use tavola_core::{Clock, CoreError, RepoError};
use tavola_shared::pii::Masked;
use tracing::info;

use crate::models::{Order, OrderItem, OrderItemRequest, PlaceOrderRequest};
use crate::recommend::{ComboCount, ComboSuggestion};
use crate::repository::OrderRepository;

const TOP_COMBOS: usize = 3;

/// Places orders and answers "what goes well with this dish".
pub struct OrderManager {
    repo: Arc<dyn OrderRepository>,
    menu: Arc<Menu>,
    clock: Arc<dyn Clock>,
}

impl OrderManager {
    pub fn new(repo: Arc<dyn OrderRepository>, menu: Arc<Menu>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, menu, clock }
    }

    pub async fn place_order(&self, req: PlaceOrderRequest) -> Result<Order, OrderError> {
        let has_items = req.items.as_ref().is_some_and(|items| !items.is_empty());
        require_fields(
            &[req.first_name.as_deref(), req.phone.as_deref()],
            "Missing required fields: firstName, phone, and at least one item.",
        )?;
        if !has_items {
            return Err(OrderError::Validation(
                "Missing required fields: firstName, phone, and at least one item.".to_string(),
            ));
        }

        let first_name = req.first_name.as_deref().unwrap_or_default().trim().to_string();
        if first_name.chars().count() < 2 {
            return Err(OrderError::Validation(
                "First name must be at least 2 characters.".to_string(),
            ));
        }
        let phone = validate_phone(req.phone.as_deref().unwrap_or_default())?;
        let email = validate_email(req.email.as_deref())?;

        let items = req
            .items
            .unwrap_or_default()
            .into_iter()
            .map(validate_item)
            .collect::<Result<Vec<_>, _>>()?;

        let total = match req.total {
            Some(total) if total.is_finite() && total >= 0.0 => total,
            _ => {
                return Err(OrderError::Validation(
                    "total must be a non-negative number.".to_string(),
                ))
            }
        };
        let notes = req.notes.filter(|n| !n.trim().is_empty());

        let order = Order::new(first_name, phone, email, items, total, notes, self.clock.now());
        self.repo.create_order(&order).await?;

        info!(
            order_id = %order.id,
            lines = order.items.len(),
            phone = %Masked(&order.phone),
            "Order placed"
        );
        Ok(order)
    }

    /// The single most frequent combo for `dish_id`, if any was ever ordered.
    pub async fn recommend_combo(&self, dish_id: Option<&str>) -> Result<Option<ComboSuggestion>, OrderError> {
        let dish_id = require_dish(dish_id)?;
        let top = self.repo.combo_counts(dish_id, 1).await?.into_iter().next();

        Ok(top.map(|c| ComboSuggestion {
            dish_id: dish_id.to_string(),
            dish_name: self.menu.dish(dish_id).map(|d| d.title.clone()),
            avg_extra: self.menu.combo(&c.combo_id).map_or(0.0, |combo| combo.extra_price),
            combo_id: c.combo_id,
            combo_name: c.combo_name,
            count: c.count,
        }))
    }

    pub async fn recommend_top3(&self, dish_id: Option<&str>) -> Result<Vec<ComboCount>, OrderError> {
        let dish_id = require_dish(dish_id)?;
        Ok(self.repo.combo_counts(dish_id, TOP_COMBOS).await?)
    }
}

fn require_dish(dish_id: Option<&str>) -> Result<&str, OrderError> {
    match dish_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(OrderError::Validation("dishId is required".to_string())),
    }
}

fn validate_item(item: OrderItemRequest) -> Result<OrderItem, OrderError> {
    let invalid = |msg: &str| OrderError::Validation(msg.to_string());

    let menu_id = item
        .menu_id
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| invalid("Each item needs a menuId."))?;
    let name = item
        .name
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| invalid("Each item needs a name."))?;
    let qty = match item.qty {
        Some(q) if q >= 1 => u32::try_from(q).map_err(|_| invalid("Item quantity is too large."))?,
        _ => return Err(invalid("Item quantity must be at least 1.")),
    };
    let price = match item.price {
        Some(p) if p.is_finite() && p >= 0.0 => p,
        _ => return Err(invalid("Item price must be a non-negative number.")),
    };

    Ok(OrderItem {
        menu_id,
        name,
        qty,
        price,
        combo_id: item.combo_id.filter(|v| !v.is_empty()),
        combo_name: item.combo_name.filter(|v| !v.is_empty()),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("Order storage failed: {0}")]
    Unexpected(#[from] RepoError),
}

impl From<CoreError> for OrderError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => OrderError::Validation(msg),
        }
    }
}
