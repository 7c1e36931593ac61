use async_trait::async_trait;
use tavola_core::RepoResult;

use crate::models::Order;
use crate::recommend::ComboCount;

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> RepoResult<()>;

    /// Combos ordered alongside `dish_id`, ranked as in
    /// [`crate::recommend::rank_combos`].
    async fn combo_counts(&self, dish_id: &str, limit: usize) -> RepoResult<Vec<ComboCount>>;
}
