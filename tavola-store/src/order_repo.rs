use async_trait::async_trait;
use sqlx::PgPool;

use tavola_core::{RepoError, RepoResult};
use tavola_order::recommend::ComboCount;
use tavola_order::{Order, OrderRepository};

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ComboCountRow {
    combo_id: String,
    combo_name: Option<String>,
    count: i64,
}

fn backend(err: sqlx::Error) -> RepoError {
    RepoError::Backend(Box::new(err))
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: &Order) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, first_name, phone, email, total, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(&order.first_name)
        .bind(&order.phone)
        .bind(&order.email)
        .bind(order.total)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, menu_id, name, qty, price, combo_id, combo_name)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(order.id)
            .bind(position as i32)
            .bind(&item.menu_id)
            .bind(&item.name)
            .bind(i64::from(item.qty))
            .bind(item.price)
            .bind(&item.combo_id)
            .bind(&item.combo_name)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn combo_counts(&self, dish_id: &str, limit: usize) -> RepoResult<Vec<ComboCount>> {
        let rows = sqlx::query_as::<_, ComboCountRow>(
            r#"
            SELECT combo_id, combo_name, COUNT(*) AS count
            FROM order_items
            WHERE menu_id = $1 AND combo_id IS NOT NULL
            GROUP BY combo_id, combo_name
            ORDER BY count DESC, combo_id COLLATE "C" ASC, combo_name COLLATE "C" ASC NULLS FIRST
            LIMIT $2
            "#,
        )
        .bind(dish_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        // Byte-order collation matches `rank_combos` on ties.
        Ok(rows
            .into_iter()
            .map(|row| ComboCount {
                combo_id: row.combo_id,
                combo_name: row.combo_name,
                count: row.count.max(0) as u64,
            })
            .collect())
    }
}
