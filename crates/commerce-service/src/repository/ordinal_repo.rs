//! 排序序号仓储
//!
//! 整表加行锁后计算移动方案，同一张表的并发移动会串行执行

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::traits::OrdinalRepositoryTrait;
use crate::error::Result;
use crate::models::{MoveCommand, OrderedTable, OrdinalSlot, ReorderOutcome, plan_reorder};

pub struct OrdinalRepository {
    pool: PgPool,
}

impl OrdinalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrdinalRepositoryTrait for OrdinalRepository {
    async fn reorder(
        &self,
        table: OrderedTable,
        id: i64,
        command: MoveCommand,
    ) -> Result<Option<ReorderOutcome>> {
        let table_name = table.table();
        let mut tx = self.pool.begin().await?;

        let slots = sqlx::query_as::<_, OrdinalSlot>(&format!(
            "SELECT id, urutan FROM {table_name} ORDER BY urutan ASC, id ASC FOR UPDATE"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let Some(plan) = plan_reorder(&slots, id, command) else {
            tx.rollback().await?;
            return Ok(None);
        };

        if plan.updates.is_empty() {
            tx.rollback().await?;
            return Ok(Some(plan.outcome));
        }

        let ids: Vec<i64> = plan.updates.iter().map(|s| s.id).collect();
        let values: Vec<i32> = plan.updates.iter().map(|s| s.urutan).collect();

        sqlx::query(&format!(
            r#"
            UPDATE {table_name} AS t
            SET urutan = v.urutan, updated_at = NOW()
            FROM UNNEST($1::BIGINT[], $2::INT[]) AS v(id, urutan)
            WHERE t.id = v.id
            "#
        ))
        .bind(&ids)
        .bind(&values)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            table = table_name,
            id,
            position = plan.outcome.position,
            changed = plan.outcome.changed,
            "序号已调整"
        );

        Ok(Some(plan.outcome))
    }
}
