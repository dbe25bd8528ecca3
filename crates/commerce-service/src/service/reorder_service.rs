//! 排序服务
//!
//! 所有带 urutan 列的表共用同一套移动逻辑

use std::sync::Arc;

use grosir_shared::cache::{Cache, CacheKey};
use tracing::{info, instrument, warn};

use crate::error::{CommerceError, Result};
use crate::models::{MoveCommand, OrderedTable, ReorderOutcome};
use crate::repository::OrdinalRepositoryTrait;

pub struct ReorderService<R: OrdinalRepositoryTrait> {
    repo: Arc<R>,
    cache: Option<Arc<Cache>>,
}

impl<R: OrdinalRepositoryTrait> ReorderService<R> {
    pub fn new(repo: Arc<R>, cache: Option<Arc<Cache>>) -> Self {
        Self { repo, cache }
    }

    #[instrument(skip(self))]
    pub async fn move_item(
        &self,
        table: OrderedTable,
        id: i64,
        command: MoveCommand,
    ) -> Result<ReorderOutcome> {
        let outcome = self
            .repo
            .reorder(table, id, command)
            .await?
            .ok_or_else(|| CommerceError::not_found(table.entity(), id))?;

        if outcome.moved {
            info!(
                table = table.table(),
                id,
                position = outcome.position,
                changed = outcome.changed,
                "排序已调整"
            );

            // 分类树缓存包含顺序
            if table == OrderedTable::Category
                && let Some(cache) = &self.cache
                && let Err(e) = cache.delete(&CacheKey::category_tree()).await
            {
                warn!(error = %e, "Failed to invalidate category tree cache");
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockOrdinalRepositoryTrait;

    #[tokio::test]
    async fn test_unknown_id_maps_to_table_entity() {
        let mut repo = MockOrdinalRepositoryTrait::new();
        repo.expect_reorder().returning(|_, _, _| Ok(None));

        let err = ReorderService::new(Arc::new(repo), None)
            .move_item(OrderedTable::Faq, 404, MoveCommand::Up)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FAQ_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_edge_move_reports_not_moved() {
        let mut repo = MockOrdinalRepositoryTrait::new();
        repo.expect_reorder()
            .withf(|table, id, command| {
                *table == OrderedTable::Banner && *id == 1 && *command == MoveCommand::Up
            })
            .returning(|_, _, _| {
                Ok(Some(ReorderOutcome {
                    moved: false,
                    position: 1,
                    changed: 0,
                }))
            });

        let outcome = ReorderService::new(Arc::new(repo), None)
            .move_item(OrderedTable::Banner, 1, MoveCommand::Up)
            .await
            .unwrap();
        assert!(!outcome.moved);
        assert_eq!(outcome.changed, 0);
    }
}
