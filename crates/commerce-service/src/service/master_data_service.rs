//! 品牌 / 成色 / 包装状况服务
//!
//! 三类主数据字段一致，由 MasterDataKind 区分

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{MasterDataRequest, trim_optional};
use crate::error::{CommerceError, Result};
use crate::models::{MasterData, MasterDataInput, MasterDataKind};
use crate::repository::MasterDataRepositoryTrait;
use crate::service::slug::unique_slug;

pub struct MasterDataService<R: MasterDataRepositoryTrait> {
    repo: Arc<R>,
}

impl<R: MasterDataRepositoryTrait> MasterDataService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, kind: MasterDataKind, active_only: bool) -> Result<Vec<MasterData>> {
        self.repo.list(kind, active_only).await
    }

    pub async fn get(&self, kind: MasterDataKind, id: i64) -> Result<MasterData> {
        self.repo
            .get(kind, id)
            .await?
            .ok_or_else(|| CommerceError::not_found(kind.entity(), id))
    }

    async fn slug_for(
        &self,
        kind: MasterDataKind,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<String> {
        unique_slug(name, |candidate| async move {
            self.repo.slug_exists(kind, &candidate, exclude_id).await
        })
        .await
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        kind: MasterDataKind,
        request: MasterDataRequest,
    ) -> Result<MasterData> {
        request.validate()?;

        let name = request.name.trim().to_string();
        let input = MasterDataInput {
            slug: self.slug_for(kind, &name, None).await?,
            name,
            description: trim_optional(request.description),
            is_active: request.is_active.unwrap_or(true),
        };

        let item = self.repo.create(kind, &input).await?;
        info!(kind = ?kind, id = item.id, "主数据已创建");
        Ok(item)
    }

    /// 整体替换；名称变化时重新生成 slug，is_active 缺省时保持不变
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        kind: MasterDataKind,
        id: i64,
        request: MasterDataRequest,
    ) -> Result<MasterData> {
        request.validate()?;
        let current = self.get(kind, id).await?;

        let name = request.name.trim().to_string();
        let slug = if name == current.name {
            current.slug
        } else {
            self.slug_for(kind, &name, Some(id)).await?
        };

        let input = MasterDataInput {
            name,
            slug,
            description: trim_optional(request.description),
            is_active: request.is_active.unwrap_or(current.is_active),
        };

        self.repo
            .update(kind, id, &input)
            .await?
            .ok_or_else(|| CommerceError::not_found(kind.entity(), id))
    }

    /// 仍被商品引用时拒绝删除
    #[instrument(skip(self))]
    pub async fn delete(&self, kind: MasterDataKind, id: i64) -> Result<()> {
        let used = self.repo.count_products(kind, id).await?;
        if used > 0 {
            return Err(CommerceError::in_use(
                kind.entity(),
                format!("masih dipakai oleh {} produk", used),
            ));
        }

        if !self.repo.delete(kind, id).await? {
            return Err(CommerceError::not_found(kind.entity(), id));
        }

        info!(kind = ?kind, id, "主数据已删除");
        Ok(())
    }
}
