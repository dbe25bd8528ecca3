//! 仓库服务

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{WarehouseRequest, trim_optional};
use crate::error::{CommerceError, Entity, Result};
use crate::models::{Warehouse, WarehouseInput};
use crate::repository::{RegionRepositoryTrait, WarehouseRepositoryTrait};

pub struct WarehouseService<WR, RR>
where
    WR: WarehouseRepositoryTrait,
    RR: RegionRepositoryTrait,
{
    repo: Arc<WR>,
    region_repo: Arc<RR>,
}

impl<WR, RR> WarehouseService<WR, RR>
where
    WR: WarehouseRepositoryTrait,
    RR: RegionRepositoryTrait,
{
    pub fn new(repo: Arc<WR>, region_repo: Arc<RR>) -> Self {
        Self { repo, region_repo }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<Warehouse>> {
        self.repo.list(active_only).await
    }

    pub async fn get(&self, id: i64) -> Result<Warehouse> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Warehouse, id))
    }

    async fn to_input(
        &self,
        request: WarehouseRequest,
        current_active: Option<bool>,
    ) -> Result<WarehouseInput> {
        request.validate()?;

        if self
            .region_repo
            .resolve_path(request.sub_district_id)
            .await?
            .is_none()
        {
            return Err(CommerceError::not_found(
                Entity::SubDistrict,
                request.sub_district_id,
            ));
        }

        Ok(WarehouseInput {
            name: request.name.trim().to_string(),
            address: request.address.trim().to_string(),
            sub_district_id: request.sub_district_id,
            phone: trim_optional(request.phone),
            is_active: request
                .is_active
                .or(current_active)
                .unwrap_or(true),
        })
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: WarehouseRequest) -> Result<Warehouse> {
        let input = self.to_input(request, None).await?;
        let warehouse = self.repo.create(&input).await?;
        info!(warehouse_id = warehouse.id, "仓库已创建");
        Ok(warehouse)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: WarehouseRequest) -> Result<Warehouse> {
        let current = self.get(id).await?;
        let input = self.to_input(request, Some(current.is_active)).await?;

        self.repo
            .update(id, &input)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Warehouse, id))
    }

    /// 仍有商品从该仓库发货时拒绝删除
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let used = self.repo.count_products(id).await?;
        if used > 0 {
            return Err(CommerceError::in_use(
                Entity::Warehouse,
                format!("masih memiliki {} produk", used),
            ));
        }

        if !self.repo.delete(id).await? {
            return Err(CommerceError::not_found(Entity::Warehouse, id));
        }
        Ok(())
    }
}
