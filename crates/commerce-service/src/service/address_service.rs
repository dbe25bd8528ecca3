//! 收货地址服务
//!
//! 买家只能访问自己的地址，他人的地址 ID 一律视为不存在

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{AddressRequest, AddressResponse, trim_optional};
use crate::error::{CommerceError, Entity, Result};
use crate::models::{Address, AddressInput, RegionPath};
use crate::repository::{AddressRepositoryTrait, RegionRepositoryTrait};
use crate::service::RegionService;

pub struct AddressService<AR, RR>
where
    AR: AddressRepositoryTrait,
    RR: RegionRepositoryTrait,
{
    repo: Arc<AR>,
    regions: Arc<RegionService<RR>>,
}

impl<AR, RR> AddressService<AR, RR>
where
    AR: AddressRepositoryTrait,
    RR: RegionRepositoryTrait,
{
    pub fn new(repo: Arc<AR>, regions: Arc<RegionService<RR>>) -> Self {
        Self { repo, regions }
    }

    async fn with_region(&self, address: Address) -> Result<AddressResponse> {
        let region = self.regions.resolve_path(address.sub_district_id).await?;
        Ok(AddressResponse { address, region })
    }

    /// 校验请求并解析区划，邮编缺省时取街道邮编
    async fn to_input(&self, request: AddressRequest) -> Result<(AddressInput, RegionPath)> {
        request.validate()?;

        let region = self.regions.resolve_path(request.sub_district_id).await?;
        let postal_code = trim_optional(request.postal_code)
            .or_else(|| region.postal_code.clone())
            .ok_or_else(|| {
                CommerceError::Validation(
                    "Kelurahan ini tidak memiliki kode pos bawaan, isi kode pos".to_string(),
                )
            })?;

        let input = AddressInput {
            label: request.label.trim().to_string(),
            recipient_name: request.recipient_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            street: request.street.trim().to_string(),
            sub_district_id: request.sub_district_id,
            postal_code,
            notes: trim_optional(request.notes),
        };

        Ok((input, region))
    }

    pub async fn list(&self, buyer_id: i64) -> Result<Vec<AddressResponse>> {
        let addresses = self.repo.list_by_buyer(buyer_id).await?;

        let mut result = Vec::with_capacity(addresses.len());
        for address in addresses {
            result.push(self.with_region(address).await?);
        }
        Ok(result)
    }

    /// 读取地址原始记录（下单时使用）
    pub async fn get_owned(&self, buyer_id: i64, id: i64) -> Result<Address> {
        self.repo
            .get(buyer_id, id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Address, id))
    }

    pub async fn resolve_region(&self, sub_district_id: i64) -> Result<RegionPath> {
        self.regions.resolve_path(sub_district_id).await
    }

    pub async fn get(&self, buyer_id: i64, id: i64) -> Result<AddressResponse> {
        let address = self.get_owned(buyer_id, id).await?;
        self.with_region(address).await
    }

    /// 新建地址，买家的第一个地址自动成为默认地址
    #[instrument(skip(self, request))]
    pub async fn create(&self, buyer_id: i64, request: AddressRequest) -> Result<AddressResponse> {
        let make_default = request.is_default || self.repo.count_by_buyer(buyer_id).await? == 0;
        let (input, region) = self.to_input(request).await?;

        let address = self.repo.create(buyer_id, &input, make_default).await?;
        info!(buyer_id, address_id = address.id, make_default, "地址已创建");

        Ok(AddressResponse { address, region })
    }

    /// 修改地址；is_default=false 不会取消已有的默认地址
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        buyer_id: i64,
        id: i64,
        request: AddressRequest,
    ) -> Result<AddressResponse> {
        let make_default = request.is_default;
        let (input, region) = self.to_input(request).await?;

        let address = self
            .repo
            .update(buyer_id, id, &input, make_default)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Address, id))?;

        Ok(AddressResponse { address, region })
    }

    pub async fn set_default(&self, buyer_id: i64, id: i64) -> Result<AddressResponse> {
        if !self.repo.set_default(buyer_id, id).await? {
            return Err(CommerceError::not_found(Entity::Address, id));
        }
        self.get(buyer_id, id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, buyer_id: i64, id: i64) -> Result<()> {
        if !self.repo.delete(buyer_id, id).await? {
            return Err(CommerceError::not_found(Entity::Address, id));
        }
        info!(buyer_id, address_id = id, "地址已删除");
        Ok(())
    }
}
