//! 账号管理服务
//!
//! 管理员账号由后台创建；买家可以修改自己的资料，后台可以启用/禁用买家。
//! 禁用账号时立即吊销其全部会话。

use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::auth::{check_password_strength, hash_password};
use crate::dto::{
    AccountFilter, CreateAdminRequest, PageRequest, PageResponse, UpdateBuyerProfileRequest,
};
use crate::error::{CommerceError, Entity, Result, is_unique_violation};
use crate::models::{Admin, Buyer, PrincipalKind};
use crate::repository::{AccountRepositoryTrait, SessionRepositoryTrait};

pub struct AccountService<AR, SR>
where
    AR: AccountRepositoryTrait,
    SR: SessionRepositoryTrait,
{
    account_repo: Arc<AR>,
    session_repo: Arc<SR>,
}

impl<AR, SR> AccountService<AR, SR>
where
    AR: AccountRepositoryTrait,
    SR: SessionRepositoryTrait,
{
    pub fn new(account_repo: Arc<AR>, session_repo: Arc<SR>) -> Self {
        Self {
            account_repo,
            session_repo,
        }
    }

    // ==================== 管理员 ====================

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_admin(&self, request: CreateAdminRequest) -> Result<Admin> {
        request.validate()?;
        check_password_strength(&request.password)?;

        let username = request.username.trim().to_string();
        if self.account_repo.admin_username_taken(&username).await? {
            return Err(CommerceError::already_exists(
                Entity::Admin,
                "username",
                &username,
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let email = request
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        let admin = self
            .account_repo
            .create_admin(&username, &password_hash, request.full_name.trim(), email)
            .await
            .map_err(|e| match e {
                CommerceError::Database(ref db) if is_unique_violation(db) => {
                    CommerceError::already_exists(Entity::Admin, "username", &username)
                }
                other => other,
            })?;

        info!(admin_id = admin.id, "管理员已创建");
        Ok(admin)
    }

    pub async fn get_admin(&self, id: i64) -> Result<Admin> {
        self.account_repo
            .get_admin(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Admin, id))
    }

    pub async fn list_admins(
        &self,
        filter: AccountFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Admin>> {
        let (items, total) = self.account_repo.list_admins(&filter, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    /// 启用/禁用管理员，不允许禁用自己
    #[instrument(skip(self))]
    pub async fn set_admin_active(&self, actor_id: i64, id: i64, active: bool) -> Result<Admin> {
        if actor_id == id && !active {
            return Err(CommerceError::Validation(
                "Tidak dapat menonaktifkan akun yang sedang dipakai".to_string(),
            ));
        }

        if !self.account_repo.set_admin_active(id, active).await? {
            return Err(CommerceError::not_found(Entity::Admin, id));
        }
        if !active {
            let revoked = self
                .session_repo
                .revoke_all_except(PrincipalKind::Admin, id, None)
                .await?;
            info!(admin_id = id, revoked, "管理员已禁用");
        }

        self.get_admin(id).await
    }

    // ==================== 买家 ====================

    pub async fn get_buyer(&self, id: i64) -> Result<Buyer> {
        self.account_repo
            .get_buyer(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Buyer, id))
    }

    pub async fn list_buyers(
        &self,
        filter: AccountFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Buyer>> {
        let (items, total) = self.account_repo.list_buyers(&filter, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    #[instrument(skip(self))]
    pub async fn set_buyer_active(&self, id: i64, active: bool) -> Result<Buyer> {
        if !self.account_repo.set_buyer_active(id, active).await? {
            return Err(CommerceError::not_found(Entity::Buyer, id));
        }
        if !active {
            let revoked = self
                .session_repo
                .revoke_all_except(PrincipalKind::Buyer, id, None)
                .await?;
            info!(buyer_id = id, revoked, "买家已禁用");
        }

        self.get_buyer(id).await
    }

    /// 买家修改资料，未提供的字段保持不变
    #[instrument(skip(self, request))]
    pub async fn update_buyer_profile(
        &self,
        buyer_id: i64,
        request: UpdateBuyerProfileRequest,
    ) -> Result<Buyer> {
        request.validate()?;
        let current = self.get_buyer(buyer_id).await?;

        let name = request
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(current.name);
        let phone = request
            .phone
            .map(|p| p.trim().to_string())
            .unwrap_or(current.phone);
        let company_name = match request.company_name {
            Some(c) => Some(c.trim().to_string()).filter(|c| !c.is_empty()),
            None => current.company_name,
        };

        if self
            .account_repo
            .buyer_phone_taken(&phone, Some(buyer_id))
            .await?
        {
            return Err(CommerceError::already_exists(Entity::Buyer, "phone", &phone));
        }

        self.account_repo
            .update_buyer_profile(buyer_id, &name, &phone, company_name)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Buyer, buyer_id))
    }
}
