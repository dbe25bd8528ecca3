//! 认证与账号管理 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::PHONE_REGEX;
use crate::models::PrincipalKind;

/// 管理员登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username wajib diisi"))]
    pub username: String,
    #[validate(length(min = 1, message = "Kata sandi wajib diisi"))]
    pub password: String,
}

/// 买家登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuyerLoginRequest {
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Kata sandi wajib diisi"))]
    pub password: String,
}

/// 买家注册请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBuyerRequest {
    #[validate(length(min = 2, max = 100, message = "Nama harus 2-100 karakter"))]
    pub name: String,
    #[validate(email(message = "Format email tidak valid"))]
    pub email: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Format nomor HP tidak valid"))]
    pub phone: String,
    #[validate(length(max = 150, message = "Nama usaha maksimal 150 karakter"))]
    pub company_name: Option<String>,
    #[validate(length(min = 8, max = 72, message = "Kata sandi harus 8-72 karakter"))]
    pub password: String,
}

/// 刷新 Token 请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(equal = 64, message = "Format refresh token tidak valid"))]
    pub refresh_token: String,
}

/// 修改密码请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Kata sandi lama wajib diisi"))]
    pub old_password: String,
    #[validate(length(min = 8, max = 72, message = "Kata sandi baru harus 8-72 karakter"))]
    pub new_password: String,
}

/// 创建管理员请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[validate(length(min = 3, max = 50, message = "Username harus 3-50 karakter"))]
    pub username: String,
    #[validate(length(min = 8, max = 72, message = "Kata sandi harus 8-72 karakter"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Nama harus 1-100 karakter"))]
    pub full_name: String,
    #[validate(email(message = "Format email tidak valid"))]
    pub email: Option<String>,
}

/// 买家修改资料请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBuyerProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Nama harus 2-100 karakter"))]
    pub name: Option<String>,
    #[validate(regex(path = *PHONE_REGEX, message = "Format nomor HP tidak valid"))]
    pub phone: Option<String>,
    #[validate(length(max = 150, message = "Nama usaha maksimal 150 karakter"))]
    pub company_name: Option<String>,
}

/// 账号列表过滤
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    /// 匹配用户名/姓名/邮箱/手机号
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
}

/// 登录时采集的客户端信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// 当前登录主体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalInfo {
    pub id: i64,
    pub kind: PrincipalKind,
    pub name: String,
}

/// 登录 / 刷新响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Access Token 剩余有效秒数
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub principal: PrincipalInfo,
}
