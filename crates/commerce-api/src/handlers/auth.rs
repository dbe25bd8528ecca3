//! 认证相关的 HTTP 处理器
//!
//! 管理员与买家使用各自的登录、刷新入口；登出、当前主体与修改密码两类主体共用

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header},
};
use commerce::dto::{
    AdminLoginRequest, BuyerLoginRequest, ChangePasswordRequest, ClientInfo, RefreshTokenRequest,
    RegisterBuyerRequest, TokenResponse,
};
use commerce::{Admin, Buyer, Claims, PrincipalKind};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use super::principal_id;
use crate::error::Result;
use crate::response::ApiResponse;
use crate::state::AppState;

/// 当前登录主体资料
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    Admin(Admin),
    Buyer(Buyer),
}

/// 修改密码响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    /// 被吊销的其他会话数量
    pub revoked_sessions: u64,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// 从请求头采集客户端信息，代理转发时取 X-Forwarded-For 的第一个地址
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip_address = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string);

    ClientInfo {
        user_agent: header_str(headers, header::USER_AGENT.as_str()).map(str::to_string),
        ip_address,
    }
}

/// 管理员登录
///
/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>> {
    req.validate()?;
    let token = state
        .auth
        .login(PrincipalKind::Admin, &req.username, &req.password, &client_info(&headers))
        .await?;
    Ok(Json(ApiResponse::success(token)))
}

/// 买家登录
///
/// POST /api/auth/buyer/login
pub async fn buyer_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BuyerLoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>> {
    req.validate()?;
    let token = state
        .auth
        .login(PrincipalKind::Buyer, &req.email, &req.password, &client_info(&headers))
        .await?;
    Ok(Json(ApiResponse::success(token)))
}

/// 买家注册
///
/// POST /api/auth/buyer/register
pub async fn register_buyer(
    State(state): State<AppState>,
    Json(req): Json<RegisterBuyerRequest>,
) -> Result<Json<ApiResponse<Buyer>>> {
    let buyer = state.auth.register_buyer(req).await?;
    Ok(Json(ApiResponse::success_with_message(buyer, "Registrasi berhasil")))
}

/// 刷新管理员 Token
///
/// POST /api/auth/admin/refresh
pub async fn admin_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>> {
    req.validate()?;
    let token = state.auth.refresh(PrincipalKind::Admin, &req.refresh_token).await?;
    Ok(Json(ApiResponse::success(token)))
}

/// 刷新买家 Token
///
/// POST /api/auth/buyer/refresh
pub async fn buyer_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>> {
    req.validate()?;
    let token = state.auth.refresh(PrincipalKind::Buyer, &req.refresh_token).await?;
    Ok(Json(ApiResponse::success(token)))
}

/// 登出，吊销当前会话
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<()>>> {
    state.auth.logout(claims.kind, claims.sid).await?;
    info!(kind = %claims.kind, principal = %claims.sub, session_id = claims.sid, "已登出");
    Ok(Json(ApiResponse::success_empty()))
}

/// 当前登录主体
///
/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Profile>>> {
    let id = principal_id(&claims)?;
    let profile = match claims.kind {
        PrincipalKind::Admin => Profile::Admin(state.accounts.get_admin(id).await?),
        PrincipalKind::Buyer => Profile::Buyer(state.accounts.get_buyer(id).await?),
    };
    Ok(Json(ApiResponse::success(profile)))
}

/// 修改密码，同时吊销该主体的其他会话
///
/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<ChangePasswordResponse>>> {
    let id = principal_id(&claims)?;
    let revoked_sessions = state
        .auth
        .change_password(claims.kind, id, claims.sid, req)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        ChangePasswordResponse { revoked_sessions },
        "Kata sandi berhasil diubah",
    )))
}
