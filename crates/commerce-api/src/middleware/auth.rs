//! JWT 认证中间件
//!
//! 按路径前缀决定访问级别，验证 Bearer Token 与会话后将 Claims 注入请求扩展

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use commerce::{Claims, PrincipalKind};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 路由的访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// 任意已登录主体
    Authenticated,
    Admin,
    Buyer,
}

/// 需要登录但不限主体类型的认证路由
const AUTHENTICATED_PATHS: [&str; 3] = [
    "/api/auth/logout",
    "/api/auth/me",
    "/api/auth/change-password",
];

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// 根据请求路径判断访问级别
pub fn required_access(path: &str) -> Access {
    if under(path, "/api/admin") {
        Access::Admin
    } else if under(path, "/api/buyer") {
        Access::Buyer
    } else if AUTHENTICATED_PATHS.contains(&path) {
        Access::Authenticated
    } else {
        Access::Public
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(state: &AppState, token: &str, access: Access) -> Result<Claims> {
    let claims = state.jwt_manager.verify_token(token)?;

    match (access, claims.kind) {
        (Access::Admin, PrincipalKind::Buyer) => {
            return Err(ApiError::Forbidden("Khusus admin".to_string()));
        }
        (Access::Buyer, PrincipalKind::Admin) => {
            return Err(ApiError::Forbidden("Khusus pembeli".to_string()));
        }
        _ => {}
    }

    // 登出或被禁用后会话立即失效，不等 Access Token 过期
    state.auth.validate_session(&claims).await?;
    Ok(claims)
}

/// 认证中间件
///
/// 公开路由直接放行；其余路由校验 Token、主体类型与会话状态
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let access = required_access(request.uri().path());
    if access == Access::Public {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::Unauthorized("Token autentikasi tidak ada".to_string()).into_response();
    };

    match authenticate(&state, token, access).await {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fixtures::lazy_state;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_required_access_by_prefix() {
        assert_eq!(required_access("/api/admin/products"), Access::Admin);
        assert_eq!(required_access("/api/admin"), Access::Admin);
        assert_eq!(required_access("/api/administrator"), Access::Public);
        assert_eq!(required_access("/api/buyer/orders/3"), Access::Buyer);
        assert_eq!(required_access("/api/auth/me"), Access::Authenticated);
        assert_eq!(required_access("/api/auth/change-password"), Access::Authenticated);
        assert_eq!(required_access("/api/auth/buyer/login"), Access::Public);
        assert_eq!(required_access("/api/public/products"), Access::Public);
        assert_eq!(required_access("/health"), Access::Public);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/api/public/ping", get(|| async { "pong" }))
            .route("/api/admin/ping", get(|| async { "pong" }))
            .route("/api/buyer/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn call(app: Router, path: &str, token: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_public_route_needs_no_token() {
        let status = call(app(lazy_state()), "/api/public/ping", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_token_is_unauthorized() {
        let state = lazy_state();
        assert_eq!(
            call(app(state.clone()), "/api/admin/ping", None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(app(state), "/api/buyer/ping", Some("not-a-jwt")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_wrong_principal_kind_is_forbidden() {
        let state = lazy_state();
        let (buyer_token, _) = state
            .jwt_manager
            .generate_token(PrincipalKind::Buyer, 5, 11, "Budi")
            .unwrap();
        let (admin_token, _) = state
            .jwt_manager
            .generate_token(PrincipalKind::Admin, 1, 12, "Admin")
            .unwrap();

        assert_eq!(
            call(app(state.clone()), "/api/admin/ping", Some(&buyer_token)).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            call(app(state), "/api/buyer/ping", Some(&admin_token)).await,
            StatusCode::FORBIDDEN
        );
    }
}
