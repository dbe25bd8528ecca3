//! HTTP 错误类型
//!
//! 业务错误统一由 `CommerceError` 承载，这里只补充 HTTP 层特有的错误并负责状态码映射

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commerce::CommerceError;
use serde_json::json;

/// HTTP 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error("Tidak terautentikasi: {0}")]
    Unauthorized(String),

    #[error("Akses ditolak: {0}")]
    Forbidden(String),

    /// 路径参数不在白名单内（如未知的主数据种类）
    #[error("Tidak ditemukan: {0}")]
    NotFound(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Commerce(err) => match err {
                CommerceError::NotFound { .. } => StatusCode::NOT_FOUND,
                CommerceError::Validation(_) => StatusCode::BAD_REQUEST,

                CommerceError::InvalidCredentials | CommerceError::Unauthorized(_) => {
                    StatusCode::UNAUTHORIZED
                }
                CommerceError::AccountDisabled | CommerceError::AccountLocked { .. } => {
                    StatusCode::FORBIDDEN
                }

                CommerceError::AlreadyExists { .. }
                | CommerceError::InUse { .. }
                | CommerceError::InsufficientStock { .. }
                | CommerceError::InvalidStatusTransition { .. }
                | CommerceError::ConcurrencyConflict => StatusCode::CONFLICT,

                // 请求格式正确，但优惠券规则不满足
                CommerceError::CouponRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,

                CommerceError::Database(_)
                | CommerceError::Cache(_)
                | CommerceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> String {
        match self {
            Self::Commerce(err) => err.error_code(),
            Self::Unauthorized(_) => "UNAUTHORIZED".to_string(),
            Self::Forbidden(_) => "FORBIDDEN".to_string(),
            Self::NotFound(_) => "NOT_FOUND".to_string(),
        }
    }
}

/// 系统级错误对客户端的统一提示
const INTERNAL_ERROR_MESSAGE: &str = "Terjadi kesalahan pada server, coba lagi nanti";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Commerce(CommerceError::Database(e)) => {
                tracing::error!(error = %e, "数据库操作失败");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            Self::Commerce(CommerceError::Cache(e)) => {
                tracing::error!(error = %e, "缓存操作失败");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            Self::Commerce(CommerceError::Internal(e)) => {
                tracing::error!(error = %e, "内部错误");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Commerce(errors.into())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use commerce::error::{CouponRejection, Entity};
    use commerce::models::OrderStatus;

    /// 所有错误形态及其期望的 (StatusCode, error_code)
    fn all_error_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (
                ApiError::Unauthorized("Token autentikasi tidak ada".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                ApiError::Forbidden("Khusus admin".into()),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                ApiError::NotFound("master-data/colors".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                CommerceError::not_found(Entity::Product, 7).into(),
                StatusCode::NOT_FOUND,
                "PRODUCT_NOT_FOUND",
            ),
            (
                CommerceError::already_exists(Entity::Buyer, "email", "a@b.id").into(),
                StatusCode::CONFLICT,
                "BUYER_ALREADY_EXISTS",
            ),
            (
                CommerceError::in_use(Entity::Category, "masih memiliki produk").into(),
                StatusCode::CONFLICT,
                "CATEGORY_IN_USE",
            ),
            (
                CommerceError::Validation("Minimum pemesanan belum terpenuhi".into()).into(),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                CommerceError::InvalidCredentials.into(),
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
            ),
            (
                CommerceError::AccountDisabled.into(),
                StatusCode::FORBIDDEN,
                "ACCOUNT_DISABLED",
            ),
            (
                CommerceError::AccountLocked { until: Utc::now() }.into(),
                StatusCode::FORBIDDEN,
                "ACCOUNT_LOCKED",
            ),
            (
                CommerceError::Unauthorized("Sesi tidak berlaku".into()).into(),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                CommerceError::CouponRejected(CouponRejection::Expired).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "COUPON_EXPIRED",
            ),
            (
                CommerceError::InsufficientStock {
                    product_id: 1,
                    requested: 10,
                    available: 3,
                }
                .into(),
                StatusCode::CONFLICT,
                "INSUFFICIENT_STOCK",
            ),
            (
                CommerceError::InvalidStatusTransition {
                    from: OrderStatus::Completed,
                    to: OrderStatus::Cancelled,
                }
                .into(),
                StatusCode::CONFLICT,
                "INVALID_STATUS_TRANSITION",
            ),
            (
                CommerceError::ConcurrencyConflict.into(),
                StatusCode::CONFLICT,
                "CONCURRENCY_CONFLICT",
            ),
            (
                CommerceError::Cache("connection refused".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "CACHE_ERROR",
            ),
            (
                CommerceError::Internal("unexpected state".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ]
    }

    #[test]
    fn test_all_variants_status_code() {
        for (error, expected_status, label) in all_error_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "状态码不匹配: variant={label}"
            );
        }
    }

    #[test]
    fn test_all_variants_error_code() {
        for (error, _status, expected_code) in all_error_variants() {
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[test]
    fn test_validation_errors_convert() {
        use validator::Validate;

        #[derive(Validate)]
        struct NamedInput {
            #[validate(length(min = 1, message = "Nama wajib diisi"))]
            name: String,
        }

        let err: ApiError = NamedInput {
            name: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Nama wajib diisi"));
    }

    #[tokio::test]
    async fn test_into_response_body_structure() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);

            let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("读取响应体失败");
            let body: serde_json::Value =
                serde_json::from_slice(&body_bytes).expect("响应体不是合法 JSON");

            assert_eq!(body["success"], false);
            assert_eq!(body["code"], expected_code);
            assert!(body["message"].is_string());
            assert!(body["data"].is_null());
        }
    }

    /// 系统错误不得把内部细节写进响应
    #[tokio::test]
    async fn test_system_errors_hide_details() {
        let error: ApiError = CommerceError::Internal("pool exhausted at 10.0.0.5".into()).into();
        let response = error.into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        let message = body["message"].as_str().unwrap();
        assert!(!message.contains("10.0.0.5"));
        assert_eq!(message, INTERNAL_ERROR_MESSAGE);
    }

    /// 面向买家的提示使用印尼语
    #[tokio::test]
    async fn test_client_messages_in_indonesian() {
        let cases: Vec<(ApiError, &str)> = vec![
            (
                CommerceError::CouponRejected(CouponRejection::Expired).into(),
                "Kupon sudah kedaluwarsa",
            ),
            (
                CommerceError::not_found(Entity::Order, 100).into(),
                "Pesanan tidak ditemukan: 100",
            ),
            (
                CommerceError::InvalidCredentials.into(),
                "Username atau kata sandi salah",
            ),
        ];

        for (error, expected) in cases {
            let response = error.into_response();
            let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
            assert_eq!(body["message"], expected);
        }
    }
}
