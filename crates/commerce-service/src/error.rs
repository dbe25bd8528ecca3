//! 业务错误类型
//!
//! 服务层与仓储层共用的错误定义，HTTP 层再映射到状态码

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::models::OrderStatus;

/// 业务实体，用于统一 NotFound / AlreadyExists 等错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Admin,
    Buyer,
    Session,
    Province,
    City,
    District,
    SubDistrict,
    Address,
    Category,
    Brand,
    Condition,
    PackageCondition,
    Warehouse,
    Product,
    Coupon,
    Order,
    Payment,
    Review,
    Banner,
    Faq,
    Video,
    BlogPost,
}

impl Entity {
    /// 稳定的错误码前缀
    pub fn code(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Buyer => "BUYER",
            Self::Session => "SESSION",
            Self::Province => "PROVINCE",
            Self::City => "CITY",
            Self::District => "DISTRICT",
            Self::SubDistrict => "SUB_DISTRICT",
            Self::Address => "ADDRESS",
            Self::Category => "CATEGORY",
            Self::Brand => "BRAND",
            Self::Condition => "CONDITION",
            Self::PackageCondition => "PACKAGE_CONDITION",
            Self::Warehouse => "WAREHOUSE",
            Self::Product => "PRODUCT",
            Self::Coupon => "COUPON",
            Self::Order => "ORDER",
            Self::Payment => "PAYMENT",
            Self::Review => "REVIEW",
            Self::Banner => "BANNER",
            Self::Faq => "FAQ",
            Self::Video => "VIDEO",
            Self::BlogPost => "BLOG_POST",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Buyer => "Pembeli",
            Self::Session => "Sesi",
            Self::Province => "Provinsi",
            Self::City => "Kota/Kabupaten",
            Self::District => "Kecamatan",
            Self::SubDistrict => "Kelurahan",
            Self::Address => "Alamat",
            Self::Category => "Kategori",
            Self::Brand => "Merek",
            Self::Condition => "Kondisi",
            Self::PackageCondition => "Kondisi kemasan",
            Self::Warehouse => "Gudang",
            Self::Product => "Produk",
            Self::Coupon => "Kupon",
            Self::Order => "Pesanan",
            Self::Payment => "Pembayaran",
            Self::Review => "Ulasan",
            Self::Banner => "Banner",
            Self::Faq => "FAQ",
            Self::Video => "Video",
            Self::BlogPost => "Artikel",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 优惠券不可用的原因
///
/// 按校验顺序排列，报价时返回第一个不满足的条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    Inactive,
    NotStarted,
    Expired,
    Exhausted,
    BuyerLimitReached,
    MinimumNotMet { required: i64, actual: i64 },
    NoEligibleItems,
}

impl CouponRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Inactive => "COUPON_INACTIVE",
            Self::NotStarted => "COUPON_NOT_STARTED",
            Self::Expired => "COUPON_EXPIRED",
            Self::Exhausted => "COUPON_EXHAUSTED",
            Self::BuyerLimitReached => "COUPON_BUYER_LIMIT_REACHED",
            Self::MinimumNotMet { .. } => "COUPON_MINIMUM_NOT_MET",
            Self::NoEligibleItems => "COUPON_NO_ELIGIBLE_ITEMS",
        }
    }
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "Kupon sudah dinonaktifkan"),
            Self::NotStarted => write!(f, "Kupon belum berlaku"),
            Self::Expired => write!(f, "Kupon sudah kedaluwarsa"),
            Self::Exhausted => write!(f, "Kuota kupon sudah habis"),
            Self::BuyerLimitReached => {
                write!(f, "Batas pemakaian kupon ini untuk akun Anda sudah tercapai")
            }
            Self::MinimumNotMet { required, actual } => write!(
                f,
                "Minimum belanja belum terpenuhi: perlu Rp{}, saat ini Rp{}",
                required, actual
            ),
            Self::NoEligibleItems => {
                write!(f, "Tidak ada produk di pesanan yang berlaku untuk kupon ini")
            }
        }
    }
}

/// 业务错误
#[derive(Debug, Error)]
pub enum CommerceError {
    // === 通用 ===
    #[error("{entity} tidak ditemukan: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("{entity} sudah ada: {field}={value}")]
    AlreadyExists {
        entity: Entity,
        field: &'static str,
        value: String,
    },

    #[error("{entity} masih digunakan dan tidak dapat dihapus: {reason}")]
    InUse { entity: Entity, reason: String },

    #[error("Data tidak valid: {0}")]
    Validation(String),

    // === 认证 ===
    #[error("Username atau kata sandi salah")]
    InvalidCredentials,

    #[error("Akun dinonaktifkan")]
    AccountDisabled,

    #[error("Akun terkunci, coba lagi setelah {until}")]
    AccountLocked { until: DateTime<Utc> },

    #[error("Tidak terautentikasi: {0}")]
    Unauthorized(String),

    // === 交易 ===
    #[error("{0}")]
    CouponRejected(CouponRejection),

    #[error("Stok tidak cukup: product_id={product_id}, diminta {requested}, tersedia {available}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("Status pesanan tidak mengizinkan perubahan: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Data telah berubah, muat ulang lalu coba lagi")]
    ConcurrencyConflict,

    // === 系统 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("缓存错误: {0}")]
    Cache(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl CommerceError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: Entity, field: &'static str, value: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn in_use(entity: Entity, reason: impl Into<String>) -> Self {
        Self::InUse {
            entity,
            reason: reason.into(),
        }
    }

    /// 稳定的错误码，前端依赖该值做分支处理
    pub fn error_code(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("{}_NOT_FOUND", entity.code()),
            Self::AlreadyExists { entity, .. } => format!("{}_ALREADY_EXISTS", entity.code()),
            Self::InUse { entity, .. } => format!("{}_IN_USE", entity.code()),
            Self::Validation(_) => "VALIDATION_ERROR".to_string(),
            Self::InvalidCredentials => "INVALID_CREDENTIALS".to_string(),
            Self::AccountDisabled => "ACCOUNT_DISABLED".to_string(),
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED".to_string(),
            Self::Unauthorized(_) => "UNAUTHORIZED".to_string(),
            Self::CouponRejected(reason) => reason.code().to_string(),
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK".to_string(),
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION".to_string(),
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT".to_string(),
            Self::Database(_) => "DATABASE_ERROR".to_string(),
            Self::Cache(_) => "CACHE_ERROR".to_string(),
            Self::Internal(_) => "INTERNAL_ERROR".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for CommerceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} tidak valid", field))
                })
            })
            .collect();
        Self::Validation(messages.join("; "))
    }
}

impl From<grosir_shared::error::SharedError> for CommerceError {
    fn from(err: grosir_shared::error::SharedError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for CommerceError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Internal(format!("密码哈希失败: {}", err))
    }
}

/// 是否为唯一约束冲突（PostgreSQL 23505）
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// 是否为外键约束冲突（PostgreSQL 23503）
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

pub type Result<T> = std::result::Result<T, CommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases: Vec<(CommerceError, &str)> = vec![
            (
                CommerceError::not_found(Entity::Product, 42),
                "PRODUCT_NOT_FOUND",
            ),
            (
                CommerceError::already_exists(Entity::Coupon, "code", "HEMAT10"),
                "COUPON_ALREADY_EXISTS",
            ),
            (
                CommerceError::in_use(Entity::Category, "masih memiliki produk"),
                "CATEGORY_IN_USE",
            ),
            (
                CommerceError::CouponRejected(CouponRejection::Expired),
                "COUPON_EXPIRED",
            ),
            (
                CommerceError::InvalidStatusTransition {
                    from: OrderStatus::Completed,
                    to: OrderStatus::Cancelled,
                },
                "INVALID_STATUS_TRANSITION",
            ),
            (CommerceError::InvalidCredentials, "INVALID_CREDENTIALS"),
        ];

        for (err, code) in cases {
            assert_eq!(err.error_code(), code, "error: {}", err);
        }
    }

    #[test]
    fn test_display_messages() {
        let err = CommerceError::not_found(Entity::SubDistrict, 3171010001i64);
        assert_eq!(err.to_string(), "Kelurahan tidak ditemukan: 3171010001");

        let err = CommerceError::CouponRejected(CouponRejection::MinimumNotMet {
            required: 100_000,
            actual: 50_000,
        });
        assert!(err.to_string().contains("100000"));
    }

    #[test]
    fn test_transition_error_uses_wire_names() {
        let err = CommerceError::InvalidStatusTransition {
            from: OrderStatus::PendingPayment,
            to: OrderStatus::Shipped,
        };
        assert_eq!(
            err.to_string(),
            "Status pesanan tidak mengizinkan perubahan: pending_payment -> shipped"
        );
    }
}
