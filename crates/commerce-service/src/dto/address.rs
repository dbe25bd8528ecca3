//! 收货地址 DTO

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::PHONE_REGEX;
use crate::models::{Address, RegionPath};

/// 新建 / 修改地址请求（修改时整体替换）
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 50, message = "Label alamat harus 1-50 karakter"))]
    pub label: String,
    #[validate(length(min = 1, max = 100, message = "Nama penerima harus 1-100 karakter"))]
    pub recipient_name: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Format nomor HP tidak valid"))]
    pub phone: String,
    #[validate(length(min = 5, max = 500, message = "Alamat lengkap harus 5-500 karakter"))]
    pub street: String,
    pub sub_district_id: i64,
    /// 为空时使用街道的默认邮编
    #[validate(length(min = 5, max = 10, message = "Format kode pos tidak valid"))]
    pub postal_code: Option<String>,
    #[validate(length(max = 255, message = "Catatan maksimal 255 karakter"))]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// 地址 + 区划路径
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    #[serde(flatten)]
    pub address: Address,
    pub region: RegionPath,
}
