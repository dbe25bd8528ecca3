//! 收货地址

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::region::RegionPath;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub buyer_id: i64,
    /// 地址标签，如"仓库"、"门店"
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub sub_district_id: i64,
    pub postal_code: String,
    #[sqlx(default)]
    pub notes: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 下单时的地址快照，以 JSONB 存入订单
///
/// 地址后续被修改或删除不影响历史订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSnapshot {
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub sub_district: String,
    pub district: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AddressSnapshot {
    pub fn capture(address: &Address, region: &RegionPath) -> Self {
        Self {
            label: address.label.clone(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            street: address.street.clone(),
            sub_district: region.sub_district.name.clone(),
            district: region.district.name.clone(),
            city: region.city.name.clone(),
            province: region.province.name.clone(),
            postal_code: address.postal_code.clone(),
            notes: address.notes.clone(),
        }
    }
}

/// 待写入的地址字段
#[derive(Debug, Clone, PartialEq)]
pub struct AddressInput {
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub sub_district_id: i64,
    pub postal_code: String,
    pub notes: Option<String>,
}
