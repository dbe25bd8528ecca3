//! 商品目录实体
//!
//! 分类、品牌/成色/包装状况等主数据、仓库、商品及批发阶梯价

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::error::Entity;

/// 商品分类
///
/// 最多两级：顶级分类与其子分类
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    #[sqlx(default)]
    pub parent_id: Option<i64>,
    pub name: String,
    pub slug: String,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub icon_url: Option<String>,
    /// 排序序号，越小越靠前
    pub urutan: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 分类树节点
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// 主数据种类
///
/// 三类主数据结构相同，共用一张表结构和一个服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterDataKind {
    Brand,
    Condition,
    PackageCondition,
}

impl MasterDataKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Brand => "brands",
            Self::Condition => "conditions",
            Self::PackageCondition => "package_conditions",
        }
    }

    /// products 表上引用该主数据的列
    pub fn product_column(&self) -> &'static str {
        match self {
            Self::Brand => "brand_id",
            Self::Condition => "condition_id",
            Self::PackageCondition => "package_condition_id",
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            Self::Brand => Entity::Brand,
            Self::Condition => Entity::Condition,
            Self::PackageCondition => Entity::PackageCondition,
        }
    }

    /// 从 URL 路径段解析，如 "package-conditions"
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "brands" => Some(Self::Brand),
            "conditions" => Some(Self::Condition),
            "package-conditions" => Some(Self::PackageCondition),
            _ => None,
        }
    }
}

/// 品牌 / 成色 / 包装状况
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MasterData {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub urutan: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 发货仓库
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub sub_district_id: i64,
    #[sqlx(default)]
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    /// 库存单位编码，统一大写
    pub sku: String,
    pub name: String,
    pub slug: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub category_id: i64,
    #[sqlx(default)]
    pub brand_id: Option<i64>,
    pub condition_id: i64,
    #[sqlx(default)]
    pub package_condition_id: Option<i64>,
    pub warehouse_id: i64,
    /// 基础单价（IDR）
    pub base_price: i64,
    /// 计量单位，如 "karung"、"dus"、"kg"
    pub unit: String,
    pub min_order_qty: i32,
    pub stock: i32,
    pub weight_grams: i32,
    pub images: Json<Vec<String>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 批发阶梯价：购买数量达到 min_quantity 时使用 unit_price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub min_quantity: i32,
    pub unit_price: i64,
}

/// 商品详情（含阶梯价）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub price_tiers: Vec<PriceTier>,
}

/// 商品检索条件
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub keyword: Option<String>,
    /// 包含其子分类
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub condition_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub in_stock_only: bool,
    pub active_only: bool,
    pub sort: super::ProductSort,
}

/// 待写入的分类字段
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInput {
    pub parent_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub is_active: bool,
}

/// 待写入的主数据字段
#[derive(Debug, Clone, PartialEq)]
pub struct MasterDataInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// 待写入的仓库字段
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseInput {
    pub name: String,
    pub address: String,
    pub sub_district_id: i64,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// 待写入的商品字段（不含库存）
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub brand_id: Option<i64>,
    pub condition_id: i64,
    pub package_condition_id: Option<i64>,
    pub warehouse_id: i64,
    pub base_price: i64,
    pub unit: String,
    pub min_order_qty: i32,
    pub weight_grams: i32,
    pub images: Vec<String>,
    pub is_active: bool,
}

impl ProductInput {
    /// 以现有商品为基础构造，用于部分更新
    pub fn from_product(product: &Product) -> Self {
        Self {
            sku: product.sku.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            category_id: product.category_id,
            brand_id: product.brand_id,
            condition_id: product.condition_id,
            package_condition_id: product.package_condition_id,
            warehouse_id: product.warehouse_id,
            base_price: product.base_price,
            unit: product.unit.clone(),
            min_order_qty: product.min_order_qty,
            weight_grams: product.weight_grams,
            images: product.images.0.clone(),
            is_active: product.is_active,
        }
    }
}
