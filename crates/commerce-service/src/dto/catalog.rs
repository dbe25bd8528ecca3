//! 商品目录 DTO

use serde::Deserialize;
use validator::Validate;

use crate::models::{PriceTier, ProductFilter, ProductSort};

/// 创建分类请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Nama kategori harus 1-100 karakter"))]
    pub name: String,
    pub parent_id: Option<i64>,
    pub description: Option<String>,
    #[validate(url(message = "URL ikon tidak valid"))]
    pub icon_url: Option<String>,
    pub is_active: Option<bool>,
}

/// 更新分类请求
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Nama kategori harus 1-100 karakter"))]
    pub name: Option<String>,
    /// 外层 None 表示不修改，Some(None) 表示改为顶级分类
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    pub description: Option<String>,
    #[validate(url(message = "URL ikon tidak valid"))]
    pub icon_url: Option<String>,
    pub is_active: Option<bool>,
}

/// 品牌 / 成色 / 包装状况请求（创建与修改共用）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MasterDataRequest {
    #[validate(length(min = 1, max = 100, message = "Nama harus 1-100 karakter"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// 仓库请求（创建与修改共用）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseRequest {
    #[validate(length(min = 1, max = 100, message = "Nama gudang harus 1-100 karakter"))]
    pub name: String,
    #[validate(length(min = 5, max = 500, message = "Alamat gudang harus 5-500 karakter"))]
    pub address: String,
    pub sub_district_id: i64,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// 阶梯价输入
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PriceTierInput {
    #[validate(range(min = 1, message = "Jumlah minimum harga grosir harus lebih dari 0"))]
    pub min_quantity: i32,
    #[validate(range(min = 1, message = "Harga grosir harus lebih dari 0"))]
    pub unit_price: i64,
}

impl From<PriceTierInput> for PriceTier {
    fn from(input: PriceTierInput) -> Self {
        Self {
            min_quantity: input.min_quantity,
            unit_price: input.unit_price,
        }
    }
}

/// 创建商品请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 2, max = 64, message = "SKU harus 2-64 karakter"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Nama produk harus 1-200 karakter"))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub brand_id: Option<i64>,
    pub condition_id: i64,
    pub package_condition_id: Option<i64>,
    pub warehouse_id: i64,
    #[validate(range(min = 1, message = "Harga dasar harus lebih dari 0"))]
    pub base_price: i64,
    #[validate(length(min = 1, max = 20, message = "Satuan harus 1-20 karakter"))]
    pub unit: String,
    #[validate(range(min = 1, message = "Minimum pemesanan minimal 1"))]
    pub min_order_qty: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stok tidak boleh negatif"))]
    pub stock: i32,
    #[validate(range(min = 1, message = "Berat harus lebih dari 0"))]
    pub weight_grams: i32,
    #[serde(default)]
    #[validate(length(max = 10, message = "Maksimal 10 gambar produk"))]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub price_tiers: Vec<PriceTierInput>,
    pub is_active: Option<bool>,
}

/// 更新商品请求（库存通过单独接口调整）
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 2, max = 64, message = "SKU harus 2-64 karakter"))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Nama produk harus 1-200 karakter"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub brand_id: Option<Option<i64>>,
    pub condition_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub package_condition_id: Option<Option<i64>>,
    pub warehouse_id: Option<i64>,
    #[validate(range(min = 1, message = "Harga dasar harus lebih dari 0"))]
    pub base_price: Option<i64>,
    #[validate(length(min = 1, max = 20, message = "Satuan harus 1-20 karakter"))]
    pub unit: Option<String>,
    #[validate(range(min = 1, message = "Minimum pemesanan minimal 1"))]
    pub min_order_qty: Option<i32>,
    #[validate(range(min = 1, message = "Berat harus lebih dari 0"))]
    pub weight_grams: Option<i32>,
    #[validate(length(max = 10, message = "Maksimal 10 gambar produk"))]
    pub images: Option<Vec<String>>,
    /// 传入时整体替换阶梯价
    #[validate(nested)]
    pub price_tiers: Option<Vec<PriceTierInput>>,
    pub is_active: Option<bool>,
}

/// 库存调整请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    /// 正数入库，负数出库
    pub delta: i32,
    #[validate(length(max = 255, message = "Catatan maksimal 255 karakter"))]
    pub note: Option<String>,
}

/// 商品检索参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub keyword: Option<String>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub condition_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    #[serde(default)]
    pub in_stock: bool,
    /// 仅后台有效；前台固定只看上架商品
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductQuery {
    /// 前台检索：只返回上架商品
    pub fn into_public_filter(self) -> ProductFilter {
        ProductFilter {
            active_only: true,
            ..self.into_filter()
        }
    }

    /// 后台检索
    pub fn into_admin_filter(self) -> ProductFilter {
        let active_only = self.is_active == Some(true);
        ProductFilter {
            active_only,
            ..self.into_filter()
        }
    }

    fn into_filter(self) -> ProductFilter {
        ProductFilter {
            keyword: self
                .keyword
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            category_id: self.category_id,
            brand_id: self.brand_id,
            condition_id: self.condition_id,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock_only: self.in_stock,
            active_only: false,
            sort: self.sort,
        }
    }
}

/// 区分"字段缺省"与"显式 null"
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_category_parent_tri_state() {
        let req: UpdateCategoryRequest = serde_json::from_str(r#"{"name":"Beras"}"#).unwrap();
        assert_eq!(req.parent_id, None);

        let req: UpdateCategoryRequest = serde_json::from_str(r#"{"parentId":null}"#).unwrap();
        assert_eq!(req.parent_id, Some(None));

        let req: UpdateCategoryRequest = serde_json::from_str(r#"{"parentId":3}"#).unwrap();
        assert_eq!(req.parent_id, Some(Some(3)));
    }

    #[test]
    fn test_product_query_filters() {
        let query = ProductQuery {
            keyword: Some("  ".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let filter = query.clone().into_public_filter();
        assert!(filter.active_only);
        assert!(filter.keyword.is_none());

        let filter = query.into_admin_filter();
        assert!(!filter.active_only);
    }

    #[test]
    fn test_create_product_nested_tier_validation() {
        let req: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "sku": "BRS-001",
            "name": "Beras Premium 25kg",
            "categoryId": 1,
            "conditionId": 1,
            "warehouseId": 1,
            "basePrice": 350000,
            "unit": "karung",
            "minOrderQty": 5,
            "weightGrams": 25000,
            "priceTiers": [{"minQuantity": 0, "unitPrice": 340000}]
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }
}
