//! 商品服务
//!
//! 负责商品的引用校验、SKU/slug 唯一性、批发阶梯价规则与库存调整

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{
    AdjustStockRequest, CreateProductRequest, PageRequest, PageResponse, ProductQuery,
    UpdateProductRequest, trim_optional,
};
use crate::error::{CommerceError, Entity, Result};
use crate::models::{
    MasterDataKind, PriceTier, Product, ProductDetail, ProductFilter, ProductInput,
};
use crate::repository::{
    CategoryRepositoryTrait, MasterDataRepositoryTrait, ProductRepositoryTrait,
    WarehouseRepositoryTrait,
};
use crate::service::pricing::validate_price_tiers;
use crate::service::slug::unique_slug;

pub struct ProductService<PR, CR, MR, WR>
where
    PR: ProductRepositoryTrait,
    CR: CategoryRepositoryTrait,
    MR: MasterDataRepositoryTrait,
    WR: WarehouseRepositoryTrait,
{
    product_repo: Arc<PR>,
    category_repo: Arc<CR>,
    master_data_repo: Arc<MR>,
    warehouse_repo: Arc<WR>,
}

fn normalize_images(images: Vec<String>) -> Vec<String> {
    images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

impl<PR, CR, MR, WR> ProductService<PR, CR, MR, WR>
where
    PR: ProductRepositoryTrait,
    CR: CategoryRepositoryTrait,
    MR: MasterDataRepositoryTrait,
    WR: WarehouseRepositoryTrait,
{
    pub fn new(
        product_repo: Arc<PR>,
        category_repo: Arc<CR>,
        master_data_repo: Arc<MR>,
        warehouse_repo: Arc<WR>,
    ) -> Self {
        Self {
            product_repo,
            category_repo,
            master_data_repo,
            warehouse_repo,
        }
    }

    // ==================== 查询 ====================

    /// 为一页商品批量加载阶梯价，避免 N+1 查询
    async fn with_tiers(&self, products: Vec<Product>) -> Result<Vec<ProductDetail>> {
        if products.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let mut tiers: HashMap<i64, Vec<PriceTier>> = HashMap::new();
        for (product_id, tier) in self.product_repo.price_tiers_for(&ids).await? {
            tiers.entry(product_id).or_default().push(tier);
        }

        Ok(products
            .into_iter()
            .map(|product| ProductDetail {
                price_tiers: tiers.remove(&product.id).unwrap_or_default(),
                product,
            })
            .collect())
    }

    async fn search(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ProductDetail>> {
        let (products, total) = self.product_repo.search(&filter, page).await?;
        let items = self.with_tiers(products).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    pub async fn search_public(
        &self,
        query: ProductQuery,
        page: PageRequest,
    ) -> Result<PageResponse<ProductDetail>> {
        self.search(query.into_public_filter(), page).await
    }

    pub async fn search_admin(
        &self,
        query: ProductQuery,
        page: PageRequest,
    ) -> Result<PageResponse<ProductDetail>> {
        self.search(query.into_admin_filter(), page).await
    }

    pub async fn get(&self, id: i64) -> Result<ProductDetail> {
        let product = self.get_product(id).await?;
        let price_tiers = self.product_repo.price_tiers(id).await?;
        Ok(ProductDetail {
            product,
            price_tiers,
        })
    }

    /// 前台商品详情，下架商品视为不存在
    pub async fn get_public_by_slug(&self, slug: &str) -> Result<ProductDetail> {
        let product = self
            .product_repo
            .get_by_slug(slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CommerceError::not_found(Entity::Product, slug))?;

        let price_tiers = self.product_repo.price_tiers(product.id).await?;
        Ok(ProductDetail {
            product,
            price_tiers,
        })
    }

    async fn get_product(&self, id: i64) -> Result<Product> {
        self.product_repo
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Product, id))
    }

    // ==================== 写操作 ====================

    /// 校验商品引用的分类、主数据与仓库都存在
    async fn check_references(&self, input: &ProductInput) -> Result<()> {
        if self.category_repo.get(input.category_id).await?.is_none() {
            return Err(CommerceError::not_found(Entity::Category, input.category_id));
        }

        let master_refs = [
            (MasterDataKind::Condition, Some(input.condition_id)),
            (MasterDataKind::Brand, input.brand_id),
            (MasterDataKind::PackageCondition, input.package_condition_id),
        ];
        for (kind, id) in master_refs {
            if let Some(id) = id
                && self.master_data_repo.get(kind, id).await?.is_none()
            {
                return Err(CommerceError::not_found(kind.entity(), id));
            }
        }

        if self.warehouse_repo.get(input.warehouse_id).await?.is_none() {
            return Err(CommerceError::not_found(Entity::Warehouse, input.warehouse_id));
        }

        Ok(())
    }

    async fn check_sku(&self, sku: &str, exclude_id: Option<i64>) -> Result<()> {
        if self.product_repo.sku_exists(sku, exclude_id).await? {
            return Err(CommerceError::already_exists(Entity::Product, "sku", sku));
        }
        Ok(())
    }

    async fn slug_for(&self, name: &str, exclude_id: Option<i64>) -> Result<String> {
        unique_slug(name, |candidate| async move {
            self.product_repo.slug_exists(&candidate, exclude_id).await
        })
        .await
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create(&self, request: CreateProductRequest) -> Result<ProductDetail> {
        request.validate()?;

        let sku = request.sku.trim().to_uppercase();
        self.check_sku(&sku, None).await?;

        let name = request.name.trim().to_string();
        let input = ProductInput {
            sku,
            slug: self.slug_for(&name, None).await?,
            name,
            description: trim_optional(request.description),
            category_id: request.category_id,
            brand_id: request.brand_id,
            condition_id: request.condition_id,
            package_condition_id: request.package_condition_id,
            warehouse_id: request.warehouse_id,
            base_price: request.base_price,
            unit: request.unit.trim().to_string(),
            min_order_qty: request.min_order_qty,
            weight_grams: request.weight_grams,
            images: normalize_images(request.images),
            is_active: request.is_active.unwrap_or(true),
        };
        self.check_references(&input).await?;

        let tiers: Vec<PriceTier> = request.price_tiers.into_iter().map(Into::into).collect();
        validate_price_tiers(input.base_price, input.min_order_qty, &tiers)?;

        let product = self
            .product_repo
            .create(&input, request.stock, tiers.clone())
            .await?;

        info!(product_id = product.id, sku = %product.sku, "商品已创建");
        Ok(ProductDetail {
            product,
            price_tiers: tiers,
        })
    }

    /// 部分更新；价格或起订量变化但未提交阶梯价时，用新值重新校验现有阶梯价
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateProductRequest) -> Result<ProductDetail> {
        request.validate()?;
        let current = self.get_product(id).await?;
        let mut input = ProductInput::from_product(&current);

        if let Some(sku) = request.sku {
            let sku = sku.trim().to_uppercase();
            if sku != current.sku {
                self.check_sku(&sku, Some(id)).await?;
            }
            input.sku = sku;
        }
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name != current.name {
                input.slug = self.slug_for(&name, Some(id)).await?;
            }
            input.name = name;
        }
        if let Some(description) = request.description {
            input.description = trim_optional(Some(description));
        }
        if let Some(category_id) = request.category_id {
            input.category_id = category_id;
        }
        if let Some(brand_id) = request.brand_id {
            input.brand_id = brand_id;
        }
        if let Some(condition_id) = request.condition_id {
            input.condition_id = condition_id;
        }
        if let Some(package_condition_id) = request.package_condition_id {
            input.package_condition_id = package_condition_id;
        }
        if let Some(warehouse_id) = request.warehouse_id {
            input.warehouse_id = warehouse_id;
        }
        if let Some(base_price) = request.base_price {
            input.base_price = base_price;
        }
        if let Some(unit) = request.unit {
            input.unit = unit.trim().to_string();
        }
        if let Some(min_order_qty) = request.min_order_qty {
            input.min_order_qty = min_order_qty;
        }
        if let Some(weight_grams) = request.weight_grams {
            input.weight_grams = weight_grams;
        }
        if let Some(images) = request.images {
            input.images = normalize_images(images);
        }
        if let Some(is_active) = request.is_active {
            input.is_active = is_active;
        }

        self.check_references(&input).await?;

        let new_tiers: Option<Vec<PriceTier>> = request
            .price_tiers
            .map(|tiers| tiers.into_iter().map(Into::into).collect());

        let effective_tiers = match &new_tiers {
            Some(tiers) => tiers.clone(),
            None => self.product_repo.price_tiers(id).await?,
        };
        validate_price_tiers(input.base_price, input.min_order_qty, &effective_tiers)?;

        let product = self
            .product_repo
            .update(id, &input, new_tiers)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Product, id))?;

        Ok(ProductDetail {
            product,
            price_tiers: effective_tiers,
        })
    }

    /// 已有订单引用的商品不能删除，只能下架
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let ordered = self.product_repo.count_order_items(id).await?;
        if ordered > 0 {
            return Err(CommerceError::in_use(
                Entity::Product,
                format!("sudah ada di {} baris pesanan, nonaktifkan saja", ordered),
            ));
        }

        if !self.product_repo.delete(id).await? {
            return Err(CommerceError::not_found(Entity::Product, id));
        }

        info!(product_id = id, "商品已删除");
        Ok(())
    }

    /// 调整库存，结果不能为负
    #[instrument(skip(self, request), fields(delta = request.delta))]
    pub async fn adjust_stock(&self, id: i64, request: AdjustStockRequest) -> Result<i32> {
        request.validate()?;
        if request.delta == 0 {
            return Err(CommerceError::Validation("Perubahan stok tidak boleh 0".to_string()));
        }

        match self.product_repo.adjust_stock(id, request.delta).await? {
            Some(stock) => {
                info!(
                    product_id = id,
                    delta = request.delta,
                    stock,
                    note = request.note.as_deref().unwrap_or(""),
                    "库存已调整"
                );
                Ok(stock)
            }
            None => {
                let product = self.get_product(id).await?;
                Err(CommerceError::InsufficientStock {
                    product_id: id,
                    requested: request.delta.saturating_neg(),
                    available: product.stock,
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::Product;
    use chrono::Utc;
    use sqlx::types::Json;

    pub fn product(id: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            sku: format!("BRS-{:03}", id),
            name: "Beras Premium 25kg".to_string(),
            slug: format!("beras-premium-25kg-{}", id),
            description: None,
            category_id: 1,
            brand_id: None,
            condition_id: 1,
            package_condition_id: None,
            warehouse_id: 1,
            base_price: 350_000,
            unit: "karung".to_string(),
            min_order_qty: 5,
            stock: 100,
            weight_grams: 25_000,
            images: Json(vec![]),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;
    use crate::dto::PriceTierInput;
    use crate::repository::{
        MockCategoryRepositoryTrait, MockMasterDataRepositoryTrait, MockProductRepositoryTrait,
        MockWarehouseRepositoryTrait,
    };

    type TestService = ProductService<
        MockProductRepositoryTrait,
        MockCategoryRepositoryTrait,
        MockMasterDataRepositoryTrait,
        MockWarehouseRepositoryTrait,
    >;

    fn service(
        products: MockProductRepositoryTrait,
        categories: MockCategoryRepositoryTrait,
        master_data: MockMasterDataRepositoryTrait,
        warehouses: MockWarehouseRepositoryTrait,
    ) -> TestService {
        ProductService::new(
            Arc::new(products),
            Arc::new(categories),
            Arc::new(master_data),
            Arc::new(warehouses),
        )
    }

    fn create_request() -> CreateProductRequest {
        CreateProductRequest {
            sku: " brs-001 ".to_string(),
            name: "Beras Premium 25kg".to_string(),
            description: None,
            category_id: 1,
            brand_id: None,
            condition_id: 1,
            package_condition_id: None,
            warehouse_id: 1,
            base_price: 350_000,
            unit: "karung".to_string(),
            min_order_qty: 5,
            stock: 40,
            weight_grams: 25_000,
            images: vec![],
            price_tiers: vec![PriceTierInput {
                min_quantity: 10,
                unit_price: 340_000,
            }],
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_sku() {
        let mut products = MockProductRepositoryTrait::new();
        products
            .expect_sku_exists()
            .withf(|sku, exclude| sku == "BRS-001" && exclude.is_none())
            .returning(|_, _| Ok(true));
        products.expect_create().never();

        let err = service(
            products,
            MockCategoryRepositoryTrait::new(),
            MockMasterDataRepositoryTrait::new(),
            MockWarehouseRepositoryTrait::new(),
        )
        .create(create_request())
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), "PRODUCT_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_category() {
        let mut products = MockProductRepositoryTrait::new();
        products.expect_sku_exists().returning(|_, _| Ok(false));
        products.expect_slug_exists().returning(|_, _| Ok(false));

        let mut categories = MockCategoryRepositoryTrait::new();
        categories.expect_get().returning(|_| Ok(None));

        let err = service(
            products,
            categories,
            MockMasterDataRepositoryTrait::new(),
            MockWarehouseRepositoryTrait::new(),
        )
        .create(create_request())
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), "CATEGORY_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_revalidates_existing_tiers() {
        let mut products = MockProductRepositoryTrait::new();
        products.expect_get().returning(|id| Ok(Some(product(id))));
        products.expect_price_tiers().returning(|_| {
            Ok(vec![PriceTier {
                min_quantity: 10,
                unit_price: 340_000,
            }])
        });
        products.expect_update().never();

        let mut categories = MockCategoryRepositoryTrait::new();
        categories.expect_get().returning(|id| {
            let now = chrono::Utc::now();
            Ok(Some(crate::models::Category {
                id,
                parent_id: None,
                name: "Sembako".to_string(),
                slug: "sembako".to_string(),
                description: None,
                icon_url: None,
                urutan: 1,
                is_active: true,
                created_at: now,
                updated_at: now,
            }))
        });
        let mut master_data = MockMasterDataRepositoryTrait::new();
        master_data.expect_get().returning(|_, id| {
            let now = chrono::Utc::now();
            Ok(Some(crate::models::MasterData {
                id,
                name: "Baru".to_string(),
                slug: "baru".to_string(),
                description: None,
                urutan: 1,
                is_active: true,
                created_at: now,
                updated_at: now,
            }))
        });
        let mut warehouses = MockWarehouseRepositoryTrait::new();
        warehouses.expect_get().returning(|id| {
            let now = chrono::Utc::now();
            Ok(Some(crate::models::Warehouse {
                id,
                name: "Gudang Cakung".to_string(),
                address: "Jl. Raya Bekasi".to_string(),
                sub_district_id: 1,
                phone: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            }))
        });
        // 新基础价低于现有阶梯价
        let err = service(products, categories, master_data, warehouses)
            .update(
                1,
                UpdateProductRequest {
                    base_price: Some(330_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_adjust_stock_never_negative() {
        let mut products = MockProductRepositoryTrait::new();
        products.expect_adjust_stock().returning(|_, _| Ok(None));
        products.expect_get().returning(|id| Ok(Some(product(id))));

        let err = service(
            products,
            MockCategoryRepositoryTrait::new(),
            MockMasterDataRepositoryTrait::new(),
            MockWarehouseRepositoryTrait::new(),
        )
        .adjust_stock(
            1,
            AdjustStockRequest {
                delta: -500,
                note: None,
            },
        )
        .await
        .unwrap_err();

        match err {
            CommerceError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 500);
                assert_eq!(available, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_delete_refused_once_ordered() {
        let mut products = MockProductRepositoryTrait::new();
        products.expect_count_order_items().returning(|_| Ok(2));
        products.expect_delete().never();

        let err = service(
            products,
            MockCategoryRepositoryTrait::new(),
            MockMasterDataRepositoryTrait::new(),
            MockWarehouseRepositoryTrait::new(),
        )
        .delete(1)
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), "PRODUCT_IN_USE");
    }
}
