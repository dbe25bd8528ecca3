//! 应用状态定义
//!
//! 仓储与服务在启动时装配一次，通过 Arc 在 handler 间共享

use std::sync::Arc;

use commerce::repository::{
    AccountRepository, AddressRepository, AuthRepository, CategoryRepository, ContentRepository,
    CouponRepository, MasterDataRepository, OrderRepository, OrdinalRepository, ProductRepository,
    RegionRepository, ReviewRepository, WarehouseRepository,
};
use commerce::{
    AccountService, AddressService, AuthService, CategoryService, ContentService, CouponService,
    JwtConfig, JwtManager, MasterDataService, OrderService, ProductService, RegionService,
    ReorderService, ReviewService, WarehouseService,
};
use grosir_shared::cache::Cache;
use grosir_shared::config::AppConfig;
use sqlx::PgPool;

pub type AuthSvc = AuthService<AuthRepository, AuthRepository, AccountRepository>;
pub type AccountSvc = AccountService<AccountRepository, AuthRepository>;
pub type RegionSvc = RegionService<RegionRepository>;
pub type AddressSvc = AddressService<AddressRepository, RegionRepository>;
pub type CategorySvc = CategoryService<CategoryRepository>;
pub type MasterDataSvc = MasterDataService<MasterDataRepository>;
pub type WarehouseSvc = WarehouseService<WarehouseRepository, RegionRepository>;
pub type ProductSvc = ProductService<
    ProductRepository,
    CategoryRepository,
    MasterDataRepository,
    WarehouseRepository,
>;
pub type CouponSvc = CouponService<CouponRepository, CategoryRepository>;
pub type OrderSvc = OrderService<
    OrderRepository,
    ProductRepository,
    AddressRepository,
    RegionRepository,
    CouponRepository,
    CategoryRepository,
>;
pub type ReviewSvc = ReviewService<ReviewRepository, ProductRepository>;
pub type ContentSvc = ContentService<ContentRepository>;
pub type ReorderSvc = ReorderService<OrdinalRepository>;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub jwt_manager: Arc<JwtManager>,
    pub auth: Arc<AuthSvc>,
    pub accounts: Arc<AccountSvc>,
    pub regions: Arc<RegionSvc>,
    pub addresses: Arc<AddressSvc>,
    pub categories: Arc<CategorySvc>,
    pub master_data: Arc<MasterDataSvc>,
    pub warehouses: Arc<WarehouseSvc>,
    pub products: Arc<ProductSvc>,
    pub coupons: Arc<CouponSvc>,
    pub orders: Arc<OrderSvc>,
    pub reviews: Arc<ReviewSvc>,
    pub content: Arc<ContentSvc>,
    pub reorder: Arc<ReorderSvc>,
}

impl AppState {
    /// 装配仓储与服务
    ///
    /// `cache` 为 None 时区划与分类树直接查库
    pub fn new(pool: PgPool, cache: Option<Arc<Cache>>, config: &AppConfig) -> Self {
        let auth_repo = Arc::new(AuthRepository::new(pool.clone()));
        let account_repo = Arc::new(AccountRepository::new(pool.clone()));
        let region_repo = Arc::new(RegionRepository::new(pool.clone()));
        let category_repo = Arc::new(CategoryRepository::new(pool.clone()));
        let master_data_repo = Arc::new(MasterDataRepository::new(pool.clone()));
        let warehouse_repo = Arc::new(WarehouseRepository::new(pool.clone()));
        let product_repo = Arc::new(ProductRepository::new(pool.clone()));
        let coupon_repo = Arc::new(CouponRepository::new(pool.clone()));

        let jwt_manager = Arc::new(JwtManager::new(JwtConfig::from(&config.auth)));

        let regions = Arc::new(RegionService::new(region_repo.clone(), cache.clone()));
        let addresses = Arc::new(AddressService::new(
            Arc::new(AddressRepository::new(pool.clone())),
            regions.clone(),
        ));
        let coupons = Arc::new(CouponService::new(coupon_repo, category_repo.clone()));

        Self {
            auth: Arc::new(AuthService::new(
                auth_repo.clone(),
                auth_repo.clone(),
                account_repo.clone(),
                jwt_manager.clone(),
                config.auth.clone(),
            )),
            accounts: Arc::new(AccountService::new(account_repo, auth_repo)),
            categories: Arc::new(CategoryService::new(category_repo.clone(), cache.clone())),
            master_data: Arc::new(MasterDataService::new(master_data_repo.clone())),
            warehouses: Arc::new(WarehouseService::new(
                warehouse_repo.clone(),
                region_repo,
            )),
            products: Arc::new(ProductService::new(
                product_repo.clone(),
                category_repo,
                master_data_repo,
                warehouse_repo,
            )),
            orders: Arc::new(OrderService::new(
                Arc::new(OrderRepository::new(pool.clone())),
                product_repo.clone(),
                addresses.clone(),
                coupons.clone(),
                config.order.clone(),
            )),
            reviews: Arc::new(ReviewService::new(
                Arc::new(ReviewRepository::new(pool.clone())),
                product_repo,
            )),
            content: Arc::new(ContentService::new(Arc::new(ContentRepository::new(
                pool.clone(),
            )))),
            reorder: Arc::new(ReorderService::new(Arc::new(OrdinalRepository::new(pool)), cache)),
            jwt_manager,
            regions,
            addresses,
            coupons,
        }
    }
}
