//! 服务层
//!
//! 实现业务规则，协调仓储层和缓存层。
//!
//! ## 模块结构
//!
//! - `auth_service` / `account_service`: 登录、会话与账号管理
//! - `region_service` / `address_service`: 行政区划与收货地址
//! - `category_service` / `master_data_service` / `warehouse_service` / `product_service`: 商品目录
//! - `coupon_service` / `order_service`: 优惠券与订单
//! - `review_service` / `content_service`: 评价与内容
//! - `reorder_service`: 通用排序

pub mod account_service;
pub mod address_service;
pub mod auth_service;
pub mod category_service;
pub mod content_service;
pub mod coupon_service;
pub mod master_data_service;
pub mod order_service;
pub mod pricing;
pub mod product_service;
pub mod region_service;
pub mod reorder_service;
pub mod review_service;
pub mod slug;
pub mod warehouse_service;

pub use account_service::AccountService;
pub use address_service::AddressService;
pub use auth_service::AuthService;
pub use category_service::{CategoryService, build_tree};
pub use content_service::ContentService;
pub use coupon_service::{CouponService, evaluate_coupon, normalize_code};
pub use master_data_service::MasterDataService;
pub use order_service::{OrderService, generate_order_number};
pub use product_service::ProductService;
pub use region_service::RegionService;
pub use reorder_service::ReorderService;
pub use review_service::ReviewService;
pub use warehouse_service::WarehouseService;
