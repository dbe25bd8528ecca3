//! 数据库仓储层
//!
//! 封装 SQL 细节，每个仓储实现 traits 中的一个或多个接口。
//!
//! - 仓储只负责持久化，业务规则在服务层
//! - 需要多表一致性的写操作（下单、取消、排序）在仓储内部开启事务
//! - 动态表名只来自枚举映射，不拼接外部输入

mod account_repo;
mod address_repo;
mod auth_repo;
mod category_repo;
mod content_repo;
mod coupon_repo;
mod master_data_repo;
mod order_repo;
mod ordinal_repo;
mod product_repo;
mod region_repo;
mod review_repo;
mod traits;
mod warehouse_repo;

pub use account_repo::AccountRepository;
pub use address_repo::AddressRepository;
pub use auth_repo::AuthRepository;
pub use category_repo::CategoryRepository;
pub use content_repo::ContentRepository;
pub use coupon_repo::CouponRepository;
pub use master_data_repo::MasterDataRepository;
pub use order_repo::OrderRepository;
pub use ordinal_repo::OrdinalRepository;
pub use product_repo::ProductRepository;
pub use region_repo::RegionRepository;
pub use review_repo::ReviewRepository;
pub use traits::*;
pub use warehouse_repo::WarehouseRepository;
