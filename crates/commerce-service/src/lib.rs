//! Grosir 批发商城核心业务
//!
//! 面向批发买家的商品目录、下单、优惠券、评价与内容管理。
//!
//! ## 核心功能
//!
//! - **商品目录**：两级分类、品牌/成色等主数据、仓库、阶梯价商品
//! - **下单**：起订量校验、阶梯计价、按重量计运费、库存扣减
//! - **优惠券**：按分类限定、总量与每人限用、过期自动停用
//! - **支付审核**：买家上传凭证，后台核实后订单转为已支付
//! - **评价**：完成订单后评价，后台审核后展示
//! - **认证**：管理员与买家双账号体系，JWT + 可吊销会话，登录失败锁定
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `dto`: 请求与响应结构
//! - `error`: 错误类型定义
//! - `auth`: JWT、密码哈希与令牌摘要
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层

pub mod auth;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use auth::{Claims, JwtConfig, JwtManager};
pub use error::{CommerceError, Entity, Result};
pub use models::*;
pub use service::{
    AccountService, AddressService, AuthService, CategoryService, ContentService, CouponService,
    MasterDataService, OrderService, ProductService, RegionService, ReorderService, ReviewService,
    WarehouseService,
};
