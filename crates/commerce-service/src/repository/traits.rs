//! 仓储 Trait 定义
//!
//! 服务层依赖抽象而非具体实现，测试时使用 mockall 生成的 Mock

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::dto::{
    AccountFilter, BannerRequest, BlogPostQuery, ClientInfo, CouponQuery, FaqRequest,
    PageRequest, ReviewQuery, SubmitReviewRequest, SubmitPaymentRequest, VideoRequest,
};
use crate::error::Result;
use crate::models::{
    Address, AddressInput, Admin, Banner, BlogPost, BlogPostInput, Buyer, Category, CategoryInput,
    City, Coupon, CouponInput, Credential, District, Faq, MasterData, MasterDataInput,
    MasterDataKind, MoveCommand, NewOrder, Order, OrderFilter, OrderItem, OrderStatus,
    OrderStatusHistory, OrderedTable, Payment, PaymentReview, PaymentReviewOutcome, PriceTier,
    PrincipalKind, Product, ProductFilter, ProductInput, Province, PublicReview, RegionPath,
    ReorderOutcome, Review, ReviewStatus, Session, StatusChange, SubDistrict, Video, Warehouse,
    WarehouseInput,
};

/// 登录凭证仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepositoryTrait: Send + Sync {
    /// 按登录名查找（Admin 为用户名，Buyer 为小写邮箱）
    async fn find_credential(&self, kind: PrincipalKind, login: &str)
    -> Result<Option<Credential>>;
    async fn find_credential_by_id(&self, kind: PrincipalKind, id: i64)
    -> Result<Option<Credential>>;
    async fn record_login_failure(
        &self,
        kind: PrincipalKind,
        id: i64,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<()>;
    async fn record_login_success(&self, kind: PrincipalKind, id: i64) -> Result<()>;
    async fn update_password_hash(&self, kind: PrincipalKind, id: i64, hash: &str) -> Result<()>;
}

/// 会话仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepositoryTrait: Send + Sync {
    async fn create_session(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
        client: &ClientInfo,
    ) -> Result<i64>;
    async fn find_by_token_hash(&self, kind: PrincipalKind, token_hash: &str)
    -> Result<Option<Session>>;
    async fn find_session(&self, kind: PrincipalKind, id: i64) -> Result<Option<Session>>;
    /// 轮换 Refresh Token，仅当会话仍有效时生效
    async fn rotate(
        &self,
        kind: PrincipalKind,
        id: i64,
        old_hash: &str,
        new_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;
    async fn revoke(&self, kind: PrincipalKind, id: i64) -> Result<()>;
    /// 吊销主体的所有会话，可保留一个
    async fn revoke_all_except(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        keep_session_id: Option<i64>,
    ) -> Result<u64>;
}

/// 账号管理仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    async fn admin_username_taken(&self, username: &str) -> Result<bool>;
    async fn create_admin(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        email: Option<String>,
    ) -> Result<Admin>;
    async fn get_admin(&self, id: i64) -> Result<Option<Admin>>;
    async fn list_admins(&self, filter: &AccountFilter, page: PageRequest)
    -> Result<(Vec<Admin>, i64)>;
    async fn set_admin_active(&self, id: i64, active: bool) -> Result<bool>;

    async fn buyer_email_taken(&self, email: &str) -> Result<bool>;
    async fn buyer_phone_taken(&self, phone: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn create_buyer(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        company_name: Option<String>,
        password_hash: &str,
    ) -> Result<Buyer>;
    async fn get_buyer(&self, id: i64) -> Result<Option<Buyer>>;
    async fn update_buyer_profile(
        &self,
        id: i64,
        name: &str,
        phone: &str,
        company_name: Option<String>,
    ) -> Result<Option<Buyer>>;
    async fn list_buyers(&self, filter: &AccountFilter, page: PageRequest)
    -> Result<(Vec<Buyer>, i64)>;
    async fn set_buyer_active(&self, id: i64, active: bool) -> Result<bool>;
}

/// 行政区划仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionRepositoryTrait: Send + Sync {
    async fn list_provinces(&self) -> Result<Vec<Province>>;
    async fn province_exists(&self, id: i64) -> Result<bool>;
    async fn list_cities(&self, province_id: i64) -> Result<Vec<City>>;
    async fn city_exists(&self, id: i64) -> Result<bool>;
    async fn list_districts(&self, city_id: i64) -> Result<Vec<District>>;
    async fn district_exists(&self, id: i64) -> Result<bool>;
    async fn list_sub_districts(&self, district_id: i64) -> Result<Vec<SubDistrict>>;
    async fn resolve_path(&self, sub_district_id: i64) -> Result<Option<RegionPath>>;
}

/// 收货地址仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressRepositoryTrait: Send + Sync {
    async fn list_by_buyer(&self, buyer_id: i64) -> Result<Vec<Address>>;
    async fn count_by_buyer(&self, buyer_id: i64) -> Result<i64>;
    async fn get(&self, buyer_id: i64, id: i64) -> Result<Option<Address>>;
    /// make_default 为 true 时同一事务内清除其他默认地址
    async fn create(&self, buyer_id: i64, input: &AddressInput, make_default: bool)
    -> Result<Address>;
    async fn update(
        &self,
        buyer_id: i64,
        id: i64,
        input: &AddressInput,
        make_default: bool,
    ) -> Result<Option<Address>>;
    async fn set_default(&self, buyer_id: i64, id: i64) -> Result<bool>;
    /// 删除默认地址时，把最近创建的剩余地址设为默认
    async fn delete(&self, buyer_id: i64, id: i64) -> Result<bool>;
}

/// 分类仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    async fn list(&self, active_only: bool) -> Result<Vec<Category>>;
    async fn get(&self, id: i64) -> Result<Option<Category>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn create(&self, input: &CategoryInput) -> Result<Category>;
    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count_children(&self, id: i64) -> Result<i64>;
    async fn count_products(&self, id: i64) -> Result<i64>;
    /// 适用范围包含该分类的优惠券数量
    async fn count_coupons(&self, id: i64) -> Result<i64>;
}

/// 品牌 / 成色 / 包装状况仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MasterDataRepositoryTrait: Send + Sync {
    async fn list(&self, kind: MasterDataKind, active_only: bool) -> Result<Vec<MasterData>>;
    async fn get(&self, kind: MasterDataKind, id: i64) -> Result<Option<MasterData>>;
    async fn slug_exists(
        &self,
        kind: MasterDataKind,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool>;
    async fn create(&self, kind: MasterDataKind, input: &MasterDataInput) -> Result<MasterData>;
    async fn update(
        &self,
        kind: MasterDataKind,
        id: i64,
        input: &MasterDataInput,
    ) -> Result<Option<MasterData>>;
    async fn delete(&self, kind: MasterDataKind, id: i64) -> Result<bool>;
    async fn count_products(&self, kind: MasterDataKind, id: i64) -> Result<i64>;
}

/// 仓库仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WarehouseRepositoryTrait: Send + Sync {
    async fn list(&self, active_only: bool) -> Result<Vec<Warehouse>>;
    async fn get(&self, id: i64) -> Result<Option<Warehouse>>;
    async fn create(&self, input: &WarehouseInput) -> Result<Warehouse>;
    async fn update(&self, id: i64, input: &WarehouseInput) -> Result<Option<Warehouse>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count_products(&self, id: i64) -> Result<i64>;
}

/// 商品仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    async fn search(&self, filter: &ProductFilter, page: PageRequest)
    -> Result<(Vec<Product>, i64)>;
    async fn get(&self, id: i64) -> Result<Option<Product>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>>;
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Product>>;
    async fn price_tiers(&self, product_id: i64) -> Result<Vec<PriceTier>>;
    /// 批量加载阶梯价，返回 (product_id, tier)
    async fn price_tiers_for(&self, product_ids: &[i64]) -> Result<Vec<(i64, PriceTier)>>;
    async fn sku_exists(&self, sku: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn create(&self, input: &ProductInput, stock: i32, tiers: Vec<PriceTier>)
    -> Result<Product>;
    /// tiers 为 Some 时整体替换阶梯价
    async fn update(
        &self,
        id: i64,
        input: &ProductInput,
        tiers: Option<Vec<PriceTier>>,
    ) -> Result<Option<Product>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count_order_items(&self, id: i64) -> Result<i64>;
    /// 调整库存，结果为负时不更新并返回 None
    async fn adjust_stock(&self, id: i64, delta: i32) -> Result<Option<i32>>;
}

/// 排序序号仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrdinalRepositoryTrait: Send + Sync {
    /// 在单个事务内锁定整表序号并执行移动，目标不存在时返回 None
    async fn reorder(
        &self,
        table: OrderedTable,
        id: i64,
        command: MoveCommand,
    ) -> Result<Option<ReorderOutcome>>;
}

/// 优惠券仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepositoryTrait: Send + Sync {
    async fn list(
        &self,
        query: &CouponQuery,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<(Vec<Coupon>, i64)>;
    async fn get(&self, id: i64) -> Result<Option<Coupon>>;
    async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>>;
    async fn code_exists(&self, code: &str) -> Result<bool>;
    async fn create(&self, input: &CouponInput) -> Result<Coupon>;
    async fn update(&self, id: i64, input: &CouponInput) -> Result<Option<Coupon>>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn buyer_usage_count(&self, coupon_id: i64, buyer_id: i64) -> Result<i64>;
    /// 引用该优惠券的订单数量，含已取消订单
    async fn count_orders(&self, coupon_id: i64) -> Result<i64>;
    /// 停用已过期的优惠券，返回本批处理数量
    async fn deactivate_expired(&self, now: DateTime<Utc>, batch_size: i64) -> Result<u64>;
}

/// 订单仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    /// 单事务写入订单、明细、库存扣减、优惠券使用和首条状态流水
    async fn create_order(&self, order: &NewOrder) -> Result<Order>;
    async fn get(&self, id: i64) -> Result<Option<Order>>;
    async fn list(&self, filter: &OrderFilter, page: PageRequest) -> Result<(Vec<Order>, i64)>;
    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>>;
    async fn histories(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>>;
    async fn payments(&self, order_id: i64) -> Result<Vec<Payment>>;
    /// 条件更新状态（当前状态必须等于 change.from）；取消时回补库存并释放优惠券
    async fn change_status(&self, order_id: i64, change: &StatusChange) -> Result<Option<Order>>;
    async fn create_payment(&self, order_id: i64, request: &SubmitPaymentRequest)
    -> Result<Payment>;
    async fn get_payment(&self, order_id: i64, payment_id: i64) -> Result<Option<Payment>>;
    /// 锁定订单后审核待处理的支付记录；核实金额覆盖总额时同一事务内转为已支付
    ///
    /// 订单不是待支付时返回 InvalidStatusTransition，支付记录已被审核时返回 None
    async fn review_payment(
        &self,
        order_id: i64,
        review: &PaymentReview,
    ) -> Result<Option<PaymentReviewOutcome>>;
    async fn list_unpaid_before(&self, cutoff: DateTime<Utc>, limit: i64) -> Result<Vec<Order>>;
}

/// 评价仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepositoryTrait: Send + Sync {
    /// 买家订单中包含该商品时返回订单状态
    async fn purchase_status(
        &self,
        buyer_id: i64,
        order_id: i64,
        product_id: i64,
    ) -> Result<Option<OrderStatus>>;
    async fn exists(&self, buyer_id: i64, product_id: i64, order_id: i64) -> Result<bool>;
    async fn create(&self, buyer_id: i64, request: &SubmitReviewRequest) -> Result<Review>;
    async fn get(&self, id: i64) -> Result<Option<Review>>;
    async fn list(&self, query: &ReviewQuery, page: PageRequest) -> Result<(Vec<Review>, i64)>;
    async fn list_by_buyer(&self, buyer_id: i64, page: PageRequest)
    -> Result<(Vec<Review>, i64)>;
    async fn list_approved(&self, product_id: i64, page: PageRequest)
    -> Result<(Vec<PublicReview>, i64)>;
    /// 已通过评价按星级分组计数
    async fn rating_counts(&self, product_id: i64) -> Result<Vec<(i32, i64)>>;
    /// 仅处理待审核评价
    async fn moderate(
        &self,
        id: i64,
        status: ReviewStatus,
        admin_id: i64,
        reason: Option<String>,
    ) -> Result<Option<Review>>;
    async fn delete_pending(&self, buyer_id: i64, id: i64) -> Result<bool>;
}

/// 内容仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepositoryTrait: Send + Sync {
    // 横幅
    async fn list_banners(&self) -> Result<Vec<Banner>>;
    async fn list_visible_banners(&self, now: DateTime<Utc>) -> Result<Vec<Banner>>;
    async fn get_banner(&self, id: i64) -> Result<Option<Banner>>;
    async fn create_banner(&self, request: &BannerRequest) -> Result<Banner>;
    async fn update_banner(&self, id: i64, request: &BannerRequest) -> Result<Option<Banner>>;
    async fn delete_banner(&self, id: i64) -> Result<bool>;

    // 常见问题
    async fn list_faqs(&self, active_only: bool) -> Result<Vec<Faq>>;
    async fn get_faq(&self, id: i64) -> Result<Option<Faq>>;
    async fn create_faq(&self, request: &FaqRequest) -> Result<Faq>;
    async fn update_faq(&self, id: i64, request: &FaqRequest) -> Result<Option<Faq>>;
    async fn delete_faq(&self, id: i64) -> Result<bool>;

    // 视频
    async fn list_videos(&self, active_only: bool) -> Result<Vec<Video>>;
    async fn get_video(&self, id: i64) -> Result<Option<Video>>;
    async fn create_video(&self, request: &VideoRequest) -> Result<Video>;
    async fn update_video(&self, id: i64, request: &VideoRequest) -> Result<Option<Video>>;
    async fn delete_video(&self, id: i64) -> Result<bool>;

    // 文章
    async fn list_posts(&self, query: &BlogPostQuery, page: PageRequest)
    -> Result<(Vec<BlogPost>, i64)>;
    async fn get_post(&self, id: i64) -> Result<Option<BlogPost>>;
    async fn get_published_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;
    async fn post_slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn create_post(&self, input: &BlogPostInput, author_admin_id: i64) -> Result<BlogPost>;
    async fn update_post(&self, id: i64, input: &BlogPostInput) -> Result<Option<BlogPost>>;
    async fn delete_post(&self, id: i64) -> Result<bool>;
}
