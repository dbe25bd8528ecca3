//! 下单流程集成测试
//!
//! 使用真实 PostgreSQL 验证下单事务（库存扣减、优惠券占用、取消回滚）、支付核实、
//! 删除时的引用保护、默认地址切换，以及通用排序在真实表上的行为。
//! 这些逻辑由仓储层 SQL 保证，无法通过 mock 覆盖。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p commerce-service --test order_flow_test -- --ignored
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, Utc};
use commerce::dto::{
    AddressRequest, CancelOrderRequest, OrderLineRequest, PlaceOrderRequest, SubmitPaymentRequest,
    VerifyPaymentRequest,
};
use commerce::error::CommerceError;
use commerce::repository::{
    AddressRepository, CategoryRepository, CouponRepository, OrderRepository, OrdinalRepository,
    ProductRepository, RegionRepository,
};
use commerce::service::{
    AddressService, CategoryService, CouponService, OrderService, RegionService, ReorderService,
};
use commerce::{MoveCommand, OrderStatus, OrderedTable, PaymentMethod, PaymentStatus};
use fake::Fake;
use fake::faker::name::en::Name;
use grosir_shared::config::OrderConfig;
use grosir_shared::database::Database;
use sqlx::PgPool;

// ==================== 辅助函数 ====================

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

/// 每个测试使用独立的 id 段，避免并行测试互相干扰
fn unique_seed() -> i64 {
    static COUNTER: AtomicI64 = AtomicI64::new(0);
    let base = Utc::now().timestamp_micros() % 1_000_000_000;
    base * 10 + COUNTER.fetch_add(1, Ordering::SeqCst)
}

async fn setup_pool() -> PgPool {
    let pool = PgPool::connect(&database_url())
        .await
        .expect("数据库连接失败");
    Database::from_pool(pool.clone())
        .run_migrations()
        .await
        .expect("迁移执行失败");
    pool
}

struct Seed {
    buyer_id: i64,
    address_id: i64,
    sub_district_id: i64,
    product_id: i64,
    coupon_code: String,
}

/// 插入区划、买家、地址、商品（含阶梯价）与优惠券
async fn seed(pool: &PgPool) -> Seed {
    let n = unique_seed();

    sqlx::query("INSERT INTO provinces (id, name) VALUES ($1, 'DKI Jakarta')")
        .bind(n)
        .execute(pool)
        .await
        .expect("插入省份失败");
    sqlx::query("INSERT INTO cities (id, province_id, name) VALUES ($1, $1, 'Jakarta Selatan')")
        .bind(n)
        .execute(pool)
        .await
        .expect("插入城市失败");
    sqlx::query("INSERT INTO districts (id, city_id, name) VALUES ($1, $1, 'Tebet')")
        .bind(n)
        .execute(pool)
        .await
        .expect("插入区失败");
    sqlx::query(
        "INSERT INTO sub_districts (id, district_id, name, postal_code) VALUES ($1, $1, 'Manggarai', '12850')",
    )
    .bind(n)
    .execute(pool)
    .await
    .expect("插入街道失败");

    let buyer_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO buyers (name, email, phone, password_hash)
        VALUES ($1, $2, $3, 'x')
        RETURNING id
        "#,
    )
    .bind(Name().fake::<String>())
    .bind(format!("budi{}@toko.id", n))
    .bind(format!("08{}", n))
    .fetch_one(pool)
    .await
    .expect("插入买家失败");

    let address_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO addresses (buyer_id, label, recipient_name, phone, street,
                               sub_district_id, postal_code, is_default)
        VALUES ($1, 'Toko', 'Budi', '081234567890', 'Jl. Saharjo 10', $2, '12850', TRUE)
        RETURNING id
        "#,
    )
    .bind(buyer_id)
    .bind(n)
    .fetch_one(pool)
    .await
    .expect("插入地址失败");

    let category_id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, slug) VALUES ('Sembako', $1) RETURNING id",
    )
    .bind(format!("sembako-{}", n))
    .fetch_one(pool)
    .await
    .expect("插入分类失败");

    let condition_id: i64 = sqlx::query_scalar(
        "INSERT INTO conditions (name, slug) VALUES ('Baru', $1) RETURNING id",
    )
    .bind(format!("baru-{}", n))
    .fetch_one(pool)
    .await
    .expect("插入成色失败");

    let warehouse_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO warehouses (name, address, sub_district_id)
        VALUES ('Gudang Cakung', 'Jl. Raya Bekasi KM 25', $1)
        RETURNING id
        "#,
    )
    .bind(n)
    .fetch_one(pool)
    .await
    .expect("插入仓库失败");

    let product_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO products (sku, name, slug, category_id, condition_id, warehouse_id,
                              base_price, unit, min_order_qty, stock, weight_grams)
        VALUES ($1, 'Beras Premium 25kg', $2, $3, $4, $5, 350000, 'karung', 5, 20, 25000)
        RETURNING id
        "#,
    )
    .bind(format!("BRS-{}", n))
    .bind(format!("beras-premium-{}", n))
    .bind(category_id)
    .bind(condition_id)
    .bind(warehouse_id)
    .fetch_one(pool)
    .await
    .expect("插入商品失败");

    sqlx::query(
        "INSERT INTO product_price_tiers (product_id, min_quantity, unit_price) VALUES ($1, 10, 340000)",
    )
    .bind(product_id)
    .execute(pool)
    .await
    .expect("插入阶梯价失败");

    let coupon_code = format!("IT{}", n % 100_000_000);
    sqlx::query(
        r#"
        INSERT INTO coupons (code, name, discount_type, discount_value, max_discount,
                             usage_limit, per_buyer_limit, starts_at, expires_at)
        VALUES ($1, 'Integrasi', 'percentage', 10, 200000, 1, 1, $2, $3)
        "#,
    )
    .bind(&coupon_code)
    .bind(Utc::now() - Duration::days(1))
    .bind(Utc::now() + Duration::days(1))
    .execute(pool)
    .await
    .expect("插入优惠券失败");

    Seed {
        buyer_id,
        address_id,
        sub_district_id: n,
        product_id,
        coupon_code,
    }
}

async fn seed_admin(pool: &PgPool) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO admins (username, password_hash, full_name)
        VALUES ($1, 'x', 'Sari')
        RETURNING id
        "#,
    )
    .bind(format!("admin{}", unique_seed()))
    .fetch_one(pool)
    .await
    .expect("插入管理员失败")
}

type TestOrderService = OrderService<
    OrderRepository,
    ProductRepository,
    AddressRepository,
    RegionRepository,
    CouponRepository,
    CategoryRepository,
>;

fn address_service(pool: &PgPool) -> AddressService<AddressRepository, RegionRepository> {
    let regions = Arc::new(RegionService::new(
        Arc::new(RegionRepository::new(pool.clone())),
        None,
    ));
    AddressService::new(Arc::new(AddressRepository::new(pool.clone())), regions)
}

fn coupon_service(pool: &PgPool) -> CouponService<CouponRepository, CategoryRepository> {
    CouponService::new(
        Arc::new(CouponRepository::new(pool.clone())),
        Arc::new(CategoryRepository::new(pool.clone())),
    )
}

fn order_service(pool: &PgPool) -> TestOrderService {
    OrderService::new(
        Arc::new(OrderRepository::new(pool.clone())),
        Arc::new(ProductRepository::new(pool.clone())),
        Arc::new(address_service(pool)),
        Arc::new(coupon_service(pool)),
        OrderConfig::default(),
    )
}

async fn stock_of(pool: &PgPool, product_id: i64) -> i32 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("查询库存失败")
}

async fn coupon_id(pool: &PgPool, code: &str) -> i64 {
    sqlx::query_scalar("SELECT id FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .expect("查询优惠券失败")
}

async fn default_address_ids(pool: &PgPool, buyer_id: i64) -> Vec<i64> {
    sqlx::query_scalar("SELECT id FROM addresses WHERE buyer_id = $1 AND is_default ORDER BY id")
        .bind(buyer_id)
        .fetch_all(pool)
        .await
        .expect("查询默认地址失败")
}

fn address_request(seed: &Seed, label: &str, is_default: bool) -> AddressRequest {
    AddressRequest {
        label: label.to_string(),
        recipient_name: "Siti".to_string(),
        phone: "081298765432".to_string(),
        street: "Jl. Dr. Sahardjo 45".to_string(),
        sub_district_id: seed.sub_district_id,
        postal_code: None,
        notes: None,
        is_default,
    }
}

fn payment_request(amount: i64) -> SubmitPaymentRequest {
    SubmitPaymentRequest {
        method: PaymentMethod::BankTransfer,
        amount,
        reference: "TRF-BCA-0001".to_string(),
        proof_url: None,
    }
}

fn approve() -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        approve: true,
        reason: None,
    }
}

async fn coupon_used(pool: &PgPool, code: &str) -> i32 {
    sqlx::query_scalar("SELECT used_count FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .expect("查询优惠券失败")
}

fn place_request(seed: &Seed, quantity: i32, coupon: bool) -> PlaceOrderRequest {
    PlaceOrderRequest {
        address_id: seed.address_id,
        lines: vec![OrderLineRequest {
            product_id: seed.product_id,
            quantity,
        }],
        coupon_code: coupon.then(|| seed.coupon_code.to_lowercase()),
        note: None,
    }
}

// ==================== 测试 ====================

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_place_then_cancel_restores_stock_and_coupon() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;
    let svc = order_service(&pool);

    let detail = svc
        .place(seed.buyer_id, place_request(&seed, 10, true))
        .await
        .expect("下单失败");

    assert_eq!(detail.order.status, OrderStatus::PendingPayment);
    assert_eq!(detail.order.subtotal, 3_400_000);
    // 10% 封顶 200000
    assert_eq!(detail.order.discount_amount, 200_000);
    assert_eq!(detail.order.shipping_fee, 250 * 5_000);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].unit_price, 340_000);
    assert_eq!(detail.histories.len(), 1);
    assert_eq!(detail.order.shipping_address.city, "Jakarta Selatan");
    assert_eq!(stock_of(&pool, seed.product_id).await, 10);
    assert_eq!(coupon_used(&pool, &seed.coupon_code).await, 1);

    let cancelled = svc
        .cancel_by_buyer(
            seed.buyer_id,
            detail.order.id,
            CancelOrderRequest {
                reason: Some("Salah alamat".to_string()),
            },
        )
        .await
        .expect("取消失败");

    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.order.cancel_reason.as_deref(), Some("Salah alamat"));
    assert_eq!(cancelled.histories.len(), 2);
    assert_eq!(stock_of(&pool, seed.product_id).await, 20);
    assert_eq!(coupon_used(&pool, &seed.coupon_code).await, 0);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_coupon_usage_limit_enforced_across_orders() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;
    let svc = order_service(&pool);

    svc.place(seed.buyer_id, place_request(&seed, 5, true))
        .await
        .expect("首单失败");

    let err = svc
        .place(seed.buyer_id, place_request(&seed, 5, true))
        .await
        .unwrap_err();
    assert!(matches!(err, CommerceError::CouponRejected(_)));

    // 失败的下单不应扣减库存
    assert_eq!(stock_of(&pool, seed.product_id).await, 15);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_insufficient_stock_rejected() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;

    let err = order_service(&pool)
        .place(seed.buyer_id, place_request(&seed, 21, false))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");
    assert_eq!(stock_of(&pool, seed.product_id).await, 20);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_reorder_videos_moves_to_position() {
    let pool = setup_pool().await;
    sqlx::query("DELETE FROM videos").execute(&pool).await.unwrap();

    let mut ids = Vec::new();
    for (i, title) in ["A", "B", "C"].iter().enumerate() {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO videos (title, video_url, urutan) VALUES ($1, 'https://v.id/x', $2) RETURNING id",
        )
        .bind(title)
        .bind(i as i32 + 1)
        .fetch_one(&pool)
        .await
        .unwrap();
        ids.push(id);
    }

    let svc = ReorderService::new(Arc::new(OrdinalRepository::new(pool.clone())), None);
    let outcome = svc
        .move_item(OrderedTable::Video, ids[2], MoveCommand::To(1))
        .await
        .unwrap();
    assert!(outcome.moved);
    assert_eq!(outcome.position, 1);

    let order: Vec<String> = sqlx::query_scalar("SELECT title FROM videos ORDER BY urutan")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(order, vec!["C", "A", "B"]);

    // 已在首位时上移不做任何修改
    let outcome = svc
        .move_item(OrderedTable::Video, ids[2], MoveCommand::Up)
        .await
        .unwrap();
    assert!(!outcome.moved);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_verified_payment_marks_order_paid() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;
    let admin_id = seed_admin(&pool).await;
    let svc = order_service(&pool);

    let detail = svc
        .place(seed.buyer_id, place_request(&seed, 5, false))
        .await
        .expect("下单失败");
    let order_id = detail.order.id;

    let first = svc
        .submit_payment(seed.buyer_id, order_id, payment_request(1_000_000))
        .await
        .expect("提交支付失败");
    let rest = svc
        .submit_payment(
            seed.buyer_id,
            order_id,
            payment_request(detail.order.total_amount - 1_000_000),
        )
        .await
        .expect("提交支付失败");

    // 部分核实不改变订单状态
    svc.verify_payment(admin_id, order_id, first.id, approve())
        .await
        .expect("审核失败");
    let order = svc.get_admin(order_id).await.unwrap();
    assert_eq!(order.order.status, OrderStatus::PendingPayment);

    let payment = svc
        .verify_payment(admin_id, order_id, rest.id, approve())
        .await
        .expect("审核失败");
    assert_eq!(payment.status, PaymentStatus::Verified);

    let order = svc.get_admin(order_id).await.unwrap();
    assert_eq!(order.order.status, OrderStatus::Paid);
    assert!(order.order.paid_at.is_some());
    assert_eq!(order.histories.len(), 2);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_payment_on_cancelled_order_cannot_be_verified() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;
    let admin_id = seed_admin(&pool).await;
    let svc = order_service(&pool);

    let detail = svc
        .place(seed.buyer_id, place_request(&seed, 5, false))
        .await
        .expect("下单失败");
    let payment = svc
        .submit_payment(seed.buyer_id, detail.order.id, payment_request(detail.order.total_amount))
        .await
        .expect("提交支付失败");
    svc.cancel_by_buyer(seed.buyer_id, detail.order.id, CancelOrderRequest { reason: None })
        .await
        .expect("取消失败");

    let err = svc
        .verify_payment(admin_id, detail.order.id, payment.id, approve())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");

    // 支付记录保持待审核，订单保持已取消
    let order = svc.get_admin(detail.order.id).await.unwrap();
    assert_eq!(order.order.status, OrderStatus::Cancelled);
    assert_eq!(order.payments[0].status, PaymentStatus::Pending);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_coupon_of_cancelled_order_cannot_be_deleted() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;
    let svc = order_service(&pool);

    let detail = svc
        .place(seed.buyer_id, place_request(&seed, 5, true))
        .await
        .expect("下单失败");
    svc.cancel_by_buyer(seed.buyer_id, detail.order.id, CancelOrderRequest { reason: None })
        .await
        .expect("取消失败");
    assert_eq!(coupon_used(&pool, &seed.coupon_code).await, 0);

    let id = coupon_id(&pool, &seed.coupon_code).await;
    let err = coupon_service(&pool).delete(id).await.unwrap_err();
    assert_eq!(err.error_code(), "COUPON_IN_USE");
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_category_in_coupon_scope_cannot_be_deleted() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;

    let category_id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, slug) VALUES ('Minuman', $1) RETURNING id",
    )
    .bind(format!("minuman-{}", unique_seed()))
    .fetch_one(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO coupon_categories (coupon_id, category_id) VALUES ($1, $2)")
        .bind(coupon_id(&pool, &seed.coupon_code).await)
        .bind(category_id)
        .execute(&pool)
        .await
        .unwrap();

    let categories = CategoryService::new(Arc::new(CategoryRepository::new(pool.clone())), None);
    let err = categories.delete(category_id).await.unwrap_err();
    assert_eq!(err.error_code(), "CATEGORY_IN_USE");
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_default_address_exclusive_and_promoted_on_delete() {
    let pool = setup_pool().await;
    let seed = seed(&pool).await;
    let svc = address_service(&pool);

    let warung = svc
        .create(seed.buyer_id, address_request(&seed, "Warung", false))
        .await
        .expect("创建地址失败");
    assert!(!warung.address.is_default);
    // 邮编取自街道
    assert_eq!(warung.address.postal_code, "12850");
    assert_eq!(default_address_ids(&pool, seed.buyer_id).await, vec![seed.address_id]);

    let gudang = svc
        .create(seed.buyer_id, address_request(&seed, "Gudang", true))
        .await
        .expect("创建地址失败");
    assert!(gudang.address.is_default);
    assert_eq!(default_address_ids(&pool, seed.buyer_id).await, vec![gudang.address.id]);

    svc.set_default(seed.buyer_id, seed.address_id)
        .await
        .expect("设置默认地址失败");
    assert_eq!(default_address_ids(&pool, seed.buyer_id).await, vec![seed.address_id]);

    // 删除默认地址后，最近创建的剩余地址成为默认
    svc.delete(seed.buyer_id, seed.address_id)
        .await
        .expect("删除地址失败");
    assert_eq!(default_address_ids(&pool, seed.buyer_id).await, vec![gudang.address.id]);

    // 删除非默认地址不影响默认地址
    svc.delete(seed.buyer_id, warung.address.id)
        .await
        .expect("删除地址失败");
    assert_eq!(default_address_ids(&pool, seed.buyer_id).await, vec![gudang.address.id]);
}
