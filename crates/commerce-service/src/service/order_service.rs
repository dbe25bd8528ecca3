//! 订单服务
//!
//! 下单流程：
//! 1. 校验商品行（不重复、上架、起订量），按阶梯价计价
//! 2. 校验收货地址归属并生成地址快照
//! 3. 试算优惠券，计算运费与总额
//! 4. 单事务落库：订单、明细、库存扣减、优惠券使用、首条状态流水
//!
//! 状态变更一律使用条件更新（当前状态必须与读取时一致），并发修改时返回冲突。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use grosir_shared::config::OrderConfig;
use grosir_shared::observability::metrics;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{
    AdminOrderQuery, BuyerOrderQuery, CancelOrderRequest, CouponLine, CouponQuote,
    OrderLineRequest, OrderPreview, PageRequest, PageResponse, PlaceOrderRequest, PricedLine,
    QuoteCouponRequest, SubmitPaymentRequest, TransitionOrderRequest, VerifyPaymentRequest,
    trim_optional,
};
use crate::error::{CommerceError, Entity, Result};
use crate::models::{
    ActorKind, Address, AddressSnapshot, AppliedCoupon, NewOrder, NewOrderItem, Order,
    OrderDetail, OrderFilter, OrderStatus, Payment, PaymentReview, PaymentStatus, PriceTier,
    StatusChange,
};
use crate::repository::{
    AddressRepositoryTrait, CategoryRepositoryTrait, CouponRepositoryTrait, OrderRepositoryTrait,
    ProductRepositoryTrait, RegionRepositoryTrait,
};
use crate::service::pricing::{shipping_fee, unit_price_for};
use crate::service::{AddressService, CouponService};

/// 生成订单号：GRS-YYYYMMDD-XXXXXX
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("GRS-{}-{}", now.format("%Y%m%d"), suffix)
}

/// 下单前的计价结果
struct Quotation {
    address: Address,
    snapshot: AddressSnapshot,
    lines: Vec<PricedLine>,
    subtotal: i64,
    total_weight_grams: i64,
    shipping_fee: i64,
    coupon: Option<AppliedCoupon>,
}

impl Quotation {
    fn discount(&self) -> i64 {
        self.coupon.as_ref().map_or(0, |c| c.discount_amount)
    }

    fn total(&self) -> i64 {
        self.subtotal - self.discount() + self.shipping_fee
    }

    fn preview(&self) -> OrderPreview {
        OrderPreview {
            lines: self.lines.clone(),
            subtotal: self.subtotal,
            coupon_code: self.coupon.as_ref().map(|c| c.code.clone()),
            discount_amount: self.discount(),
            total_weight_grams: self.total_weight_grams,
            shipping_fee: self.shipping_fee,
            total_amount: self.total(),
        }
    }
}

fn coupon_lines(lines: &[PricedLine]) -> Vec<CouponLine> {
    lines
        .iter()
        .map(|line| CouponLine {
            category_id: line.category_id,
            line_total: line.line_total,
        })
        .collect()
}

pub struct OrderService<OR, PR, AR, RR, CR, CatR>
where
    OR: OrderRepositoryTrait,
    PR: ProductRepositoryTrait,
    AR: AddressRepositoryTrait,
    RR: RegionRepositoryTrait,
    CR: CouponRepositoryTrait,
    CatR: CategoryRepositoryTrait,
{
    order_repo: Arc<OR>,
    product_repo: Arc<PR>,
    addresses: Arc<AddressService<AR, RR>>,
    coupons: Arc<CouponService<CR, CatR>>,
    config: OrderConfig,
}

impl<OR, PR, AR, RR, CR, CatR> OrderService<OR, PR, AR, RR, CR, CatR>
where
    OR: OrderRepositoryTrait,
    PR: ProductRepositoryTrait,
    AR: AddressRepositoryTrait,
    RR: RegionRepositoryTrait,
    CR: CouponRepositoryTrait,
    CatR: CategoryRepositoryTrait,
{
    pub fn new(
        order_repo: Arc<OR>,
        product_repo: Arc<PR>,
        addresses: Arc<AddressService<AR, RR>>,
        coupons: Arc<CouponService<CR, CatR>>,
        config: OrderConfig,
    ) -> Self {
        Self {
            order_repo,
            product_repo,
            addresses,
            coupons,
            config,
        }
    }

    // ==================== 计价 ====================

    /// 校验商品行并按阶梯价计价，保持请求顺序
    async fn price_lines(&self, lines: &[OrderLineRequest]) -> Result<Vec<PricedLine>> {
        if lines.is_empty() {
            return Err(CommerceError::Validation(
                "Pesanan harus berisi minimal satu produk".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(lines.len());
        for line in lines {
            if !seen.insert(line.product_id) {
                return Err(CommerceError::Validation(format!(
                    "Produk {} muncul lebih dari sekali dalam pesanan",
                    line.product_id
                )));
            }
        }

        let ids: Vec<i64> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<i64, _> = self
            .product_repo
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut tiers: HashMap<i64, Vec<PriceTier>> = HashMap::new();
        for (product_id, tier) in self.product_repo.price_tiers_for(&ids).await? {
            tiers.entry(product_id).or_default().push(tier);
        }

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let product = products
                .get(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or_else(|| CommerceError::not_found(Entity::Product, line.product_id))?;

            if line.quantity < product.min_order_qty {
                return Err(CommerceError::Validation(format!(
                    "Minimum pemesanan {} adalah {} {}",
                    product.name, product.min_order_qty, product.unit
                )));
            }
            if line.quantity > product.stock {
                return Err(CommerceError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            let product_tiers = tiers.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
            let unit_price = unit_price_for(product.base_price, product_tiers, line.quantity);
            let quantity = i64::from(line.quantity);

            priced.push(PricedLine {
                product_id: product.id,
                category_id: product.category_id,
                sku: product.sku.clone(),
                product_name: product.name.clone(),
                unit: product.unit.clone(),
                quantity: line.quantity,
                unit_price,
                line_total: unit_price * quantity,
                weight_grams: i64::from(product.weight_grams) * quantity,
            });
        }

        Ok(priced)
    }

    async fn quotation(&self, buyer_id: i64, request: &PlaceOrderRequest) -> Result<Quotation> {
        request.validate()?;

        let address = self.addresses.get_owned(buyer_id, request.address_id).await?;
        let region = self.addresses.resolve_region(address.sub_district_id).await?;
        let snapshot = AddressSnapshot::capture(&address, &region);

        let lines = self.price_lines(&request.lines).await?;
        let subtotal: i64 = lines.iter().map(|l| l.line_total).sum();
        let total_weight_grams: i64 = lines.iter().map(|l| l.weight_grams).sum();

        let coupon = match trim_optional(request.coupon_code.clone()) {
            Some(code) => {
                let (coupon, quote) = self
                    .coupons
                    .quote_with_coupon(&code, buyer_id, &coupon_lines(&lines))
                    .await?;
                Some(AppliedCoupon {
                    coupon_id: coupon.id,
                    code: coupon.code,
                    per_buyer_limit: coupon.per_buyer_limit,
                    discount_amount: quote.discount,
                })
            }
            None => None,
        };

        Ok(Quotation {
            address,
            snapshot,
            lines,
            subtotal,
            total_weight_grams,
            shipping_fee: shipping_fee(total_weight_grams, self.config.shipping_rate_per_kg),
            coupon,
        })
    }

    /// 下单预览，不落库
    pub async fn preview(&self, buyer_id: i64, request: PlaceOrderRequest) -> Result<OrderPreview> {
        Ok(self.quotation(buyer_id, &request).await?.preview())
    }

    /// 优惠券试算
    pub async fn quote_coupon(
        &self,
        buyer_id: i64,
        request: QuoteCouponRequest,
    ) -> Result<CouponQuote> {
        request.validate()?;
        let lines = self.price_lines(&request.lines).await?;
        self.coupons
            .quote(&request.code, buyer_id, &coupon_lines(&lines))
            .await
    }

    /// 下单
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn place(&self, buyer_id: i64, request: PlaceOrderRequest) -> Result<OrderDetail> {
        let quotation = self.quotation(buyer_id, &request).await?;
        let total_amount = quotation.total();

        let new_order = NewOrder {
            order_number: generate_order_number(Utc::now()),
            buyer_id,
            subtotal: quotation.subtotal,
            discount_amount: quotation.discount(),
            shipping_fee: quotation.shipping_fee,
            total_amount,
            total_weight_grams: quotation.total_weight_grams,
            coupon: quotation.coupon.clone(),
            shipping_address: quotation.snapshot,
            note: trim_optional(request.note),
            items: quotation
                .lines
                .into_iter()
                .map(|line| NewOrderItem {
                    product_id: line.product_id,
                    category_id: line.category_id,
                    sku: line.sku,
                    product_name: line.product_name,
                    unit: line.unit,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total,
                    weight_grams: line.weight_grams,
                })
                .collect(),
        };

        let order = self.order_repo.create_order(&new_order).await?;

        metrics::record_order_placed(total_amount, new_order.coupon.is_some());
        if let Some(coupon) = &new_order.coupon {
            metrics::record_coupon_redemption(&coupon.code);
        }
        info!(
            order_id = order.id,
            order_number = %order.order_number,
            address_id = quotation.address.id,
            total_amount,
            "订单已创建"
        );

        self.detail(order).await
    }

    // ==================== 查询 ====================

    async fn detail(&self, order: Order) -> Result<OrderDetail> {
        let (items, histories, payments) = tokio::try_join!(
            self.order_repo.items(order.id),
            self.order_repo.histories(order.id),
            self.order_repo.payments(order.id),
        )?;

        Ok(OrderDetail {
            order,
            items,
            histories,
            payments,
        })
    }

    async fn get_order(&self, id: i64) -> Result<Order> {
        self.order_repo
            .get(id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Order, id))
    }

    /// 买家只能访问自己的订单
    async fn get_owned(&self, buyer_id: i64, id: i64) -> Result<Order> {
        self.order_repo
            .get(id)
            .await?
            .filter(|o| o.buyer_id == buyer_id)
            .ok_or_else(|| CommerceError::not_found(Entity::Order, id))
    }

    pub async fn list_for_buyer(
        &self,
        buyer_id: i64,
        query: BuyerOrderQuery,
        page: PageRequest,
    ) -> Result<PageResponse<Order>> {
        let filter = OrderFilter {
            buyer_id: Some(buyer_id),
            status: query.status,
            ..Default::default()
        };
        let (items, total) = self.order_repo.list(&filter, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    pub async fn get_for_buyer(&self, buyer_id: i64, id: i64) -> Result<OrderDetail> {
        let order = self.get_owned(buyer_id, id).await?;
        self.detail(order).await
    }

    pub async fn list_admin(
        &self,
        query: AdminOrderQuery,
        page: PageRequest,
    ) -> Result<PageResponse<Order>> {
        let filter: OrderFilter = query.into();
        let (items, total) = self.order_repo.list(&filter, page).await?;
        Ok(PageResponse::new(items, total, &page))
    }

    pub async fn get_admin(&self, id: i64) -> Result<OrderDetail> {
        let order = self.get_order(id).await?;
        self.detail(order).await
    }

    // ==================== 状态流转 ====================

    /// 校验状态机并执行条件更新
    async fn apply_transition(&self, order: &Order, change: StatusChange) -> Result<Order> {
        if !order.status.can_transition_to(change.to) {
            return Err(CommerceError::InvalidStatusTransition {
                from: order.status,
                to: change.to,
            });
        }

        let updated = self
            .order_repo
            .change_status(order.id, &change)
            .await?
            .ok_or(CommerceError::ConcurrencyConflict)?;

        metrics::record_order_transition(change.from.as_str(), change.to.as_str());
        Ok(updated)
    }

    /// 买家取消：仅限待支付
    #[instrument(skip(self, request))]
    pub async fn cancel_by_buyer(
        &self,
        buyer_id: i64,
        id: i64,
        request: CancelOrderRequest,
    ) -> Result<OrderDetail> {
        request.validate()?;
        let order = self.get_owned(buyer_id, id).await?;

        if order.status != OrderStatus::PendingPayment {
            return Err(CommerceError::InvalidStatusTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let change = StatusChange {
            from: order.status,
            to: OrderStatus::Cancelled,
            actor_kind: ActorKind::Buyer,
            actor_id: Some(buyer_id),
            note: trim_optional(request.reason),
            tracking_number: None,
        };
        let updated = self.apply_transition(&order, change).await?;
        self.detail(updated).await
    }

    /// 买家确认收货
    #[instrument(skip(self))]
    pub async fn confirm_receipt(&self, buyer_id: i64, id: i64) -> Result<OrderDetail> {
        let order = self.get_owned(buyer_id, id).await?;

        if order.status != OrderStatus::Shipped {
            return Err(CommerceError::InvalidStatusTransition {
                from: order.status,
                to: OrderStatus::Completed,
            });
        }

        let change = StatusChange {
            from: order.status,
            to: OrderStatus::Completed,
            actor_kind: ActorKind::Buyer,
            actor_id: Some(buyer_id),
            note: Some("Pembeli mengonfirmasi pesanan diterima".to_string()),
            tracking_number: None,
        };
        let updated = self.apply_transition(&order, change).await?;
        self.detail(updated).await
    }

    /// 后台变更状态；发货必须填写运单号
    #[instrument(skip(self, request), fields(to = %request.status))]
    pub async fn transition(
        &self,
        admin_id: i64,
        id: i64,
        request: TransitionOrderRequest,
    ) -> Result<OrderDetail> {
        request.validate()?;
        let order = self.get_order(id).await?;

        let tracking_number = trim_optional(request.tracking_number);
        if request.status == OrderStatus::Shipped && tracking_number.is_none() {
            return Err(CommerceError::Validation(
                "Nomor resi wajib diisi saat pengiriman".to_string(),
            ));
        }

        let change = StatusChange {
            from: order.status,
            to: request.status,
            actor_kind: ActorKind::Admin,
            actor_id: Some(admin_id),
            note: trim_optional(request.note),
            tracking_number,
        };
        let updated = self.apply_transition(&order, change).await?;
        self.detail(updated).await
    }

    // ==================== 支付 ====================

    /// 买家提交支付凭证，仅限待支付订单
    #[instrument(skip(self, request))]
    pub async fn submit_payment(
        &self,
        buyer_id: i64,
        order_id: i64,
        request: SubmitPaymentRequest,
    ) -> Result<Payment> {
        request.validate()?;
        let order = self.get_owned(buyer_id, order_id).await?;

        if order.status != OrderStatus::PendingPayment {
            return Err(CommerceError::Validation(format!(
                "Status pesanan {}, pembayaran tidak dapat dikirim",
                order.status
            )));
        }

        let payment = self.order_repo.create_payment(order_id, &request).await?;
        info!(order_id, payment_id = payment.id, amount = payment.amount, "支付凭证已提交");
        Ok(payment)
    }

    /// 审核支付；已核实金额覆盖订单总额时订单转为已支付
    #[instrument(skip(self, request), fields(approve = request.approve))]
    pub async fn verify_payment(
        &self,
        admin_id: i64,
        order_id: i64,
        payment_id: i64,
        request: VerifyPaymentRequest,
    ) -> Result<Payment> {
        request.validate()?;

        let reason = trim_optional(request.reason);
        if !request.approve && reason.is_none() {
            return Err(CommerceError::Validation(
                "Alasan wajib diisi saat menolak pembayaran".to_string(),
            ));
        }

        let order = self.get_order(order_id).await?;
        if order.status != OrderStatus::PendingPayment {
            return Err(CommerceError::InvalidStatusTransition {
                from: order.status,
                to: OrderStatus::Paid,
            });
        }

        let payment = self
            .order_repo
            .get_payment(order_id, payment_id)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Payment, payment_id))?;

        if payment.status != PaymentStatus::Pending {
            return Err(CommerceError::Validation("Pembayaran ini sudah ditinjau".to_string()));
        }

        let review = PaymentReview {
            payment_id,
            status: if request.approve {
                PaymentStatus::Verified
            } else {
                PaymentStatus::Rejected
            },
            admin_id,
            reason,
        };
        let outcome = self
            .order_repo
            .review_payment(order_id, &review)
            .await?
            .ok_or(CommerceError::ConcurrencyConflict)?;

        if outcome.paid_order.is_some() {
            metrics::record_order_transition(
                OrderStatus::PendingPayment.as_str(),
                OrderStatus::Paid.as_str(),
            );
        }

        Ok(outcome.payment)
    }

    // ==================== 后台任务 ====================

    /// 取消超时未支付的订单，返回本批取消数量
    pub async fn cancel_expired_unpaid(&self, now: DateTime<Utc>, batch_size: i64) -> Result<u64> {
        let cutoff = now - Duration::hours(self.config.unpaid_timeout_hours);
        let orders = self.order_repo.list_unpaid_before(cutoff, batch_size).await?;

        let mut cancelled = 0u64;
        for order in orders {
            let change = StatusChange {
                from: OrderStatus::PendingPayment,
                to: OrderStatus::Cancelled,
                actor_kind: ActorKind::System,
                actor_id: None,
                note: Some(format!(
                    "Dibatalkan otomatis oleh sistem: belum dibayar lebih dari {} jam",
                    self.config.unpaid_timeout_hours
                )),
                tracking_number: None,
            };

            // 单个订单失败不影响其余订单
            match self.order_repo.change_status(order.id, &change).await {
                Ok(Some(_)) => {
                    cancelled += 1;
                    metrics::record_order_transition(change.from.as_str(), change.to.as_str());
                }
                Ok(None) => {}
                Err(e) => warn!(order_id = order.id, error = %e, "自动取消订单失败"),
            }
        }

        if cancelled > 0 {
            info!(cancelled, "已取消超时未支付订单");
        }
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentReviewOutcome;
    use crate::models::coupon::fixtures::coupon;
    use crate::repository::{
        MockAddressRepositoryTrait, MockCategoryRepositoryTrait, MockCouponRepositoryTrait,
        MockOrderRepositoryTrait, MockProductRepositoryTrait, MockRegionRepositoryTrait,
    };
    use crate::service::RegionService;
    use crate::service::address_service::fixtures::{address, region_path};
    use crate::service::product_service::fixtures::product;
    use sqlx::types::Json;

    type TestService = OrderService<
        MockOrderRepositoryTrait,
        MockProductRepositoryTrait,
        MockAddressRepositoryTrait,
        MockRegionRepositoryTrait,
        MockCouponRepositoryTrait,
        MockCategoryRepositoryTrait,
    >;

    struct Mocks {
        orders: MockOrderRepositoryTrait,
        products: MockProductRepositoryTrait,
        addresses: MockAddressRepositoryTrait,
        coupons: MockCouponRepositoryTrait,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                orders: MockOrderRepositoryTrait::new(),
                products: MockProductRepositoryTrait::new(),
                addresses: MockAddressRepositoryTrait::new(),
                coupons: MockCouponRepositoryTrait::new(),
            }
        }

        /// 商品 1：基础价 350000，10 件起 340000；商品 2：无阶梯价
        fn with_catalog(mut self) -> Self {
            self.products.expect_get_many().returning(|ids| {
                Ok(ids
                    .iter()
                    .map(|id| {
                        let mut p = product(*id);
                        if *id == 2 {
                            p.category_id = 2;
                            p.base_price = 100_000;
                            p.min_order_qty = 1;
                            p.weight_grams = 1_500;
                        }
                        p
                    })
                    .collect())
            });
            self.products.expect_price_tiers_for().returning(|_| {
                Ok(vec![(
                    1,
                    PriceTier {
                        min_quantity: 10,
                        unit_price: 340_000,
                    },
                )])
            });
            self
        }

        fn with_address(mut self) -> Self {
            self.addresses
                .expect_get()
                .returning(|buyer_id, id| Ok((buyer_id == 5).then(|| address(buyer_id, id))));
            self
        }

        fn build(self) -> TestService {
            let mut regions = MockRegionRepositoryTrait::new();
            regions
                .expect_resolve_path()
                .returning(|_| Ok(Some(region_path(Some("12850")))));
            let regions = Arc::new(RegionService::new(Arc::new(regions), None));
            let addresses = Arc::new(AddressService::new(Arc::new(self.addresses), regions));
            let coupons = Arc::new(CouponService::new(
                Arc::new(self.coupons),
                Arc::new(MockCategoryRepositoryTrait::new()),
            ));

            OrderService::new(
                Arc::new(self.orders),
                Arc::new(self.products),
                addresses,
                coupons,
                OrderConfig::default(),
            )
        }
    }

    fn order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: 100,
            order_number: "GRS-20260101-ABC123".to_string(),
            buyer_id: 5,
            status,
            subtotal: 3_400_000,
            discount_amount: 0,
            shipping_fee: 1_250_000,
            total_amount: 4_650_000,
            total_weight_grams: 250_000,
            coupon_id: None,
            coupon_code: None,
            shipping_address: Json(AddressSnapshot::capture(
                &address(5, 1),
                &region_path(Some("12850")),
            )),
            note: None,
            tracking_number: None,
            paid_at: None,
            shipped_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment(status: PaymentStatus) -> Payment {
        let now = Utc::now();
        Payment {
            id: 9,
            order_id: 100,
            method: crate::models::PaymentMethod::BankTransfer,
            amount: 4_650_000,
            reference: "TRF-001".to_string(),
            proof_url: None,
            status,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn expect_detail(orders: &mut MockOrderRepositoryTrait) {
        orders.expect_items().returning(|_| Ok(vec![]));
        orders.expect_histories().returning(|_| Ok(vec![]));
        orders.expect_payments().returning(|_| Ok(vec![]));
    }

    fn place_request(lines: Vec<(i64, i32)>, coupon_code: Option<&str>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            address_id: 1,
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
            coupon_code: coupon_code.map(str::to_string),
            note: None,
        }
    }

    #[test]
    fn test_order_number_format() {
        let now = "2026-03-05T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let number = generate_order_number(now);

        assert_eq!(number.len(), 19);
        assert!(number.starts_with("GRS-20260305-"));
        assert!(
            number[13..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[tokio::test]
    async fn test_preview_applies_tiers_and_shipping() {
        let svc = Mocks::new().with_catalog().with_address().build();

        let preview = svc
            .preview(5, place_request(vec![(1, 10), (2, 3)], None))
            .await
            .unwrap();

        assert_eq!(preview.lines[0].unit_price, 340_000);
        assert_eq!(preview.lines[1].unit_price, 100_000);
        assert_eq!(preview.subtotal, 3_400_000 + 300_000);
        // 250kg + 4.5kg -> 255kg
        assert_eq!(preview.total_weight_grams, 254_500);
        assert_eq!(preview.shipping_fee, 255 * 5_000);
        assert_eq!(preview.total_amount, 3_700_000 + 1_275_000);
    }

    #[tokio::test]
    async fn test_preview_with_scoped_coupon() {
        let mut mocks = Mocks::new().with_catalog().with_address();
        mocks.coupons.expect_get_by_code().returning(|_| {
            let mut c = coupon();
            c.category_ids = vec![2];
            Ok(Some(c))
        });
        mocks.coupons.expect_get().returning(|_| {
            let mut c = coupon();
            c.category_ids = vec![2];
            Ok(Some(c))
        });

        let preview = mocks
            .build()
            .preview(5, place_request(vec![(1, 10), (2, 3)], Some("hemat10")))
            .await
            .unwrap();

        // 10% * 300000（仅分类 2）
        assert_eq!(preview.discount_amount, 30_000);
        assert_eq!(preview.coupon_code.as_deref(), Some("HEMAT10"));
    }

    #[tokio::test]
    async fn test_place_rejects_duplicate_and_below_minimum() {
        let svc = Mocks::new().with_catalog().with_address().build();

        let err = svc
            .place(5, place_request(vec![(1, 10), (1, 5)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));

        let err = svc
            .place(5, place_request(vec![(1, 2)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_place_rejects_foreign_address() {
        let svc = Mocks::new().with_catalog().with_address().build();

        let err = svc
            .place(6, place_request(vec![(1, 10)], None))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ADDRESS_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_place_persists_snapshot_and_totals() {
        let mut mocks = Mocks::new().with_catalog().with_address();
        mocks
            .orders
            .expect_create_order()
            .withf(|new_order| {
                new_order.buyer_id == 5
                    && new_order.order_number.starts_with("GRS-")
                    && new_order.items.len() == 1
                    && new_order.subtotal == 3_400_000
                    && new_order.total_amount == 3_400_000 + 250 * 5_000
                    && new_order.shipping_address.city == "Jakarta Selatan"
                    && new_order.coupon.is_none()
            })
            .times(1)
            .returning(|_| Ok(order(OrderStatus::PendingPayment)));
        expect_detail(&mut mocks.orders);

        let detail = mocks
            .build()
            .place(5, place_request(vec![(1, 10)], None))
            .await
            .unwrap();
        assert_eq!(detail.order.status, OrderStatus::PendingPayment);
    }

    #[tokio::test]
    async fn test_buyer_cancel_only_while_pending() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::Paid))));
        mocks.orders.expect_change_status().never();

        let err = mocks
            .build()
            .cancel_by_buyer(5, 100, CancelOrderRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_cancel_conflict_when_status_changed() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::PendingPayment))));
        mocks.orders.expect_change_status().returning(|_, _| Ok(None));

        let err = mocks
            .build()
            .cancel_by_buyer(5, 100, CancelOrderRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::ConcurrencyConflict));
    }

    #[tokio::test]
    async fn test_transition_requires_tracking_for_shipping() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::Processing))));
        mocks.orders.expect_change_status().never();

        let err = mocks
            .build()
            .transition(
                1,
                100,
                TransitionOrderRequest {
                    status: OrderStatus::Shipped,
                    note: None,
                    tracking_number: Some("   ".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_transition_rejects_skipping_states() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::PendingPayment))));

        let err = mocks
            .build()
            .transition(
                1,
                100,
                TransitionOrderRequest {
                    status: OrderStatus::Shipped,
                    note: None,
                    tracking_number: Some("JNE123".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_verified_payment_marks_order_paid() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::PendingPayment))));
        mocks
            .orders
            .expect_get_payment()
            .returning(|_, _| Ok(Some(payment(PaymentStatus::Pending))));
        mocks
            .orders
            .expect_review_payment()
            .withf(|order_id, review| {
                *order_id == 100
                    && review.payment_id == 9
                    && review.status == PaymentStatus::Verified
                    && review.admin_id == 1
            })
            .times(1)
            .returning(|_, review| {
                Ok(Some(PaymentReviewOutcome {
                    payment: payment(review.status),
                    verified_total: 4_650_000,
                    paid_order: Some(order(OrderStatus::Paid)),
                }))
            });
        mocks.orders.expect_change_status().never();

        let payment = mocks
            .build()
            .verify_payment(
                1,
                100,
                9,
                VerifyPaymentRequest {
                    approve: true,
                    reason: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Verified);
    }

    #[tokio::test]
    async fn test_verify_payment_rejected_on_cancelled_order() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::Cancelled))));
        mocks
            .orders
            .expect_get_payment()
            .returning(|_, _| Ok(Some(payment(PaymentStatus::Pending))));
        mocks.orders.expect_review_payment().never();

        let err = mocks
            .build()
            .verify_payment(
                1,
                100,
                9,
                VerifyPaymentRequest {
                    approve: true,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");
    }

    #[tokio::test]
    async fn test_verify_payment_already_reviewed_concurrently() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::PendingPayment))));
        mocks
            .orders
            .expect_get_payment()
            .returning(|_, _| Ok(Some(payment(PaymentStatus::Pending))));
        mocks
            .orders
            .expect_review_payment()
            .returning(|_, _| Ok(None));

        let err = mocks
            .build()
            .verify_payment(
                1,
                100,
                9,
                VerifyPaymentRequest {
                    approve: false,
                    reason: Some("nominal tidak sesuai".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::ConcurrencyConflict));
    }

    #[tokio::test]
    async fn test_reject_payment_requires_reason() {
        let err = Mocks::new()
            .build()
            .verify_payment(
                1,
                100,
                9,
                VerifyPaymentRequest {
                    approve: false,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_payment_only_while_pending() {
        let mut mocks = Mocks::new();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(Some(order(OrderStatus::Cancelled))));
        mocks.orders.expect_create_payment().never();

        let err = mocks
            .build()
            .submit_payment(
                5,
                100,
                SubmitPaymentRequest {
                    method: crate::models::PaymentMethod::BankTransfer,
                    amount: 4_650_000,
                    reference: "TRF-001".to_string(),
                    proof_url: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_expired_unpaid_counts_successes() {
        let mut mocks = Mocks::new();
        mocks.orders.expect_list_unpaid_before().returning(|_, _| {
            let mut second = order(OrderStatus::PendingPayment);
            second.id = 101;
            Ok(vec![order(OrderStatus::PendingPayment), second])
        });
        mocks
            .orders
            .expect_change_status()
            .withf(|_, change| {
                change.actor_kind == ActorKind::System
                    && change.actor_id.is_none()
                    && change.note.as_deref()
                        == Some("Dibatalkan otomatis oleh sistem: belum dibayar lebih dari 24 jam")
            })
            .returning(|id, _| {
                // 第二单已被买家支付
                Ok((id == 100).then(|| order(OrderStatus::Cancelled)))
            });

        let cancelled = mocks
            .build()
            .cancel_expired_unpaid(Utc::now(), 50)
            .await
            .unwrap();
        assert_eq!(cancelled, 1);
    }
}
