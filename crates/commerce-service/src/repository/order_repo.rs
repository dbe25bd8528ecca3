//! 订单仓储
//!
//! 下单与状态变更都在单个事务内完成：
//! - 库存扣减使用条件更新，库存不足时整单回滚
//! - 优惠券计数先加行锁再校验每人上限，并发下单不会超发
//! - 取消订单时回补库存并释放优惠券

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use super::traits::OrderRepositoryTrait;
use crate::dto::{PageRequest, SubmitPaymentRequest};
use crate::error::{CommerceError, CouponRejection, Entity, Result};
use crate::models::{
    ActorKind, AppliedCoupon, NewOrder, NewOrderItem, Order, OrderFilter, OrderItem, OrderStatus,
    OrderStatusHistory, Payment, PaymentReview, PaymentReviewOutcome, PaymentStatus, StatusChange,
};

const ORDER_COLUMNS: &str = "id, order_number, buyer_id, status, subtotal, discount_amount, \
     shipping_fee, total_amount, total_weight_grams, coupon_id, coupon_code, shipping_address, \
     note, tracking_number, paid_at, shipped_at, completed_at, cancelled_at, cancel_reason, \
     created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, order_id, method, amount, reference, proof_url, status, \
     verified_by, verified_at, rejection_reason, created_at, updated_at";

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 条件扣减库存
    async fn reserve_stock(
        tx: &mut Transaction<'_, Postgres>,
        item: &NewOrderItem,
    ) -> Result<()> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND is_active = true AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(item.product_id)
        .bind(item.quantity)
        .fetch_optional(&mut **tx)
        .await?;

        if remaining.is_some() {
            return Ok(());
        }

        let available: Option<i32> = sqlx::query_scalar(
            "SELECT stock FROM products WHERE id = $1 AND is_active = true",
        )
        .bind(item.product_id)
        .fetch_optional(&mut **tx)
        .await?;

        Err(CommerceError::InsufficientStock {
            product_id: item.product_id,
            requested: item.quantity,
            available: available.unwrap_or(0),
        })
    }

    /// 占用一次优惠券额度
    async fn claim_coupon(
        tx: &mut Transaction<'_, Postgres>,
        buyer_id: i64,
        coupon: &AppliedCoupon,
    ) -> Result<()> {
        let claimed: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE coupons
            SET used_count = used_count + 1, updated_at = NOW()
            WHERE id = $1 AND is_active = true
              AND starts_at <= NOW() AND expires_at > NOW()
              AND (usage_limit IS NULL OR used_count < usage_limit)
            RETURNING id
            "#,
        )
        .bind(coupon.coupon_id)
        .fetch_optional(&mut **tx)
        .await?;

        if claimed.is_none() {
            return Err(CommerceError::CouponRejected(CouponRejection::Exhausted));
        }

        // 券行已被本事务锁定，此处计数不会与其他下单交错
        if let Some(limit) = coupon.per_buyer_limit {
            let used: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = $1 AND buyer_id = $2",
            )
            .bind(coupon.coupon_id)
            .bind(buyer_id)
            .fetch_one(&mut **tx)
            .await?;

            if used >= i64::from(limit) {
                return Err(CommerceError::CouponRejected(
                    CouponRejection::BuyerLimitReached,
                ));
            }
        }

        Ok(())
    }

    async fn insert_history(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        from: Option<OrderStatus>,
        to: OrderStatus,
        actor_kind: ActorKind,
        actor_id: Option<i64>,
        note: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_status_histories
                (order_id, from_status, to_status, actor_kind, actor_id, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id)
        .bind(from)
        .bind(to)
        .bind(actor_kind)
        .bind(actor_id)
        .bind(note)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// 回补库存并释放优惠券
    async fn release_reservations(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products p
            SET stock = p.stock + i.quantity, updated_at = NOW()
            FROM (
                SELECT product_id, SUM(quantity)::INT AS quantity
                FROM order_items
                WHERE order_id = $1
                GROUP BY product_id
            ) i
            WHERE p.id = i.product_id
            "#,
        )
        .bind(order.id)
        .execute(&mut **tx)
        .await?;

        if let Some(coupon_id) = order.coupon_id {
            sqlx::query(
                "UPDATE coupons SET used_count = GREATEST(used_count - 1, 0), updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(coupon_id)
            .execute(&mut **tx)
            .await?;

            sqlx::query("DELETE FROM coupon_usages WHERE order_id = $1")
                .bind(order.id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            Self::reserve_stock(&mut tx, item).await?;
        }

        if let Some(coupon) = &order.coupon {
            Self::claim_coupon(&mut tx, order.buyer_id, coupon).await?;
        }

        let sql = format!(
            r#"
            INSERT INTO orders (order_number, buyer_id, status, subtotal, discount_amount,
                                shipping_fee, total_amount, total_weight_grams, coupon_id,
                                coupon_code, shipping_address, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(&order.order_number)
            .bind(order.buyer_id)
            .bind(OrderStatus::PendingPayment)
            .bind(order.subtotal)
            .bind(order.discount_amount)
            .bind(order.shipping_fee)
            .bind(order.total_amount)
            .bind(order.total_weight_grams)
            .bind(order.coupon.as_ref().map(|c| c.coupon_id))
            .bind(order.coupon.as_ref().map(|c| c.code.as_str()))
            .bind(Json(&order.shipping_address))
            .bind(&order.note)
            .fetch_one(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, category_id, sku, product_name,
                                         unit, quantity, unit_price, line_total, weight_grams)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(created.id)
            .bind(item.product_id)
            .bind(item.category_id)
            .bind(&item.sku)
            .bind(&item.product_name)
            .bind(&item.unit)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .bind(item.weight_grams)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(coupon) = &order.coupon {
            sqlx::query(
                r#"
                INSERT INTO coupon_usages (coupon_id, buyer_id, order_id, discount_amount)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(coupon.coupon_id)
            .bind(order.buyer_id)
            .bind(created.id)
            .bind(coupon.discount_amount)
            .execute(&mut *tx)
            .await?;
        }

        Self::insert_history(
            &mut tx,
            created.id,
            None,
            OrderStatus::PendingPayment,
            ActorKind::Buyer,
            Some(order.buyer_id),
            None,
        )
        .await?;

        tx.commit().await?;

        info!(
            order_id = created.id,
            order_number = %created.order_number,
            buyer_id = created.buyer_id,
            total = created.total_amount,
            "订单已创建"
        );

        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list(&self, filter: &OrderFilter, page: PageRequest) -> Result<(Vec<Order>, i64)> {
        let order_number = filter
            .order_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| format!("%{}%", n));

        let condition = r#"
            WHERE ($1::BIGINT IS NULL OR buyer_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR order_number ILIKE $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at < $5)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {condition}"))
            .bind(filter.buyer_id)
            .bind(filter.status)
            .bind(&order_number)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders {condition} \
             ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(filter.buyer_id)
            .bind(filter.status)
            .bind(&order_number)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((orders, total))
    }

    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, category_id, sku, product_name, unit,
                   quantity, unit_price, line_total, weight_grams
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn histories(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>> {
        let histories = sqlx::query_as::<_, OrderStatusHistory>(
            r#"
            SELECT id, order_id, from_status, to_status, actor_kind, actor_id, note, created_at
            FROM order_status_histories
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(histories)
    }

    async fn payments(&self, order_id: i64) -> Result<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    async fn change_status(&self, order_id: i64, change: &StatusChange) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE orders
            SET status = $3,
                paid_at = CASE WHEN $3 = 'paid' THEN NOW() ELSE paid_at END,
                shipped_at = CASE WHEN $3 = 'shipped' THEN NOW() ELSE shipped_at END,
                tracking_number = COALESCE($4, tracking_number),
                completed_at = CASE WHEN $3 = 'completed' THEN NOW() ELSE completed_at END,
                cancelled_at = CASE WHEN $3 = 'cancelled' THEN NOW() ELSE cancelled_at END,
                cancel_reason = CASE WHEN $3 = 'cancelled' THEN $5 ELSE cancel_reason END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(change.from)
            .bind(change.to)
            .bind(&change.tracking_number)
            .bind(&change.note)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(order) = updated else {
            tx.rollback().await?;
            debug!(order_id, from = %change.from, to = %change.to, "订单状态已变化，条件更新未命中");
            return Ok(None);
        };

        if change.to == OrderStatus::Cancelled {
            Self::release_reservations(&mut tx, &order).await?;
        }

        Self::insert_history(
            &mut tx,
            order_id,
            Some(change.from),
            change.to,
            change.actor_kind,
            change.actor_id,
            change.note.as_deref(),
        )
        .await?;

        tx.commit().await?;

        info!(
            order_id,
            from = %change.from,
            to = %change.to,
            actor = ?change.actor_kind,
            "订单状态已变更"
        );

        Ok(Some(order))
    }

    async fn create_payment(
        &self,
        order_id: i64,
        request: &SubmitPaymentRequest,
    ) -> Result<Payment> {
        let sql = format!(
            r#"
            INSERT INTO payments (order_id, method, amount, reference, proof_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(order_id)
            .bind(request.method)
            .bind(request.amount)
            .bind(request.reference.trim())
            .bind(&request.proof_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(payment)
    }

    async fn get_payment(&self, order_id: i64, payment_id: i64) -> Result<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND order_id = $2");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(payment_id)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    async fn review_payment(
        &self,
        order_id: i64,
        review: &PaymentReview,
    ) -> Result<Option<PaymentReviewOutcome>> {
        let mut tx = self.pool.begin().await?;

        // 锁定订单行，与超时取消和状态流转串行
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CommerceError::not_found(Entity::Order, order_id))?;

        if order.status != OrderStatus::PendingPayment {
            tx.rollback().await?;
            return Err(CommerceError::InvalidStatusTransition {
                from: order.status,
                to: OrderStatus::Paid,
            });
        }

        let sql = format!(
            r#"
            UPDATE payments
            SET status = $3, verified_by = $4, verified_at = NOW(),
                rejection_reason = $5, updated_at = NOW()
            WHERE id = $1 AND order_id = $2 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "#
        );
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(review.payment_id)
            .bind(order_id)
            .bind(review.status)
            .bind(review.admin_id)
            .bind(&review.reason)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(payment) = payment else {
            tx.rollback().await?;
            debug!(order_id, payment_id = review.payment_id, "支付记录已被审核");
            return Ok(None);
        };

        let verified_total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
            FROM payments
            WHERE order_id = $1 AND status = 'verified'
            "#,
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut paid_order = None;
        if review.status == PaymentStatus::Verified && verified_total >= order.total_amount {
            let sql = format!(
                r#"
                UPDATE orders
                SET status = 'paid', paid_at = NOW(), updated_at = NOW()
                WHERE id = $1
                RETURNING {ORDER_COLUMNS}
                "#
            );
            let updated = sqlx::query_as::<_, Order>(&sql)
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;

            let note = format!("Pembayaran terverifikasi, total Rp{verified_total}");
            Self::insert_history(
                &mut tx,
                order_id,
                Some(OrderStatus::PendingPayment),
                OrderStatus::Paid,
                ActorKind::Admin,
                Some(review.admin_id),
                Some(&note),
            )
            .await?;
            paid_order = Some(updated);
        }

        tx.commit().await?;

        info!(
            order_id,
            payment_id = payment.id,
            status = ?payment.status,
            verified_total,
            paid = paid_order.is_some(),
            "支付已审核"
        );

        Ok(Some(PaymentReviewOutcome {
            payment,
            verified_total,
            paid_order,
        }))
    }

    async fn list_unpaid_before(&self, cutoff: DateTime<Utc>, limit: i64) -> Result<Vec<Order>> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE status = 'pending_payment' AND created_at < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(cutoff)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }
}
