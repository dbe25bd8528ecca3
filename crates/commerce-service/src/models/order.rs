//! 订单（Pesanan）、订单明细、状态流水与支付记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::address::AddressSnapshot;
use super::enums::{ActorKind, OrderStatus, PaymentMethod, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// GRS-YYYYMMDD-XXXXXX
    pub order_number: String,
    pub buyer_id: i64,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_fee: i64,
    pub total_amount: i64,
    pub total_weight_grams: i64,
    #[sqlx(default)]
    pub coupon_id: Option<i64>,
    #[sqlx(default)]
    pub coupon_code: Option<String>,
    pub shipping_address: Json<AddressSnapshot>,
    #[sqlx(default)]
    pub note: Option<String>,
    #[sqlx(default)]
    pub tracking_number: Option<String>,
    #[sqlx(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub shipped_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 订单明细，保存下单时的商品快照
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub category_id: i64,
    pub sku: String,
    pub product_name: String,
    pub unit: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub weight_grams: i64,
}

/// 订单状态流水
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusHistory {
    pub id: i64,
    pub order_id: i64,
    #[sqlx(default)]
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub actor_kind: ActorKind,
    #[sqlx(default)]
    pub actor_id: Option<i64>,
    #[sqlx(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 支付记录（线下转账凭证，由管理员人工核对）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount: i64,
    pub reference: String,
    #[sqlx(default)]
    pub proof_url: Option<String>,
    pub status: PaymentStatus,
    #[sqlx(default)]
    pub verified_by: Option<i64>,
    #[sqlx(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 订单详情
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub histories: Vec<OrderStatusHistory>,
    pub payments: Vec<Payment>,
}

/// 待写入的订单明细
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub category_id: i64,
    pub sku: String,
    pub product_name: String,
    pub unit: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub weight_grams: i64,
}

/// 待写入的订单（含优惠券使用信息）
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub buyer_id: i64,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_fee: i64,
    pub total_amount: i64,
    pub total_weight_grams: i64,
    pub coupon: Option<AppliedCoupon>,
    pub shipping_address: AddressSnapshot,
    pub note: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// 订单使用的优惠券
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCoupon {
    pub coupon_id: i64,
    pub code: String,
    pub per_buyer_limit: Option<i32>,
    pub discount_amount: i64,
}

/// 一次状态变更
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor_kind: ActorKind,
    pub actor_id: Option<i64>,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

/// 一次支付审核
#[derive(Debug, Clone)]
pub struct PaymentReview {
    pub payment_id: i64,
    pub status: PaymentStatus,
    pub admin_id: i64,
    pub reason: Option<String>,
}

/// 支付审核结果
#[derive(Debug, Clone)]
pub struct PaymentReviewOutcome {
    pub payment: Payment,
    /// 已核实支付累计金额
    pub verified_total: i64,
    /// 本次审核使订单转为已支付时返回更新后的订单
    pub paid_order: Option<Order>,
}

/// 订单检索条件
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub buyer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub order_number: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}
