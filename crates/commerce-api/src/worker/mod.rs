pub mod coupon_expiry_worker;
pub mod order_timeout_worker;

pub use coupon_expiry_worker::CouponExpiryWorker;
pub use order_timeout_worker::OrderTimeoutWorker;
