//! HTTP 请求处理器模块
//!
//! 处理器只负责提取参数和包装响应，业务规则全部在服务层

pub mod account;
pub mod address;
pub mod auth;
pub mod catalog;
pub mod content;
pub mod coupon;
pub mod order;
pub mod product;
pub mod region;
pub mod reorder;
pub mod review;

use commerce::Claims;

use crate::error::Result;

/// 当前登录主体的 ID（由认证中间件注入的 Claims 解析）
pub(crate) fn principal_id(claims: &Claims) -> Result<i64> {
    Ok(claims.principal_id()?)
}
