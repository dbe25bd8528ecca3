//! Grosir HTTP 服务
//!
//! 面向后台管理员、批发买家与匿名访客的 REST API。
//!
//! ## 路由分组
//!
//! - `/api/public/*`：商品、分类、区划、内容等公开数据
//! - `/api/auth/*`：登录、注册、刷新、登出、当前主体
//! - `/api/buyer/*`：买家的地址、订单、支付凭证与评价
//! - `/api/admin/*`：后台管理
//!
//! ## 模块结构
//!
//! - `response`: 统一响应结构
//! - `error`: 错误类型与 HTTP 状态码映射
//! - `middleware`: 认证中间件
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//! - `worker`: 后台定时任务

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod worker;

pub use error::{ApiError, Result};
pub use response::ApiResponse;
pub use state::AppState;
