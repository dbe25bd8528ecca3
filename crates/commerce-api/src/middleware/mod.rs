//! 中间件模块

mod auth;
mod security;

pub use auth::{Access, auth_middleware, required_access};
pub use security::{build_cors, security_headers};
