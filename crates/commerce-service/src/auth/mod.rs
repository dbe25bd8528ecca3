//! 认证基础组件
//!
//! JWT 签发与校验、密码哈希、Refresh Token 摘要

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{Claims, JwtConfig, JwtManager};
pub use password::{check_password_strength, hash_password, verify_password};
pub use token::{generate_refresh_token, hash_token};
