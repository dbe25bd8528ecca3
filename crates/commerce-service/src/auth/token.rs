//! Refresh Token 生成与摘要
//!
//! 数据库只保存 SHA-256 摘要，明文仅在签发时返回给客户端一次

use sha2::{Digest, Sha256};

/// 生成 32 字节随机 Refresh Token（hex 编码，64 字符）
pub fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// 计算 Token 的 SHA-256 摘要（hex 编码）
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
