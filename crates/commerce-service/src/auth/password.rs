//! 密码处理
//!
//! bcrypt 哈希与校验

use bcrypt::{hash, verify};

use crate::error::{CommerceError, Result};

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

/// 密码最小长度
pub const MIN_PASSWORD_LEN: usize = 8;

/// 对密码进行哈希处理
pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, HASH_COST)?)
}

/// 验证密码
///
/// 存储的哈希格式损坏时视为不匹配，而不是返回系统错误
pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

/// 校验新密码长度
pub fn check_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CommerceError::Validation(format!(
            "Kata sandi minimal {} karakter",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("rahasia123").unwrap();

        assert!(verify_password("rahasia123", &hashed));
        assert!(!verify_password("salah123", &hashed));
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(!verify_password("rahasia123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_password_strength() {
        assert!(check_password_strength("abc12345").is_ok());
        assert!(check_password_strength("abc123").is_err());
        // 按字符计数，而不是字节
        assert!(check_password_strength("密码密码密码密码").is_ok());
    }
}
