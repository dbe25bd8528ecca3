//! JWT Token 处理
//!
//! Access Token 携带主体类型与会话 ID，服务端每次请求都会校验会话是否仍然有效

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use grosir_shared::config::AuthConfig;

use crate::error::{CommerceError, Result};
use crate::models::PrincipalKind;

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access Token 过期时间（秒）
    pub expires_in_secs: i64,
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expires_in_secs: config.access_token_ttl_secs,
            issuer: config.jwt_issuer.clone(),
        }
    }
}

/// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// 主体 ID（admins.id 或 buyers.id）
    pub sub: String,
    /// 会话 ID
    pub sid: i64,
    pub kind: PrincipalKind,
    /// 显示名称
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn principal_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| CommerceError::Unauthorized("ID pengguna tidak valid".to_string()))
    }
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 签发 Access Token，返回 Token 与过期时间
    pub fn generate_token(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        session_id: i64,
        name: &str,
    ) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expires_in_secs);

        let claims = Claims {
            sub: principal_id.to_string(),
            sid: session_id,
            kind,
            name: name.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| CommerceError::Internal(format!("JWT 生成失败: {}", e)))?;

        Ok((token, exp))
    }

    /// 验证并解析 Token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    CommerceError::Unauthorized("Token sudah kedaluwarsa".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    CommerceError::Unauthorized("Token tidak valid".to_string())
                }
                _ => CommerceError::Unauthorized(format!("Verifikasi token gagal: {}", e)),
            },
        )?;

        Ok(token_data.claims)
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.config.expires_in_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(issuer: &str) -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "test-secret".to_string(),
            expires_in_secs: 3600,
            issuer: issuer.to_string(),
        })
    }

    #[test]
    fn test_generate_and_verify_token() {
        let manager = manager("grosir-api");
        let (token, exp) = manager
            .generate_token(PrincipalKind::Buyer, 42, 7, "Toko Makmur")
            .unwrap();

        let claims = manager.verify_token(&token).unwrap();
        assert_eq!(claims.principal_id().unwrap(), 42);
        assert_eq!(claims.sid, 7);
        assert_eq!(claims.kind, PrincipalKind::Buyer);
        assert_eq!(claims.name, "Toko Makmur");
        assert_eq!(claims.exp, exp.timestamp());
    }

    #[test]
    fn test_invalid_token() {
        let result = manager("grosir-api").verify_token("invalid.token.here");
        assert!(matches!(result, Err(CommerceError::Unauthorized(_))));
    }

    #[test]
    fn test_issuer_mismatch_rejected() {
        let (token, _) = manager("other-issuer")
            .generate_token(PrincipalKind::Admin, 1, 1, "root")
            .unwrap();
        assert!(manager("grosir-api").verify_token(&token).is_err());
    }

    #[test]
    fn test_from_auth_config() {
        let config = JwtConfig::from(&AuthConfig::default());
        assert_eq!(config.expires_in_secs, 3600);
        assert_eq!(config.issuer, "grosir-api");
    }
}
