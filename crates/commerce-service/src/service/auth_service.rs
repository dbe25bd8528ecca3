//! 认证服务
//!
//! Admin 与 Buyer 共用同一套流程，差异只在凭证表与会话表：
//! - 登录失败累计到阈值后锁定账号
//! - 每次登录创建一条会话，Access Token 携带会话 ID
//! - Refresh Token 每次使用后轮换，数据库只保存其 SHA-256 摘要

use std::sync::Arc;

use chrono::{Duration, Utc};
use grosir_shared::config::AuthConfig;
use grosir_shared::observability::metrics;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::{
    Claims, JwtManager, check_password_strength, generate_refresh_token, hash_password,
    hash_token, verify_password,
};
use crate::dto::{
    ChangePasswordRequest, ClientInfo, PrincipalInfo, RegisterBuyerRequest, TokenResponse,
};
use crate::error::{CommerceError, Entity, Result, is_unique_violation};
use crate::models::{Buyer, Credential, PrincipalKind};
use crate::repository::{
    AccountRepositoryTrait, CredentialRepositoryTrait, SessionRepositoryTrait,
};

pub struct AuthService<CR, SR, AR>
where
    CR: CredentialRepositoryTrait,
    SR: SessionRepositoryTrait,
    AR: AccountRepositoryTrait,
{
    credential_repo: Arc<CR>,
    session_repo: Arc<SR>,
    account_repo: Arc<AR>,
    jwt: Arc<JwtManager>,
    config: AuthConfig,
}

/// 规范化登录名：Buyer 邮箱不区分大小写
fn normalize_login(kind: PrincipalKind, login: &str) -> String {
    match kind {
        PrincipalKind::Admin => login.trim().to_string(),
        PrincipalKind::Buyer => login.trim().to_lowercase(),
    }
}

impl<CR, SR, AR> AuthService<CR, SR, AR>
where
    CR: CredentialRepositoryTrait,
    SR: SessionRepositoryTrait,
    AR: AccountRepositoryTrait,
{
    pub fn new(
        credential_repo: Arc<CR>,
        session_repo: Arc<SR>,
        account_repo: Arc<AR>,
        jwt: Arc<JwtManager>,
        config: AuthConfig,
    ) -> Self {
        Self {
            credential_repo,
            session_repo,
            account_repo,
            jwt,
            config,
        }
    }

    /// 登录
    #[instrument(skip(self, password, client), fields(kind = %kind))]
    pub async fn login(
        &self,
        kind: PrincipalKind,
        login: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<TokenResponse> {
        let login = normalize_login(kind, login);
        let now = Utc::now();

        let Some(credential) = self.credential_repo.find_credential(kind, &login).await? else {
            metrics::record_login(kind.as_str(), false);
            return Err(CommerceError::InvalidCredentials);
        };

        if !credential.is_active {
            metrics::record_login(kind.as_str(), false);
            return Err(CommerceError::AccountDisabled);
        }

        if credential.is_locked(now) {
            metrics::record_login(kind.as_str(), false);
            return Err(CommerceError::AccountLocked {
                until: credential.locked_until.unwrap_or(now),
            });
        }

        if !verify_password(password, &credential.password_hash) {
            metrics::record_login(kind.as_str(), false);
            return Err(self.register_failure(kind, &credential).await?);
        }

        self.credential_repo
            .record_login_success(kind, credential.id)
            .await?;
        metrics::record_login(kind.as_str(), true);

        info!(principal_id = credential.id, "登录成功");

        self.issue_session(kind, credential.id, &credential.display_name, client)
            .await
    }

    /// 记录一次失败，返回应告知调用方的错误
    async fn register_failure(
        &self,
        kind: PrincipalKind,
        credential: &Credential,
    ) -> Result<CommerceError> {
        // 已过期的锁定不再累计
        let previous = if credential.locked_until.is_some() {
            0
        } else {
            credential.failed_login_attempts
        };
        let attempts = previous + 1;

        if attempts >= self.config.max_failed_logins {
            let until = Utc::now() + Duration::minutes(self.config.lockout_minutes);
            self.credential_repo
                .record_login_failure(kind, credential.id, 0, Some(until))
                .await?;

            warn!(
                principal_id = credential.id,
                attempts,
                locked_until = %until,
                "连续登录失败，账号已锁定"
            );
            return Ok(CommerceError::AccountLocked { until });
        }

        self.credential_repo
            .record_login_failure(kind, credential.id, attempts, None)
            .await?;

        Ok(CommerceError::InvalidCredentials)
    }

    /// 创建会话并签发 Token
    async fn issue_session(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        name: &str,
        client: &ClientInfo,
    ) -> Result<TokenResponse> {
        let refresh_token = generate_refresh_token();
        let refresh_expires_at = Utc::now() + Duration::seconds(self.config.refresh_token_ttl_secs);

        let session_id = self
            .session_repo
            .create_session(
                kind,
                principal_id,
                &hash_token(&refresh_token),
                refresh_expires_at,
                client,
            )
            .await?;

        self.token_response(kind, principal_id, session_id, name, refresh_token, refresh_expires_at)
    }

    fn token_response(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        session_id: i64,
        name: &str,
        refresh_token: String,
        refresh_expires_at: chrono::DateTime<Utc>,
    ) -> Result<TokenResponse> {
        let (access_token, expires_at) =
            self.jwt
                .generate_token(kind, principal_id, session_id, name)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expires_in_secs(),
            expires_at,
            refresh_token,
            refresh_expires_at,
            principal: PrincipalInfo {
                id: principal_id,
                kind,
                name: name.to_string(),
            },
        })
    }

    /// 买家注册
    #[instrument(skip(self, request))]
    pub async fn register_buyer(&self, request: RegisterBuyerRequest) -> Result<Buyer> {
        request.validate()?;
        check_password_strength(&request.password)?;

        let email = normalize_login(PrincipalKind::Buyer, &request.email);
        let phone = request.phone.trim().to_string();

        if self.account_repo.buyer_email_taken(&email).await? {
            return Err(CommerceError::already_exists(Entity::Buyer, "email", &email));
        }
        if self.account_repo.buyer_phone_taken(&phone, None).await? {
            return Err(CommerceError::already_exists(Entity::Buyer, "phone", &phone));
        }

        let password_hash = hash_password(&request.password)?;
        let company_name = request
            .company_name
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let buyer = self
            .account_repo
            .create_buyer(request.name.trim(), &email, &phone, company_name, &password_hash)
            .await
            .map_err(|e| match e {
                CommerceError::Database(ref db) if is_unique_violation(db) => {
                    CommerceError::already_exists(Entity::Buyer, "email", &email)
                }
                other => other,
            })?;

        info!(buyer_id = buyer.id, "买家注册成功");
        Ok(buyer)
    }

    /// 用 Refresh Token 换取新 Token，旧 Refresh Token 立即失效
    #[instrument(skip(self, refresh_token), fields(kind = %kind))]
    pub async fn refresh(&self, kind: PrincipalKind, refresh_token: &str) -> Result<TokenResponse> {
        let old_hash = hash_token(refresh_token);
        let now = Utc::now();

        let session = self
            .session_repo
            .find_by_token_hash(kind, &old_hash)
            .await?
            .filter(|s| s.is_active(now))
            .ok_or_else(|| {
                CommerceError::Unauthorized("Sesi tidak berlaku, silakan login kembali".to_string())
            })?;

        let credential = self
            .credential_repo
            .find_credential_by_id(kind, session.principal_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| CommerceError::Unauthorized("Akun tidak tersedia".to_string()))?;

        let new_token = generate_refresh_token();
        let refresh_expires_at = now + Duration::seconds(self.config.refresh_token_ttl_secs);

        let rotated = self
            .session_repo
            .rotate(
                kind,
                session.id,
                &old_hash,
                &hash_token(&new_token),
                refresh_expires_at,
            )
            .await?;

        if !rotated {
            return Err(CommerceError::Unauthorized(
                "Sesi tidak berlaku, silakan login kembali".to_string(),
            ));
        }

        self.token_response(
            kind,
            credential.id,
            session.id,
            &credential.display_name,
            new_token,
            refresh_expires_at,
        )
    }

    /// 退出登录
    pub async fn logout(&self, kind: PrincipalKind, session_id: i64) -> Result<()> {
        self.session_repo.revoke(kind, session_id).await?;
        info!(kind = %kind, session_id, "会话已注销");
        Ok(())
    }

    /// 校验 Access Token 对应的会话仍然有效
    pub async fn validate_session(&self, claims: &Claims) -> Result<()> {
        let principal_id = claims.principal_id()?;
        let now = Utc::now();

        let valid = self
            .session_repo
            .find_session(claims.kind, claims.sid)
            .await?
            .is_some_and(|s| s.principal_id == principal_id && s.is_active(now));

        if valid {
            Ok(())
        } else {
            Err(CommerceError::Unauthorized(
                "Sesi tidak berlaku, silakan login kembali".to_string(),
            ))
        }
    }

    /// 修改密码，并注销当前会话以外的所有会话
    #[instrument(skip(self, request), fields(kind = %kind))]
    pub async fn change_password(
        &self,
        kind: PrincipalKind,
        principal_id: i64,
        session_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<u64> {
        request.validate()?;

        let credential = self
            .credential_repo
            .find_credential_by_id(kind, principal_id)
            .await?
            .ok_or_else(|| CommerceError::Unauthorized("Akun tidak ditemukan".to_string()))?;

        if !verify_password(&request.old_password, &credential.password_hash) {
            return Err(CommerceError::InvalidCredentials);
        }
        check_password_strength(&request.new_password)?;
        if request.old_password == request.new_password {
            return Err(CommerceError::Validation(
                "Kata sandi baru tidak boleh sama dengan yang lama".to_string(),
            ));
        }

        let hash = hash_password(&request.new_password)?;
        self.credential_repo
            .update_password_hash(kind, principal_id, &hash)
            .await?;

        let revoked = self
            .session_repo
            .revoke_all_except(kind, principal_id, Some(session_id))
            .await?;

        info!(principal_id, revoked, "密码已修改");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::models::Session;
    use crate::repository::{
        MockAccountRepositoryTrait, MockCredentialRepositoryTrait, MockSessionRepositoryTrait,
    };
    use chrono::DateTime;

    type TestService = AuthService<
        MockCredentialRepositoryTrait,
        MockSessionRepositoryTrait,
        MockAccountRepositoryTrait,
    >;

    fn service(
        credentials: MockCredentialRepositoryTrait,
        sessions: MockSessionRepositoryTrait,
        accounts: MockAccountRepositoryTrait,
    ) -> TestService {
        let jwt = JwtManager::new(JwtConfig {
            secret: "test-secret-for-auth-service-0123456789".to_string(),
            expires_in_secs: 3600,
            issuer: "grosir-test".to_string(),
        });
        AuthService::new(
            Arc::new(credentials),
            Arc::new(sessions),
            Arc::new(accounts),
            Arc::new(jwt),
            AuthConfig::default(),
        )
    }

    fn credential(password: &str) -> Credential {
        Credential {
            id: 7,
            login: "budi@tokomakmur.id".to_string(),
            display_name: "Budi".to_string(),
            password_hash: hash_password(password).unwrap(),
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
        }
    }

    fn session(expires_at: DateTime<Utc>, revoked: bool) -> Session {
        let now = Utc::now();
        Session {
            id: 11,
            principal_id: 7,
            expires_at,
            revoked_at: revoked.then_some(now),
            created_at: now,
            last_used_at: now,
        }
    }

    #[tokio::test]
    async fn test_login_success_creates_session() {
        let mut credentials = MockCredentialRepositoryTrait::new();
        credentials
            .expect_find_credential()
            .withf(|kind, login| *kind == PrincipalKind::Buyer && login == "budi@tokomakmur.id")
            .returning(|_, _| Ok(Some(credential("rahasia123"))));
        credentials
            .expect_record_login_success()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepositoryTrait::new();
        sessions
            .expect_create_session()
            .withf(|_, principal_id, hash, _, _| *principal_id == 7 && hash.len() == 64)
            .returning(|_, _, _, _, _| Ok(11));

        let svc = service(credentials, sessions, MockAccountRepositoryTrait::new());
        let tokens = svc
            .login(
                PrincipalKind::Buyer,
                "  Budi@TokoMakmur.id ",
                "rahasia123",
                &ClientInfo::default(),
            )
            .await
            .unwrap();

        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.refresh_token.len(), 64);
        assert_eq!(tokens.principal.id, 7);

        let claims = svc.jwt.verify_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sid, 11);
        assert_eq!(claims.kind, PrincipalKind::Buyer);
    }

    #[tokio::test]
    async fn test_login_wrong_password_counts_failure() {
        let mut credentials = MockCredentialRepositoryTrait::new();
        credentials.expect_find_credential().returning(|_, _| {
            let mut c = credential("rahasia123");
            c.failed_login_attempts = 2;
            Ok(Some(c))
        });
        credentials
            .expect_record_login_failure()
            .withf(|_, id, attempts, locked| *id == 7 && *attempts == 3 && locked.is_none())
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let svc = service(
            credentials,
            MockSessionRepositoryTrait::new(),
            MockAccountRepositoryTrait::new(),
        );
        let err = svc
            .login(PrincipalKind::Buyer, "budi@tokomakmur.id", "salah", &ClientInfo::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_locks_after_threshold() {
        let mut credentials = MockCredentialRepositoryTrait::new();
        credentials.expect_find_credential().returning(|_, _| {
            let mut c = credential("rahasia123");
            c.failed_login_attempts = 4;
            Ok(Some(c))
        });
        credentials
            .expect_record_login_failure()
            .withf(|_, _, attempts, locked| *attempts == 0 && locked.is_some())
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let svc = service(
            credentials,
            MockSessionRepositoryTrait::new(),
            MockAccountRepositoryTrait::new(),
        );
        let err = svc
            .login(PrincipalKind::Admin, "root", "salah", &ClientInfo::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::AccountLocked { .. }));
    }

    #[tokio::test]
    async fn test_login_rejects_locked_and_disabled() {
        let mut credentials = MockCredentialRepositoryTrait::new();
        credentials
            .expect_find_credential()
            .withf(|_, login| login == "locked")
            .returning(|_, _| {
                let mut c = credential("rahasia123");
                c.locked_until = Some(Utc::now() + Duration::minutes(10));
                Ok(Some(c))
            });
        credentials
            .expect_find_credential()
            .withf(|_, login| login == "disabled")
            .returning(|_, _| {
                let mut c = credential("rahasia123");
                c.is_active = false;
                Ok(Some(c))
            });

        let svc = service(
            credentials,
            MockSessionRepositoryTrait::new(),
            MockAccountRepositoryTrait::new(),
        );

        let err = svc
            .login(PrincipalKind::Admin, "locked", "rahasia123", &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::AccountLocked { .. }));

        let err = svc
            .login(PrincipalKind::Admin, "disabled", "rahasia123", &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let mut sessions = MockSessionRepositoryTrait::new();
        sessions
            .expect_find_by_token_hash()
            .returning(|_, _| Ok(Some(session(Utc::now() + Duration::days(1), false))));
        sessions
            .expect_rotate()
            .withf(|_, id, old, new, _| *id == 11 && old != new)
            .times(1)
            .returning(|_, _, _, _, _| Ok(true));

        let mut credentials = MockCredentialRepositoryTrait::new();
        credentials
            .expect_find_credential_by_id()
            .returning(|_, _| Ok(Some(credential("rahasia123"))));

        let svc = service(credentials, sessions, MockAccountRepositoryTrait::new());
        let tokens = svc
            .refresh(PrincipalKind::Buyer, &"a".repeat(64))
            .await
            .unwrap();

        assert_ne!(tokens.refresh_token, "a".repeat(64));
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_session() {
        let mut sessions = MockSessionRepositoryTrait::new();
        sessions
            .expect_find_by_token_hash()
            .returning(|_, _| Ok(Some(session(Utc::now() + Duration::days(1), true))));

        let svc = service(
            MockCredentialRepositoryTrait::new(),
            sessions,
            MockAccountRepositoryTrait::new(),
        );
        let err = svc
            .refresh(PrincipalKind::Buyer, &"a".repeat(64))
            .await
            .unwrap_err();

        assert!(matches!(err, CommerceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let mut accounts = MockAccountRepositoryTrait::new();
        accounts
            .expect_buyer_email_taken()
            .withf(|email| email == "budi@tokomakmur.id")
            .returning(|_| Ok(true));

        let svc = service(
            MockCredentialRepositoryTrait::new(),
            MockSessionRepositoryTrait::new(),
            accounts,
        );
        let err = svc
            .register_buyer(RegisterBuyerRequest {
                name: "Budi".to_string(),
                email: "Budi@TokoMakmur.id".to_string(),
                phone: "081234567890".to_string(),
                company_name: None,
                password: "rahasia123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "BUYER_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_change_password_revokes_other_sessions() {
        let mut credentials = MockCredentialRepositoryTrait::new();
        credentials
            .expect_find_credential_by_id()
            .returning(|_, _| Ok(Some(credential("rahasia123"))));
        credentials
            .expect_update_password_hash()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut sessions = MockSessionRepositoryTrait::new();
        sessions
            .expect_revoke_all_except()
            .withf(|_, principal_id, keep| *principal_id == 7 && *keep == Some(11))
            .returning(|_, _, _| Ok(2));

        let svc = service(credentials, sessions, MockAccountRepositoryTrait::new());
        let revoked = svc
            .change_password(
                PrincipalKind::Buyer,
                7,
                11,
                ChangePasswordRequest {
                    old_password: "rahasia123".to_string(),
                    new_password: "rahasiaBaru456".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(revoked, 2);
    }
}
