//! Fakes and wiring shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use studio_auth::{
    AuthConfig, AuthService, AuthorizationUrl, ExtractError, GatewayError, IssuedToken,
    LlmAdminService, LlmGatewayAdmin, MemorySessionStore, MemoryUserDirectory, OAuthGateway,
    RbacService, SessionStore, StoreError, TokenGate, TokenIssuer, UidExtractor, UserRepository,
};
use studio_core::{
    AdminUser, LlmModelConfig, LlmModelSpec, LlmProviderConfig, LlmProviderConfigView,
    LlmProviderType, LoginInfo, Me, Page, Role, Session, SessionId, Token, TokenPair,
};

pub const ACCESS_TOKEN: &str = "access-token";

pub fn login_info(user_id: &str, email: &str) -> LoginInfo {
    LoginInfo {
        user_id: user_id.to_string(),
        email: email.to_string(),
        github_id: None,
        password_enabled: false,
        oauth_connections: vec![],
    }
}

/// What the fake identity provider answers for the login-info lookup.
#[derive(Debug, Clone)]
pub enum LoginInfoReply {
    Info(LoginInfo),
    Fail,
    Hang,
}

#[derive(Debug)]
pub struct FakeGateway {
    pub reply: Mutex<LoginInfoReply>,
    pub reject_code: bool,
}

impl FakeGateway {
    pub fn answering(reply: LoginInfoReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            reject_code: false,
        }
    }

    pub fn set_reply(&self, reply: LoginInfoReply) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl OAuthGateway for FakeGateway {
    async fn authorization_url(
        &self,
        provider: &str,
        redirect_url: &str,
    ) -> Result<AuthorizationUrl, GatewayError> {
        if redirect_url.is_empty() {
            return Err(GatewayError::Rejected("redirect url".to_string()));
        }
        Ok(AuthorizationUrl {
            url: format!("https://idp.example.com/{provider}?redirect={redirect_url}"),
            state: "state-1".to_string(),
        })
    }

    async fn login_by_oauth(&self, code: &str, _state: &str) -> Result<TokenPair, GatewayError> {
        if self.reject_code || code.is_empty() {
            return Err(GatewayError::Rejected("code".to_string()));
        }
        Ok(TokenPair {
            access_token: Token::new(ACCESS_TOKEN, 1_000),
            refresh_token: Token::new("refresh-token", 2_000),
            token_type: "Bearer".to_string(),
        })
    }

    async fn current_user_login_info(
        &self,
        _access_token: &str,
    ) -> Result<LoginInfo, GatewayError> {
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            LoginInfoReply::Info(info) => Ok(info),
            LoginInfoReply::Fail => Err(GatewayError::Unavailable("idp down".to_string())),
            LoginInfoReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Unavailable("unreachable".to_string()))
            }
        }
    }
}

#[derive(Debug)]
pub struct FakeExtractor {
    pub result: Result<String, ExtractError>,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn returning(result: Result<String, ExtractError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UidExtractor for FakeExtractor {
    fn extract_user_id(&self, _access_token: &str) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[derive(Debug, Default)]
pub struct FakeAdmin {
    pub providers: Mutex<Vec<LlmProviderConfigView>>,
    pub models: Mutex<Vec<LlmModelSpec>>,
    pub last_api_key: Mutex<Option<String>>,
    pub writes: AtomicUsize,
}

impl FakeAdmin {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmGatewayAdmin for FakeAdmin {
    async fn upsert_provider_config(
        &self,
        config: &LlmProviderConfig,
    ) -> Result<(), GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_api_key.lock().unwrap() = Some(config.api_key.expose().to_string());

        let mut providers = self.providers.lock().unwrap();
        providers.retain(|p| p.provider != config.provider);
        providers.push(LlmProviderConfigView {
            provider: config.provider,
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            api_key_present: !config.api_key.is_empty(),
        });
        Ok(())
    }

    async fn delete_provider_config(&self, provider: LlmProviderType) -> Result<(), GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.providers
            .lock()
            .unwrap()
            .retain(|p| p.provider != provider);
        Ok(())
    }

    async fn list_provider_configs(&self) -> Result<Vec<LlmProviderConfigView>, GatewayError> {
        Ok(self.providers.lock().unwrap().clone())
    }

    async fn upsert_model(&self, config: &LlmModelConfig) -> Result<String, GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}:{}", config.provider, config.upstream_model);
        let mut models = self.models.lock().unwrap();
        models.retain(|m| m.id != id);
        models.push(LlmModelSpec {
            id: id.clone(),
            provider: config.provider,
            capabilities: config.capabilities.clone(),
            upstream_model: config.upstream_model.clone(),
        });
        Ok(id)
    }

    async fn delete_model(&self, id: &str) -> Result<(), GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().retain(|m| m.id != id);
        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<LlmModelSpec>, GatewayError> {
        Ok(self.models.lock().unwrap().clone())
    }
}

#[derive(Debug, Default)]
pub struct FakeIssuer {
    pub last_request: Mutex<Option<(String, i64, Vec<String>)>>,
}

#[async_trait]
impl TokenIssuer for FakeIssuer {
    async fn issue_token(
        &self,
        subject: &str,
        ttl_seconds: i64,
        allowed_model_ids: &[String],
    ) -> Result<IssuedToken, GatewayError> {
        *self.last_request.lock().unwrap() =
            Some((subject.to_string(), ttl_seconds, allowed_model_ids.to_vec()));
        Ok(IssuedToken {
            token: format!("dp-{subject}"),
            expires_at_unix: 1_700_000_000 + ttl_seconds,
        })
    }
}

/// Every service wired over in-memory stores and the fakes above.
/// User directory whose role lookups fail with a backend error.
///
/// Everything else goes to an in-memory directory.
#[derive(Debug, Default)]
pub struct BrokenRoleLookups {
    pub inner: MemoryUserDirectory,
    pub role_writes: AtomicUsize,
}

impl BrokenRoleLookups {
    pub fn role_writes(&self) -> usize {
        self.role_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for BrokenRoleLookups {
    async fn ensure_exists(&self, user_id: &str) -> Result<(), StoreError> {
        self.inner.ensure_exists(user_id).await
    }

    async fn save_login_info(&self, info: &LoginInfo) -> Result<(), StoreError> {
        self.inner.save_login_info(info).await
    }

    async fn get_role(&self, _user_id: &str) -> Result<Role, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn set_role(&self, user_id: &str, role: Role) -> Result<(), StoreError> {
        self.role_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_role(user_id, role).await
    }

    async fn list_users(&self, page: Page) -> Result<Vec<AdminUser>, StoreError> {
        self.inner.list_users(page).await
    }

    async fn get_me(&self, user_id: &str) -> Result<Me, StoreError> {
        self.inner.get_me(user_id).await
    }

    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<(), StoreError> {
        self.inner.set_nickname(user_id, nickname).await
    }
}

pub struct Harness {
    pub config: Arc<AuthConfig>,
    pub gateway: Arc<FakeGateway>,
    pub sessions: Arc<MemorySessionStore>,
    pub users: Arc<MemoryUserDirectory>,
    pub admin: Arc<FakeAdmin>,
    pub issuer: Arc<FakeIssuer>,
    pub auth: AuthService,
    pub rbac: RbacService,
    pub llm: LlmAdminService,
    pub tokens: TokenGate,
}

impl Harness {
    pub fn new(config: AuthConfig, reply: LoginInfoReply) -> Self {
        let config = Arc::new(config);
        let gateway = Arc::new(FakeGateway::answering(reply));
        let sessions = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let admin = Arc::new(FakeAdmin::default());
        let issuer = Arc::new(FakeIssuer::default());

        let auth = AuthService::new(
            gateway.clone(),
            sessions.clone(),
            users.clone(),
            config.clone(),
        );
        let policy = auth.policy();
        let rbac = RbacService::new(policy.clone(), users.clone(), config.clone());
        let llm = LlmAdminService::new(policy.clone(), admin.clone(), config.clone());
        let tokens = TokenGate::new(policy, issuer.clone(), config.clone());

        Self {
            config,
            gateway,
            sessions,
            users,
            admin,
            issuer,
            auth,
            rbac,
            llm,
            tokens,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            AuthConfig::default(),
            LoginInfoReply::Info(login_info("u-1", "u1@example.com")),
        )
    }

    /// Store a live session for `user_id` without going through OAuth.
    pub async fn session_for(&self, user_id: &str) -> SessionId {
        let id = SessionId::generate();
        self.sessions
            .save(
                &id,
                &Session::new(user_id, TokenPair::default()),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();
        id
    }

    /// Session for a user who holds `role`.
    pub async fn session_with_role(&self, user_id: &str, role: Role) -> SessionId {
        self.users.set_role(user_id, role).await.unwrap();
        self.session_for(user_id).await
    }
}
