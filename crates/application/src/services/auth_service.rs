use std::sync::Arc;

use domain::{
    ClientInfo, DomainError, FullName, LoginEvent, LoginEventId, RepositoryError, Session,
    SessionToken, Timestamp, User, UserEmail, UserId, UserPublic,
};

use crate::{
    clock::Clock,
    dispatcher::RealtimeDispatcher,
    dto::{LoginAction, LoginBroadcast, WarningDto},
    error::ApplicationError,
    password::{PasswordHasher, PlainPassword},
    presence::PresenceTracker,
    repository::{LoginEventRepository, SessionRepository, UserRepository},
};

#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录或注册成功后的结果
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub session: Session,
    pub user: UserPublic,
    pub warning: WarningDto,
}

/// `me` 查询的三种结果
#[derive(Debug, Clone)]
pub enum SessionStatus {
    Anonymous,
    /// 会话已被撤销
    Suspended { until: Timestamp },
    Active { user: UserPublic, warning: WarningDto },
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub session_repository: Arc<dyn SessionRepository>,
    pub login_event_repository: Arc<dyn LoginEventRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub presence: Arc<PresenceTracker>,
    pub dispatcher: Arc<RealtimeDispatcher>,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

fn missing_fields() -> ApplicationError {
    DomainError::invalid_argument("fields", "missing_fields").into()
}

fn generate_token() -> SessionToken {
    let bytes: [u8; 32] = rand::random();
    SessionToken::new(data_encoding::BASE64URL_NOPAD.encode(&bytes))
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn signup(
        &self,
        request: SignupRequest,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, ApplicationError> {
        let full_name = request.full_name.trim();
        let email = request.email.trim();
        let password = match PlainPassword::parse(&request.password) {
            Some(password) if !full_name.is_empty() && !email.is_empty() => password,
            _ => return Err(missing_fields()),
        };

        let full_name = FullName::parse(full_name)?;
        let email = UserEmail::parse(email)?;
        if self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let password_hash = self.deps.password_hasher.hash(password).await?;
        let user = User::register(
            UserId::generate(),
            full_name,
            email,
            password_hash,
            self.deps.clock.now(),
        );
        let user = match self.deps.user_repository.create(user).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict) => return Err(DomainError::UserAlreadyExists.into()),
            Err(err) => return Err(err.into()),
        };
        tracing::info!(user_id = %user.id, "新用户注册");

        let session = self.open_session(&user, user.is_admin).await?;
        self.record_login(user.email.as_str(), Some(user.id), true, client)
            .await;
        self.broadcast(LoginAction::Signup, &user);

        Ok(AuthOutcome {
            session,
            user: user.public(),
            warning: WarningDto::from(&user),
        })
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, ApplicationError> {
        let user = self.check_credentials(&request, client).await?;

        let now = self.deps.clock.now();
        if let Some(until) = user.active_suspension(now) {
            self.record_login(user.email.as_str(), Some(user.id), false, client)
                .await;
            return Err(DomainError::AccountSuspended { until }.into());
        }

        let session = self.open_session(&user, user.is_admin).await?;
        self.record_login(user.email.as_str(), Some(user.id), true, client)
            .await;
        self.broadcast(LoginAction::Login, &user);

        Ok(AuthOutcome {
            session,
            user: user.public(),
            warning: WarningDto::from(&user),
        })
    }

    /// 管理员登录；非管理员账号按凭据错误处理
    pub async fn admin_login(
        &self,
        request: LoginRequest,
        client: &ClientInfo,
    ) -> Result<AuthOutcome, ApplicationError> {
        let user = self.check_credentials(&request, client).await?;
        if !user.is_admin {
            self.record_login(user.email.as_str(), Some(user.id), false, client)
                .await;
            return Err(DomainError::InvalidCredentials.into());
        }

        let session = self.open_session(&user, true).await?;
        self.record_login(user.email.as_str(), Some(user.id), true, client)
            .await;
        self.broadcast(LoginAction::AdminLogin, &user);

        Ok(AuthOutcome {
            session,
            user: user.public(),
            warning: WarningDto::from(&user),
        })
    }

    /// 删除会话并清除在线状态；没有会话时什么也不做
    pub async fn logout(&self, token: Option<&SessionToken>) -> Result<(), ApplicationError> {
        let Some(token) = token else {
            return Ok(());
        };
        let Some(session) = self.deps.session_repository.find(token).await? else {
            return Ok(());
        };

        self.deps.session_repository.delete(token).await?;
        self.deps.presence.clear_presence(session.user_id);

        if let Some(user) = self.deps.user_repository.find_by_id(session.user_id).await? {
            self.broadcast(LoginAction::Logout, &user);
        }
        tracing::info!(user_id = %session.user_id, "用户登出");
        Ok(())
    }

    pub async fn resolve_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Session>, ApplicationError> {
        Ok(self.deps.session_repository.find(token).await?)
    }

    /// 当前会话对应的用户；停用中的用户会被强制登出
    pub async fn session_status(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<SessionStatus, ApplicationError> {
        let Some(token) = token else {
            return Ok(SessionStatus::Anonymous);
        };
        let Some(session) = self.deps.session_repository.find(token).await? else {
            return Ok(SessionStatus::Anonymous);
        };
        let Some(user) = self.deps.user_repository.find_by_id(session.user_id).await? else {
            self.deps.session_repository.delete(token).await?;
            return Ok(SessionStatus::Anonymous);
        };

        if let Some(until) = user.active_suspension(self.deps.clock.now()) {
            self.deps.session_repository.delete(token).await?;
            tracing::info!(user_id = %user.id, until = %until, "停用用户的会话已撤销");
            return Ok(SessionStatus::Suspended { until });
        }

        Ok(SessionStatus::Active {
            user: user.public(),
            warning: WarningDto::from(&user),
        })
    }

    /// 确认警告。失败只记日志，不影响调用方。
    pub async fn acknowledge_warning(&self, user_id: UserId) {
        let result = async {
            if let Some(mut user) = self.deps.user_repository.find_by_id(user_id).await? {
                user.acknowledge_warning(self.deps.clock.now());
                self.deps.user_repository.update(user).await?;
            }
            Ok::<_, RepositoryError>(())
        }
        .await;

        if let Err(err) = result {
            tracing::warn!(user_id = %user_id, error = %err, "确认警告失败");
        }
    }

    /// 启动时保证配置的管理员账号存在
    pub async fn ensure_admin(&self, request: SignupRequest) -> Result<User, ApplicationError> {
        let email = UserEmail::parse(request.email.trim())?;
        let now = self.deps.clock.now();

        if let Some(mut user) = self.deps.user_repository.find_by_email(&email).await? {
            if user.is_admin {
                return Ok(user);
            }
            user.promote_to_admin(now);
            let user = self.deps.user_repository.update(user).await?;
            tracing::info!(user_id = %user.id, "已有账号提升为管理员");
            return Ok(user);
        }

        let password = PlainPassword::parse(&request.password).ok_or_else(missing_fields)?;
        let password_hash = self.deps.password_hasher.hash(password).await?;
        let mut user = User::register(
            UserId::generate(),
            FullName::parse(request.full_name.trim())?,
            email,
            password_hash,
            now,
        );
        user.promote_to_admin(now);
        let user = self.deps.user_repository.create(user).await?;
        tracing::info!(user_id = %user.id, "已创建初始管理员");
        Ok(user)
    }

    /// 校验邮箱、密码和封禁状态，失败时记录一次失败的登录
    async fn check_credentials(
        &self,
        request: &LoginRequest,
        client: &ClientInfo,
    ) -> Result<User, ApplicationError> {
        let raw_email = request.email.trim().to_lowercase();

        let user = match UserEmail::parse(raw_email.as_str()) {
            Ok(email) => self.deps.user_repository.find_by_email(&email).await?,
            Err(_) => None,
        };
        let Some(user) = user else {
            self.record_login(&raw_email, None, false, client).await;
            return Err(DomainError::InvalidCredentials.into());
        };

        // 空密码不交给哈希器，按密码错误处理
        let password_ok = match PlainPassword::parse(&request.password) {
            Some(password) => {
                self.deps
                    .password_hasher
                    .verify(password, &user.password)
                    .await?
            }
            None => false,
        };
        if !password_ok || user.is_banned {
            self.record_login(&raw_email, Some(user.id), false, client)
                .await;
            return Err(DomainError::InvalidCredentials.into());
        }

        Ok(user)
    }

    async fn open_session(&self, user: &User, is_admin: bool) -> Result<Session, ApplicationError> {
        let session = Session {
            token: generate_token(),
            user_id: user.id,
            is_admin,
            created_at: self.deps.clock.now(),
        };
        Ok(self.deps.session_repository.create(session).await?)
    }

    async fn record_login(
        &self,
        email: &str,
        user_id: Option<UserId>,
        success: bool,
        client: &ClientInfo,
    ) {
        let event = LoginEvent {
            id: LoginEventId::generate(),
            user_id,
            email: email.to_owned(),
            success,
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            created_at: self.deps.clock.now(),
        };
        if let Err(err) = self.deps.login_event_repository.record(event).await {
            tracing::warn!(email, success, error = %err, "登录记录写入失败");
        }
    }

    fn broadcast(&self, action: LoginAction, user: &User) {
        let login = LoginBroadcast {
            action,
            user: user.public(),
        };
        if let Err(err) = self.deps.dispatcher.on_login_event(&login) {
            tracing::warn!(user_id = %user.id, error = %err, "登录事件推送失败");
        }
    }
}
