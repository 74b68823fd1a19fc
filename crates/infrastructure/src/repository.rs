use std::sync::Arc;

use application::repository::{
    LoginEventRepository, MessageRepository, NotificationRepository, ReportRepository,
    SessionRepository, UserRepository,
};
use async_trait::async_trait;
use domain::{
    DirectMessage, FullName, LoginEvent, LoginEventId, MessageId, MessageText, NewNotification,
    Notification, NotificationId, PasswordHash, Report, ReportId, ReportStatus, RepositoryError,
    Session, SessionToken, Timestamp, User, UserEmail, UserId,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepositoryError::Conflict,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    full_name: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    is_banned: bool,
    suspended_until: Option<Timestamp>,
    warning_message: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let full_name =
            FullName::parse(value.full_name).map_err(|err| invalid_data(err.to_string()))?;
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            full_name,
            email,
            password,
            is_admin: value.is_admin,
            is_banned: value.is_banned,
            suspended_until: value.suspended_until,
            warning_message: value.warning_message,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    text: String,
    created_at: Timestamp,
}

impl TryFrom<MessageRecord> for DirectMessage {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let text = MessageText::new(value.text).map_err(|err| invalid_data(err.to_string()))?;
        Ok(DirectMessage::new(
            MessageId::from(value.id),
            UserId::from(value.sender_id),
            UserId::from(value.recipient_id),
            text,
            value.created_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct NotificationRecord {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    icon: String,
    title: String,
    content: String,
    link: String,
    is_read: bool,
    created_at: Timestamp,
}

impl From<NotificationRecord> for Notification {
    fn from(value: NotificationRecord) -> Self {
        Notification {
            id: NotificationId::from(value.id),
            user_id: UserId::from(value.user_id),
            kind: value.kind,
            icon: value.icon,
            title: value.title,
            content: value.content,
            link: value.link,
            read: value.is_read,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ReportRecord {
    id: Uuid,
    reporter_id: Uuid,
    target_user_id: Uuid,
    reason: String,
    details: String,
    status: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TryFrom<ReportRecord> for Report {
    type Error = RepositoryError;

    fn try_from(value: ReportRecord) -> Result<Self, Self::Error> {
        let status = value
            .status
            .parse::<ReportStatus>()
            .map_err(|err| invalid_data(err.to_string()))?;
        Ok(Report {
            id: ReportId::from(value.id),
            reporter_id: UserId::from(value.reporter_id),
            target_user_id: UserId::from(value.target_user_id),
            reason: value.reason,
            details: value.details,
            status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LoginEventRecord {
    id: Uuid,
    user_id: Option<Uuid>,
    email: String,
    success: bool,
    ip: String,
    user_agent: String,
    created_at: Timestamp,
}

impl From<LoginEventRecord> for LoginEvent {
    fn from(value: LoginEventRecord) -> Self {
        LoginEvent {
            id: LoginEventId::from(value.id),
            user_id: value.user_id.map(UserId::from),
            email: value.email,
            success: value.success,
            ip: value.ip,
            user_agent: value.user_agent,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionRecord {
    token: String,
    user_id: Uuid,
    is_admin: bool,
    created_at: Timestamp,
}

impl From<SessionRecord> for Session {
    fn from(value: SessionRecord) -> Self {
        Session {
            token: SessionToken::new(value.token),
            user_id: UserId::from(value.user_id),
            is_admin: value.is_admin,
            created_at: value.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, full_name, email, password_hash, is_admin, is_banned, \
                            suspended_until, warning_message, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, full_name, email, password_hash, is_admin, is_banned,
                               suspended_until, warning_message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(user.id))
        .bind(user.full_name.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(user.is_admin)
        .bind(user.is_banned)
        .bind(user.suspended_until)
        .bind(user.warning_message.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
            SET full_name = $2, email = $3, password_hash = $4, is_admin = $5, is_banned = $6,
                suspended_until = $7, warning_message = $8, updated_at = $9
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(user.id))
        .bind(user.full_name.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(user.is_admin)
        .bind(user.is_banned)
        .bind(user.suspended_until)
        .bind(user.warning_message.as_deref())
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(count.max(0) as u64)
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: DirectMessage) -> Result<DirectMessage, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO direct_messages (id, sender_id, recipient_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sender_id, recipient_id, text, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.sender_id))
        .bind(Uuid::from(message.recipient_id))
        .bind(message.text.as_str())
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        DirectMessage::try_from(record)
    }

    async fn list_thread(
        &self,
        user_a: UserId,
        user_b: UserId,
        limit: u32,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, recipient_id, text, created_at
            FROM direct_messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(Uuid::from(user_a))
        .bind(Uuid::from(user_b))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut items: Vec<DirectMessage> = records
            .into_iter()
            .map(DirectMessage::try_from)
            .collect::<Result<_, _>>()?;
        items.reverse();
        Ok(items)
    }

    async fn list_contact_ids(&self, user_id: UserId) -> Result<Vec<UserId>, RepositoryError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT contact_id FROM (
                SELECT CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS contact_id,
                       MAX(created_at) AS last_at
                FROM direct_messages
                WHERE sender_id = $1 OR recipient_id = $1
                GROUP BY 1
            ) AS contacts
            ORDER BY last_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(ids.into_iter().map(UserId::from).collect())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM direct_messages WHERE sender_id = $1 OR recipient_id = $1")
                .bind(Uuid::from(user_id))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, icon, title, content, link, is_read, created_at";

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, RepositoryError> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            INSERT INTO notifications (id, user_id, kind, icon, title, content, link)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(Uuid::from(NotificationId::generate()))
        .bind(Uuid::from(notification.user_id))
        .bind(&notification.kind)
        .bind(&notification.icon)
        .bind(&notification.title)
        .bind(&notification.content)
        .bind(&notification.link)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let records = sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(Uuid::from(user_id))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Notification::from).collect())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(Uuid::from(user_id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(Uuid::from(user_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

const REPORT_COLUMNS: &str =
    "id, reporter_id, target_user_id, reason, details, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create(&self, report: Report) -> Result<Report, RepositoryError> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            r#"
            INSERT INTO reports (id, reporter_id, target_user_id, reason, details, status,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(Uuid::from(report.id))
        .bind(Uuid::from(report.reporter_id))
        .bind(Uuid::from(report.target_user_id))
        .bind(&report.reason)
        .bind(&report.details)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .bind(report.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Report::try_from(record)
    }

    async fn update(&self, report: Report) -> Result<Report, RepositoryError> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            r#"
            UPDATE reports
            SET reason = $2, details = $3, status = $4, updated_at = $5
            WHERE id = $1
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(Uuid::from(report.id))
        .bind(&report.reason)
        .bind(&report.details)
        .bind(report.status.as_str())
        .bind(report.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        Report::try_from(record)
    }

    async fn find_by_id(&self, id: ReportId) -> Result<Option<Report>, RepositoryError> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Report::try_from).transpose()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Report>, RepositoryError> {
        let records = sqlx::query_as::<_, ReportRecord>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Report::try_from).collect()
    }

    async fn count_by_status(&self, status: ReportStatus) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(count.max(0) as u64)
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM reports WHERE reporter_id = $1 OR target_user_id = $1")
                .bind(Uuid::from(user_id))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgLoginEventRepository {
    pool: PgPool,
}

impl PgLoginEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginEventRepository for PgLoginEventRepository {
    async fn record(&self, event: LoginEvent) -> Result<LoginEvent, RepositoryError> {
        let record = sqlx::query_as::<_, LoginEventRecord>(
            r#"
            INSERT INTO login_events (id, user_id, email, success, ip, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, email, success, ip, user_agent, created_at
            "#,
        )
        .bind(Uuid::from(event.id))
        .bind(event.user_id.map(Uuid::from))
        .bind(&event.email)
        .bind(event.success)
        .bind(&event.ip)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<LoginEvent>, RepositoryError> {
        let records = sqlx::query_as::<_, LoginEventRecord>(
            r#"
            SELECT id, user_id, email, success, ip, user_agent, created_at
            FROM login_events
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(LoginEvent::from).collect())
    }

    async fn detach_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE login_events SET user_id = NULL WHERE user_id = $1")
            .bind(Uuid::from(user_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO sessions (token, user_id, is_admin, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING token, user_id, is_admin, created_at
            "#,
        )
        .bind(session.token.as_str())
        .bind(Uuid::from(session.user_id))
        .bind(session.is_admin)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn find(&self, token: &SessionToken) -> Result<Option<Session>, RepositoryError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT token, user_id, is_admin, created_at FROM sessions WHERE token = $1",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Session::from))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(Uuid::from(user_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub message_repository: Arc<PgMessageRepository>,
    pub notification_repository: Arc<PgNotificationRepository>,
    pub report_repository: Arc<PgReportRepository>,
    pub login_event_repository: Arc<PgLoginEventRepository>,
    pub session_repository: Arc<PgSessionRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            notification_repository: Arc::new(PgNotificationRepository::new(pool.clone())),
            report_repository: Arc::new(PgReportRepository::new(pool.clone())),
            login_event_repository: Arc::new(PgLoginEventRepository::new(pool.clone())),
            session_repository: Arc::new(PgSessionRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
