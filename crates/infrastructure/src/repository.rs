use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use application::repository::{
    ConversationRepository, MessageRepository, NotificationRepository, ProfileRepository,
};
use domain::{
    ActorKind, ActorRef, Conversation, ConversationId, DirectMessage, MessageBody, MessageId,
    Notification, NotificationId, NotificationKind, ParticipantPair, Profile, RepositoryError,
    Timestamp, UserId,
};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

// 枚举在库里存 TEXT，读出时解析
fn parse_actor_kind(value: &str) -> Result<ActorKind, RepositoryError> {
    match value {
        "student" => Ok(ActorKind::Student),
        "recruiter" => Ok(ActorKind::Recruiter),
        other => Err(invalid_data(format!("unknown actor kind: {other}"))),
    }
}

fn parse_notification_kind(value: &str) -> Result<NotificationKind, RepositoryError> {
    match value {
        "follow" => Ok(NotificationKind::Follow),
        "job-posted" => Ok(NotificationKind::JobPosted),
        "application" => Ok(NotificationKind::Application),
        "system" => Ok(NotificationKind::System),
        other => Err(invalid_data(format!("unknown notification kind: {other}"))),
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    body: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for DirectMessage {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let body = MessageBody::new(value.body).map_err(|err| invalid_data(err.to_string()))?;

        Ok(DirectMessage {
            id: MessageId::from(value.id),
            sender_id: UserId::from(value.sender_id),
            receiver_id: UserId::from(value.receiver_id),
            body,
            read: value.read,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ConversationRecord {
    id: Uuid,
    participant_low: Uuid,
    participant_high: Uuid,
    message_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConversationRecord> for Conversation {
    fn from(value: ConversationRecord) -> Self {
        Conversation {
            id: ConversationId::from(value.id),
            participants: ParticipantPair::new(
                UserId::from(value.participant_low),
                UserId::from(value.participant_high),
            ),
            message_ids: value.message_ids.into_iter().map(MessageId::from).collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRecord {
    id: Uuid,
    recipient_id: Uuid,
    sender_kind: String,
    sender_id: Uuid,
    kind: String,
    title: String,
    body: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRecord> for Notification {
    type Error = RepositoryError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        let sender = ActorRef::new(
            parse_actor_kind(&value.sender_kind)?,
            UserId::from(value.sender_id),
        );

        Ok(Notification {
            id: NotificationId::from(value.id),
            recipient_id: UserId::from(value.recipient_id),
            sender,
            kind: parse_notification_kind(&value.kind)?,
            title: value.title,
            body: value.body,
            read: value.read,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProfileRecord {
    id: Uuid,
    name: String,
    avatar_url: Option<String>,
    last_seen_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    // 表本身决定类别，记录里不再存一份
    fn into_profile(self, kind: ActorKind) -> Profile {
        Profile {
            id: UserId::from(self.id),
            kind,
            name: self.name,
            avatar_url: self.avatar_url,
            last_seen_at: self.last_seen_at,
        }
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
    async fn insert(&self, message: DirectMessage) -> Result<DirectMessage, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO direct_messages (id, sender_id, receiver_id, body, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sender_id, receiver_id, body, read, created_at
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(message.sender_id))
        .bind(Uuid::from(message.receiver_id))
        .bind(message.body.as_str())
        .bind(message.read)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        DirectMessage::try_from(record)
    }

    async fn find_thread(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, receiver_id, body, read, created_at
            FROM direct_messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(Uuid::from(a))
        .bind(Uuid::from(b))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(DirectMessage::try_from).collect()
    }

    async fn mark_read_from(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE direct_messages
            SET read = TRUE
            WHERE sender_id = $1 AND receiver_id = $2 AND read = FALSE
            "#,
        )
        .bind(Uuid::from(sender_id))
        .bind(Uuid::from(receiver_id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn latest_per_counterparty(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        // 先算出每条消息的对方是谁，再按对方分组取最新一条
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT DISTINCT ON (counterparty)
                   id, sender_id, receiver_id, body, read, created_at
            FROM (
                SELECT id, sender_id, receiver_id, body, read, created_at,
                       CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS counterparty
                FROM direct_messages
                WHERE sender_id = $1 OR receiver_id = $1
            ) AS exchanges
            ORDER BY counterparty, created_at DESC
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(DirectMessage::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn append_message(
        &self,
        participants: ParticipantPair,
        message_id: MessageId,
        at: Timestamp,
    ) -> Result<Conversation, RepositoryError> {
        // 唯一约束上的 upsert：同一对用户并发发首条消息也只会留下一条会话
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high, message_ids, created_at, updated_at)
            VALUES ($1, $2, $3, ARRAY[$4]::uuid[], $5, $5)
            ON CONFLICT (participant_low, participant_high)
            DO UPDATE SET message_ids = array_append(conversations.message_ids, $4), updated_at = $5
            RETURNING id, participant_low, participant_high, message_ids, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Uuid::from(participants.low()))
        .bind(Uuid::from(participants.high()))
        .bind(Uuid::from(message_id))
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(Conversation::from(record))
    }

    async fn find_by_pair(
        &self,
        participants: ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT id, participant_low, participant_high, message_ids, created_at, updated_at
            FROM conversations
            WHERE participant_low = $1 AND participant_high = $2
            "#,
        )
        .bind(Uuid::from(participants.low()))
        .bind(Uuid::from(participants.high()))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Conversation::from))
    }
}

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
    async fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let record = sqlx::query_as::<_, NotificationRecord>(
            r#"
            INSERT INTO notifications (id, recipient_id, sender_kind, sender_id, kind, title, body, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, recipient_id, sender_kind, sender_id, kind, title, body, read, created_at
            "#,
        )
        .bind(Uuid::from(notification.id))
        .bind(Uuid::from(notification.recipient_id))
        .bind(notification.sender.kind.as_str())
        .bind(Uuid::from(notification.sender.id))
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(notification.read)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Notification::try_from(record)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT id, recipient_id, sender_kind, sender_id, kind, title, body, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Uuid::from(recipient_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: NotificationId) -> Result<bool, RepositoryError> {
        // RETURNING 区分"已更新"与"不存在"
        let updated: Option<Uuid> =
            sqlx::query_scalar(r#"UPDATE notifications SET read = TRUE WHERE id = $1 RETURNING id"#)
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        Ok(updated.is_some())
    }

    async fn delete_all_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(r#"DELETE FROM notifications WHERE recipient_id = $1"#)
            .bind(Uuid::from(recipient_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find(&self, kind: ActorKind, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        // 两类账号各有一张档案表，按引用声明的类别查
        let sql = match kind {
            ActorKind::Student => {
                r#"SELECT id, name, avatar_url, last_seen_at FROM students WHERE id = $1"#
            }
            ActorKind::Recruiter => {
                r#"SELECT id, name, avatar_url, last_seen_at FROM recruiters WHERE id = $1"#
            }
        };

        let record = sqlx::query_as::<_, ProfileRecord>(sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(record.map(|record| record.into_profile(kind)))
    }

    async fn record_last_seen(&self, id: UserId, at: Timestamp) -> Result<(), RepositoryError> {
        // 断开连接时只有用户 id，类别未知：先试学生表，未命中再试招聘者表。
        // 两张表都没有该账号时静默返回。
        let updated = sqlx::query(r#"UPDATE students SET last_seen_at = $2 WHERE id = $1"#)
            .bind(Uuid::from(id))
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .rows_affected();

        if updated == 0 {
            sqlx::query(r#"UPDATE recruiters SET last_seen_at = $2 WHERE id = $1"#)
                .bind(Uuid::from(id))
                .bind(at)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub message_repository: Arc<PgMessageRepository>,
    pub conversation_repository: Arc<PgConversationRepository>,
    pub notification_repository: Arc<PgNotificationRepository>,
    pub profile_repository: Arc<PgProfileRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            conversation_repository: Arc::new(PgConversationRepository::new(pool.clone())),
            notification_repository: Arc::new(PgNotificationRepository::new(pool.clone())),
            profile_repository: Arc::new(PgProfileRepository::new(pool.clone())),
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
