use domain::{ActorKind, ActorSummary, DirectMessage, Notification, NotificationKind, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 私信的对外表示，字段名与前端约定一致（camelCase）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub body: String,
    pub read: bool,
    pub created_at: Timestamp,
}

impl From<&DirectMessage> for MessageDto {
    fn from(message: &DirectMessage) -> Self {
        Self {
            id: Uuid::from(message.id),
            sender_id: Uuid::from(message.sender_id),
            receiver_id: Uuid::from(message.receiver_id),
            body: message.body.as_str().to_owned(),
            read: message.read,
            created_at: message.created_at,
        }
    }
}

/// 通知里解析出的发送者摘要。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderDto {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<ActorSummary> for SenderDto {
    fn from(summary: ActorSummary) -> Self {
        Self {
            id: Uuid::from(summary.id),
            name: summary.name,
            avatar_url: summary.avatar_url,
        }
    }
}

/// 通知的对外表示。
///
/// `sender` 为解析后的档案摘要；档案已被删除时为 null，客户端按
/// 匿名发送者渲染。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender: Option<SenderDto>,
    pub sender_kind: ActorKind,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: Timestamp,
}

impl NotificationDto {
    pub fn new(notification: &Notification, sender: Option<ActorSummary>) -> Self {
        Self {
            id: Uuid::from(notification.id),
            recipient_id: Uuid::from(notification.recipient_id),
            sender: sender.map(SenderDto::from),
            sender_kind: notification.sender.kind,
            kind: notification.kind,
            title: notification.title.clone(),
            body: notification.body.clone(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}
