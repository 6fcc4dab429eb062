use serde::{Deserialize, Serialize};

use crate::actor::ActorRef;
use crate::value_objects::{NotificationId, Timestamp, UserId};

/// 通知类别，序列化形式与前端约定一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Follow,
    JobPosted,
    Application,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::JobPosted => "job-posted",
            NotificationKind::Application => "application",
            NotificationKind::System => "system",
        }
    }
}

/// 投递给单个用户的通知。
///
/// 创建后只有已读标记可变；接收者可以一次性清空自己的全部通知。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender: ActorRef,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: Timestamp,
}

impl Notification {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: NotificationId,
        recipient_id: UserId,
        sender: ActorRef,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            recipient_id,
            sender,
            kind,
            title: title.into(),
            body: body.into(),
            read: false,
            created_at,
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
