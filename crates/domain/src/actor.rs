//! 参与者模型。
//!
//! 平台上有两类账号：求职学生与企业招聘者。两类账号各自维护档案，
//! 但在消息和通知里通过 `ActorRef` 以统一方式引用。

use serde::{Deserialize, Serialize};

use crate::value_objects::{Timestamp, UserId};

/// 账号类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Student,
    Recruiter,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Student => "student",
            ActorKind::Recruiter => "recruiter",
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 指向某个账号的多态引用，携带类别以便在正确的档案表中解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    pub kind: ActorKind,
    pub id: UserId,
}

impl ActorRef {
    pub fn new(kind: ActorKind, id: UserId) -> Self {
        Self { kind, id }
    }

    pub fn student(id: UserId) -> Self {
        Self::new(ActorKind::Student, id)
    }

    pub fn recruiter(id: UserId) -> Self {
        Self::new(ActorKind::Recruiter, id)
    }
}

/// 档案中与实时核心相关的字段。
///
/// 求职市场的完整档案由其他服务维护，这里只读取展示通知发送者
/// 所需的最小信息，以及离线时刻写入的 `last_seen_at`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub kind: ActorKind,
    pub name: String,
    pub avatar_url: Option<String>,
    pub last_seen_at: Option<Timestamp>,
}

impl Profile {
    pub fn summary(&self) -> ActorSummary {
        ActorSummary {
            id: self.id,
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// 解析后的发送者摘要，随通知一起返回给客户端。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}
