//! 求职平台实时核心的领域模型
//!
//! 包含私信、会话、通知与参与者档案等核心实体，以及相关的业务规则。

pub mod actor;
pub mod conversation;
pub mod errors;
pub mod message;
pub mod notification;
pub mod value_objects;

// 重新导出常用类型
pub use actor::{ActorKind, ActorRef, ActorSummary, Profile};
pub use conversation::{Conversation, ParticipantPair};
pub use errors::{DomainError, RepositoryError};
pub use message::DirectMessage;
pub use notification::{Notification, NotificationKind};
pub use value_objects::{
    ConversationId, MessageBody, MessageId, NotificationId, Timestamp, UserId,
};
