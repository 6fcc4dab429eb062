//! 会话模型。
//!
//! 每对用户最多存在一个会话，参与者按固定顺序归一化，
//! 因此 (A, B) 和 (B, A) 命中同一条记录。

use serde::{Deserialize, Serialize};

use crate::value_objects::{ConversationId, MessageId, Timestamp, UserId};

/// 归一化的参与者对：低位在前，高位在后。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    /// 构造时对两个用户排序，保证无序对只有一种表示。
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.low == user_id || self.high == user_id
    }
}

/// 一对用户的私信会话。
///
/// 消息引用按到达顺序追加，正常运行中不会删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: ParticipantPair,
    pub message_ids: Vec<MessageId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn new(id: ConversationId, participants: ParticipantPair, created_at: Timestamp) -> Self {
        Self {
            id,
            participants,
            message_ids: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn record_message(&mut self, message_id: MessageId, at: Timestamp) {
        self.message_ids.push(message_id);
        self.updated_at = at;
    }
}
