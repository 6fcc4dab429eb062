use crate::value_objects::{MessageBody, MessageId, Timestamp, UserId};

/// 两个用户之间的一条私信。
///
/// 创建后除已读标记外不可变；没有编辑或删除操作。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: MessageBody,
    pub read: bool,
    pub created_at: Timestamp,
}

impl DirectMessage {
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        body: MessageBody,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            sender_id,
            receiver_id,
            body,
            read: false,
            created_at,
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }

    /// 给定消息一方的用户，返回对话的另一方。
    pub fn counterparty_of(&self, user_id: UserId) -> UserId {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}
