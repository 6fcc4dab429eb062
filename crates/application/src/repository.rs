use async_trait::async_trait;
use domain::{
    ActorKind, Conversation, DirectMessage, MessageId, Notification, NotificationId,
    ParticipantPair, Profile, RepositoryError, Timestamp, UserId,
};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: DirectMessage) -> Result<DirectMessage, RepositoryError>;

    // 两个方向的完整历史，按 created_at 升序
    async fn find_thread(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;

    // 把 sender -> receiver 方向的未读消息批量置为已读，返回命中行数
    async fn mark_read_from(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<u64, RepositoryError>;

    // 每个对话对方各取最新一条消息
    async fn latest_per_counterparty(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    // 为归一化的参与者对追加一条消息引用；会话不存在则创建。
    // 同一对用户的并发调用必须保持原子，不允许出现两条会话记录。
    async fn append_message(
        &self,
        participants: ParticipantPair,
        message_id: MessageId,
        at: Timestamp,
    ) -> Result<Conversation, RepositoryError>;

    async fn find_by_pair(
        &self,
        participants: ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;

    // 接收者的全部通知，按 created_at 降序
    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> Result<Vec<Notification>, RepositoryError>;

    // 幂等置已读，返回目标是否存在
    async fn mark_read(&self, id: NotificationId) -> Result<bool, RepositoryError>;

    async fn delete_all_for_recipient(&self, recipient_id: UserId)
        -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    // 按账号类别在对应档案表中查找
    async fn find(&self, kind: ActorKind, id: UserId) -> Result<Option<Profile>, RepositoryError>;

    // 连接断开时写入最后在线时间；类别未知，两张表都尝试
    async fn record_last_seen(&self, id: UserId, at: Timestamp) -> Result<(), RepositoryError>;
}
