//! 内存仓储实现。
//!
//! 供单元测试和无数据库的本地运行使用，行为与 PostgreSQL 实现
//! 保持一致：会话追加在单个写锁内完成，排序规则与 SQL 查询相同。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{
    ActorKind, Conversation, ConversationId, DirectMessage, MessageId, Notification,
    NotificationId, ParticipantPair, Profile, RepositoryError, Timestamp, UserId,
};

use crate::repository::{
    ConversationRepository, MessageRepository, NotificationRepository, ProfileRepository,
};

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<DirectMessage>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn insert(&self, message: DirectMessage) -> Result<DirectMessage, RepositoryError> {
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(message)
    }

    async fn find_thread(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut thread: Vec<DirectMessage> = messages
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b)
                    || (m.sender_id == b && m.receiver_id == a)
            })
            .cloned()
            .collect();
        thread.sort_by_key(|m| m.created_at);
        Ok(thread)
    }

    async fn mark_read_from(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.write().await;
        let mut updated = 0;
        for message in messages.iter_mut() {
            if message.sender_id == sender_id && message.receiver_id == receiver_id && !message.read
            {
                message.mark_read();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn latest_per_counterparty(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DirectMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut involved: Vec<&DirectMessage> = messages
            .iter()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .collect();
        involved.sort_by_key(|m| std::cmp::Reverse(m.created_at));

        let mut latest: Vec<DirectMessage> = Vec::new();
        let mut seen: HashSet<UserId> = HashSet::new();
        for message in involved {
            let counterparty = message.counterparty_of(user_id);
            if seen.insert(counterparty) {
                latest.push(message.clone());
            }
        }
        Ok(latest)
    }
}

#[derive(Default)]
pub struct MemoryConversationRepository {
    conversations: RwLock<HashMap<ParticipantPair, Conversation>>,
}

impl MemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ConversationRepository for MemoryConversationRepository {
    async fn append_message(
        &self,
        participants: ParticipantPair,
        message_id: MessageId,
        at: Timestamp,
    ) -> Result<Conversation, RepositoryError> {
        // 单个写锁内完成查找或创建，与数据库的 upsert 同样原子
        let mut conversations = self.conversations.write().await;
        let conversation = conversations.entry(participants).or_insert_with(|| {
            Conversation::new(ConversationId::from(Uuid::new_v4()), participants, at)
        });
        conversation.record_message(message_id, at);
        Ok(conversation.clone())
    }

    async fn find_by_pair(
        &self,
        participants: ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(&participants).cloned())
    }
}

#[derive(Default)]
pub struct MemoryNotificationRepository {
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = self.notifications.read().await;
        let mut items: Vec<Notification> = notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        items.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok(items)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<bool, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.mark_read();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.recipient_id != recipient_id);
        Ok((before - notifications.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryProfileRepository {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl MemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置档案，供测试环境使用。
    pub async fn put(&self, profile: Profile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.id, profile);
    }
}

#[async_trait]
impl ProfileRepository for MemoryProfileRepository {
    async fn find(&self, kind: ActorKind, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .get(&id)
            .filter(|profile| profile.kind == kind)
            .cloned())
    }

    async fn record_last_seen(&self, id: UserId, at: Timestamp) -> Result<(), RepositoryError> {
        // 档案不存在时静默跳过，与数据库实现的 0 行更新一致
        let mut profiles = self.profiles.write().await;
        if let Some(profile) = profiles.get_mut(&id) {
            profile.last_seen_at = Some(at);
        }
        Ok(())
    }
}
