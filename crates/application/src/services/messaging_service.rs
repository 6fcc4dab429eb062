use std::collections::HashMap;
use std::sync::Arc;

use domain::{DirectMessage, MessageBody, MessageId, ParticipantPair, UserId};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::MessageDto,
    error::ApplicationError,
    events::ServerEvent,
    hub::RealtimeHub,
    repository::{ConversationRepository, MessageRepository},
};

#[derive(Debug, Clone)]
pub struct SendDirectMessageRequest {
    pub sender_id: Uuid, // 发送者（从JWT获取）
    pub receiver_id: Uuid,
    pub body: String,
}

pub struct MessagingServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub conversation_repository: Arc<dyn ConversationRepository>,
    pub clock: Arc<dyn Clock>,
    pub hub: Arc<RealtimeHub>,
}

pub struct MessagingService {
    deps: MessagingServiceDependencies,
}

impl MessagingService {
    pub fn new(deps: MessagingServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发送私信：先落库，再把消息登记到会话，最后尽力投递。
    ///
    /// 接收者是否存在不做校验，离线接收者的消息留在库里等待拉取。
    pub async fn send(
        &self,
        request: SendDirectMessageRequest,
    ) -> Result<DirectMessage, ApplicationError> {
        let sender_id = UserId::from(request.sender_id);
        let receiver_id = UserId::from(request.receiver_id);

        let body = MessageBody::new(request.body)?;
        let now = self.deps.clock.now();

        let message = DirectMessage::new(
            MessageId::from(Uuid::new_v4()),
            sender_id,
            receiver_id,
            body,
            now,
        );

        let stored = self.deps.message_repository.insert(message).await?;

        self.deps
            .conversation_repository
            .append_message(ParticipantPair::new(sender_id, receiver_id), stored.id, now)
            .await?;

        // 持久化成功后才投递；投递失败不影响发送结果
        self.deps
            .hub
            .route_to(receiver_id, ServerEvent::MessageNew(MessageDto::from(&stored)))
            .await;

        Ok(stored)
    }

    /// 拉取与某个用户的完整对话。
    ///
    /// 副作用：对方发给请求者的未读消息会先被置为已读，返回的
    /// 快照反映更新后的状态。此处不发送已读回执事件。
    pub async fn get_thread(
        &self,
        requester_id: Uuid,
        counterparty_id: Uuid,
    ) -> Result<Vec<DirectMessage>, ApplicationError> {
        let requester_id = UserId::from(requester_id);
        let counterparty_id = UserId::from(counterparty_id);

        self.deps
            .message_repository
            .mark_read_from(counterparty_id, requester_id)
            .await?;

        let thread = self
            .deps
            .message_repository
            .find_thread(requester_id, counterparty_id)
            .await?;

        Ok(thread)
    }

    /// 把 sender -> reader 方向的未读消息批量置为已读，并向原发送者
    /// 推送已读回执。回执是尽力而为的，发送者离线就直接丢弃。
    pub async fn mark_thread_read(
        &self,
        sender_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, ApplicationError> {
        let sender = UserId::from(sender_id);
        let reader = UserId::from(reader_id);

        let updated = self
            .deps
            .message_repository
            .mark_read_from(sender, reader)
            .await?;

        self.deps
            .hub
            .route_to(sender, ServerEvent::MessagesRead { reader_id })
            .await;

        Ok(updated)
    }

    /// 会话列表预览：每个对话对方取最新一条消息，按对方ID索引。
    pub async fn latest_per_counterparty(
        &self,
        user_id: Uuid,
    ) -> Result<HashMap<Uuid, DirectMessage>, ApplicationError> {
        let user_id = UserId::from(user_id);

        let items = self
            .deps
            .message_repository
            .latest_per_counterparty(user_id)
            .await?;

        let mut latest = HashMap::with_capacity(items.len());
        for message in items {
            latest.insert(Uuid::from(message.counterparty_of(user_id)), message);
        }
        Ok(latest)
    }
}
