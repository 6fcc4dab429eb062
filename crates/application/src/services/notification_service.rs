use std::sync::Arc;

use domain::{
    ActorKind, ActorRef, ActorSummary, DomainError, Notification, NotificationId,
    NotificationKind, UserId,
};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::NotificationDto,
    error::ApplicationError,
    events::ServerEvent,
    hub::RealtimeHub,
    repository::{NotificationRepository, ProfileRepository},
};

#[derive(Debug, Clone)]
pub struct CreateNotificationRequest {
    pub recipient_id: Uuid,
    pub sender_kind: ActorKind,
    pub sender_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

pub struct NotificationServiceDependencies {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub clock: Arc<dyn Clock>,
    pub hub: Arc<RealtimeHub>,
}

pub struct NotificationService {
    deps: NotificationServiceDependencies,
}

impl NotificationService {
    pub fn new(deps: NotificationServiceDependencies) -> Self {
        Self { deps }
    }

    /// 创建通知并尽力实时投递。
    ///
    /// 投递失败不重试；接收者下次拉取列表时自然看到错过的通知。
    pub async fn create(
        &self,
        request: CreateNotificationRequest,
    ) -> Result<NotificationDto, ApplicationError> {
        let recipient_id = UserId::from(request.recipient_id);
        let sender = ActorRef::new(request.sender_kind, UserId::from(request.sender_id));

        let notification = Notification::new(
            NotificationId::from(Uuid::new_v4()),
            recipient_id,
            sender,
            request.kind,
            request.title,
            request.body,
            self.deps.clock.now(),
        );

        let stored = self.deps.notification_repository.insert(notification).await?;

        let summary = self.resolve_sender(stored.sender).await;
        let dto = NotificationDto::new(&stored, summary);

        self.deps
            .hub
            .route_to(recipient_id, ServerEvent::NotificationNew(dto.clone()))
            .await;

        Ok(dto)
    }

    /// 接收者的通知列表，最新在前，发送者解析为档案摘要。
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationDto>, ApplicationError> {
        let items = self
            .deps
            .notification_repository
            .list_for_recipient(UserId::from(user_id))
            .await?;

        let mut dtos = Vec::with_capacity(items.len());
        for notification in &items {
            let summary = self.resolve_sender(notification.sender).await;
            dtos.push(NotificationDto::new(notification, summary));
        }
        Ok(dtos)
    }

    /// 幂等置已读；通知不存在时返回 NotFound。
    pub async fn mark_read(&self, id: Uuid) -> Result<(), ApplicationError> {
        let found = self
            .deps
            .notification_repository
            .mark_read(NotificationId::from(id))
            .await?;

        if !found {
            return Err(DomainError::NotificationNotFound.into());
        }
        Ok(())
    }

    /// 清空接收者的全部通知，返回删除条数。
    pub async fn clear_all(&self, user_id: Uuid) -> Result<u64, ApplicationError> {
        let removed = self
            .deps
            .notification_repository
            .delete_all_for_recipient(UserId::from(user_id))
            .await?;

        tracing::info!(user_id = %user_id, removed, "清空用户通知");
        Ok(removed)
    }

    /// 解析发送者档案。
    ///
    /// 档案已被删除时返回 None；查询故障同样降级为 None，
    /// 单条解析失败不中断整批列表。
    async fn resolve_sender(&self, sender: ActorRef) -> Option<ActorSummary> {
        match self.deps.profile_repository.find(sender.kind, sender.id).await {
            Ok(profile) => profile.map(|p| p.summary()),
            Err(err) => {
                tracing::warn!(
                    sender_id = %sender.id,
                    sender_kind = %sender.kind,
                    error = %err,
                    "发送者档案解析失败"
                );
                None
            }
        }
    }
}
