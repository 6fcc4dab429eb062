//! 实时中枢。
//!
//! 在注册表之上提供连接生命周期与事件投递：上线/下线广播、
//! 定向路由、全员广播。所有投递都是尽力而为，失败只记日志，
//! 绝不向持久化路径传播。

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use domain::UserId;

use crate::clock::Clock;
use crate::events::ServerEvent;
use crate::presence::PresenceRegistry;
use crate::repository::ProfileRepository;

pub struct RealtimeHub {
    registry: Arc<PresenceRegistry>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
}

impl RealtimeHub {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            profiles,
            clock,
        }
    }

    /// 绑定连接并向所有在线用户广播上线状态。
    pub async fn register(
        &self,
        connection_id: Uuid,
        user_id: UserId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        self.registry.register(user_id, connection_id, sender).await;
        tracing::info!(user_id = %user_id, connection_id = %connection_id, "用户上线");

        self.broadcast_all(ServerEvent::UserStatus {
            user_id: Uuid::from(user_id),
            is_online: true,
        })
        .await;
    }

    /// 解绑连接：记录最后在线时间并广播下线状态。
    ///
    /// 连接从未完成握手、或该用户已被更新的连接接管时是空操作。
    /// 最后在线时间写失败只记日志，下线流程照常继续。
    pub async fn unregister(&self, connection_id: Uuid) {
        let Some(user_id) = self.registry.unregister(connection_id).await else {
            tracing::debug!(connection_id = %connection_id, "连接未绑定用户，跳过注销");
            return;
        };

        if let Err(err) = self
            .profiles
            .record_last_seen(user_id, self.clock.now())
            .await
        {
            tracing::warn!(user_id = %user_id, error = %err, "最后在线时间写入失败");
        }

        tracing::info!(user_id = %user_id, connection_id = %connection_id, "用户下线");

        self.broadcast_all(ServerEvent::UserStatus {
            user_id: Uuid::from(user_id),
            is_online: false,
        })
        .await;
    }

    /// 定向投递，返回是否尝试了投递（不保证对端收到）。
    pub async fn route_to(&self, user_id: UserId, event: ServerEvent) -> bool {
        let delivered = self.registry.send_to(user_id, event).await;
        if !delivered {
            tracing::debug!(user_id = %user_id, "接收者不在线，事件丢弃");
        }
        delivered
    }

    /// 广播给所有在线连接。
    pub async fn broadcast_all(&self, event: ServerEvent) {
        self.registry.broadcast(event).await;
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.registry.is_online(user_id).await
    }

    /// 当前在线用户快照，供 REST 查询。
    pub async fn online_users(&self) -> Vec<UserId> {
        self.registry.online_users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::memory::MemoryProfileRepository;
    use domain::{ActorKind, Profile};

    fn build_hub(profiles: Arc<MemoryProfileRepository>) -> RealtimeHub {
        RealtimeHub::new(
            Arc::new(PresenceRegistry::new()),
            profiles,
            Arc::new(SystemClock),
        )
    }

    async fn connect(hub: &RealtimeHub, user_id: UserId) -> (Uuid, mpsc::UnboundedReceiver<ServerEvent>) {
        let connection_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register(connection_id, user_id, tx).await;
        (connection_id, rx)
    }

    #[tokio::test]
    async fn register_broadcasts_online_status() {
        let hub = build_hub(Arc::new(MemoryProfileRepository::new()));
        let watcher = UserId::from(Uuid::new_v4());
        let joiner = UserId::from(Uuid::new_v4());

        let (_, mut watcher_rx) = connect(&hub, watcher).await;
        watcher_rx.recv().await; // 丢弃自己的上线广播
        connect(&hub, joiner).await;

        match watcher_rx.recv().await {
            Some(ServerEvent::UserStatus { user_id, is_online }) => {
                assert_eq!(user_id, Uuid::from(joiner));
                assert!(is_online);
            }
            other => panic!("Expected user:status broadcast, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unregister_records_last_seen_and_broadcasts_offline() {
        let profiles = Arc::new(MemoryProfileRepository::new());
        let user = UserId::from(Uuid::new_v4());
        profiles
            .put(Profile {
                id: user,
                kind: ActorKind::Student,
                name: "小明".to_owned(),
                avatar_url: None,
                last_seen_at: None,
            })
            .await;

        let hub = build_hub(profiles.clone());
        let watcher = UserId::from(Uuid::new_v4());
        let (_, mut watcher_rx) = connect(&hub, watcher).await;
        watcher_rx.recv().await;

        let (connection_id, _rx) = connect(&hub, user).await;
        watcher_rx.recv().await; // 上线广播

        hub.unregister(connection_id).await;

        match watcher_rx.recv().await {
            Some(ServerEvent::UserStatus { user_id, is_online }) => {
                assert_eq!(user_id, Uuid::from(user));
                assert!(!is_online);
            }
            other => panic!("Expected offline broadcast, got {:?}", other),
        }

        let stored = profiles
            .find(ActorKind::Student, user)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_seen_at.is_some(), "注销后应记录最后在线时间");
    }

    #[tokio::test]
    async fn missing_profile_does_not_block_unregister() {
        // 档案不存在时没有可写的 last_seen，注销流程照常完成
        let hub = build_hub(Arc::new(MemoryProfileRepository::new()));
        let user = UserId::from(Uuid::new_v4());

        let (connection_id, _rx) = connect(&hub, user).await;
        hub.unregister(connection_id).await;

        assert!(!hub.is_online(user).await);
    }
}
