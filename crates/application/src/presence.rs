//! 在线状态注册表。
//!
//! 维护 用户 -> 活跃连接 的映射，每个用户最多保留一条连接。
//! 注册表是纯内存结构，进程重启后为空；随进程启动创建、随进程
//! 关闭丢弃，不做跨节点共享。

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use domain::UserId;

use crate::events::ServerEvent;

/// 单个活跃连接的记录。
struct Registration {
    connection_id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

/// 进程内的在线用户注册表。
///
/// 同一用户再次注册会直接覆盖旧条目：新连接接管路由，旧连接
/// 的收件通道被丢弃。注销以连接ID为准，旧连接关闭时不会把接管
/// 后的新连接踢下线。
#[derive(Default)]
pub struct PresenceRegistry {
    entries: RwLock<HashMap<UserId, Registration>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 登记用户的活跃连接，覆盖同一用户的旧连接。
    pub async fn register(
        &self,
        user_id: UserId,
        connection_id: Uuid,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let mut entries = self.entries.write().await;
        entries.insert(
            user_id,
            Registration {
                connection_id,
                sender,
            },
        );
    }

    /// 按连接ID注销，返回被移除的用户。
    ///
    /// 连接ID不匹配（握手未完成、或该用户已被更新的连接接管）时
    /// 什么都不做。
    pub async fn unregister(&self, connection_id: Uuid) -> Option<UserId> {
        let mut entries = self.entries.write().await;
        let user_id = entries
            .iter()
            .find(|(_, registration)| registration.connection_id == connection_id)
            .map(|(user_id, _)| *user_id)?;
        entries.remove(&user_id);
        Some(user_id)
    }

    /// 把事件投递给指定用户的连接，返回是否尝试了投递。
    ///
    /// 用户不在线或通道已关闭都返回 false；没有排队和重试。
    pub async fn send_to(&self, user_id: UserId, event: ServerEvent) -> bool {
        let entries = self.entries.read().await;
        match entries.get(&user_id) {
            Some(registration) => registration.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// 把事件投递给所有在线连接，单个连接的失败直接忽略。
    pub async fn broadcast(&self, event: ServerEvent) {
        let entries = self.entries.read().await;
        for registration in entries.values() {
            let _ = registration.sender.send(event.clone());
        }
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.entries.read().await.contains_key(&user_id)
    }

    pub async fn online_users(&self) -> Vec<UserId> {
        self.entries.read().await.keys().copied().collect()
    }
}
