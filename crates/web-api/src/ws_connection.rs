use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use application::{ClientEvent, ServerEvent};
use domain::UserId;

use crate::state::AppState;

/// WebSocket 连接管理器
///
/// 封装单个 WebSocket 连接的所有状态和逻辑，包括：
/// - 客户端事件解析和分发
/// - 身份绑定（setup 事件之后才算上线）
/// - 心跳回应
/// - 断开时的注册表清理
pub struct WebSocketConnection {
    state: AppState,
    connection_id: Uuid,
    bound_user: Option<UserId>,
}

impl WebSocketConnection {
    /// 创建新的 WebSocket 连接
    ///
    /// 连接建立时不带身份，收到 setup 事件后才绑定用户并注册到
    /// 实时中枢。
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            connection_id: Uuid::new_v4(),
            bound_user: None,
        }
    }

    /// 运行 WebSocket 连接的主循环
    ///
    /// 这是连接的核心逻辑，处理：
    /// - 客户端事件接收
    /// - 路由到本连接的服务端事件下发
    /// - 连接生命周期管理
    pub async fn run(mut self, socket: WebSocket) {
        tracing::info!(connection_id = %self.connection_id, "WebSocket 连接已建立");

        let (mut sender, mut incoming) = socket.split();

        // 出站事件通道：注册后注册表持有一份发送端，定向路由和
        // 全员广播都走这里
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
        // pong 回应单独走一条命令通道，不和业务事件抢队列
        let (pong_tx, mut pong_rx) = mpsc::channel::<Vec<u8>>(8);

        // 发送任务：统一处理所有对 WebSocket sender 的写操作
        let send_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(data) = pong_rx.recv() => {
                        if sender.send(WsMessage::Pong(data.into())).await.is_err() {
                            tracing::warn!("Failed to send pong message");
                            break;
                        }
                    }
                    event = event_rx.recv() => {
                        let Some(event) = event else { break };
                        let payload = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(err) => {
                                tracing::warn!(error = %err, "failed to serialize websocket payload");
                                continue;
                            }
                        };
                        if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                            tracing::warn!("Failed to send text message");
                            break;
                        }
                    }
                }
            }
            tracing::info!("WebSocket发送任务结束");
        });

        // 接收循环：逐帧处理客户端消息
        while let Some(Ok(message)) = incoming.next().await {
            if self
                .handle_frame(message, &pong_tx, &event_tx)
                .await
                .is_err()
            {
                break;
            }
        }

        // 断开清理：注销会写入最后在线时间并广播下线状态；
        // 未完成握手的连接在注册表里没有条目，注销是空操作
        self.state.hub.unregister(self.connection_id).await;

        drop(pong_tx);
        drop(event_tx);
        let _ = send_task.await;

        tracing::info!(connection_id = %self.connection_id, "WebSocket连接已断开，在线状态已清理");
    }

    /// 处理来自客户端的单个帧
    ///
    /// 返回 Err 表示连接应当结束；解析失败的帧只记日志，绝不
    /// 终止连接。
    async fn handle_frame(
        &mut self,
        message: WsMessage,
        pong_tx: &mpsc::Sender<Vec<u8>>,
        event_tx: &mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<(), ()> {
        match message {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => self.handle_event(event, event_tx).await,
                Err(err) => {
                    tracing::warn!(
                        connection_id = %self.connection_id,
                        error = %err,
                        "收到无法解析的客户端事件，已忽略"
                    );
                }
            },
            WsMessage::Close(_) => {
                tracing::info!(connection_id = %self.connection_id, "WebSocket收到关闭消息");
                return Err(());
            }
            WsMessage::Ping(data) => {
                tracing::debug!("收到ping消息，发送pong回应");
                if pong_tx.send(data.to_vec()).await.is_err() {
                    return Err(());
                }
            }
            WsMessage::Pong(_) => {
                tracing::debug!("收到pong消息");
            }
            WsMessage::Binary(_) => {
                tracing::debug!("忽略二进制帧");
            }
        }
        Ok(())
    }

    /// 分发解析成功的客户端事件
    async fn handle_event(
        &mut self,
        event: ClientEvent,
        event_tx: &mpsc::UnboundedSender<ServerEvent>,
    ) {
        match event {
            ClientEvent::Setup(user_id) => {
                self.bound_user = Some(user_id);
                self.state
                    .hub
                    .register(self.connection_id, user_id, event_tx.clone())
                    .await;
            }
            ClientEvent::JoinChat(chat_id) => {
                // 前端进入会话页时上报，目前只做记录
                tracing::debug!(
                    connection_id = %self.connection_id,
                    chat_id = %chat_id,
                    "客户端进入会话"
                );
            }
            ClientEvent::Typing { receiver_id } => {
                let Some(sender_id) = self.bound_user else {
                    tracing::debug!("连接未绑定用户，丢弃输入提示");
                    return;
                };
                self.state
                    .hub
                    .route_to(
                        UserId::from(receiver_id),
                        ServerEvent::Typing {
                            sender_id: Uuid::from(sender_id),
                        },
                    )
                    .await;
            }
            ClientEvent::StopTyping { receiver_id } => {
                let Some(sender_id) = self.bound_user else {
                    tracing::debug!("连接未绑定用户，丢弃输入提示");
                    return;
                };
                self.state
                    .hub
                    .route_to(
                        UserId::from(receiver_id),
                        ServerEvent::StopTyping {
                            sender_id: Uuid::from(sender_id),
                        },
                    )
                    .await;
            }
            ClientEvent::MarkMessagesRead {
                sender_id,
                receiver_id,
            } => {
                // 已读回执由消息服务推给原发送者
                if let Err(err) = self
                    .state
                    .messaging_service
                    .mark_thread_read(sender_id, receiver_id)
                    .await
                {
                    tracing::warn!(
                        connection_id = %self.connection_id,
                        error = %err,
                        "批量标记已读失败"
                    );
                }
            }
        }
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        tracing::info!(
            connection_id = %self.connection_id,
            user = ?self.bound_user,
            "WebSocketConnection 被销毁"
        );
    }
}
