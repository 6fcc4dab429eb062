use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    MemoryConversationRepository, MemoryMessageRepository, MemoryNotificationRepository,
    MemoryProfileRepository, MessagingService, MessagingServiceDependencies, NotificationService,
    NotificationServiceDependencies, PresenceRegistry, RealtimeHub, SystemClock,
};
use axum::Router;
use domain::{ActorKind, Profile, UserId};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as TungsteniteMessage, MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;
use web_api::{router as build_router_fn, AppState, JwtConfig, JwtService};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 测试后端：路由加上可以直接操作的依赖句柄。
///
/// 集成测试全部走内存仓储，不依赖外部存储；通知创建没有对外
/// 接口，测试通过 state 上的服务直接触发。
pub struct TestBackend {
    pub router: Router,
    pub state: AppState,
    pub profiles: Arc<MemoryProfileRepository>,
}

pub fn build_backend() -> TestBackend {
    let messages = Arc::new(MemoryMessageRepository::new());
    let conversations = Arc::new(MemoryConversationRepository::new());
    let notifications = Arc::new(MemoryNotificationRepository::new());
    let profiles = Arc::new(MemoryProfileRepository::new());
    let clock = Arc::new(SystemClock::default());

    let registry = Arc::new(PresenceRegistry::new());
    let hub = Arc::new(RealtimeHub::new(
        registry,
        profiles.clone(),
        clock.clone(),
    ));

    let messaging_service = MessagingService::new(MessagingServiceDependencies {
        message_repository: messages,
        conversation_repository: conversations,
        clock: clock.clone(),
        hub: hub.clone(),
    });

    let notification_service = NotificationService::new(NotificationServiceDependencies {
        notification_repository: notifications,
        profile_repository: profiles.clone(),
        clock,
        hub: hub.clone(),
    });

    let jwt_service = Arc::new(JwtService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        expiration_hours: 24,
    }));

    let state = AppState::new(
        Arc::new(messaging_service),
        Arc::new(notification_service),
        hub,
        jwt_service,
    );

    TestBackend {
        router: build_router_fn(state.clone()),
        state,
        profiles,
    }
}

/// 预置一个用户档案并返回其ID。
pub async fn seed_profile(backend: &TestBackend, kind: ActorKind, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    backend
        .profiles
        .put(Profile {
            id: UserId::from(id),
            kind,
            name: name.to_string(),
            avatar_url: None,
            last_seen_at: None,
        })
        .await;
    id
}

/// 读取下一条服务端事件，跳过心跳帧。
pub async fn next_event(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("等待服务端事件超时")
            .expect("ws message")
            .expect("ws frame");
        match msg {
            TungsteniteMessage::Text(payload) => {
                return serde_json::from_str(&payload).expect("event json");
            }
            TungsteniteMessage::Ping(_) | TungsteniteMessage::Pong(_) => continue,
            other => panic!("unexpected message {other:?}"),
        }
    }
}

/// 建立 WebSocket 连接并通过 setup 事件绑定用户。
///
/// 绑定会触发一条发给所有在线连接的上线广播，这里顺手吃掉
/// 自己收到的那一条，调用方从干净的队列开始断言。
pub async fn connect_and_setup(addr: SocketAddr, user_id: Uuid) -> WsStream {
    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("ws connect");

    ws.send(TungsteniteMessage::Text(
        json!({"event": "setup", "data": user_id}).to_string().into(),
    ))
    .await
    .expect("send setup");

    let event = next_event(&mut ws).await;
    assert_eq!(event["event"], "user:status", "绑定后应先收到自己的上线广播");
    assert_eq!(event["data"]["userId"], json!(user_id));
    assert_eq!(event["data"]["isOnline"], json!(true));

    ws
}
