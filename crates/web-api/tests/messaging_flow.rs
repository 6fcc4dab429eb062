mod support;

use std::time::Duration;

use domain::ActorKind;
use futures_util::SinkExt;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use uuid::Uuid;

use support::{build_backend, connect_and_setup, next_event, seed_profile};

#[tokio::test]
async fn direct_message_flow() {
    let backend = build_backend();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let router = backend.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    // 等待服务器启动
    sleep(Duration::from_millis(100)).await;

    let base_http = format!("http://{}", addr);
    let client = Client::new();

    let student_id = seed_profile(&backend, ActorKind::Student, "Li Ming").await;
    let recruiter_id = seed_profile(&backend, ActorKind::Recruiter, "Acme Recruiting").await;

    let student_token = backend
        .state
        .jwt_service
        .generate_token(student_id, ActorKind::Student)
        .expect("student token");
    let recruiter_token = backend
        .state
        .jwt_service
        .generate_token(recruiter_id, ActorKind::Recruiter)
        .expect("recruiter token");

    // 接收方在线，等着实时收信
    let mut recruiter_ws = connect_and_setup(addr, recruiter_id).await;

    // 学生通过 REST 发私信
    let response = client
        .post(format!("{}/message/send/{}", base_http, recruiter_id))
        .header("authorization", format!("Bearer {}", student_token))
        .json(&json!({"message": "hello, is the internship still open?"}))
        .send()
        .await
        .expect("send message");
    assert_eq!(response.status(), StatusCode::CREATED);

    let message = response
        .json::<serde_json::Value>()
        .await
        .expect("message json");
    assert_eq!(message["senderId"], json!(student_id));
    assert_eq!(message["receiverId"], json!(recruiter_id));
    assert_eq!(message["body"], "hello, is the internship still open?");
    assert_eq!(message["read"], json!(false));

    // 在线的接收方实时拿到同一条消息
    let event = next_event(&mut recruiter_ws).await;
    assert_eq!(event["event"], "message:new");
    assert_eq!(event["data"]["id"], message["id"]);
    assert_eq!(event["data"]["body"], "hello, is the internship still open?");

    // 发送方的会话预览里，对方名下就是这条最新消息
    let latest = client
        .get(format!("{}/message/latest-per-user", base_http))
        .header("authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("latest per user")
        .json::<serde_json::Value>()
        .await
        .expect("latest json");
    assert_eq!(
        latest[recruiter_id.to_string().as_str()]["id"],
        message["id"],
        "会话预览应指向最新一条消息"
    );

    // 接收方拉取完整对话，未读在拉取时顺手置为已读
    let thread = client
        .get(format!("{}/message/{}", base_http, student_id))
        .header("authorization", format!("Bearer {}", recruiter_token))
        .send()
        .await
        .expect("thread")
        .json::<serde_json::Value>()
        .await
        .expect("thread json");
    assert_eq!(thread.as_array().map(|items| items.len()), Some(1));
    assert_eq!(
        thread[0]["read"],
        json!(true),
        "拉取对话应把对方发来的消息置为已读"
    );

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn read_receipt_reaches_original_sender() {
    let backend = build_backend();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let router = backend.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    sleep(Duration::from_millis(100)).await;

    let base_http = format!("http://{}", addr);
    let client = Client::new();

    let student_id = seed_profile(&backend, ActorKind::Student, "Li Ming").await;
    let recruiter_id = seed_profile(&backend, ActorKind::Recruiter, "Acme Recruiting").await;

    let student_token = backend
        .state
        .jwt_service
        .generate_token(student_id, ActorKind::Student)
        .expect("student token");

    // 双方都在线；学生先上线，所以还会收到招聘方的上线广播
    let mut student_ws = connect_and_setup(addr, student_id).await;
    let mut recruiter_ws = connect_and_setup(addr, recruiter_id).await;

    let event = next_event(&mut student_ws).await;
    assert_eq!(event["event"], "user:status");
    assert_eq!(event["data"]["userId"], json!(recruiter_id));

    // 两条未读私信
    for body in ["resume attached", "any update?"] {
        let response = client
            .post(format!("{}/message/send/{}", base_http, recruiter_id))
            .header("authorization", format!("Bearer {}", student_token))
            .json(&json!({"message": body}))
            .send()
            .await
            .expect("send message");
        assert_eq!(response.status(), StatusCode::CREATED);

        let event = next_event(&mut recruiter_ws).await;
        assert_eq!(event["event"], "message:new");
        assert_eq!(event["data"]["body"], body);
    }

    // 招聘方在会话里点了全部已读
    recruiter_ws
        .send(TungsteniteMessage::Text(
            json!({
                "event": "markMessagesRead",
                "data": {"senderId": student_id, "receiverId": recruiter_id}
            })
            .to_string()
            .into(),
        ))
        .await
        .expect("send markMessagesRead");

    // 回执推给原发送者
    let event = next_event(&mut student_ws).await;
    assert_eq!(event["event"], "messagesRead");
    assert_eq!(event["data"]["readerId"], json!(recruiter_id));

    // 回执到达说明存储已更新，发送方视角的消息都翻成已读
    let thread = client
        .get(format!("{}/message/{}", base_http, recruiter_id))
        .header("authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("thread")
        .json::<serde_json::Value>()
        .await
        .expect("thread json");
    let all_read = thread
        .as_array()
        .expect("thread array")
        .iter()
        .all(|message| message["read"] == json!(true));
    assert!(all_read, "标记后两条消息都应是已读");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn send_rejects_blank_body_and_missing_token() {
    let backend = build_backend();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let router = backend.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    sleep(Duration::from_millis(100)).await;

    let base_http = format!("http://{}", addr);
    let client = Client::new();

    let student_id = seed_profile(&backend, ActorKind::Student, "Li Ming").await;
    let student_token = backend
        .state
        .jwt_service
        .generate_token(student_id, ActorKind::Student)
        .expect("student token");
    let receiver_id = Uuid::new_v4();

    // 空白消息体被拒绝
    let response = client
        .post(format!("{}/message/send/{}", base_http, receiver_id))
        .header("authorization", format!("Bearer {}", student_token))
        .json(&json!({"message": "   "}))
        .send()
        .await
        .expect("send blank message");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("error json");
    assert_eq!(body["code"], "INVALID_ARGUMENT");

    // 没带会话
    let response = client
        .post(format!("{}/message/send/{}", base_http, receiver_id))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .expect("send without token");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 健康检查不需要会话
    let response = client
        .get(format!("{}/health", base_http))
        .send()
        .await
        .expect("health");
    assert_eq!(response.status(), StatusCode::OK);

    let _ = shutdown_tx.send(());
}
