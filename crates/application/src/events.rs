//! WebSocket 线上事件定义。
//!
//! 帧格式为 `{"event": <名称>, "data": <负载>}`，事件名称与负载字段
//! 都必须和前端约定保持一致，改动任何一个都会静默破坏客户端。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::UserId;

use crate::dto::{MessageDto, NotificationDto};

/// 服务端推送给客户端的事件。
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// 用户上线/下线，广播给所有已连接客户端
    #[serde(rename = "user:status")]
    #[serde(rename_all = "camelCase")]
    UserStatus { user_id: Uuid, is_online: bool },

    /// 新私信投递给接收者
    #[serde(rename = "message:new")]
    MessageNew(MessageDto),

    /// 对方已读回执，投递给原发送者
    #[serde(rename = "messagesRead")]
    #[serde(rename_all = "camelCase")]
    MessagesRead { reader_id: Uuid },

    /// 新通知投递给接收者
    #[serde(rename = "notification:new")]
    NotificationNew(NotificationDto),

    /// 正在输入提示，转发给接收者
    #[serde(rename = "typing")]
    #[serde(rename_all = "camelCase")]
    Typing { sender_id: Uuid },

    /// 停止输入提示，转发给接收者
    #[serde(rename = "stopTyping")]
    #[serde(rename_all = "camelCase")]
    StopTyping { sender_id: Uuid },
}

/// 客户端发来的事件。
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// 连接握手：把连接绑定到指定用户
    #[serde(rename = "setup")]
    Setup(UserId),

    /// 客户端进入某个会话界面；目前只做记录
    #[serde(rename = "joinChat")]
    JoinChat(String),

    /// 正在输入，要求转发给指定接收者
    #[serde(rename = "typing")]
    #[serde(rename_all = "camelCase")]
    Typing { receiver_id: Uuid },

    /// 停止输入，要求转发给指定接收者
    #[serde(rename = "stopTyping")]
    #[serde(rename_all = "camelCase")]
    StopTyping { receiver_id: Uuid },

    /// 把某个方向的未读私信全部标记为已读
    #[serde(rename = "markMessagesRead")]
    #[serde(rename_all = "camelCase")]
    MarkMessagesRead { sender_id: Uuid, receiver_id: Uuid },
}
