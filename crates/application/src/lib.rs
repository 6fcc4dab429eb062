//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：私信收发、通知分发，
//! 以及维护在线状态的实时中枢。仓储和时钟以 trait 抽象，
//! 由基础设施层或测试里的内存实现注入。

pub mod clock;
pub mod dto;
pub mod error;
pub mod events;
pub mod hub;
pub mod memory;
pub mod presence;
pub mod repository;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{MessageDto, NotificationDto, SenderDto};
pub use error::ApplicationError;
pub use events::{ClientEvent, ServerEvent};
pub use hub::RealtimeHub;
pub use memory::{
    MemoryConversationRepository, MemoryMessageRepository, MemoryNotificationRepository,
    MemoryProfileRepository,
};
pub use presence::PresenceRegistry;
pub use repository::{
    ConversationRepository, MessageRepository, NotificationRepository, ProfileRepository,
};
pub use services::{
    CreateNotificationRequest, MessagingService, MessagingServiceDependencies, NotificationService,
    NotificationServiceDependencies, SendDirectMessageRequest,
};
