mod messaging_service;
mod notification_service;

pub use messaging_service::{
    MessagingService, MessagingServiceDependencies, SendDirectMessageRequest,
};
pub use notification_service::{
    CreateNotificationRequest, NotificationService, NotificationServiceDependencies,
};
