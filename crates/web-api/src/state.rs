use std::sync::Arc;

use application::{MessagingService, NotificationService, RealtimeHub};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub messaging_service: Arc<MessagingService>,
    pub notification_service: Arc<NotificationService>,
    pub hub: Arc<RealtimeHub>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        messaging_service: Arc<MessagingService>,
        notification_service: Arc<NotificationService>,
        hub: Arc<RealtimeHub>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            messaging_service,
            notification_service,
            hub,
            jwt_service,
        }
    }
}
