//! 基础设施层实现。
//!
//! 提供 Postgres 仓储与数据库迁移，实现应用层定义的接口。

pub mod builder;
pub mod migrations;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use migrations::MIGRATOR;
pub use repository::{
    create_pg_pool, PgConversationRepository, PgMessageRepository, PgNotificationRepository,
    PgProfileRepository, PgStorage,
};
