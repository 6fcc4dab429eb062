//! 数据库迁移。
//!
//! 迁移脚本位于仓库根目录的 `migrations/`，编译期嵌入二进制，
//! 由启动流程（或测试）在建连后执行。

use sqlx::migrate::Migrator;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
