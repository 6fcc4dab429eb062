//! 领域模型错误定义
//!
//! 定义领域校验错误与仓储层错误，作为系统错误分类的基础。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 输入校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 通知不存在
    #[error("notification not found")]
    NotificationNotFound,
}

impl DomainError {
    /// 创建校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// 目标记录不存在
    #[error("record not found")]
    NotFound,

    /// 唯一性冲突
    #[error("record conflict")]
    Conflict,

    /// 底层存储故障
    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    /// 创建存储故障错误
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
