//! 集合变更层统一错误定义
//!
//! 聚焦协议误用（事务块不平衡、块外上报变更）、监听器注册的执行上下文校验、
//! 监听器执行失败与变更流滞后等最小必要集合。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SetError {
    // --- 协议误用 ---
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("listener registry modified off the permitted context: operation={operation}")]
    WrongContext { operation: &'static str },

    // --- 监听器 ---
    #[error("listener failed: failures={failures}, first={first}")]
    Listener {
        failures: usize,
        first: anyhow::Error,
    },

    // --- 变更流 ---
    #[error("change stream lagged: skipped={skipped}")]
    Lagged { skipped: u64 },
}

impl SetError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        SetError::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn wrong_context(operation: &'static str) -> Self {
        SetError::WrongContext { operation }
    }

    /// 是否为协议误用（调用方缺陷，而非运行期故障）
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            SetError::InvalidState { .. } | SetError::WrongContext { .. }
        )
    }
}

/// 统一 Result 类型别名
pub type SetResult<T> = Result<T, SetError>;
