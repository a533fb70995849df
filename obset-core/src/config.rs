//! 可观察集合配置
//!
//! 通过 `ObservableSetConfig::builder()` 构建，或由宿主从 JSON 等格式反序列化。
//!
use bon::Builder;
use serde::{Deserialize, Serialize};

/// 监听器返回错误时的分发策略
///
/// 两种策略都会把错误传播给调用 `end_change` 的一方，区别只在于剩余监听器是否继续执行。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerFailurePolicy {
    /// 继续通知本次快照中的全部监听器，结束后返回首个错误与失败数
    #[default]
    DeliverAll,
    /// 遇到首个错误即停止分发
    StopOnFirst,
}

/// 可观察集合配置
#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservableSetConfig {
    /// 元素存储与构建器工作集的初始容量
    #[builder(default = 16)]
    pub initial_capacity: usize,
    /// 监听器失败时的分发策略
    #[builder(default)]
    pub on_listener_error: ListenerFailurePolicy,
}

impl Default for ObservableSetConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            on_listener_error: ListenerFailurePolicy::default(),
        }
    }
}
