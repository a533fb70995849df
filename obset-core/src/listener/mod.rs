//! 监听器（Listener）与注册表
//!
//! 三类监听器按固定顺序同步通知：失效监听器 → 变更监听器 → 单元素监听器。
//! 注册表的增删受宿主提供的执行上下文判定约束，通知不受限制。
//!
mod listener_trait;
mod registry;

pub use listener_trait::{
    ElementChangeListener, InvalidationListener, ListenerId, ListenerKind, SetChangeListener,
};
pub use registry::ListenerRegistry;
