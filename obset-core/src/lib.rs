//! 可观察集合变更批处理库（obset-core）
//!
//! 把原始的添加/移除上报（可能位于嵌套事务块中）转换为最少的、监听器可见的变更事件：
//! - 事务（`builder`）：可重入的 `begin_change`/`end_change`，只有最外层结束时提交；
//! - 事件（`change`）：按基数与方向成形的 `SetChange`，聚合事件惰性派生并缓存单元素序列；
//! - 监听器（`listener`）：失效/变更/单元素三类监听器，按注册顺序同步通知；
//! - 上下文约束（`affinity`）：监听器增删只允许在宿主指定的执行上下文中进行；
//! - 集合（`observable`）：可嵌入的基座与现成的 `ObservableHashSet`；
//! - 变更流（`stream`，特性开关）：把提交转发到 tokio 广播通道。
//!
//! 典型用法：
//! 1. 创建 `ObservableHashSet`（或在自定义集合中内嵌 `ObservableSetBase`）；
//! 2. 通过 `on_change`/`on_element_change`/`on_invalidated` 注册监听器；
//! 3. 直接调用修改操作，或在 `batch` 中组合多次修改，只产生一次通知。
//!
//! 所有类型都是单线程的（`!Send`），不提供内部锁。
//!
pub mod affinity;
pub mod builder;
pub mod change;
pub mod config;
pub mod error;
pub mod listener;
pub mod observable;
#[cfg(feature = "stream")]
pub mod stream;

pub use change::{AggregateChange, ChangeKind, ElementChange, SetChange};
pub use config::{ListenerFailurePolicy, ObservableSetConfig};
pub use error::{SetError, SetResult};
pub use observable::{ObservableHashSet, ObservableSetBase};
