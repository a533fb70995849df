//! 变更流（stream）
//!
//! 把同步提交的变更转发到 `tokio::sync::broadcast`，供异步消费方以流的形式订阅：
//! - `ChangeBroadcaster` 本身只是一个变更监听器，分发仍在 `end_change` 内同步完成；
//! - `subscribe` 返回 `'static` 生命周期的事件流，可在 tokio 任务中消费；
//! - 订阅方落后超过缓冲区容量时收到 `SetError::Lagged`。
//!
//! 注意：没有订阅者时转发的事件会被丢弃。
//!
mod broadcaster;

pub use broadcaster::ChangeBroadcaster;
