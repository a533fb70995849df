use crate::change::{ElementChange, SetChange};
use std::fmt;

/// 监听器标识，由注册表分配，跨种类唯一
///
/// 同一个监听器多次注册会得到不同的标识，每次注册都会独立触发。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// 监听器种类，通知按此顺序进行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Invalidation,
    Change,
    Element,
}

/// 失效监听器：只关心“集合变了”，最先被通知
pub trait InvalidationListener {
    fn invalidated(&self) -> anyhow::Result<()>;
}

impl<F> InvalidationListener for F
where
    F: Fn() -> anyhow::Result<()>,
{
    fn invalidated(&self) -> anyhow::Result<()> {
        self()
    }
}

/// 变更监听器：每次提交收到一个完整事件
pub trait SetChangeListener<E> {
    fn on_changed(&self, change: &SetChange<E>) -> anyhow::Result<()>;
}

impl<E, F> SetChangeListener<E> for F
where
    F: Fn(&SetChange<E>) -> anyhow::Result<()>,
{
    fn on_changed(&self, change: &SetChange<E>) -> anyhow::Result<()> {
        self(change)
    }
}

/// 单元素监听器：按事件的单元素序列逐个收到变更
pub trait ElementChangeListener<E> {
    fn on_element_changed(&self, change: &ElementChange<E>) -> anyhow::Result<()>;
}

impl<E, F> ElementChangeListener<E> for F
where
    F: Fn(&ElementChange<E>) -> anyhow::Result<()>,
{
    fn on_element_changed(&self, change: &ElementChange<E>) -> anyhow::Result<()> {
        self(change)
    }
}
