use crate::affinity::{AnyContext, ThreadAffinity};
use crate::builder::SetChangeBuilder;
use crate::change::{ElementChange, SetChange};
use crate::config::ObservableSetConfig;
use crate::error::SetResult;
use crate::listener::{
    ElementChangeListener, InvalidationListener, ListenerId, ListenerRegistry, SetChangeListener,
};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// 可观察集合的公共基座
///
/// 每个拥有元素的集合内嵌一个基座，生命周期与集合一致：
/// 一个变更构建器 + 一个监听器注册表。集合的每次结构性修改都必须位于
/// `begin_change`/`end_change` 之间，并在对应的 `end_change` 之前通过
/// `next_add`/`next_remove` 上报。
pub struct ObservableSetBase<E> {
    builder: SetChangeBuilder<E>,
    listeners: Rc<ListenerRegistry<E>>,
}

impl<E> ObservableSetBase<E>
where
    E: Eq + Hash + Clone + 'static,
{
    pub fn new(config: ObservableSetConfig) -> Self {
        Self::with_affinity(config, AnyContext)
    }

    /// 使用宿主提供的执行上下文判定创建基座
    pub fn with_affinity(
        config: ObservableSetConfig,
        affinity: impl ThreadAffinity + 'static,
    ) -> Self {
        let listeners = Rc::new(ListenerRegistry::new(
            Box::new(affinity),
            config.on_listener_error,
        ));
        let builder = SetChangeBuilder::with_capacity(listeners.clone(), config.initial_capacity);
        Self { builder, listeners }
    }

    /// 开启事务块，可嵌套
    pub fn begin_change(&self) {
        self.builder.begin_change();
    }

    /// 结束事务块；最外层块结束时构造事件并通知全部监听器，嵌套块结束不通知
    pub fn end_change(&self) -> SetResult<()> {
        self.builder.end_change()
    }

    /// 上报一次添加，必须位于事务块内
    pub fn next_add(&self, added: E) -> SetResult<()> {
        self.builder.next_add(added)
    }

    pub fn next_add_all(&self, added: impl IntoIterator<Item = E>) -> SetResult<()> {
        self.builder.next_add_all(added)
    }

    /// 上报一次移除，必须位于事务块内
    pub fn next_remove(&self, removed: E) -> SetResult<()> {
        self.builder.next_remove(removed)
    }

    pub fn next_remove_all(&self, removed: impl IntoIterator<Item = E>) -> SetResult<()> {
        self.builder.next_remove_all(removed)
    }

    pub fn is_changing(&self) -> bool {
        self.builder.is_changing()
    }

    pub fn has_listeners(&self) -> bool {
        self.listeners.has_listeners()
    }

    pub fn listeners(&self) -> &ListenerRegistry<E> {
        &self.listeners
    }

    pub fn add_invalidation_listener(
        &self,
        listener: Rc<dyn InvalidationListener>,
    ) -> SetResult<ListenerId> {
        self.listeners.add_invalidation_listener(listener)
    }

    pub fn remove_invalidation_listener(&self, id: ListenerId) -> SetResult<bool> {
        self.listeners.remove_invalidation_listener(id)
    }

    pub fn add_change_listener(
        &self,
        listener: Rc<dyn SetChangeListener<E>>,
    ) -> SetResult<ListenerId> {
        self.listeners.add_change_listener(listener)
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> SetResult<bool> {
        self.listeners.remove_change_listener(id)
    }

    pub fn add_element_listener(
        &self,
        listener: Rc<dyn ElementChangeListener<E>>,
    ) -> SetResult<ListenerId> {
        self.listeners.add_element_listener(listener)
    }

    pub fn remove_element_listener(&self, id: ListenerId) -> SetResult<bool> {
        self.listeners.remove_element_listener(id)
    }

    /// 以闭包注册失效监听器
    pub fn on_invalidated<F>(&self, f: F) -> SetResult<ListenerId>
    where
        F: Fn() -> anyhow::Result<()> + 'static,
    {
        self.add_invalidation_listener(Rc::new(f))
    }

    /// 以闭包注册变更监听器
    pub fn on_change<F>(&self, f: F) -> SetResult<ListenerId>
    where
        F: Fn(&SetChange<E>) -> anyhow::Result<()> + 'static,
    {
        self.add_change_listener(Rc::new(f))
    }

    /// 以闭包注册单元素监听器
    pub fn on_element_change<F>(&self, f: F) -> SetResult<ListenerId>
    where
        F: Fn(&ElementChange<E>) -> anyhow::Result<()> + 'static,
    {
        self.add_element_listener(Rc::new(f))
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableSetBase<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSetBase")
            .field("builder", &self.builder)
            .field("listeners", &self.listeners)
            .finish()
    }
}
