use super::listener_trait::{
    ElementChangeListener, InvalidationListener, ListenerId, ListenerKind, SetChangeListener,
};
use crate::affinity::{AnyContext, ThreadAffinity};
use crate::builder::ChangeSink;
use crate::change::SetChange;
use crate::config::ListenerFailurePolicy;
use crate::error::{SetError, SetResult};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;
use tracing::{debug, warn};

struct Entry<L: ?Sized> {
    id: ListenerId,
    listener: Rc<L>,
}

impl<L: ?Sized> Clone for Entry<L> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Rc::clone(&self.listener),
        }
    }
}

/// 监听器注册表
///
/// - 每类监听器按注册顺序保存，允许重复注册；
/// - 增删前调用宿主的 [`ThreadAffinity`] 判定，不在许可上下文时返回 `WrongContext`；
/// - 通知前对每类监听器列表做快照，监听器在回调中增删监听器不会影响本轮分发。
pub struct ListenerRegistry<E> {
    invalidation: RefCell<Vec<Entry<dyn InvalidationListener>>>,
    change: RefCell<Vec<Entry<dyn SetChangeListener<E>>>>,
    element: RefCell<Vec<Entry<dyn ElementChangeListener<E>>>>,
    next_id: Cell<u64>,
    affinity: Box<dyn ThreadAffinity>,
    policy: ListenerFailurePolicy,
}

impl<E> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new(Box::new(AnyContext), ListenerFailurePolicy::default())
    }
}

impl<E> ListenerRegistry<E> {
    pub fn new(affinity: Box<dyn ThreadAffinity>, policy: ListenerFailurePolicy) -> Self {
        Self {
            invalidation: RefCell::new(Vec::new()),
            change: RefCell::new(Vec::new()),
            element: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            affinity,
            policy,
        }
    }

    pub fn policy(&self) -> ListenerFailurePolicy {
        self.policy
    }

    pub fn add_invalidation_listener(
        &self,
        listener: Rc<dyn InvalidationListener>,
    ) -> SetResult<ListenerId> {
        self.check_context("add_invalidation_listener")?;
        let id = self.next_id();
        self.invalidation.borrow_mut().push(Entry { id, listener });
        Ok(id)
    }

    pub fn remove_invalidation_listener(&self, id: ListenerId) -> SetResult<bool> {
        self.check_context("remove_invalidation_listener")?;
        Ok(remove_entry(&self.invalidation, id))
    }

    pub fn add_change_listener(
        &self,
        listener: Rc<dyn SetChangeListener<E>>,
    ) -> SetResult<ListenerId> {
        self.check_context("add_change_listener")?;
        let id = self.next_id();
        self.change.borrow_mut().push(Entry { id, listener });
        Ok(id)
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> SetResult<bool> {
        self.check_context("remove_change_listener")?;
        Ok(remove_entry(&self.change, id))
    }

    pub fn add_element_listener(
        &self,
        listener: Rc<dyn ElementChangeListener<E>>,
    ) -> SetResult<ListenerId> {
        self.check_context("add_element_listener")?;
        let id = self.next_id();
        self.element.borrow_mut().push(Entry { id, listener });
        Ok(id)
    }

    pub fn remove_element_listener(&self, id: ListenerId) -> SetResult<bool> {
        self.check_context("remove_element_listener")?;
        Ok(remove_entry(&self.element, id))
    }

    /// 是否存在任意种类的监听器
    pub fn has_listeners(&self) -> bool {
        !self.invalidation.borrow().is_empty()
            || !self.change.borrow().is_empty()
            || !self.element.borrow().is_empty()
    }

    /// 某类监听器的注册数（重复注册分别计数）
    pub fn len_of(&self, kind: ListenerKind) -> usize {
        match kind {
            ListenerKind::Invalidation => self.invalidation.borrow().len(),
            ListenerKind::Change => self.change.borrow().len(),
            ListenerKind::Element => self.element.borrow().len(),
        }
    }

    fn next_id(&self) -> ListenerId {
        let value = self.next_id.get();
        self.next_id.set(value + 1);
        ListenerId::new(value)
    }

    fn check_context(&self, operation: &'static str) -> SetResult<()> {
        if self.affinity.is_permitted() {
            return Ok(());
        }
        debug!(operation, "listener registry mutation rejected off the permitted context");
        Err(SetError::wrong_context(operation))
    }
}

impl<E> ListenerRegistry<E>
where
    E: Clone,
{
    /// 同步通知全部监听器
    ///
    /// 顺序：失效监听器 → 变更监听器 → 单元素监听器（外层遍历单元素序列，内层遍历监听器）；
    /// 每类内部按注册顺序。监听器错误按 [`ListenerFailurePolicy`] 处理并最终返回给调用方。
    /// 三类监听器在任何回调执行前一并快照，回调中新增的监听器从下一轮通知开始生效。
    pub fn notify(&self, change: &SetChange<E>) -> SetResult<()> {
        let invalidation = snapshot(&self.invalidation);
        let listeners = snapshot(&self.change);
        let element = snapshot(&self.element);
        let mut failures = Failures::new(self.policy);

        for entry in invalidation {
            let result = entry.listener.invalidated();
            if failures.record(ListenerKind::Invalidation, entry.id, result).is_break() {
                return failures.finish();
            }
        }

        for entry in listeners {
            let result = entry.listener.on_changed(change);
            if failures.record(ListenerKind::Change, entry.id, result).is_break() {
                return failures.finish();
            }
        }

        if !element.is_empty() {
            for elementary in change.elementary().iter() {
                for entry in &element {
                    let result = entry.listener.on_element_changed(elementary);
                    if failures.record(ListenerKind::Element, entry.id, result).is_break() {
                        return failures.finish();
                    }
                }
            }
        }

        failures.finish()
    }
}

impl<E> ChangeSink<E> for ListenerRegistry<E>
where
    E: Clone,
{
    fn publish(&self, change: &SetChange<E>) -> SetResult<()> {
        self.notify(change)
    }
}

impl<E> fmt::Debug for ListenerRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("invalidation", &self.invalidation.borrow().len())
            .field("change", &self.change.borrow().len())
            .field("element", &self.element.borrow().len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn snapshot<L: ?Sized>(list: &RefCell<Vec<Entry<L>>>) -> Vec<Entry<L>> {
    list.borrow().clone()
}

fn remove_entry<L: ?Sized>(list: &RefCell<Vec<Entry<L>>>, id: ListenerId) -> bool {
    let mut list = list.borrow_mut();
    match list.iter().position(|e| e.id == id) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

/// 一次通知内的失败汇总
struct Failures {
    policy: ListenerFailurePolicy,
    count: usize,
    first: Option<anyhow::Error>,
}

impl Failures {
    fn new(policy: ListenerFailurePolicy) -> Self {
        Self {
            policy,
            count: 0,
            first: None,
        }
    }

    fn record(
        &mut self,
        kind: ListenerKind,
        id: ListenerId,
        result: anyhow::Result<()>,
    ) -> ControlFlow<()> {
        let Err(err) = result else {
            return ControlFlow::Continue(());
        };
        warn!(?kind, %id, error = %err, "set listener failed");
        self.count += 1;
        self.first.get_or_insert(err);

        match self.policy {
            ListenerFailurePolicy::DeliverAll => ControlFlow::Continue(()),
            ListenerFailurePolicy::StopOnFirst => ControlFlow::Break(()),
        }
    }

    fn finish(self) -> SetResult<()> {
        match self.first {
            None => Ok(()),
            Some(first) => Err(SetError::Listener {
                failures: self.count,
                first,
            }),
        }
    }
}
