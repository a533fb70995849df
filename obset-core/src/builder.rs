//! 变更构建器（SetChangeBuilder）
//!
//! 嵌套事务累加器：
//! - `begin_change`/`end_change` 维护嵌套深度，只有最外层 `end_change` 触发提交；
//! - `next_add`/`next_remove` 把元素并入待添加/待移除工作集（集合语义，重复上报无副作用）；
//! - 提交时按基数与方向决定事件形态，并在 `end_change` 返回前同步交给 `ChangeSink`。
//!
//! 所有方法都只需要 `&self`，监听器在通知过程中再次开启事务不会触发借用冲突。
//!
use crate::change::{AggregateChange, SetChange};
use crate::error::{SetError, SetResult};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use tracing::{debug, trace};

/// 变更接收方：构建器提交后把事件交给它
///
/// 构建器只持有这一能力，而不是指向所属集合的反向引用。
pub trait ChangeSink<E> {
    fn publish(&self, change: &SetChange<E>) -> SetResult<()>;
}

/// 嵌套事务变更构建器
pub struct SetChangeBuilder<E> {
    sink: Rc<dyn ChangeSink<E>>,
    depth: Cell<usize>,
    added: RefCell<HashSet<E>>,
    removed: RefCell<HashSet<E>>,
}

impl<E> SetChangeBuilder<E>
where
    E: Eq + Hash,
{
    pub fn new(sink: Rc<dyn ChangeSink<E>>) -> Self {
        Self::with_capacity(sink, 0)
    }

    /// `capacity` 为两个工作集的初始容量，提交后清空但保留容量
    pub fn with_capacity(sink: Rc<dyn ChangeSink<E>>, capacity: usize) -> Self {
        Self {
            sink,
            depth: Cell::new(0),
            added: RefCell::new(HashSet::with_capacity(capacity)),
            removed: RefCell::new(HashSet::with_capacity(capacity)),
        }
    }

    /// 当前嵌套深度
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// 是否处于事务块内
    pub fn is_changing(&self) -> bool {
        self.depth.get() > 0
    }

    /// 工作集中是否有尚未提交的元素
    pub fn has_pending(&self) -> bool {
        !self.added.borrow().is_empty() || !self.removed.borrow().is_empty()
    }

    /// 开启（可嵌套的）事务块
    pub fn begin_change(&self) {
        let depth = self.depth.get() + 1;
        self.depth.set(depth);
        trace!(depth, "begin_change");
    }

    /// 结束事务块；回到最外层且有待提交内容时提交并通知
    ///
    /// 深度已为 0 时返回 `InvalidState`，不做任何修改。
    pub fn end_change(&self) -> SetResult<()> {
        let depth = self.depth.get();
        if depth == 0 {
            return Err(SetError::invalid_state(
                "Called end_change before begin_change",
            ));
        }
        let depth = depth - 1;
        self.depth.set(depth);
        trace!(depth, "end_change");

        if depth > 0 {
            return Ok(());
        }

        match self.commit() {
            Some(change) => {
                debug!(
                    kind = ?change.kind(),
                    added = change.added_size(),
                    removed = change.removed_size(),
                    "set change committed"
                );
                self.sink.publish(&change)
            }
            None => Ok(()),
        }
    }

    pub fn next_add(&self, element: E) -> SetResult<()> {
        self.check_state()?;
        self.added.borrow_mut().insert(element);
        Ok(())
    }

    pub fn next_add_all<I>(&self, elements: I) -> SetResult<()>
    where
        I: IntoIterator<Item = E>,
    {
        self.check_state()?;
        self.added.borrow_mut().extend(elements);
        Ok(())
    }

    pub fn next_remove(&self, element: E) -> SetResult<()> {
        self.check_state()?;
        self.removed.borrow_mut().insert(element);
        Ok(())
    }

    pub fn next_remove_all<I>(&self, elements: I) -> SetResult<()>
    where
        I: IntoIterator<Item = E>,
    {
        self.check_state()?;
        self.removed.borrow_mut().extend(elements);
        Ok(())
    }

    fn check_state(&self) -> SetResult<()> {
        if self.depth.get() == 0 {
            return Err(SetError::invalid_state(
                "begin_change was not called on this builder",
            ));
        }
        Ok(())
    }

    /// 冻结工作集并决定事件形态；借用在返回前释放
    fn commit(&self) -> Option<SetChange<E>> {
        let mut added = self.added.borrow_mut();
        let mut removed = self.removed.borrow_mut();

        match (added.is_empty(), removed.is_empty()) {
            (true, true) => None,
            (false, false) => {
                let frozen =
                    AggregateChange::new(added.drain().collect(), removed.drain().collect());
                Some(frozen.into())
            }
            (false, true) => {
                if added.len() == 1 {
                    added.drain().next().map(SetChange::AddOne)
                } else {
                    Some(AggregateChange::added_only(added.drain().collect()).into())
                }
            }
            (true, false) => {
                if removed.len() == 1 {
                    removed.drain().next().map(SetChange::RemoveOne)
                } else {
                    Some(AggregateChange::removed_only(removed.drain().collect()).into())
                }
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for SetChangeBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetChangeBuilder")
            .field("depth", &self.depth.get())
            .field("added", &self.added.borrow())
            .field("removed", &self.removed.borrow())
            .finish_non_exhaustive()
    }
}
