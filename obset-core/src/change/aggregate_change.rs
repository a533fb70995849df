use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use super::element_change::ElementChange;

/// 聚合变更：一次提交内的全部添加与移除
///
/// 持有提交时刻冻结的添加集与移除集（与构建器工作集互不共享），
/// 首次请求时派生单元素变更序列并缓存在实例上，之后的调用返回同一切片。
#[derive(Debug, Clone)]
pub struct AggregateChange<E> {
    added: HashSet<E>,
    removed: HashSet<E>,
    elementary: OnceCell<Vec<ElementChange<E>>>,
}

impl<E> AggregateChange<E>
where
    E: Eq + Hash,
{
    pub fn new(added: HashSet<E>, removed: HashSet<E>) -> Self {
        Self {
            added,
            removed,
            elementary: OnceCell::new(),
        }
    }

    /// 仅包含添加的聚合变更
    pub fn added_only(added: HashSet<E>) -> Self {
        Self::new(added, HashSet::new())
    }

    /// 仅包含移除的聚合变更
    pub fn removed_only(removed: HashSet<E>) -> Self {
        Self::new(HashSet::new(), removed)
    }
}

impl<E> AggregateChange<E> {
    pub fn added(&self) -> &HashSet<E> {
        &self.added
    }

    pub fn removed(&self) -> &HashSet<E> {
        &self.removed
    }

    pub fn was_added(&self) -> bool {
        !self.added.is_empty()
    }

    pub fn was_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    /// 同时存在添加与移除
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }

    pub fn added_size(&self) -> usize {
        self.added.len()
    }

    pub fn removed_size(&self) -> usize {
        self.removed.len()
    }

    /// 派生序列是否已经计算过
    pub fn is_elementary_cached(&self) -> bool {
        self.elementary.get().is_some()
    }
}

impl<E> AggregateChange<E>
where
    E: Clone,
{
    /// 单元素变更序列：先按移除集的迭代顺序列出移除，再列出添加
    ///
    /// 只计算一次；同一实例上的后续调用返回同一切片。
    pub fn elementary(&self) -> &[ElementChange<E>] {
        self.elementary.get_or_init(|| {
            let mut seq = Vec::with_capacity(self.removed.len() + self.added.len());
            seq.extend(self.removed.iter().cloned().map(ElementChange::Removed));
            seq.extend(self.added.iter().cloned().map(ElementChange::Added));
            seq
        })
    }
}

impl<E> PartialEq for AggregateChange<E>
where
    E: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.added == other.added && self.removed == other.removed
    }
}

impl<E> Eq for AggregateChange<E> where E: Eq + Hash {}

impl<E> From<ElementChange<E>> for AggregateChange<E>
where
    E: Eq + Hash,
{
    fn from(change: ElementChange<E>) -> Self {
        match change {
            ElementChange::Added(e) => Self::added_only(HashSet::from([e])),
            ElementChange::Removed(e) => Self::removed_only(HashSet::from([e])),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for AggregateChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ added: {:?}, removed: {:?} }}",
            self.added, self.removed
        )
    }
}
