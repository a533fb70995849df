//! 集合变更事件（Set Change）
//!
//! 定义提交后交给监听器的变更记录：
//! - `ElementChange`：恰好一个元素的添加或移除；
//! - `AggregateChange`：一次提交的冻结添加集/移除集，惰性派生并缓存单元素序列；
//! - `SetChange`：统一的带标签事件（`AddOne`/`RemoveOne`/`Aggregate`），
//!   对外提供一致的访问接口，无需再区分“简单变更/复杂变更”两套类型。

mod aggregate_change;
mod element_change;

pub use aggregate_change::AggregateChange;
pub use element_change::ElementChange;

use std::borrow::Cow;
use std::collections::hash_set;
use std::fmt;
use std::hash::Hash;
use std::option;

/// 事件形态标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// 单个元素被添加
    AddOne,
    /// 单个元素被移除
    RemoveOne,
    /// 批量添加/移除（或两者兼有）
    Aggregate,
}

/// 一次提交产生的变更事件
///
/// 单元素提交为 `AddOne`/`RemoveOne`，其余为 `Aggregate`；
/// 访问方法对三种形态一致，需要区分时直接 `match`。
#[derive(Debug, Clone)]
pub enum SetChange<E> {
    AddOne(E),
    RemoveOne(E),
    Aggregate(AggregateChange<E>),
}

impl<E> SetChange<E> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            SetChange::AddOne(_) => ChangeKind::AddOne,
            SetChange::RemoveOne(_) => ChangeKind::RemoveOne,
            SetChange::Aggregate(_) => ChangeKind::Aggregate,
        }
    }

    pub fn was_added(&self) -> bool {
        match self {
            SetChange::AddOne(_) => true,
            SetChange::RemoveOne(_) => false,
            SetChange::Aggregate(c) => c.was_added(),
        }
    }

    pub fn was_removed(&self) -> bool {
        match self {
            SetChange::AddOne(_) => false,
            SetChange::RemoveOne(_) => true,
            SetChange::Aggregate(c) => c.was_removed(),
        }
    }

    /// 同一事件内既有移除又有添加；单元素事件恒为 `false`
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }

    pub fn added_size(&self) -> usize {
        match self {
            SetChange::AddOne(_) => 1,
            SetChange::RemoveOne(_) => 0,
            SetChange::Aggregate(c) => c.added_size(),
        }
    }

    pub fn removed_size(&self) -> usize {
        match self {
            SetChange::AddOne(_) => 0,
            SetChange::RemoveOne(_) => 1,
            SetChange::Aggregate(c) => c.removed_size(),
        }
    }

    /// 被添加的元素
    pub fn added(&self) -> Elements<'_, E> {
        match self {
            SetChange::AddOne(e) => Elements::One(Some(e).into_iter()),
            SetChange::RemoveOne(_) => Elements::One(None.into_iter()),
            SetChange::Aggregate(c) => Elements::Many(c.added().iter()),
        }
    }

    /// 被移除的元素
    pub fn removed(&self) -> Elements<'_, E> {
        match self {
            SetChange::AddOne(_) => Elements::One(None.into_iter()),
            SetChange::RemoveOne(e) => Elements::One(Some(e).into_iter()),
            SetChange::Aggregate(c) => Elements::Many(c.removed().iter()),
        }
    }

    /// 单元素事件涉及的元素
    pub fn element(&self) -> Option<&E> {
        match self {
            SetChange::AddOne(e) | SetChange::RemoveOne(e) => Some(e),
            SetChange::Aggregate(_) => None,
        }
    }

    /// 聚合事件的视图；单元素事件返回 `None`，需要统一视图时用 [`SetChange::to_aggregate`]
    pub fn as_aggregate(&self) -> Option<&AggregateChange<E>> {
        match self {
            SetChange::Aggregate(c) => Some(c),
            _ => None,
        }
    }
}

impl<E> SetChange<E>
where
    E: Clone,
{
    /// 单元素变更序列（先移除后添加）
    ///
    /// 聚合事件首次调用时派生并缓存，之后借出同一切片；单元素事件返回只含自身的序列。
    pub fn elementary(&self) -> Cow<'_, [ElementChange<E>]> {
        match self {
            SetChange::AddOne(e) => Cow::Owned(vec![ElementChange::Added(e.clone())]),
            SetChange::RemoveOne(e) => Cow::Owned(vec![ElementChange::Removed(e.clone())]),
            SetChange::Aggregate(c) => Cow::Borrowed(c.elementary()),
        }
    }
}

impl<E> SetChange<E>
where
    E: Clone + Eq + Hash,
{
    /// 以聚合形态查看任意事件，单元素事件被包装为一个元素的集合
    pub fn to_aggregate(&self) -> Cow<'_, AggregateChange<E>> {
        match self {
            SetChange::Aggregate(c) => Cow::Borrowed(c),
            single => Cow::Owned(single.clone().into_aggregate()),
        }
    }

    pub fn into_aggregate(self) -> AggregateChange<E> {
        match self {
            SetChange::AddOne(e) => ElementChange::Added(e).into(),
            SetChange::RemoveOne(e) => ElementChange::Removed(e).into(),
            SetChange::Aggregate(c) => c,
        }
    }
}

impl<E> From<AggregateChange<E>> for SetChange<E> {
    fn from(change: AggregateChange<E>) -> Self {
        SetChange::Aggregate(change)
    }
}

impl<E> From<ElementChange<E>> for SetChange<E> {
    fn from(change: ElementChange<E>) -> Self {
        match change {
            ElementChange::Added(e) => SetChange::AddOne(e),
            ElementChange::Removed(e) => SetChange::RemoveOne(e),
        }
    }
}

impl<E> PartialEq for SetChange<E>
where
    E: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SetChange::AddOne(a), SetChange::AddOne(b)) => a == b,
            (SetChange::RemoveOne(a), SetChange::RemoveOne(b)) => a == b,
            (SetChange::Aggregate(a), SetChange::Aggregate(b)) => a == b,
            _ => false,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for SetChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetChange::AddOne(e) => write!(f, "added {e:?}"),
            SetChange::RemoveOne(e) => write!(f, "removed {e:?}"),
            SetChange::Aggregate(c) => fmt::Display::fmt(c, f),
        }
    }
}

/// [`SetChange::added`] / [`SetChange::removed`] 返回的元素迭代器
#[derive(Debug, Clone)]
pub enum Elements<'a, E> {
    One(option::IntoIter<&'a E>),
    Many(hash_set::Iter<'a, E>),
}

impl<'a, E> Iterator for Elements<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Elements::One(it) => it.next(),
            Elements::Many(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Elements::One(it) => it.size_hint(),
            Elements::Many(it) => it.size_hint(),
        }
    }
}

impl<E> ExactSizeIterator for Elements<'_, E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // 测试单元素添加事件的统一访问接口
    #[test]
    fn test_add_one_surface() {
        let c = SetChange::AddOne("a");
        assert_eq!(c.kind(), ChangeKind::AddOne);
        assert!(c.was_added());
        assert!(!c.was_removed());
        assert!(!c.was_replaced());
        assert_eq!(c.added_size(), 1);
        assert_eq!(c.removed_size(), 0);
        assert_eq!(c.added().collect::<Vec<_>>(), vec![&"a"]);
        assert_eq!(c.removed().count(), 0);
        assert_eq!(*c.elementary(), [ElementChange::Added("a")]);
        assert!(c.as_aggregate().is_none());
        assert_eq!(c.element(), Some(&"a"));
    }

    // 测试单元素移除事件
    #[test]
    fn test_remove_one_surface() {
        let c = SetChange::RemoveOne(5);
        assert_eq!(c.kind(), ChangeKind::RemoveOne);
        assert!(!c.was_added());
        assert!(c.was_removed());
        assert_eq!(c.added_size(), 0);
        assert_eq!(c.removed_size(), 1);
        assert_eq!(c.removed().len(), 1);
        assert_eq!(*c.elementary(), [ElementChange::Removed(5)]);
    }

    // 测试聚合事件
    #[test]
    fn test_aggregate_surface() {
        let c: SetChange<u32> =
            AggregateChange::new(HashSet::from([1, 2]), HashSet::from([3])).into();
        assert_eq!(c.kind(), ChangeKind::Aggregate);
        assert!(c.was_replaced());
        assert_eq!(c.added_size(), 2);
        assert_eq!(c.removed_size(), 1);
        assert_eq!(c.added().copied().collect::<HashSet<_>>(), HashSet::from([1, 2]));
        assert_eq!(c.elementary().len(), 3);
        assert_eq!(c.elementary()[0], ElementChange::Removed(3));
        assert!(c.element().is_none());
        // 聚合事件每次借出同一缓存切片
        assert!(matches!(c.elementary(), Cow::Borrowed(_)));
    }

    // 测试任意事件到聚合视图的适配
    #[test]
    fn test_to_aggregate() {
        let single = SetChange::AddOne(9);
        let view = single.to_aggregate();
        assert!(matches!(view, Cow::Owned(_)));
        assert_eq!(view.added(), &HashSet::from([9]));

        let agg: SetChange<u32> = AggregateChange::added_only(HashSet::from([1, 2])).into();
        assert!(matches!(agg.to_aggregate(), Cow::Borrowed(_)));

        let owned = SetChange::RemoveOne(4).into_aggregate();
        assert_eq!(owned.removed(), &HashSet::from([4]));
    }

    #[test]
    fn test_equality() {
        assert_eq!(SetChange::AddOne(1), SetChange::AddOne(1));
        assert_ne!(SetChange::AddOne(1), SetChange::RemoveOne(1));
        // 形态不同即不同，即使元素相同
        let agg: SetChange<u32> = AggregateChange::added_only(HashSet::from([1])).into();
        assert_ne!(agg, SetChange::AddOne(1));
    }

    // 三种形态可以直接匹配
    #[test]
    fn test_match_on_variants() {
        let describe = |c: &SetChange<u32>| match c {
            SetChange::AddOne(e) => format!("+{e}"),
            SetChange::RemoveOne(e) => format!("-{e}"),
            SetChange::Aggregate(agg) => format!("{}/{}", agg.added_size(), agg.removed_size()),
        };
        assert_eq!(describe(&ElementChange::Added(1).into()), "+1");
        assert_eq!(describe(&SetChange::RemoveOne(2)), "-2");
        let agg: SetChange<u32> =
            AggregateChange::new(HashSet::from([1]), HashSet::from([2, 3])).into();
        assert_eq!(describe(&agg), "1/2");
    }

    #[test]
    fn test_display() {
        assert_eq!(SetChange::AddOne(1).to_string(), "added 1");
        assert_eq!(SetChange::RemoveOne(2).to_string(), "removed 2");
    }
}
