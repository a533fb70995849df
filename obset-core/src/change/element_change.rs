use std::fmt;

/// 单元素变更：恰好一次添加或恰好一次移除，构造后不可变
///
/// 不存在“替换”形态的单元素变更，替换在聚合层表示为一次移除加一次添加。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementChange<E> {
    Added(E),
    Removed(E),
}

impl<E> ElementChange<E> {
    pub fn was_added(&self) -> bool {
        matches!(self, ElementChange::Added(_))
    }

    pub fn was_removed(&self) -> bool {
        matches!(self, ElementChange::Removed(_))
    }

    /// 被添加的元素；移除变更返回 `None`
    pub fn element_added(&self) -> Option<&E> {
        match self {
            ElementChange::Added(e) => Some(e),
            ElementChange::Removed(_) => None,
        }
    }

    /// 被移除的元素；添加变更返回 `None`
    pub fn element_removed(&self) -> Option<&E> {
        match self {
            ElementChange::Added(_) => None,
            ElementChange::Removed(e) => Some(e),
        }
    }

    /// 变更涉及的元素（不区分方向）
    pub fn element(&self) -> &E {
        match self {
            ElementChange::Added(e) | ElementChange::Removed(e) => e,
        }
    }

    pub fn into_element(self) -> E {
        match self {
            ElementChange::Added(e) | ElementChange::Removed(e) => e,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for ElementChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementChange::Added(e) => write!(f, "added {e:?}"),
            ElementChange::Removed(e) => write!(f, "removed {e:?}"),
        }
    }
}
