use super::base::ObservableSetBase;
use crate::affinity::ThreadAffinity;
use crate::change::{ElementChange, SetChange};
use crate::config::ObservableSetConfig;
use crate::error::SetResult;
use crate::listener::ListenerId;
use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use tracing::warn;

/// 基于 `HashSet` 的可观察集合
///
/// 每个公开的修改操作自成一个事务块；在 [`ObservableHashSet::batch`] 中调用时，
/// 这些块嵌套在外层块内，整批修改只产生一次通知。
/// 真正改变了集合内容的元素才会被上报（重复插入、移除不存在的元素不产生事件）。
pub struct ObservableHashSet<E> {
    base: ObservableSetBase<E>,
    elements: RefCell<HashSet<E>>,
}

impl<E> ObservableHashSet<E>
where
    E: Eq + Hash + Clone + 'static,
{
    pub fn new() -> Self {
        Self::with_config(ObservableSetConfig::default())
    }

    pub fn with_config(config: ObservableSetConfig) -> Self {
        Self {
            base: ObservableSetBase::new(config),
            elements: RefCell::new(HashSet::with_capacity(config.initial_capacity)),
        }
    }

    /// 监听器增删受 `affinity` 约束
    pub fn with_affinity(
        config: ObservableSetConfig,
        affinity: impl ThreadAffinity + 'static,
    ) -> Self {
        Self {
            base: ObservableSetBase::with_affinity(config, affinity),
            elements: RefCell::new(HashSet::with_capacity(config.initial_capacity)),
        }
    }

    pub fn base(&self) -> &ObservableSetBase<E> {
        &self.base
    }

    pub fn on_invalidated<F>(&self, f: F) -> SetResult<ListenerId>
    where
        F: Fn() -> anyhow::Result<()> + 'static,
    {
        self.base.on_invalidated(f)
    }

    pub fn on_change<F>(&self, f: F) -> SetResult<ListenerId>
    where
        F: Fn(&SetChange<E>) -> anyhow::Result<()> + 'static,
    {
        self.base.on_change(f)
    }

    pub fn on_element_change<F>(&self, f: F) -> SetResult<ListenerId>
    where
        F: Fn(&ElementChange<E>) -> anyhow::Result<()> + 'static,
    {
        self.base.on_element_change(f)
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.elements.borrow().contains(value)
    }

    /// 当前内容的拷贝
    pub fn snapshot(&self) -> HashSet<E> {
        self.elements.borrow().clone()
    }

    /// 在只读借用下访问当前内容；回调内不得修改本集合
    pub fn with<R>(&self, f: impl FnOnce(&HashSet<E>) -> R) -> R {
        f(&self.elements.borrow())
    }

    /// 在一个事务块中执行 `f`，块内的全部修改合并为一次通知
    ///
    /// 无论 `f` 是否返回错误都会结束事务块，`f` 中已生效的修改照常通知。
    ///
    /// # Errors
    ///
    /// `f` 的错误优先返回。此时若结束事务块也失败（例如监听器报错），
    /// 该错误只记录到 `warn!` 日志，不再返回给调用方。
    pub fn batch<T>(&self, f: impl FnOnce(&Self) -> SetResult<T>) -> SetResult<T> {
        self.base.begin_change();
        let result = f(self);
        let ended = self.base.end_change();
        match (result, ended) {
            (Ok(value), ended) => ended.map(|()| value),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(dropped)) => {
                warn!(error = %err, dropped = %dropped, "batch failed, commit error discarded");
                Err(err)
            }
        }
    }

    /// 插入元素，返回集合是否发生变化
    pub fn insert(&self, value: E) -> SetResult<bool> {
        self.batch(|set| {
            let inserted = set.elements.borrow_mut().insert(value.clone());
            if inserted {
                set.base.next_add(value)?;
            }
            Ok(inserted)
        })
    }

    /// 移除元素，返回集合是否发生变化
    pub fn remove<Q>(&self, value: &Q) -> SetResult<bool>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.batch(|set| {
            let taken = set.elements.borrow_mut().take(value);
            match taken {
                Some(element) => {
                    set.base.next_remove(element)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    /// 批量插入，返回实际新增的元素数
    pub fn extend(&self, values: impl IntoIterator<Item = E>) -> SetResult<usize> {
        self.batch(|set| {
            let mut added = Vec::new();
            {
                let mut elements = set.elements.borrow_mut();
                for value in values {
                    if elements.insert(value.clone()) {
                        added.push(value);
                    }
                }
            }
            let count = added.len();
            set.base.next_add_all(added)?;
            Ok(count)
        })
    }

    /// 批量移除，返回实际移除的元素数
    pub fn remove_all<I>(&self, values: I) -> SetResult<usize>
    where
        I: IntoIterator,
        I::Item: Borrow<E>,
    {
        self.batch(|set| {
            let removed: Vec<E> = {
                let mut elements = set.elements.borrow_mut();
                values
                    .into_iter()
                    .filter_map(|v| elements.take(v.borrow()))
                    .collect()
            };
            let count = removed.len();
            set.base.next_remove_all(removed)?;
            Ok(count)
        })
    }

    /// 只保留满足 `keep` 的元素，返回移除的元素数
    ///
    /// `keep` 在只读借用下执行，可以读取本集合（`contains`、`len` 等）。
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) -> SetResult<usize> {
        self.batch(|set| {
            let doomed: Vec<E> = set
                .elements
                .borrow()
                .iter()
                .filter(|e| !keep(e))
                .cloned()
                .collect();
            let removed: Vec<E> = {
                let mut elements = set.elements.borrow_mut();
                doomed.into_iter().filter(|e| elements.remove(e)).collect()
            };
            let count = removed.len();
            set.base.next_remove_all(removed)?;
            Ok(count)
        })
    }

    /// 清空集合，返回移除的元素数
    pub fn clear(&self) -> SetResult<usize> {
        self.batch(|set| {
            let removed: Vec<E> = set.elements.borrow_mut().drain().collect();
            let count = removed.len();
            set.base.next_remove_all(removed)?;
            Ok(count)
        })
    }

    /// 把内容替换为 `values`
    ///
    /// 只上报差异：移除不在新内容中的元素，添加原来没有的元素；整个替换只通知一次。
    pub fn replace_all(&self, values: impl IntoIterator<Item = E>) -> SetResult<()> {
        let target: HashSet<E> = values.into_iter().collect();
        self.batch(|set| {
            set.retain(|e| target.contains(e))?;
            set.extend(target.iter().cloned())?;
            Ok(())
        })
    }
}

impl<E> Default for ObservableHashSet<E>
where
    E: Eq + Hash + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 以初始内容创建集合，不产生任何通知
impl<E> FromIterator<E> for ObservableHashSet<E>
where
    E: Eq + Hash + Clone + 'static,
{
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let set = Self::new();
        set.elements.borrow_mut().extend(iter);
        set
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableHashSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableHashSet")
            .field("elements", &self.elements.borrow())
            .field("base", &self.base)
            .finish()
    }
}
