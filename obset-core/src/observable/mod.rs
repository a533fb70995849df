//! 可观察集合（Observable Set）
//!
//! - `ObservableSetBase`：所有拥有元素的集合共用的基座（构建器 + 监听器注册表）；
//! - `ObservableHashSet`：基于 `HashSet` 的现成实现，每个修改操作自成事务块。
//!
mod base;
mod hash_set;

pub use base::ObservableSetBase;
pub use hash_set::ObservableHashSet;
