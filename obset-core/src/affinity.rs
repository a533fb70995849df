//! 执行上下文约束（Thread Affinity）
//!
//! 监听器注册表的增删只允许在宿主指定的执行上下文中进行。
//! 判定本身由宿主提供，这里只定义协议与两个常用实现。
//!
//! 集合类型本身是 `!Send` 的，跨线程修改在编译期即被拒绝；
//! 因此该判定描述的是“逻辑上下文”，例如事件循环的某个阶段。

/// 宿主提供的上下文判定
pub trait ThreadAffinity {
    /// 当前调用是否位于被允许的执行上下文
    fn is_permitted(&self) -> bool;
}

impl<F> ThreadAffinity for F
where
    F: Fn() -> bool,
{
    fn is_permitted(&self) -> bool {
        self()
    }
}

/// 不做任何限制
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyContext;

impl ThreadAffinity for AnyContext {
    fn is_permitted(&self) -> bool {
        true
    }
}

/// 仅允许在创建时所在的线程上修改
///
/// 适用于把集合包装进自定义的 `Send` 容器、由宿主自行保证单写者的场景。
#[derive(Debug, Clone, Copy)]
pub struct OwnerThread {
    owner: std::thread::ThreadId,
}

impl OwnerThread {
    pub fn current() -> Self {
        Self {
            owner: std::thread::current().id(),
        }
    }
}

impl ThreadAffinity for OwnerThread {
    fn is_permitted(&self) -> bool {
        std::thread::current().id() == self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_any_context() {
        assert!(AnyContext.is_permitted());
    }

    #[test]
    fn test_owner_thread() {
        let guard = OwnerThread::current();
        assert!(guard.is_permitted());

        let permitted_elsewhere = std::thread::spawn(move || guard.is_permitted())
            .join()
            .unwrap();
        assert!(!permitted_elsewhere);
    }

    // 闭包可直接作为判定
    #[test]
    fn test_closure_predicate() {
        let open = Cell::new(false);
        let guard = || open.get();
        assert!(!guard.is_permitted());
        open.set(true);
        assert!(guard.is_permitted());
    }
}
