use obset_core::listener::ListenerKind;
use obset_core::{
    ChangeKind, ElementChange, ListenerFailurePolicy, ObservableHashSet, ObservableSetBase,
    ObservableSetConfig, SetChange, SetError,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

/// 记录所有通知的监听器组合
#[derive(Clone, Default)]
struct Spy {
    invalidations: Rc<Cell<usize>>,
    changes: Rc<RefCell<Vec<SetChange<String>>>>,
    elements: Rc<RefCell<Vec<ElementChange<String>>>>,
    order: Rc<RefCell<Vec<&'static str>>>,
}

impl Spy {
    fn attach(&self, base: &ObservableSetBase<String>) {
        let (count, order) = (self.invalidations.clone(), self.order.clone());
        base.on_invalidated(move || {
            count.set(count.get() + 1);
            order.borrow_mut().push("invalidated");
            Ok(())
        })
        .unwrap();

        let (changes, order) = (self.changes.clone(), self.order.clone());
        base.on_change(move |c| {
            changes.borrow_mut().push(c.clone());
            order.borrow_mut().push("changed");
            Ok(())
        })
        .unwrap();

        let (elements, order) = (self.elements.clone(), self.order.clone());
        base.on_element_change(move |c| {
            elements.borrow_mut().push(c.clone());
            order.borrow_mut().push("element");
            Ok(())
        })
        .unwrap();
    }
}

fn s(v: &str) -> String {
    v.to_string()
}

// 一个最外层块内的多次添加/移除只产生一次通知，集合内容为去重后的元素
#[test]
fn coalescing_yields_one_notification() {
    let base = ObservableSetBase::<String>::new(ObservableSetConfig::default());
    let spy = Spy::default();
    spy.attach(&base);

    base.begin_change();
    for name in ["a", "b", "a", "c"] {
        base.next_add(s(name)).unwrap();
    }
    base.next_remove_all([s("x"), s("y"), s("x")]).unwrap();
    base.end_change().unwrap();

    assert_eq!(spy.invalidations.get(), 1);
    let changes = spy.changes.borrow();
    assert_eq!(changes.len(), 1);
    let agg = changes[0].as_aggregate().expect("aggregate change");
    assert_eq!(agg.added(), &HashSet::from([s("a"), s("b"), s("c")]));
    assert_eq!(agg.removed(), &HashSet::from([s("x"), s("y")]));
    assert!(changes[0].was_replaced());
    // 单元素监听器按派生序列收到 5 次
    assert_eq!(spy.elements.borrow().len(), 5);
}

// 嵌套：内层结束不通知，最外层结束通知一次并包含全部元素
#[test]
fn nested_blocks_notify_once_on_outermost_end() {
    let base = ObservableSetBase::<String>::new(ObservableSetConfig::default());
    let spy = Spy::default();
    spy.attach(&base);

    base.begin_change();
    base.begin_change();
    base.next_add(s("x")).unwrap();
    base.end_change().unwrap();
    assert_eq!(spy.invalidations.get(), 0);
    assert!(spy.changes.borrow().is_empty());

    base.next_add(s("y")).unwrap();
    base.end_change().unwrap();

    let changes = spy.changes.borrow();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes[0].added().cloned().collect::<HashSet<_>>(),
        HashSet::from([s("x"), s("y")])
    );
}

// 通知顺序：失效 → 变更 → 单元素
#[test]
fn listener_kinds_fire_in_fixed_order() {
    let base = ObservableSetBase::<String>::new(ObservableSetConfig::default());
    let spy = Spy::default();
    spy.attach(&base);

    base.begin_change();
    base.next_remove(s("a")).unwrap();
    base.next_add(s("b")).unwrap();
    base.end_change().unwrap();

    assert_eq!(
        *spy.order.borrow(),
        vec!["invalidated", "changed", "element", "element"]
    );
    assert_eq!(
        *spy.elements.borrow(),
        vec![ElementChange::Removed(s("a")), ElementChange::Added(s("b"))]
    );
}

// 派生序列是幂等的：多次调用返回同一个缓存切片
#[test]
fn elementary_derivation_is_memoized() {
    let base = ObservableSetBase::<String>::new(ObservableSetConfig::default());
    let identical = Rc::new(Cell::new(false));
    let flag = identical.clone();
    base.on_change(move |c| {
        let first = c.elementary();
        let second = c.elementary();
        flag.set(std::ptr::eq(&*first, &*second) && first.len() == 3);
        Ok(())
    })
    .unwrap();

    base.begin_change();
    base.next_remove_all([s("a"), s("b")]).unwrap();
    base.next_add(s("c")).unwrap();
    base.end_change().unwrap();

    assert!(identical.get());
}

// 示例：移除 a、b，添加 c
#[test]
fn remove_two_add_one_example() {
    let base = ObservableSetBase::<String>::new(ObservableSetConfig::default());
    let spy = Spy::default();
    spy.attach(&base);

    base.begin_change();
    base.next_remove(s("a")).unwrap();
    base.next_remove(s("b")).unwrap();
    base.next_add(s("c")).unwrap();
    base.end_change().unwrap();

    let changes = spy.changes.borrow();
    let change = &changes[0];
    assert_eq!(change.kind(), ChangeKind::Aggregate);
    assert!(change.was_replaced());
    assert_eq!(change.removed_size(), 2);
    assert_eq!(change.added_size(), 1);

    let seq = change.elementary();
    assert!(seq[0].was_removed() && seq[1].was_removed());
    assert_ne!(seq[0], seq[1]);
    assert_eq!(seq[2], ElementChange::Added(s("c")));
    // 移除顺序与冻结集合的迭代顺序一致
    let frozen: Vec<_> = change.removed().cloned().collect();
    assert_eq!(seq[0].element_removed(), Some(&frozen[0]));
    assert_eq!(seq[1].element_removed(), Some(&frozen[1]));
}

// 误用：块外上报与不平衡结束立即失败，且不产生部分状态
#[test]
fn misuse_fails_fast_without_partial_state() {
    let base = ObservableSetBase::<String>::new(ObservableSetConfig::default());
    let spy = Spy::default();
    spy.attach(&base);

    assert!(matches!(
        base.next_add(s("x")),
        Err(SetError::InvalidState { .. })
    ));
    assert!(matches!(base.end_change(), Err(SetError::InvalidState { .. })));

    // 之前失败的上报没有残留
    base.begin_change();
    base.next_add(s("y")).unwrap();
    base.end_change().unwrap();

    let changes = spy.changes.borrow();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0], SetChange::AddOne(s("y")));
}

// 完整流程：具体集合 + 监听器失败传播
#[test]
fn hash_set_propagates_listener_failures_after_applying_change() {
    let config = ObservableSetConfig::builder()
        .on_listener_error(ListenerFailurePolicy::DeliverAll)
        .build();
    let set = ObservableHashSet::<String>::with_config(config);
    let delivered = Rc::new(Cell::new(0));

    set.on_change(|_| anyhow::bail!("projection unavailable")).unwrap();
    let counter = delivered.clone();
    set.on_change(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    })
    .unwrap();

    let err = set.insert(s("a")).unwrap_err();
    assert!(matches!(err, SetError::Listener { failures: 1, .. }));
    // 修改已生效，其余监听器照常收到通知
    assert!(set.contains("a"));
    assert_eq!(delivered.get(), 1);
    assert!(!set.base().is_changing());

    // 下一次修改不受影响
    assert!(set.insert(s("b")).is_err());
    assert_eq!(delivered.get(), 2);
}

// 执行上下文约束：拒绝上下文外的监听器增删，通知照常
#[test]
fn affinity_guard_rejects_registry_mutation() {
    let permitted = Rc::new(Cell::new(true));
    let gate = permitted.clone();
    let set =
        ObservableHashSet::<String>::with_affinity(ObservableSetConfig::default(), move || {
            gate.get()
        });
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();
    let id = set
        .on_change(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .unwrap();

    permitted.set(false);
    assert!(matches!(
        set.on_invalidated(|| Ok(())),
        Err(SetError::WrongContext { .. })
    ));
    assert!(set.base().remove_change_listener(id).is_err());
    assert_eq!(set.base().listeners().len_of(ListenerKind::Change), 1);

    set.insert(s("z")).unwrap();
    assert_eq!(hits.get(), 1);
}
