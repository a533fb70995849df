use crate::change::SetChange;
use crate::error::{SetError, SetResult};
use crate::listener::{ListenerId, SetChangeListener};
use crate::observable::ObservableSetBase;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use std::hash::Hash;
use std::rc::Rc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// 把提交的变更广播给异步订阅方
#[derive(Clone)]
pub struct ChangeBroadcaster<E> {
    tx: broadcast::Sender<SetChange<E>>,
}

impl<E> ChangeBroadcaster<E>
where
    E: Clone + Send + 'static,
{
    /// `capacity` 为广播缓冲区容量
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 注册到集合基座，作为一个普通的变更监听器
    pub fn attach(&self, base: &ObservableSetBase<E>) -> SetResult<ListenerId>
    where
        E: Eq + Hash,
    {
        base.add_change_listener(Rc::new(self.clone()))
    }

    /// 返回一个 'static 生命周期的事件流，便于在 tokio::spawn 中使用
    pub fn subscribe(&self) -> BoxStream<'static, SetResult<SetChange<E>>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx).map(|r| {
            r.map_err(|e| match e {
                BroadcastStreamRecvError::Lagged(skipped) => SetError::Lagged { skipped },
            })
        });
        Box::pin(stream)
    }

    /// 当前订阅方数量
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<E> SetChangeListener<E> for ChangeBroadcaster<E>
where
    E: Clone + Send + 'static,
{
    fn on_changed(&self, change: &SetChange<E>) -> anyhow::Result<()> {
        // 若当前无订阅者，broadcast 的 send 会返回错误，这里视为非致命并忽略
        let _ = self.tx.send(change.clone());
        Ok(())
    }
}
