use anyhow::Context;
use futures_util::StreamExt;
use obset_core::stream::ChangeBroadcaster;
use obset_core::{ObservableHashSet, ObservableSetConfig};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 从 `OBSET_CONFIG`（JSON）读取配置，未设置时使用默认值
fn load_config() -> anyhow::Result<ObservableSetConfig> {
    match std::env::var("OBSET_CONFIG") {
        Ok(raw) => serde_json::from_str(&raw).context("invalid OBSET_CONFIG"),
        Err(_) => Ok(ObservableSetConfig::default()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    info!(?config, "starting demo");

    let tags = ObservableHashSet::<String>::with_config(config);

    tags.on_invalidated(|| {
        println!("tags invalidated");
        Ok(())
    })?;
    tags.on_change(|c| {
        println!("change[{:?}]: {c}", c.kind());
        Ok(())
    })?;
    tags.on_element_change(|c| {
        println!("  element: {c}");
        Ok(())
    })?;

    let broadcaster = ChangeBroadcaster::new(32);
    broadcaster.attach(tags.base())?;
    let mut stream = broadcaster.subscribe();

    // 单个添加
    tags.insert("rust".to_string())?;

    // 批量添加，只通知一次
    tags.extend(["tokio", "serde", "tracing"].map(String::from))?;

    // 组合修改：移除两个并添加一个
    tags.batch(|set| {
        set.remove("serde")?;
        set.remove("tracing")?;
        set.insert("bon".to_string())?;
        Ok(())
    })?;

    // 替换全部内容，只上报差异
    tags.replace_all(["rust", "anyhow"].map(String::from))?;

    println!("final: {:?}", tags.snapshot());

    // 异步消费已广播的变更
    while let Ok(Some(change)) =
        tokio::time::timeout(Duration::from_millis(10), stream.next()).await
    {
        let change = change?;
        info!(
            kind = ?change.kind(),
            added = change.added_size(),
            removed = change.removed_size(),
            "streamed change"
        );
    }

    Ok(())
}
