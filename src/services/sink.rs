//! 批次落库接口 - 业务能力层
//!
//! 存储端是外部协作方，这里只定义交接边界：流水线把不可变的
//! 批次交给 `BatchSink`，派发任务并发执行，完成顺序不保证，
//! 需要顺序的消费端应使用批次序号。
//!
//! `JsonlSink` 是随二进制一起发布的演示实现，把每道题追加为
//! 一行 JSON；真正的存储层结构不在本系统范围内。

use crate::models::Batch;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

/// 批次派发回调（外部持久化协作方）
pub trait BatchSink: Send + Sync {
    /// 派发一个批次
    ///
    /// 返回错误只影响该批次，流水线会继续处理后续批次。
    fn dispatch(&self, batch: Batch) -> BoxFuture<'static, Result<()>>;
}

/// 把批次追加写入 JSON Lines 文件的演示落库端
pub struct JsonlSink {
    file: Arc<Mutex<tokio::fs::File>>,
}

impl JsonlSink {
    /// 创建（或清空）输出文件
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("无法创建输出文件: {}", path.display()))?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl BatchSink for JsonlSink {
    fn dispatch(&self, batch: Batch) -> BoxFuture<'static, Result<()>> {
        let file = Arc::clone(&self.file);
        Box::pin(async move {
            let mut lines = String::new();
            for question in &batch.questions {
                lines.push_str(&serde_json::to_string(question).context("题目序列化失败")?);
                lines.push('\n');
            }

            let mut file = file.lock().await;
            file.write_all(lines.as_bytes())
                .await
                .context("写入输出文件失败")?;
            file.flush().await.context("刷新输出文件失败")?;

            info!("✓ 批次 {} 已写入 ({} 道题)", batch.ordinal, batch.len());
            Ok(())
        })
    }
}
