//! 流式批量摄取流水线 - 编排层
//!
//! ## 职责
//!
//! 1. **分块读取**：按固定大小读取输入流，跨块拼接被切断的
//!    UTF-8 序列，任意的块边界不改变解析结果
//! 2. **逐块解析**：扫描器切出的每个题块交给流程层解析，
//!    题块级错误隔离记录，绝不中断流
//! 3. **批次形成**：解析成功的题目按配置的批次大小聚批
//! 4. **并发控制**：使用 Semaphore 限制在途派发数量，满时
//!    阻塞新批次的形成（背压）
//! 5. **取消**：收到取消信号后不再读取新块、不再派发新批次，
//!    在途派发任务自然结束，避免写一半
//!
//! 题块按源顺序解析、序号单调递增；批次的完成顺序不保证。

use crate::models::{Batch, ParsedQuestion, RawBlock};
use crate::services::{BatchSink, BlockScanner};
use crate::workflow::BlockFlow;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 流水线参数
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 每次读取的字节数
    pub chunk_size: usize,
    /// 批次最大题目数
    pub max_batch_size: usize,
    /// 最大在途批次数
    pub max_concurrent_batches: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            max_batch_size: 200,
            max_concurrent_batches: 5,
        }
    }
}

impl PipelineOptions {
    /// 从程序配置取流水线参数
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            max_batch_size: config.max_batch_size,
            max_concurrent_batches: config.max_concurrent_batches,
        }
    }
}

/// 取消信号
///
/// 克隆后可以交给任何任务；`cancel` 一经调用不可撤回。
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发出取消信号
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 单个题块的解析错误记录
#[derive(Debug, Clone, Serialize)]
pub struct BlockError {
    /// 题块序号
    pub ordinal: u64,
    /// 人类可读的失败原因
    pub reason: String,
}

/// 单个批次的派发失败记录
#[derive(Debug, Clone, Serialize)]
pub struct DispatchError {
    /// 批次序号
    pub batch_ordinal: u64,
    /// 失败原因
    pub reason: String,
}

/// 一次摄取运行的最终报告
///
/// 逐条列出题块级错误及其序号，便于只返工出错的题目。
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// 扫描到的题块总数
    pub total_blocks: u64,
    /// 解析成功的题目数
    pub parsed: u64,
    /// 已派发的批次数
    pub batches_dispatched: u64,
    /// 题块级错误
    pub block_errors: Vec<BlockError>,
    /// 派发失败
    pub dispatch_errors: Vec<DispatchError>,
    /// 流末尾的坏尾错误
    pub tail_error: Option<String>,
    /// 运行是否被取消（未完成）
    pub cancelled: bool,
}

impl PipelineReport {
    /// 运行是否完整且无任何错误
    pub fn is_clean(&self) -> bool {
        !self.cancelled
            && self.tail_error.is_none()
            && self.block_errors.is_empty()
            && self.dispatch_errors.is_empty()
    }
}

/// 流式批量摄取流水线
///
/// 扫描缓冲区由流水线独占驱动；批次一经形成即不可变，
/// 交给并发派发任务无需同步。
pub struct StreamPipeline {
    options: PipelineOptions,
    flow: BlockFlow,
    sink: Arc<dyn BatchSink>,
    cancel: CancelToken,
}

type DispatchHandle = (u64, JoinHandle<std::result::Result<(), String>>);

impl StreamPipeline {
    pub fn new(options: PipelineOptions, flow: BlockFlow, sink: Arc<dyn BatchSink>) -> Self {
        Self {
            options,
            flow,
            sink,
            cancel: CancelToken::new(),
        }
    }

    /// 挂接外部取消信号
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 运行流水线直至流结束（或被取消），返回最终报告
    pub async fn run<R: AsyncRead + Unpin>(&self, mut reader: R) -> Result<PipelineReport> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_batches.max(1)));
        let mut scanner = BlockScanner::new();
        let mut report = PipelineReport::default();
        let mut handles: Vec<DispatchHandle> = Vec::new();
        let mut pending: Vec<ParsedQuestion> = Vec::new();
        let mut next_batch_ordinal = 1u64;
        let mut read_buf = vec![0u8; self.options.chunk_size.max(1)];
        let mut utf8_carry: Vec<u8> = Vec::new();

        'stream: loop {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let n = reader.read(&mut read_buf).await.context("读取输入流失败")?;
            if n == 0 {
                break;
            }

            // 跨块拼接被切断的多字节字符
            utf8_carry.extend_from_slice(&read_buf[..n]);
            let valid_len = match std::str::from_utf8(&utf8_carry) {
                Ok(_) => utf8_carry.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => bail!("输入流不是有效的 UTF-8 文本 (偏移 {})", e.valid_up_to()),
            };
            if valid_len == 0 {
                continue;
            }
            let chunk = String::from_utf8_lossy(&utf8_carry[..valid_len]).into_owned();
            utf8_carry.drain(..valid_len);

            for block in scanner.push_chunk(&chunk) {
                self.handle_block(block, &mut report, &mut pending);

                if pending.len() >= self.options.max_batch_size.max(1) {
                    let batch = Batch {
                        ordinal: next_batch_ordinal,
                        questions: std::mem::take(&mut pending),
                    };
                    next_batch_ordinal += 1;
                    if !self
                        .dispatch_batch(batch, &semaphore, &mut handles, &mut report)
                        .await?
                    {
                        break 'stream;
                    }
                }
            }
        }

        if !report.cancelled {
            if !utf8_carry.is_empty() {
                bail!("输入流在多字节字符中间结束");
            }

            // 终态扫描：残留的未闭合题块只影响坏尾，不影响已切出的题块
            if let Err(e) = scanner.finish() {
                error!("❌ {}", e);
                report.tail_error = Some(e.to_string());
            }

            // 流结束时派发最后一个未满的批次
            if !pending.is_empty() {
                let batch = Batch {
                    ordinal: next_batch_ordinal,
                    questions: std::mem::take(&mut pending),
                };
                self.dispatch_batch(batch, &semaphore, &mut handles, &mut report)
                    .await?;
            }
        }

        // 等待所有在途派发结束（取消时同样等待，避免部分写入）
        for (batch_ordinal, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(reason)) => {
                    error!("❌ 批次 {} 派发失败: {}", batch_ordinal, reason);
                    report.dispatch_errors.push(DispatchError {
                        batch_ordinal,
                        reason,
                    });
                }
                Err(e) => {
                    error!("❌ 批次 {} 派发任务执行失败: {}", batch_ordinal, e);
                    report.dispatch_errors.push(DispatchError {
                        batch_ordinal,
                        reason: format!("任务执行失败: {e}"),
                    });
                }
            }
        }

        Ok(report)
    }

    /// 解析一个题块并计入报告
    fn handle_block(
        &self,
        block: RawBlock,
        report: &mut PipelineReport,
        pending: &mut Vec<ParsedQuestion>,
    ) {
        report.total_blocks += 1;
        match self.flow.parse(&block) {
            Ok(question) => {
                report.parsed += 1;
                pending.push(question);
            }
            Err(e) => {
                warn!("[题块 {}] ⚠️ 解析失败: {}", block.ordinal, e);
                report.block_errors.push(BlockError {
                    ordinal: block.ordinal,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// 派发一个批次（在途数达到上限时此处阻塞形成背压）
    ///
    /// 返回 `false` 表示取得许可后发现已被取消，批次被放弃。
    async fn dispatch_batch(
        &self,
        batch: Batch,
        semaphore: &Arc<Semaphore>,
        handles: &mut Vec<DispatchHandle>,
        report: &mut PipelineReport,
    ) -> Result<bool> {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("并发许可获取失败")?;

        // 等许可期间可能收到取消信号
        if self.cancel.is_cancelled() {
            report.cancelled = true;
            return Ok(false);
        }

        info!("📦 派发批次 {} ({} 道题)", batch.ordinal, batch.len());
        let batch_ordinal = batch.ordinal;
        let future = self.sink.dispatch(batch);
        let handle = tokio::spawn(async move {
            let _permit = permit;
            future.await.map_err(|e| format!("{e:#}"))
        });
        handles.push((batch_ordinal, handle));
        report.batches_dispatched += 1;
        Ok(true)
    }
}
