//! 编排层
//!
//! `App` 是二进制入口的顶层编排：初始化日志文件、打开输入流、
//! 装配落库端与流水线、输出最终统计。`StreamPipeline` 是可以
//! 单独嵌入的流式摄取核心。

pub mod stream_pipeline;

pub use stream_pipeline::{
    BlockError, CancelToken, DispatchError, PipelineOptions, PipelineReport, StreamPipeline,
};

use crate::config::Config;
use crate::services::JsonlSink;
use crate::utils::logging;
use crate::workflow::BlockFlow;
use anyhow::{Context, Result};
use std::sync::Arc;

/// 应用主结构
pub struct App {
    config: Config,
    cancel: CancelToken,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    /// 外部取消句柄（如挂接 Ctrl-C）
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 运行摄取流程
    pub async fn run(&self) -> Result<PipelineReport> {
        let file = tokio::fs::File::open(&self.config.input_file)
            .await
            .with_context(|| format!("无法打开输入文件: {}", self.config.input_file))?;

        let sink = Arc::new(JsonlSink::create(&self.config.output_file).await?);
        let flow = BlockFlow::new(&self.config);
        let pipeline = StreamPipeline::new(PipelineOptions::from_config(&self.config), flow, sink)
            .with_cancel(self.cancel.clone());

        let report = pipeline.run(file).await?;

        logging::print_final_report(&report, &self.config);
        logging::append_report(&self.config.output_log_file, &report)?;

        Ok(report)
    }
}
