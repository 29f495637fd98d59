//! # Tiku Ingest
//!
//! 一个把 LaTeX 方言题库文件流式摄取为结构化题目记录的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/` - 交接契约的数据结构
//! - `ParsedQuestion` / `Batch` - 解析结果与派发单元
//! - `TaxonomyCode` - MapID 分类标识及其编解码
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力只处理单个题块
//! - `BlockScanner` - 从增长缓冲区中切出完整题目环境
//! - `metadata` / `body_parser` / `solution` - 题块三段式解析
//! - `BatchSink` / `JsonlSink` - 落库交接边界与演示实现
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个题块"的完整处理流程
//! - `BlockFlow` - 流程编排（元数据 → 解答 → 题型正文）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/stream_pipeline` - 流式批量摄取流水线，管理分块
//!   读取、批次形成与并发派发
//! - `orchestrator::App` - 二进制入口的顶层编排
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, MapIdError, ParseError, ScanError};
pub use models::{AnswerOption, Batch, CorrectAnswer, ParsedQuestion, QuestionKind, RawBlock, TaxonomyCode};
pub use orchestrator::{App, CancelToken, PipelineOptions, PipelineReport, StreamPipeline};
pub use services::{BatchSink, BlockScanner, JsonlSink};
pub use workflow::BlockFlow;
