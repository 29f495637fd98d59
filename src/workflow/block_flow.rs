//! 题块处理流程 - 流程层
//!
//! 核心职责：定义"一个题块"从原文到结构化题目的完整流程
//!
//! 流程顺序：
//! 1. 元数据提取（来源 / MapID / 编号）
//! 2. 解答切分
//! 3. 按题型解析正文
//!
//! 解析是纯转换：单线程、同步、无副作用，可以在任意工作线程上
//! 运行而无需协调。每个题块产出一个不可变的 `ParsedQuestion`。

use crate::config::Config;
use crate::error::ParseError;
use crate::models::{ParsedQuestion, RawBlock};
use crate::services::{body_parser, metadata, solution};
use crate::utils::logging::truncate_text;
use tracing::debug;

/// 题块处理流程
///
/// 不持有任何资源，只组合业务能力。
pub struct BlockFlow {
    verbose_logging: bool,
}

impl BlockFlow {
    /// 创建新的题块处理流程
    pub fn new(config: &Config) -> Self {
        Self {
            verbose_logging: config.verbose_logging,
        }
    }

    /// 把一个原始题块解析为结构化题目
    ///
    /// 错误只影响当前题块，调用方记录后继续处理后续题块。
    pub fn parse(&self, block: &RawBlock) -> Result<ParsedQuestion, ParseError> {
        if self.verbose_logging {
            debug!(
                "[题块 {}] 原文: {}",
                block.ordinal,
                truncate_text(&block.text, 80)
            );
        }

        let meta = metadata::extract(block);
        let (body, solution) = solution::split_solution(block.ordinal, &meta.body)?;
        let parsed = body_parser::parse_body(block.ordinal, &body)?;

        Ok(ParsedQuestion {
            ordinal: block.ordinal,
            raw_content: block.text.clone(),
            content: parsed.prompt,
            kind: parsed.kind,
            sub_id: meta.sub_id,
            source: meta.source,
            options: parsed.options,
            correct_answer: parsed.correct_answer,
            solution,
            taxonomy: meta.taxonomy,
        })
    }
}
