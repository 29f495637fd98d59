//! 块扫描器 - 业务能力层
//!
//! 从不断增长的文本缓冲区中切出完整的题目环境。
//!
//! 调用方（流水线）按固定大小的数据块喂入 `push_chunk`，扫描器
//! 持有缓冲区与当前嵌套深度，跨数据块累积不完整的题块；一个题块
//! 在其起始标记被同一嵌套深度的结束标记闭合时才算完整。
//! 流结束后必须调用一次 `finish` 做终态检查。

use crate::error::ScanError;
use crate::models::RawBlock;
use crate::utils::logging::truncate_text;
use tracing::warn;

/// 题目环境起始标记
pub const BEGIN_MARK: &str = "\\begin{question}";
/// 题目环境结束标记
pub const END_MARK: &str = "\\end{question}";

/// 块扫描器
///
/// 显式携带扫描状态的结构体：缓冲区由驱动它的流水线独占，
/// 不存在并发访问。
#[derive(Debug)]
pub struct BlockScanner {
    buffer: String,
    next_ordinal: u64,
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockScanner {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            next_ordinal: 1,
        }
    }

    /// 已切出的题块数量
    pub fn blocks_seen(&self) -> u64 {
        self.next_ordinal - 1
    }

    /// 喂入一个数据块，返回其中所有新近完整的题块
    ///
    /// 题块按源文件顺序返回，序号单调递增；块与块之间的
    /// 杂散文本（导言、空行）被静默跳过。
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<RawBlock> {
        self.buffer.push_str(chunk);

        let mut blocks = Vec::new();
        while let Some((start, end)) = find_complete_block(&self.buffer) {
            let text = self.buffer[start..end].to_string();
            self.buffer.drain(..end);
            blocks.push(RawBlock {
                ordinal: self.next_ordinal,
                text,
            });
            self.next_ordinal += 1;
        }
        blocks
    }

    /// 终态检查（流结束后调用一次）
    ///
    /// 残留文本中仍有起始标记说明最后一个题块未闭合，报告为
    /// 坏尾错误；不含起始标记的残留文本记录警告后丢弃，
    /// 已切出的题块不受影响。
    pub fn finish(&mut self) -> Result<(), ScanError> {
        let leftover = std::mem::take(&mut self.buffer);
        if leftover.contains(BEGIN_MARK) {
            return Err(ScanError::MalformedTail {
                preview: truncate_text(leftover.trim(), 80),
            });
        }
        if !leftover.trim().is_empty() {
            warn!("⚠️ 流末尾存在题块之外的文本，已忽略: {}", truncate_text(leftover.trim(), 80));
        }
        Ok(())
    }
}

/// 在缓冲区中查找第一个完整题块，返回其字节区间
///
/// 从第一个起始标记开始按嵌套深度计数（题目环境允许嵌套），
/// 深度归零的结束标记闭合该题块；找不到闭合则返回 `None`，
/// 等待后续数据块补全。
fn find_complete_block(buffer: &str) -> Option<(usize, usize)> {
    let start = buffer.find(BEGIN_MARK)?;
    let mut depth = 1usize;
    let mut pos = start + BEGIN_MARK.len();

    loop {
        let next_begin = buffer[pos..].find(BEGIN_MARK).map(|i| pos + i);
        let next_end = buffer[pos..].find(END_MARK).map(|i| pos + i);
        match (next_begin, next_end) {
            (Some(b), Some(e)) if b < e => {
                depth += 1;
                pos = b + BEGIN_MARK.len();
            }
            (_, Some(e)) => {
                depth -= 1;
                pos = e + END_MARK.len();
                if depth == 0 {
                    return Some((start, pos));
                }
            }
            (_, None) => return None,
        }
    }
}
