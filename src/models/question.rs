//! 题目数据模型
//!
//! 解析流水线的输出结构，是与存储端之间的交接契约。
//! `ParsedQuestion` 在解析完成后不再修改。

use crate::models::kind::QuestionKind;
use crate::models::mapid::TaxonomyCode;
use serde::{Deserialize, Serialize};

/// 一个完整题目环境的原始文本
///
/// 由块扫描器产出，立即交给解析流程消费，不持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// 题块在流中的序号（从 1 开始，单调递增）
    pub ordinal: u64,
    /// 题块原文（含首尾环境标记与注释行）
    pub text: String,
}

/// 一个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// 选项序号（从 1 开始，题内稳定）
    pub ordinal: u32,
    /// 选项内容
    pub content: String,
    /// 是否正确（由 \ans 标记决定，绝不推断）
    pub is_correct: bool,
}

/// 正确答案，按题型区分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CorrectAnswer {
    /// 单选题：正确选项的序号
    Single(u32),
    /// 判断题：被标记为"对"的选项序号集合（可为空，也可全选）
    TrueFalse(Vec<u32>),
    /// 填空题：答案字面量
    Short(String),
    /// 解答题：无客观答案
    Essay,
    /// 多选题：正确选项序号集合（非空）
    Multiple(Vec<u32>),
}

/// 解析完成的题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    /// 题块在流中的序号
    pub ordinal: u64,
    /// 题块原文
    pub raw_content: String,
    /// 题干（去除题型宏、选项与解答后的正文）
    pub content: String,
    /// 题型
    pub kind: QuestionKind,
    /// 外部编号（如 T1234）
    pub sub_id: Option<String>,
    /// 来源
    pub source: Option<String>,
    /// 选项列表（仅选项类题型）
    pub options: Option<Vec<AnswerOption>>,
    /// 正确答案
    pub correct_answer: CorrectAnswer,
    /// 解答
    pub solution: Option<String>,
    /// 分类标识
    pub taxonomy: Option<TaxonomyCode>,
}

/// 一个待派发的批次
///
/// 批次一经形成即不可变，可以安全地交给并发派发任务。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// 批次在流中的序号（从 1 开始）
    pub ordinal: u64,
    /// 本批题目
    pub questions: Vec<ParsedQuestion>,
}

impl Batch {
    /// 批次内题目数量
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// 批次是否为空
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
