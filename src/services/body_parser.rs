//! 题型正文解析 - 业务能力层
//!
//! 按题型宏分派的状态机，每种题型一条穷尽匹配分支：
//!
//! - `\choice{..}{..}…` 单选题，有且只有一个 `\ans` 标记
//! - `\choice[multi]{..}…` 多选题，至少一个标记
//! - `\choiceTF{..}{..}…` 判断题，每个选项独立判断，无数量约束
//! - `\shortans{..}` 填空题，花括号内为答案字面量
//! - 无题型宏 — 解答题
//!
//! 正确答案标记 `\ans` 必须紧贴选项的开花括号，之前不能有空白；
//! 出现在其他位置的 `\ans` 一律视为普通内容。

use crate::error::ParseError;
use crate::models::{AnswerOption, CorrectAnswer, QuestionKind};
use crate::services::braces;
use tracing::warn;

/// 正确答案标记
const CORRECT_MARKER: &str = "\\ans";

/// 题型宏表
static DISCRIMINATORS: phf::Map<&'static str, QuestionKind> = phf::phf_map! {
    "choice" => QuestionKind::SingleChoice,
    "choiceTF" => QuestionKind::MultiTrueFalse,
    "shortans" => QuestionKind::ShortAnswer,
};

/// 正文解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody {
    /// 题型
    pub kind: QuestionKind,
    /// 题干（去除题型宏与选项后的正文）
    pub prompt: String,
    /// 选项（仅选项类题型）
    pub options: Option<Vec<AnswerOption>>,
    /// 正确答案
    pub correct_answer: CorrectAnswer,
}

/// 解析一个题块的正文（元数据与解答已剥离）
pub fn parse_body(ordinal: u64, body: &str) -> Result<ParsedBody, ParseError> {
    let Some((kind, start, name_end)) = find_discriminator(body)? else {
        // 无题型宏 — 解答题，没有客观答案
        return Ok(ParsedBody {
            kind: QuestionKind::Essay,
            prompt: body.trim().to_string(),
            options: None,
            correct_answer: CorrectAnswer::Essay,
        });
    };

    match kind {
        QuestionKind::SingleChoice => {
            // \choice 家族：可选 [multi] 参数声明为非互斥多选
            let (kind, flag_end) = read_choice_flag(ordinal, body, name_end);
            let (options, span_end) = read_options(body, flag_end)?;
            let correct_answer = choice_answer(kind, &options)?;
            Ok(ParsedBody {
                kind,
                prompt: cut_span(body, start, span_end),
                options: Some(options),
                correct_answer,
            })
        }
        QuestionKind::MultiTrueFalse => {
            let (options, span_end) = read_options(body, name_end)?;
            if options.is_empty() {
                return Err(ParseError::NoOptions);
            }
            // 每个选项都是独立的对错判断，标记数量任意
            let marked = marked_ordinals(&options);
            Ok(ParsedBody {
                kind,
                prompt: cut_span(body, start, span_end),
                options: Some(options),
                correct_answer: CorrectAnswer::TrueFalse(marked),
            })
        }
        QuestionKind::ShortAnswer => {
            let rest = &body[name_end..];
            let open = name_end + (rest.len() - rest.trim_start().len());
            if !body[open..].starts_with('{') {
                return Err(ParseError::MissingAnswerLiteral);
            }
            let (answer, span_end) = braces::read_group(body, open)
                .ok_or(ParseError::UnterminatedOption { ordinal: 1 })?;
            Ok(ParsedBody {
                kind,
                prompt: cut_span(body, start, span_end),
                options: None,
                correct_answer: CorrectAnswer::Short(answer.trim().to_string()),
            })
        }
        // 多选在 read_choice_flag 中产生，Essay 在无宏分支中产生
        QuestionKind::MultiAnswer | QuestionKind::Essay => unreachable!("题型宏表不含该题型"),
    }
}

/// 在正文中查找第一个题型宏，返回 (题型, 宏起始, 宏名结束)
///
/// `choice` / `shortans` 家族的未知变体（如 `\choiceXY`）是该
/// 题块的致命错误；其余宏（`\frac` 等排版宏）视为普通内容。
fn find_discriminator(body: &str) -> Result<Option<(QuestionKind, usize, usize)>, ParseError> {
    let mut search_from = 0;
    while let Some(off) = body[search_from..].find('\\') {
        let start = search_from + off;
        let name_start = start + 1;
        let name_len = body[name_start..]
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .count();
        let name_end = name_start + name_len;
        let name = &body[name_start..name_end];

        if let Some(kind) = DISCRIMINATORS.get(name) {
            return Ok(Some((*kind, start, name_end)));
        }
        if !name.is_empty()
            && (name.starts_with("choice") || name.starts_with("shortans"))
        {
            return Err(ParseError::UnknownDiscriminator {
                name: name.to_string(),
            });
        }
        search_from = name_end.max(start + 1);
    }
    Ok(None)
}

/// 读取 \choice 的可选参数，返回 (实际题型, 参数结束位置)
fn read_choice_flag(ordinal: u64, body: &str, name_end: usize) -> (QuestionKind, usize) {
    let rest = &body[name_end..];
    let open = name_end + (rest.len() - rest.trim_start().len());
    if !body[open..].starts_with('[') {
        return (QuestionKind::SingleChoice, name_end);
    }
    let Some(close) = body[open..].find(']') else {
        warn!("[题块 {}] ⚠️ \\choice 的方括号参数未闭合，按普通内容处理", ordinal);
        return (QuestionKind::SingleChoice, name_end);
    };
    let flag = body[open + 1..open + close].trim();
    let flag_end = open + close + 1;
    match flag {
        "multi" => (QuestionKind::MultiAnswer, flag_end),
        other => {
            warn!("[题块 {}] ⚠️ 未知的 \\choice 参数，已忽略: [{}]", ordinal, other);
            (QuestionKind::SingleChoice, flag_end)
        }
    }
}

/// 读取题型宏之后的连续选项组，返回 (选项列表, 区段结束位置)
fn read_options(body: &str, mut pos: usize) -> Result<(Vec<AnswerOption>, usize), ParseError> {
    let mut options = Vec::new();
    loop {
        let rest = &body[pos..];
        let next = pos + (rest.len() - rest.trim_start().len());
        if !body[next..].starts_with('{') {
            break;
        }
        let ordinal = options.len() as u32 + 1;
        let (inner, end) = braces::read_group(body, next)
            .ok_or(ParseError::UnterminatedOption { ordinal })?;
        let (is_correct, content) = split_marker(inner);
        options.push(AnswerOption {
            ordinal,
            content: content.trim().to_string(),
            is_correct,
        });
        pos = end;
    }
    Ok((options, pos))
}

/// 判断选项内容是否以正确答案标记开头
///
/// 标记必须紧贴开花括号且构成完整宏名：`{\ans 4}` 是标记，
/// `{ \ans 4}` 和 `{\answer}` 都不是。
fn split_marker(inner: &str) -> (bool, &str) {
    if let Some(rest) = inner.strip_prefix(CORRECT_MARKER) {
        match rest.chars().next() {
            None => (true, rest),
            Some(c) if !c.is_ascii_alphabetic() => (true, rest),
            Some(_) => (false, inner),
        }
    } else {
        (false, inner)
    }
}

/// 单选/多选的答案校验
fn choice_answer(
    kind: QuestionKind,
    options: &[AnswerOption],
) -> Result<CorrectAnswer, ParseError> {
    if options.is_empty() {
        return Err(ParseError::NoOptions);
    }
    let marked = marked_ordinals(options);
    match kind {
        QuestionKind::SingleChoice => match marked.as_slice() {
            [] => Err(ParseError::MissingCorrectMarker),
            [only] => Ok(CorrectAnswer::Single(*only)),
            many => Err(ParseError::MultipleCorrectMarkers { count: many.len() }),
        },
        QuestionKind::MultiAnswer => {
            if marked.is_empty() {
                return Err(ParseError::MissingCorrectMarker);
            }
            Ok(CorrectAnswer::Multiple(marked))
        }
        _ => unreachable!("仅选项类题型会走到这里"),
    }
}

fn marked_ordinals(options: &[AnswerOption]) -> Vec<u32> {
    options
        .iter()
        .filter(|o| o.is_correct)
        .map(|o| o.ordinal)
        .collect()
}

/// 从正文中去掉 [start, end) 区段并修剪首尾空白
fn cut_span(body: &str, start: usize, end: usize) -> String {
    let mut prompt = String::with_capacity(body.len() - (end - start));
    prompt.push_str(&body[..start]);
    prompt.push_str(&body[end..]);
    prompt.trim().to_string()
}
