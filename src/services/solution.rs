//! 解答提取 - 业务能力层
//!
//! 在题块正文中定位唯一的 `\solution{…}` 区段，按深度匹配花括号
//! （内容可以包含嵌套花括号），原样返回内部文本，不做宏展开。

use crate::error::ParseError;
use crate::services::braces;
use tracing::warn;

const SOLUTION_MACRO: &str = "\\solution";

/// 从正文中切出解答
///
/// 返回去掉解答区段后的正文与解答文本。没有解答不是错误；
/// `\solution` 后缺少花括号组时降级为无解答（警告）；花括号
/// 未闭合则是该题块的致命错误。
pub fn split_solution(ordinal: u64, body: &str) -> Result<(String, Option<String>), ParseError> {
    let mut search_from = 0;
    while let Some(off) = body[search_from..].find(SOLUTION_MACRO) {
        let start = search_from + off;
        let name_end = start + SOLUTION_MACRO.len();

        // 宏名边界：\solutions 之类是别的宏，继续找
        if body[name_end..].chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            search_from = name_end;
            continue;
        }

        let rest = &body[name_end..];
        let ws = rest.len() - rest.trim_start().len();
        let open = name_end + ws;
        if !body[open..].starts_with('{') {
            warn!("[题块 {}] ⚠️ \\solution 后缺少花括号组，按无解答处理", ordinal);
            return Ok((body.to_string(), None));
        }

        let (inner, end) = match braces::read_group(body, open) {
            Some(found) => found,
            None => return Err(ParseError::UnterminatedSolution),
        };

        if body[end..].contains(SOLUTION_MACRO) {
            warn!("[题块 {}] ⚠️ 检测到多个解答区段，只取第一个", ordinal);
        }

        let mut remainder = String::with_capacity(body.len() - (end - start));
        remainder.push_str(&body[..start]);
        remainder.push_str(&body[end..]);
        return Ok((remainder, Some(inner.to_string())));
    }
    Ok((body.to_string(), None))
}
