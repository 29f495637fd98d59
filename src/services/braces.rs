//! 深度感知的花括号匹配
//!
//! 选项与解答的内容可以包含嵌套花括号（如 `{a{b}c}`），
//! 匹配时按深度计数，反斜杠转义的 `\{` `\}` 不参与计数。

/// 从 `text[open..]` 读取一个花括号组
///
/// `open` 必须指向一个 `{`。返回去掉外层花括号的内部文本，
/// 以及闭合 `}` 之后的字节偏移；未闭合时返回 `None`。
pub(crate) fn read_group(text: &str, open: usize) -> Option<(&str, usize)> {
    if !text[open..].starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut iter = text[open..].char_indices();
    while let Some((i, c)) = iter.next() {
        match c {
            // 转义字符：下一个字符不参与匹配
            '\\' => {
                iter.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[open + 1..open + i], open + i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_group() {
        assert_eq!(read_group("{abc}后文", 0), Some(("abc", 5)));
    }

    #[test]
    fn reads_nested_group() {
        let (inner, end) = read_group("{a{b}c}", 0).unwrap();
        assert_eq!(inner, "a{b}c");
        assert_eq!(end, 7);
    }

    #[test]
    fn reads_group_at_offset() {
        let text = "前缀{x}";
        let open = text.find('{').unwrap();
        assert_eq!(read_group(text, open), Some(("x", text.len())));
    }

    #[test]
    fn escaped_braces_do_not_count() {
        let (inner, _) = read_group(r"{a\{b}", 0).unwrap();
        assert_eq!(inner, r"a\{b");
    }

    #[test]
    fn unterminated_group_is_none() {
        assert_eq!(read_group("{a{b}", 0), None);
    }

    #[test]
    fn non_brace_start_is_none() {
        assert_eq!(read_group("abc", 0), None);
    }
}
