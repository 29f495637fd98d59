//! MapID 编解码
//!
//! MapID 是紧凑的方括号分类标识，按固定顺序编码
//! 年级 / 学科 / 章 / 难度 / 节，以及可选的小题型：
//!
//! - ID5：`[2P1H2]`
//! - ID6：`[2P1H2-1]`（连字符后为小题型）
//!
//! 编解码只做语法校验，不判断某个标记在分类表中是否真实存在，
//! 语义查表由外部系统负责。

use crate::error::MapIdError;

/// 各标记位置的名称（用于错误提示）
const FIELDS: [&'static str; 6] = ["年级", "学科", "章", "难度", "节", "小题型"];

/// 结构化的分类标识
///
/// `form` 存在与否区分 ID6 / ID5 两种变体；`form` 缺省与任何具体
/// 小题型取值都不相等。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaxonomyCode {
    /// 年级
    pub grade: char,
    /// 学科
    pub subject: char,
    /// 章
    pub chapter: char,
    /// 难度
    pub level: char,
    /// 节
    pub lesson: char,
    /// 小题型（仅 ID6）
    pub form: Option<char>,
}

impl TaxonomyCode {
    /// 构造并校验一个分类标识
    pub fn new(
        grade: char,
        subject: char,
        chapter: char,
        level: char,
        lesson: char,
        form: Option<char>,
    ) -> Result<Self, MapIdError> {
        let code = Self {
            grade,
            subject,
            chapter,
            level,
            lesson,
            form,
        };
        for (index, token) in code.tokens().into_iter().flatten().enumerate() {
            if !token.is_ascii_alphanumeric() {
                return Err(MapIdError::InvalidToken {
                    index: index + 1,
                    field: FIELDS[index],
                    token: token.to_string(),
                });
            }
        }
        Ok(code)
    }

    /// 从方括号字符串解码
    ///
    /// 接受规范写法 `[gscln]` / `[gscln-f]`，同时兼容不带连字符的
    /// 六字符写法 `[gsclnf]`（旧数据中存在）。
    pub fn decode(input: &str) -> Result<Self, MapIdError> {
        let inner = input
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| MapIdError::NotBracketed {
                input: input.to_string(),
            })?;
        if inner.contains('[') || inner.contains(']') {
            return Err(MapIdError::NotBracketed {
                input: input.to_string(),
            });
        }

        let (base, form) = match inner.find('-') {
            Some(pos) => {
                let suffix: Vec<char> = inner[pos + 1..].chars().collect();
                if suffix.len() != 1 {
                    return Err(MapIdError::BadFormSuffix);
                }
                (&inner[..pos], Some(suffix[0]))
            }
            None => {
                let chars: Vec<char> = inner.chars().collect();
                match chars.len() {
                    5 => (inner, None),
                    // 兼容写法：第六个字符即小题型
                    6 => (&inner[..inner.len() - chars[5].len_utf8()], Some(chars[5])),
                    count => return Err(MapIdError::BadTokenCount { count }),
                }
            }
        };

        let tokens: Vec<char> = base.chars().collect();
        if tokens.len() != 5 {
            let count = tokens.len() + if form.is_some() { 1 } else { 0 };
            return Err(MapIdError::BadTokenCount { count });
        }

        Self::new(tokens[0], tokens[1], tokens[2], tokens[3], tokens[4], form)
    }

    /// 编码为规范的方括号字符串
    ///
    /// ID6 始终使用带连字符的写法，`decode(encode(x)) == x` 对所有
    /// 合法取值成立。
    pub fn encode(&self) -> String {
        match self.form {
            Some(form) => format!(
                "[{}{}{}{}{}-{}]",
                self.grade, self.subject, self.chapter, self.level, self.lesson, form
            ),
            None => format!(
                "[{}{}{}{}{}]",
                self.grade, self.subject, self.chapter, self.level, self.lesson
            ),
        }
    }

    fn tokens(&self) -> [Option<char>; 6] {
        [
            Some(self.grade),
            Some(self.subject),
            Some(self.chapter),
            Some(self.level),
            Some(self.lesson),
            self.form,
        ]
    }
}

impl std::fmt::Display for TaxonomyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}
