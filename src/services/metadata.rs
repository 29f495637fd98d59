//! 元数据提取 - 业务能力层
//!
//! 题块正文之前可以出现若干 `%` 注释行，每行一条注解：
//!
//! - `% 来源: 2023年全国卷` — 来源
//! - `% [2P1H2-1]` — MapID 分类标识
//! - `% T1234` — 外部编号（字母前缀 + 序号）
//!
//! 注解顺序不限，每种至多一条；重复出现时后者覆盖前者并记录警告。
//! 无法识别的注解只警告不报错，题块照常解析；MapID 语法错误使该
//! 题块降级为"无分类"，同样不致命。

use crate::models::{RawBlock, TaxonomyCode};
use crate::services::scanner::{BEGIN_MARK, END_MARK};
use crate::utils::logging::truncate_text;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^来源[:：]\s*(.*)$").expect("来源正则应当合法"));
static MAPID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\[\]]*\]$").expect("MapID正则应当合法"));
static SUB_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,3}[0-9]+$").expect("编号正则应当合法"));

/// 元数据提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMeta {
    /// 来源
    pub source: Option<String>,
    /// 分类标识
    pub taxonomy: Option<TaxonomyCode>,
    /// 外部编号
    pub sub_id: Option<String>,
    /// 去掉环境标记和注释行后的正文
    pub body: String,
}

/// 提取一个题块的元数据注解
pub fn extract(block: &RawBlock) -> ExtractedMeta {
    let inner = block
        .text
        .strip_prefix(BEGIN_MARK)
        .and_then(|s| s.strip_suffix(END_MARK))
        .unwrap_or(&block.text);

    let mut meta = ExtractedMeta {
        source: None,
        taxonomy: None,
        sub_id: None,
        body: String::new(),
    };

    let lines: Vec<&str> = inner.lines().collect();
    let mut idx = 0;
    while idx < lines.len() {
        let trimmed = lines[idx].trim();
        if trimmed.is_empty() {
            idx += 1;
            continue;
        }
        match trimmed.strip_prefix('%') {
            Some(annotation) => {
                classify(block.ordinal, annotation.trim(), &mut meta);
                idx += 1;
            }
            // 第一个非注释行即正文起点
            None => break,
        }
    }
    meta.body = lines[idx..].join("\n");
    meta
}

/// 识别单条注解并写入结果
fn classify(ordinal: u64, annotation: &str, meta: &mut ExtractedMeta) {
    if let Some(caps) = SOURCE_RE.captures(annotation) {
        let source = caps[1].trim().to_string();
        if meta.source.replace(source).is_some() {
            warn!("[题块 {}] ⚠️ 重复的来源注解，后者覆盖前者", ordinal);
        }
        return;
    }

    if MAPID_RE.is_match(annotation) {
        match TaxonomyCode::decode(annotation) {
            Ok(code) => {
                if meta.taxonomy.replace(code).is_some() {
                    warn!("[题块 {}] ⚠️ 重复的 MapID 注解，后者覆盖前者", ordinal);
                }
            }
            // 格式错误只降级本注解，题块照常解析
            Err(e) => warn!("[题块 {}] ⚠️ MapID 格式错误，该题降级为无分类: {}", ordinal, e),
        }
        return;
    }

    if SUB_ID_RE.is_match(annotation) {
        if meta.sub_id.replace(annotation.to_string()).is_some() {
            warn!("[题块 {}] ⚠️ 重复的编号注解，后者覆盖前者", ordinal);
        }
        return;
    }

    warn!(
        "[题块 {}] ⚠️ 无法识别的注解，已忽略: {}",
        ordinal,
        truncate_text(annotation, 40)
    );
}
