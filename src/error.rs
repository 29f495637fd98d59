use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 块扫描错误
    #[error("扫描错误: {0}")]
    Scan(#[from] ScanError),
    /// 单个题块解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// MapID 编解码错误
    #[error("MapID错误: {0}")]
    MapId(#[from] MapIdError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 块扫描错误（流级别）
#[derive(Debug, Error)]
pub enum ScanError {
    /// 流结束时仍存在未闭合的题目环境
    #[error("流末尾存在未闭合的题目环境: {preview}")]
    MalformedTail { preview: String },
}

/// 单个题块的解析错误
///
/// 这些错误只影响当前题块，不会中断整个流的处理。
#[derive(Debug, Error)]
pub enum ParseError {
    /// 无法识别的题型宏（choice / choiceTF / shortans 家族之外的变体）
    #[error("未知的题型宏: \\{name}")]
    UnknownDiscriminator { name: String },
    /// 选项的花括号未闭合
    #[error("第 {ordinal} 个选项的花括号未闭合")]
    UnterminatedOption { ordinal: u32 },
    /// 题块没有任何选项
    #[error("题块没有任何选项")]
    NoOptions,
    /// 缺少正确答案标记
    #[error("缺少正确答案标记 (\\ans)")]
    MissingCorrectMarker,
    /// 单选题出现多个正确答案标记
    #[error("单选题出现 {count} 个正确答案标记，有且只能有一个")]
    MultipleCorrectMarkers { count: usize },
    /// 填空题宏后缺少答案字面量
    #[error("\\shortans 后缺少花括号包裹的答案")]
    MissingAnswerLiteral,
    /// 解答的花括号未闭合
    #[error("\\solution 的花括号未闭合")]
    UnterminatedSolution,
}

/// MapID 编解码错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapIdError {
    /// 缺少外层方括号
    #[error("MapID 必须由一对方括号包裹: {input}")]
    NotBracketed { input: String },
    /// 标记数量不是 5 或 6
    #[error("MapID 标记数量应为 5 或 6，实际为 {count}")]
    BadTokenCount { count: usize },
    /// 某个标记不是单个字母或数字
    #[error("MapID 第 {index} 个标记 ({field}) 无效: '{token}'")]
    InvalidToken {
        index: usize,
        field: &'static str,
        token: String,
    },
    /// 连字符后不是恰好一个小题型标记
    #[error("MapID 连字符后应恰好有一个小题型标记")]
    BadFormSuffix,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
