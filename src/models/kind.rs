/// 题型枚举
///
/// 由题块正文中的题型宏决定；没有题型宏的题块为解答题。
/// 新增题型时在此处扩展，所有 `match` 都是穷尽匹配，编译期即可发现遗漏。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum QuestionKind {
    /// 单选题（\choice，有且只有一个正确选项）
    SingleChoice,
    /// 判断题（\choiceTF，每个选项独立判断对错）
    MultiTrueFalse,
    /// 填空题（\shortans，答案为字面量）
    ShortAnswer,
    /// 解答题（无题型宏，只有题干和解答）
    Essay,
    /// 多选题（\choice[multi]，正确选项至少一个）
    MultiAnswer,
}

impl QuestionKind {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "单选题",
            QuestionKind::MultiTrueFalse => "判断题",
            QuestionKind::ShortAnswer => "填空题",
            QuestionKind::Essay => "解答题",
            QuestionKind::MultiAnswer => "多选题",
        }
    }

    /// 是否为选项类题型（解析结果中带有选项列表）
    pub fn is_choice_based(self) -> bool {
        match self {
            QuestionKind::SingleChoice | QuestionKind::MultiTrueFalse | QuestionKind::MultiAnswer => true,
            QuestionKind::ShortAnswer | QuestionKind::Essay => false,
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
