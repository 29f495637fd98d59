pub mod kind;
pub mod mapid;
pub mod question;

pub use kind::QuestionKind;
pub use mapid::TaxonomyCode;
pub use question::{AnswerOption, Batch, CorrectAnswer, ParsedQuestion, RawBlock};
