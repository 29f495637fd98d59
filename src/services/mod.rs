pub mod body_parser;
pub(crate) mod braces;
pub mod metadata;
pub mod scanner;
pub mod sink;
pub mod solution;

pub use scanner::BlockScanner;
pub use sink::{BatchSink, JsonlSink};
