pub mod block_flow;

pub use block_flow::BlockFlow;
