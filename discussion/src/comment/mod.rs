pub mod sort;
pub mod tree;
pub mod vote;

pub use vote::{VoteDirection, VoteReceipt};
