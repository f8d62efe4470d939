pub mod content;
pub mod storage;
