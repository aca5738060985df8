// Core types and storage for the Knowbase article store

pub mod types;
pub mod storage;
pub mod query;
pub mod text;
pub mod articles;

pub use types::*;
