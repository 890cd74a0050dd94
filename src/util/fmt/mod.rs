pub mod error;
pub mod tree;
