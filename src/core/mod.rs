pub mod archive;
pub mod engine;
pub mod separator;
