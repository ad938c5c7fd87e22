pub mod crypto;
pub mod download;
pub mod progress;
