pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod paths;
pub mod storage;

pub use config::Config;
pub use error::BlobPullError;
