pub mod client;
pub mod session;

pub use client::{DirectoryClient, DirectoryError, RedisDirectoryClient};
pub use session::{SessionDirectory, SessionLocation};
