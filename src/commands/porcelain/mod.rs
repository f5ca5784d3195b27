//! Porcelain commands
//!
//! - `init`: Create the repository directory layout
//! - `add`: Stage files or whole directories
//! - `rm`: Unstage files or directories, leaving the working tree alone
//! - `commit`: Snapshot the index and advance HEAD
//! - `log`: Show history from HEAD

pub mod add;
pub mod commit;
pub mod init;
pub mod log;
pub mod rm;
