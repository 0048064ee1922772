//! Command implementations, one module per subcommand.

pub mod add;
pub mod delete;
pub mod edit;
pub mod get;
pub mod init;
pub mod list;
#[cfg(feature = "legacy-sqlite")]
pub mod migrate;
pub mod status;
