//! One module per subcommand, each exposing `execute`.

pub mod delete;
pub mod generate;
pub mod get;
pub mod init;
pub mod list;
pub mod merge;
pub mod passwd;
pub mod set;
pub mod unset;
