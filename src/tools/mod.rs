mod adapter;
mod command;
mod process;

pub use adapter::{ProcessAdapter, ToolAdapter};
pub use command::{ToolBinary, ToolCommand, ToolPaths};
pub use process::ProcessRunner;
