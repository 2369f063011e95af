// casup-aio/src/lib.rs
//! IO operations for casup (uploader subprocesses, staging files, json output)

pub mod fs;
pub mod json_io;
pub mod process;

pub use json_io::{to_pretty_json, write_json_sync};
pub use process::{CommandOutput, CommandRunner, Invocation, SystemRunner};
