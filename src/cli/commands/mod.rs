mod command_result;
pub mod coverage;
pub mod helper;
pub mod init;
pub mod validate;

pub use command_result::*;
