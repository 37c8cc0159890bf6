//! CLI command implementations.

pub mod parse;
pub mod report;

pub use parse::ParseCommand;
pub use report::ReportCommand;
