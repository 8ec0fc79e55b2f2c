pub mod build;
pub mod command;
pub mod driver;

pub use command::CommandTemplate;
pub use driver::{BatchOutcome, ExecutionDriver};
