pub mod cli;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;
pub mod worker;


pub use error::{WorkerError, WorkerResult};
