pub mod job;
pub mod report;

pub use job::Job;
pub use report::OutcomeReport;
