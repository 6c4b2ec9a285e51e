pub const JOB_KIND: &str = "registraduria";
pub const API_TOKEN: &str = "test-queue-token";
pub const SUBJECT_ID: &str = "12345678";
