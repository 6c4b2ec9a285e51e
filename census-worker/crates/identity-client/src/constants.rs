use std::time::Duration;

pub const LOOKUP_PATH: &str = "get-information";

pub const DEFAULT_API_URL: &str = "https://apiweb-eleccionescolombia.infovotantes.com/api/v1/citizen/";
pub const DEFAULT_PAGE_URL: &str = "https://eleccionescolombia.registraduria.gov.co/identificacion";
pub const DEFAULT_SITE_KEY: &str = "6Lc9DmgrAAAAAJAjWVhjDy1KSgqzqJikY5z7I9SV";
pub const DEFAULT_ELECTION_CODE: &str = "congreso";

pub const IDENTIFICATION_TYPE: &str = "CC";
pub const LOOKUP_MODULE: &str = "polling_place";
pub const LOOKUP_PLATFORM: &str = "web";

/// `status_code` the API uses, together with `status: false`, for an unknown subject.
pub const NOT_FOUND_STATUS_CODE: i64 = 13;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const ACCEPT: &str = "application/json, text/plain, */*";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(10);
pub const RETRY_LINEAR_STEP: Duration = Duration::from_secs(5);
