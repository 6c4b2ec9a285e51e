use std::time::Duration;

pub const SUBMIT_PATH: &str = "in.php";
pub const POLL_PATH: &str = "res.php";

pub const RECAPTCHA_METHOD: &str = "userrecaptcha";

/// Body of `res.php` while a worker on the service side is still solving.
pub const NOT_READY: &str = "CAPCHA_NOT_READY";

pub const DEFAULT_SERVICE_URL: &str = "http://2captcha.com";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Poll cadence: quick polls while a solution is unlikely to be late, slower ones afterwards.
pub const FAST_POLL_DELAY: Duration = Duration::from_millis(1500);
pub const FAST_POLL_ATTEMPTS: u32 = 10;
pub const SLOW_POLL_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLLS: u32 = 50;
