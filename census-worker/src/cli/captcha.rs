use clap::Args;
use url::Url;

/// Parameters used to configure the CAPTCHA solving service.
#[derive(Debug, Clone, Args)]
pub struct CaptchaCliArgs {
    /// The API key for 2Captcha. The worker refuses to start without it.
    #[arg(env = "TWOCAPTCHA_API_KEY", long, hide_env_values = true)]
    pub twocaptcha_api_key: Option<String>,

    /// The URL of the solving service.
    #[arg(env = "CENSUS_CAPTCHA_SERVICE_URL", long, default_value = "http://2captcha.com")]
    pub captcha_service_url: Url,

    /// Poll attempts before a challenge is given up as timed out.
    #[arg(env = "CENSUS_CAPTCHA_MAX_POLLS", long, default_value = "50")]
    pub captcha_max_polls: u32,
}
