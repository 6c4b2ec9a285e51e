use clap::Args;
use url::Url;

#[derive(Debug, Clone, Args)]
pub struct IdentityCliArgs {
    /// Base URL of the citizen information API.
    #[arg(
        env = "CENSUS_IDENTITY_API_URL",
        long,
        default_value = "https://apiweb-eleccionescolombia.infovotantes.com/api/v1/citizen/"
    )]
    pub identity_api_url: Url,

    /// reCAPTCHA site key of the lookup page.
    #[arg(env = "CENSUS_SITE_KEY", long, default_value = "6Lc9DmgrAAAAAJAjWVhjDy1KSgqzqJikY5z7I9SV")]
    pub site_key: String,

    /// Page the reCAPTCHA is solved for. Its origin is also sent as `Origin` / `Referer`.
    #[arg(
        env = "CENSUS_PAGE_URL",
        long,
        default_value = "https://eleccionescolombia.registraduria.gov.co/identificacion"
    )]
    pub page_url: Url,

    /// Election the lookup is made for.
    #[arg(env = "CENSUS_ELECTION_CODE", long, default_value = "congreso")]
    pub election_code: String,
}
