use clap::Args;
use url::Url;

#[derive(Debug, Clone, Args)]
pub struct QueueCliArgs {
    /// Bearer token for the job queue and the result sink.
    #[arg(env = "CONSULTA_API_TOKEN", long, hide_env_values = true)]
    pub consulta_api_token: Option<String>,

    /// Base URL under which `consultas-pendientes` and `recibir-datos` are served.
    #[arg(env = "CENSUS_QUEUE_SERVICE_URL", long)]
    pub queue_service_url: Url,

    /// Queue `tipo` to work on.
    #[arg(env = "CENSUS_JOB_KIND", long, default_value = "registraduria")]
    pub job_kind: String,
}
