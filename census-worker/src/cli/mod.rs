use clap::{Parser, Subcommand};

pub mod captcha;
pub mod dispatcher;
pub mod identity;
pub mod queue;

#[derive(Parser, Debug)]
#[command(
    name = "census-worker",
    about = "Census worker - resolves pending identity lookups and reports where each subject votes",
    after_help = "Examples:\n  \
    census-worker run\n  \
    census-worker run --dispatch-mode sequential --batch-size 10"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the worker until SIGTERM / SIGINT
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct RunCmd {
    #[clap(flatten, next_help_heading = "CAPTCHA")]
    pub captcha_args: captcha::CaptchaCliArgs,

    #[clap(flatten, next_help_heading = "Identity API")]
    pub identity_args: identity::IdentityCliArgs,

    #[clap(flatten, next_help_heading = "Job queue")]
    pub queue_args: queue::QueueCliArgs,

    #[clap(flatten, next_help_heading = "Dispatcher")]
    pub dispatcher_args: dispatcher::DispatcherCliArgs,
}
