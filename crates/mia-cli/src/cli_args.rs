use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mia")]
#[command(about = "Mia consent-script agent CLI")]
pub(crate) struct Cli {
    /// Log filter directive; falls back to MIA_LOG, then "warn".
    #[arg(long = "log", global = true)]
    pub(crate) log: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Check(CheckArgs),
    Normalize(NormalizeArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Respond(RespondArgs),
    Turns(TurnsArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "participant", default_value = "participant")]
    pub(crate) participant: String,
    #[arg(long = "state-out", default_value = ".mia/state.json")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct RespondArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "node")]
    pub(crate) node: String,
    #[arg(long = "choice")]
    pub(crate) choice: Option<String>,
    #[arg(long = "select")]
    pub(crate) select: Vec<String>,
    /// `name=value`; repeat a name to submit several values.
    #[arg(long = "field")]
    pub(crate) field: Vec<String>,
    #[arg(long = "response-json")]
    pub(crate) response_json: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct TurnsArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "script")]
    pub(crate) script: Option<String>,
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct NormalizeArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "out")]
    pub(crate) out: String,
}
