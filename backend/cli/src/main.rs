mod audit_cmd;
mod config_cmd;
mod criteria_cmd;
mod serve_cmd;
mod settings;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use skyaudit_config::{config_dir, config_file_path, load_and_prepare, validate};
use skyaudit_logging::init_logger;

#[derive(Parser)]
#[command(name = "skyaudit")]
#[command(about = "SkyAudit: accessibility audits of public websites")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.skyaudit/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check a site for an accessibility widget and list its links
    Check {
        /// Site to audit
        url: String,
        /// Criteria set to evaluate the extracted links against
        #[arg(short, long)]
        criteria: Option<String>,
        /// Extra criterion to evaluate (repeatable)
        #[arg(long = "criterion")]
        criterion: Vec<String>,
        /// Link to leave out of the evaluation (repeatable)
        #[arg(long)]
        ignore: Vec<String>,
        /// Call the task API in-process instead of through the proxy
        #[arg(long)]
        direct: bool,
        /// Write a JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the given links against a criteria set
    Evaluate {
        /// Links to evaluate
        #[arg(required = true)]
        links: Vec<String>,
        #[arg(short, long)]
        criteria: Option<String>,
        #[arg(long = "criterion")]
        criterion: Vec<String>,
        #[arg(long)]
        direct: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the status document of a task
    Status {
        task_id: String,
        #[arg(long)]
        direct: bool,
    },
    /// List the built-in criteria sets
    Criteria {
        /// Show the criteria of one set only
        set: Option<String>,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Config sections a command reads; errors there stop it before it runs.
    fn config_sections(&self) -> &'static [&'static str] {
        match self {
            Commands::Serve { .. } => &["skyvern", "gateway"],
            Commands::Check { direct: true, .. } | Commands::Evaluate { direct: true, .. } => {
                &["skyvern", "orchestrator"]
            }
            Commands::Status { direct: true, .. } => &["skyvern"],
            Commands::Check { .. } | Commands::Evaluate { .. } | Commands::Status { .. } => {
                &["orchestrator"]
            }
            Commands::Criteria { .. } | Commands::Config { .. } => &[],
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Validate the config and report problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path).await?;

    let logging = config.logging();
    let _log_guard = init_logger(
        logging.level.as_deref().unwrap_or("info"),
        logging.dir.as_deref().map(std::path::Path::new),
        logging.json.unwrap_or(false),
    );
    if !matches!(cli.command, Commands::Config { .. }) {
        let report = validate(&config);
        report.log();
        report.ensure_valid_for(cli.command.config_sections())?;
    }

    match cli.command {
        Commands::Serve { port } => serve_cmd::run(&config, port).await,
        Commands::Check {
            url,
            criteria,
            criterion,
            ignore,
            direct,
            output,
        } => {
            let selection = audit_cmd::CriteriaSelection::resolve(criteria.as_deref(), criterion)?;
            audit_cmd::check(&config, &url, selection, &ignore, direct, output.as_deref()).await
        }
        Commands::Evaluate {
            links,
            criteria,
            criterion,
            direct,
            output,
        } => {
            let Some(selection) =
                audit_cmd::CriteriaSelection::resolve(criteria.as_deref(), criterion)?
            else {
                anyhow::bail!("evaluate needs --criteria <set> or at least one --criterion");
            };
            audit_cmd::evaluate(&config, &links, selection, direct, output.as_deref()).await
        }
        Commands::Status { task_id, direct } => status_cmd::run(&config, &task_id, direct).await,
        Commands::Criteria { set } => criteria_cmd::run(set.as_deref()),
        Commands::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(&config, &path).await,
            ConfigAction::Validate => config_cmd::validate_cmd(&config, &path),
        },
    }
}
