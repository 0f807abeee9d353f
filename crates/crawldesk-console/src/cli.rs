//! Command-line front-end for the crawl operations dashboard.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use crawldesk_api_models::AccessListKind;
use crawldesk_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
use tracing::warn;
use url::Url;

use crate::app::Dashboard;
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::ip::{
    handle_access_add, handle_access_list, handle_access_remove,
    handle_local_ip_add, handle_local_ip_list, handle_local_ip_remove, handle_policy_get,
    handle_policy_set, handle_pool_stats,
};
use crate::commands::tasks::{handle_task_create, handle_task_list};
use crate::commands::watch::handle_watch;
use crate::config::{ConsoleConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::core::identity::SESSION_IDENTITY_ENV;
use crate::core::notify::DEFAULT_DISPLAY_DURATION;
use crate::core::scheduler::{DEFAULT_POOL_STATS_INTERVAL, DEFAULT_TASKS_INTERVAL, PollIntervals};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
        build_sha: build_sha(),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let config = cli.console_config()?;
    let dashboard = Dashboard::connect(&config)
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
    let ctx = AppContext {
        dashboard,
        output: cli.output,
    };

    let result = match cli.command {
        Command::Watch => handle_watch(&ctx).await,
        Command::Tasks(tasks) => match tasks {
            TaskCommand::List => handle_task_list(&ctx).await,
            TaskCommand::Create(args) => handle_task_create(&ctx, args).await,
        },
        Command::Ip(ip) => match ip {
            LocalIpCommand::List => handle_local_ip_list(&ctx).await,
            LocalIpCommand::Add(args) => handle_local_ip_add(&ctx, args).await,
            LocalIpCommand::Remove(args) => handle_local_ip_remove(&ctx, args).await,
        },
        Command::Whitelist(command) => run_access(&ctx, AccessListKind::Whitelist, command).await,
        Command::Blacklist(command) => run_access(&ctx, AccessListKind::Blacklist, command).await,
        Command::Policy(policy) => match policy {
            PolicyCommand::Get => handle_policy_get(&ctx).await,
            PolicyCommand::Set(args) => handle_policy_set(&ctx, args).await,
        },
        Command::Pool(PoolCommand::Stats) => handle_pool_stats(&ctx).await,
    };
    ctx.dashboard.shutdown();
    result
}

async fn run_access(ctx: &AppContext, kind: AccessListKind, command: AccessCommand) -> CliResult<()> {
    match command {
        AccessCommand::List => handle_access_list(ctx, kind).await,
        AccessCommand::Add(args) => handle_access_add(ctx, kind, &args.ip).await,
        AccessCommand::Remove(args) => handle_access_remove(ctx, kind, &args.ip).await,
    }
}

#[derive(Parser)]
#[command(name = "crawldesk", about = "Operations console for the crawl backend")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "CRAWLDESK_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    api_url: Url,
    #[arg(
        long,
        global = true,
        env = "CRAWLDESK_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        env = "CRAWLDESK_TASKS_INTERVAL_SECS",
        default_value_t = DEFAULT_TASKS_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between task list refreshes"
    )]
    tasks_interval: u64,
    #[arg(
        long,
        global = true,
        env = "CRAWLDESK_POOL_INTERVAL_SECS",
        default_value_t = DEFAULT_POOL_STATS_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between pool stats refreshes"
    )]
    pool_interval: u64,
    #[arg(
        long,
        global = true,
        default_value_t = duration_millis(DEFAULT_DISPLAY_DURATION),
        help = "How long notifications stay visible"
    )]
    notification_ttl_ms: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "CRAWLDESK_IDENTITY_FILE",
        help = "File whose first line names the operator when no session user is set"
    )]
    identity_file: Option<PathBuf>,
    #[arg(long, global = true, env = SESSION_IDENTITY_ENV, hide_env_values = true)]
    session_user: Option<String>,
    #[arg(long, global = true, env = "CRAWLDESK_LOG_FORMAT")]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn console_config(&self) -> CliResult<ConsoleConfig> {
        if self.timeout == 0 {
            return Err(CliError::validation("--timeout must be at least one second"));
        }
        let mut config = ConsoleConfig::new(self.api_url.clone())
            .with_identity(self.session_user.clone(), self.identity_file.as_ref());
        config.timeout = Duration::from_secs(self.timeout);
        config.intervals = PollIntervals {
            tasks: Duration::from_secs(self.tasks_interval),
            pool_stats: Duration::from_secs(self.pool_interval),
        };
        config.notification_ttl = Duration::from_millis(self.notification_ttl_ms);
        if config.identity.resolve().is_none() && self.identity_file.is_some() {
            warn!("identity file did not provide an operator name");
        }
        Ok(config)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Subcommand)]
enum Command {
    /// Live dashboard with an interactive command prompt.
    Watch,
    #[command(subcommand)]
    Tasks(TaskCommand),
    #[command(subcommand)]
    Ip(LocalIpCommand),
    #[command(subcommand)]
    Whitelist(AccessCommand),
    #[command(subcommand)]
    Blacklist(AccessCommand),
    #[command(subcommand)]
    Policy(PolicyCommand),
    #[command(subcommand)]
    Pool(PoolCommand),
}

#[derive(Subcommand)]
enum TaskCommand {
    List,
    Create(TaskCreateArgs),
}

#[derive(Subcommand)]
enum LocalIpCommand {
    List,
    Add(LocalIpAddArgs),
    Remove(LocalIpRemoveArgs),
}

#[derive(Subcommand)]
enum AccessCommand {
    List,
    Add(AccessIpArgs),
    Remove(AccessIpArgs),
}

#[derive(Subcommand)]
enum PolicyCommand {
    Get,
    Set(PolicySetArgs),
}

#[derive(Subcommand)]
enum PoolCommand {
    Stats,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct TaskCreateArgs {
    pub(crate) name: String,
    #[arg(long = "type", default_value = "http", help = "Task type (http, google_earth, custom, ...)")]
    pub(crate) kind: String,
    #[arg(long, default_value = "")]
    pub(crate) url: String,
    #[arg(long, default_value_t = 5)]
    pub(crate) priority: i64,
    #[arg(long = "task-timeout", default_value_t = 30, help = "Per-execution timeout in seconds")]
    pub(crate) task_timeout: i64,
    #[arg(long, value_enum, default_value_t = ScheduleArg::Once)]
    pub(crate) schedule: ScheduleArg,
    #[arg(long, default_value = "")]
    pub(crate) cron: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LocalIpAddArgs {
    pub(crate) address: String,
    #[arg(long, default_value = "")]
    pub(crate) source: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LocalIpRemoveArgs {
    pub(crate) id: String,
    #[arg(long, help = "Skip the confirmation prompt")]
    pub(crate) yes: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct AccessIpArgs {
    pub(crate) ip: String,
}

#[derive(Args, Debug, Clone, Copy)]
pub(crate) struct PolicySetArgs {
    #[arg(long)]
    pub(crate) preheat_connections: Option<u64>,
    #[arg(long)]
    pub(crate) max_failures: Option<u64>,
    #[arg(long)]
    pub(crate) rotate_interval_seconds: Option<u64>,
    #[arg(long)]
    pub(crate) auto_recover_seconds: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScheduleArg {
    Once,
    Cron,
    Interval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

fn parse_url(input: &str) -> Result<Url, String> {
    Url::parse(input).map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_url_rejects_garbage() {
        assert!(parse_url("http://127.0.0.1:8080").is_ok());
        let err = parse_url("not a url").expect_err("invalid");
        assert!(err.contains("not a url"));
    }

    #[test]
    fn global_flags_flow_into_config() {
        let cli = Cli::try_parse_from([
            "crawldesk",
            "--tasks-interval",
            "3",
            "--pool-interval",
            "2",
            "--notification-ttl-ms",
            "500",
            "--session-user",
            "ops",
            "pool",
            "stats",
        ])
        .expect("parse");
        let config = cli.console_config().expect("config");
        assert_eq!(config.intervals.tasks, Duration::from_secs(3));
        assert_eq!(config.intervals.pool_stats, Duration::from_secs(2));
        assert_eq!(config.notification_ttl, Duration::from_millis(500));
        assert_eq!(config.identity.resolve(), Some("ops"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Cli::try_parse_from(["crawldesk", "--tasks-interval", "0", "watch"]).is_err());
    }

    #[test]
    fn task_create_parses_schedule_and_type() {
        let cli = Cli::try_parse_from([
            "crawldesk",
            "tasks",
            "create",
            "tiles",
            "--type",
            "google_earth",
            "--schedule",
            "cron",
            "--cron",
            "*/5 * * * *",
            "--output",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.output, OutputFormat::Json);
        let Command::Tasks(TaskCommand::Create(args)) = cli.command else {
            panic!("expected tasks create");
        };
        assert_eq!(args.kind, "google_earth");
        assert_eq!(args.schedule, ScheduleArg::Cron);
        assert_eq!(args.cron, "*/5 * * * *");
        assert_eq!(args.task_timeout, 30);
    }
}
