//! Live dashboard: polls in the background and reads commands from stdin.

use std::cell::Cell;
use std::io::IsTerminal;
use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time;
use tracing::{debug, info};

use crate::app::{CommandOutcome, Dashboard, Preconfirmed};
use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult};
use crate::core::store::{Domain, DomainStore};
use crate::output::render_dashboard;
use crate::view::DashboardView;

const FRAME_PERIOD: Duration = Duration::from_millis(500);
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const HELP: &str = "commands: start <id> | stop <id> | delete <id> [--yes] | refresh [domain] | quit";

/// One line typed at the watch prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum WatchCommand {
    Start(String),
    Stop(String),
    Delete { id: String, confirmed: bool },
    Refresh(Option<Domain>),
    Help,
    Quit,
}

/// Parse a prompt line; `Ok(None)` for blank input.
pub(crate) fn parse_watch_command(line: &str) -> Result<Option<WatchCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let id = |rest: &[&str]| {
        rest.iter()
            .find(|word| !word.starts_with('-'))
            .map(|word| (*word).to_string())
            .ok_or_else(|| format!("{verb} needs a task id"))
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "start" => WatchCommand::Start(id(rest.as_slice())?),
        "stop" => WatchCommand::Stop(id(rest.as_slice())?),
        "delete" | "rm" => WatchCommand::Delete {
            id: id(rest.as_slice())?,
            confirmed: rest.iter().any(|word| matches!(*word, "--yes" | "-y")),
        },
        "refresh" => match rest.first() {
            Some(domain) => WatchCommand::Refresh(Some(domain.parse()?)),
            None => WatchCommand::Refresh(None),
        },
        "help" | "?" => WatchCommand::Help,
        "quit" | "exit" | "q" => WatchCommand::Quit,
        other => return Err(format!("unknown command '{other}'; {HELP}")),
    };
    Ok(Some(command))
}

pub(crate) async fn handle_watch(ctx: &AppContext) -> CliResult<()> {
    let dashboard = &ctx.dashboard;
    let dirty = Rc::new(Cell::new(true));
    let hook_dirty = Rc::clone(&dirty);
    dashboard.set_render_hook(Rc::new(move |_store: &DomainStore, domain: Domain| {
        debug!(%domain, "store changed");
        hook_dirty.set(true);
    }));
    dashboard.start();
    info!(
        tasks_secs = dashboard.scheduler().intervals().tasks.as_secs(),
        pool_secs = dashboard.scheduler().intervals().pool_stats.as_secs(),
        "watch started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = time::interval(FRAME_PERIOD);
    let mut last_frame: Option<DashboardView> = None;
    let clear = ctx.output == OutputFormat::Table && std::io::stdout().is_terminal();
    let mut input_open = true;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let result = loop {
        tokio::select! {
            _ = &mut interrupted => break Ok(()),
            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) => match parse_watch_command(&line) {
                    Ok(Some(WatchCommand::Quit)) => break Ok(()),
                    Ok(Some(WatchCommand::Help)) => eprintln!("{HELP}"),
                    Ok(Some(command)) => {
                        run_watch_command(dashboard, command).await;
                        dirty.set(true);
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                },
                Ok(None) => {
                    debug!("stdin closed; rendering until interrupted");
                    input_open = false;
                }
                Err(err) => break Err(CliError::failure(anyhow!("failed to read command: {err}"))),
            },
            _ = frames.tick() => {
                let view = dashboard.view();
                if dirty.replace(false) || last_frame.as_ref() != Some(&view) {
                    if clear {
                        print!("{CLEAR_SCREEN}");
                    }
                    if let Err(err) = render_dashboard(&view, ctx.output) {
                        break Err(err);
                    }
                    last_frame = Some(view);
                }
            }
        }
    };

    dashboard.shutdown();
    info!("watch stopped");
    result
}

async fn run_watch_command(dashboard: &Dashboard, command: WatchCommand) {
    let dispatcher = dashboard.dispatcher();
    let outcome = match command {
        WatchCommand::Start(id) => dispatcher.start_task(&id),
        WatchCommand::Stop(id) => dispatcher.stop_task(&id),
        WatchCommand::Delete { id, confirmed: true } => {
            dispatcher.delete_task(&id, &Preconfirmed(true))
        }
        WatchCommand::Delete { id, confirmed: false } => {
            let decline = |prompt: &str| {
                eprintln!("{prompt} repeat with --yes to confirm");
                false
            };
            dispatcher.delete_task(&id, &decline)
        }
        WatchCommand::Refresh(domain) => {
            let domains = domain.map_or_else(|| Domain::ALL.to_vec(), |domain| vec![domain]);
            dashboard.load(&domains).await;
            CommandOutcome::Applied
        }
        WatchCommand::Help | WatchCommand::Quit => CommandOutcome::Applied,
    };
    if outcome == CommandOutcome::NotFound {
        eprintln!("no such task in the table");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_commands() {
        assert_eq!(
            parse_watch_command("start t-1"),
            Ok(Some(WatchCommand::Start("t-1".into())))
        );
        assert_eq!(
            parse_watch_command("  delete --yes t-2 "),
            Ok(Some(WatchCommand::Delete {
                id: "t-2".into(),
                confirmed: true
            }))
        );
        assert_eq!(
            parse_watch_command("delete t-2"),
            Ok(Some(WatchCommand::Delete {
                id: "t-2".into(),
                confirmed: false
            }))
        );
        assert_eq!(parse_watch_command("   "), Ok(None));
    }

    #[test]
    fn parses_refresh_targets() {
        assert_eq!(
            parse_watch_command("refresh"),
            Ok(Some(WatchCommand::Refresh(None)))
        );
        assert_eq!(
            parse_watch_command("refresh pool"),
            Ok(Some(WatchCommand::Refresh(Some(Domain::PoolStats))))
        );
        assert!(parse_watch_command("refresh nowhere").is_err());
    }

    #[test]
    fn rejects_missing_ids_and_unknown_verbs() {
        let err = parse_watch_command("stop").expect_err("missing id");
        assert!(err.contains("stop needs a task id"));
        let err = parse_watch_command("launch t-1").expect_err("unknown");
        assert!(err.contains("unknown command 'launch'"));
        assert_eq!(parse_watch_command("QUIT"), Ok(Some(WatchCommand::Quit)));
    }
}
