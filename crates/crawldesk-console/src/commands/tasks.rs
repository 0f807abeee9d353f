use chrono::Utc;

use crate::cli::{ScheduleArg, TaskCreateArgs};
use crate::client::{AppContext, CliResult, outcome_to_result};
use crate::core::store::Domain;
use crate::features::tasks::actions::TaskDraft;
use crate::features::tasks::{TaskSchedule, TaskType};
use crate::output::{render_notifications, render_tasks};
use crate::view;

pub(crate) async fn handle_task_list(ctx: &AppContext) -> CliResult<()> {
    ctx.load_required(Domain::Tasks).await?;
    let tasks = view::task_table(&ctx.dashboard.engine().store(), Utc::now());
    render_tasks(&tasks, ctx.output)
}

pub(crate) async fn handle_task_create(ctx: &AppContext, args: TaskCreateArgs) -> CliResult<()> {
    let draft = draft_from_args(args);
    let outcome = ctx.dashboard.dispatcher().create_task(&draft).await;
    let notes = ctx.take_notifications();
    outcome_to_result(outcome, &notes)?;
    render_notifications(&notes);

    let tasks = view::task_table(&ctx.dashboard.engine().store(), Utc::now());
    render_tasks(&tasks, ctx.output)
}

pub(crate) fn draft_from_args(args: TaskCreateArgs) -> TaskDraft {
    TaskDraft {
        name: args.name,
        kind: TaskType::from(args.kind),
        url: args.url,
        priority: args.priority,
        timeout: args.task_timeout,
        schedule: match args.schedule {
            ScheduleArg::Once => TaskSchedule::Once,
            ScheduleArg::Cron => TaskSchedule::Cron,
            ScheduleArg::Interval => TaskSchedule::Interval,
        },
        cron_expression: args.cron,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_keeps_custom_task_types() {
        let draft = draft_from_args(TaskCreateArgs {
            name: "tiles".into(),
            kind: "satellite".into(),
            url: "https://kh.example/".into(),
            priority: 9,
            task_timeout: 60,
            schedule: ScheduleArg::Interval,
            cron: String::new(),
        });
        assert_eq!(draft.kind, TaskType::Other("satellite".into()));
        assert_eq!(draft.schedule, TaskSchedule::Interval);
        assert_eq!(draft.timeout, 60);
    }
}
