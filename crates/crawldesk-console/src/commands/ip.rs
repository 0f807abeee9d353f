use crawldesk_api_models::AccessListKind;

use crate::app::{CommandOutcome, Preconfirmed};
use crate::cli::{LocalIpAddArgs, LocalIpRemoveArgs, PolicySetArgs};
use crate::client::{AppContext, CliResult, TerminalConfirm, outcome_to_result};
use crate::core::store::Domain;
use crate::features::ip::PolicyDraft;
use crate::output::{
    render_access_list, render_local_ips, render_notifications, render_policy, render_pool,
};
use crate::view;

pub(crate) async fn handle_local_ip_list(ctx: &AppContext) -> CliResult<()> {
    ctx.load_required(Domain::LocalIps).await?;
    print_local_ips(ctx)
}

pub(crate) async fn handle_local_ip_add(ctx: &AppContext, args: LocalIpAddArgs) -> CliResult<()> {
    let outcome = ctx
        .dashboard
        .dispatcher()
        .add_local_ip(&args.address, &args.source)
        .await;
    finish(ctx, outcome)?;
    print_local_ips(ctx)
}

pub(crate) async fn handle_local_ip_remove(
    ctx: &AppContext,
    args: LocalIpRemoveArgs,
) -> CliResult<()> {
    let dispatcher = ctx.dashboard.dispatcher();
    let outcome = if args.yes {
        dispatcher.remove_local_ip(&args.id, &Preconfirmed(true)).await
    } else {
        dispatcher.remove_local_ip(&args.id, &TerminalConfirm).await
    };
    finish(ctx, outcome)?;
    print_local_ips(ctx)
}

pub(crate) async fn handle_access_list(ctx: &AppContext, kind: AccessListKind) -> CliResult<()> {
    ctx.load_required(Domain::access_list(kind)).await?;
    print_access_list(ctx, kind)
}

pub(crate) async fn handle_access_add(
    ctx: &AppContext,
    kind: AccessListKind,
    ip: &str,
) -> CliResult<()> {
    let outcome = ctx.dashboard.dispatcher().add_access_ip(kind, ip).await;
    finish(ctx, outcome)?;
    print_access_list(ctx, kind)
}

pub(crate) async fn handle_access_remove(
    ctx: &AppContext,
    kind: AccessListKind,
    ip: &str,
) -> CliResult<()> {
    let outcome = ctx.dashboard.dispatcher().remove_access_ip(kind, ip).await;
    finish(ctx, outcome)?;
    print_access_list(ctx, kind)
}

pub(crate) async fn handle_policy_get(ctx: &AppContext) -> CliResult<()> {
    ctx.load_required(Domain::Policy).await?;
    let policy = view::policy_form(&ctx.dashboard.engine().store());
    render_policy(&policy, ctx.output)
}

pub(crate) async fn handle_policy_set(ctx: &AppContext, args: PolicySetArgs) -> CliResult<()> {
    let draft = PolicyDraft {
        preheat_connections: args.preheat_connections,
        max_failures: args.max_failures,
        rotate_interval_seconds: args.rotate_interval_seconds,
        auto_recover_seconds: args.auto_recover_seconds,
    };
    let outcome = ctx.dashboard.dispatcher().save_policy(draft).await;
    finish(ctx, outcome)?;
    let policy = view::policy_form(&ctx.dashboard.engine().store());
    render_policy(&policy, ctx.output)
}

pub(crate) async fn handle_pool_stats(ctx: &AppContext) -> CliResult<()> {
    ctx.load_required(Domain::PoolStats).await?;
    let pool = view::pool_card(&ctx.dashboard.engine().store());
    render_pool(&pool, ctx.output)
}

fn finish(ctx: &AppContext, outcome: CommandOutcome) -> CliResult<()> {
    let notes = ctx.take_notifications();
    outcome_to_result(outcome, &notes)?;
    render_notifications(&notes);
    Ok(())
}

fn print_local_ips(ctx: &AppContext) -> CliResult<()> {
    let ips = view::local_ip_table(&ctx.dashboard.engine().store());
    render_local_ips(&ips, ctx.output)
}

fn print_access_list(ctx: &AppContext, kind: AccessListKind) -> CliResult<()> {
    let entries = view::access_list(&ctx.dashboard.engine().store(), kind);
    render_access_list(kind, &entries, ctx.output)
}
