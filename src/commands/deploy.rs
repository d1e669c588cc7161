use remote_deploy::output::UserOutput;
use remote_deploy::{Dispatcher, Orchestrator, TaskCatalog};

/// Run (or with `dry_run`, plan) one task.
///
/// Remote failures surface as an aggregated error; the per-host detail has
/// already been printed by the orchestrator as it happened.
pub async fn run_deploy(
    orchestrator: &Orchestrator,
    catalog: &TaskCatalog,
    task: &str,
    dry_run: bool,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(orchestrator, catalog);

    if dry_run {
        let name = &catalog.resolve(task)?.name;
        let plan = dispatcher.plan(task)?;
        out.status(&format!("Dry run: task '{}' would run {} stage(s):", name, plan.len()));
        for line in plan {
            out.status(&format!("  {}", line));
        }
        return Ok(());
    }

    let report = dispatcher.dispatch(task).await?;
    out.blank();
    out.success(&format!(
        "Task '{}' completed ({} stage(s))",
        catalog.resolve(task)?.name,
        report.stages.len()
    ));
    Ok(())
}
