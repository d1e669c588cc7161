use remote_deploy::output::UserOutput;
use remote_deploy::{TaskCatalog, DEFAULT_TASK};

pub fn run_tasks(catalog: &TaskCatalog, out: &dyn UserOutput) -> anyhow::Result<()> {
    out.status("Tasks:");
    for task in catalog.tasks() {
        let aliases = if task.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", task.aliases.join(", "))
        };
        let default = if task.name == DEFAULT_TASK { " [default]" } else { "" };
        out.status(&format!(
            "  {}{}{} - {}",
            task.name, aliases, default, task.description
        ));
    }
    Ok(())
}
