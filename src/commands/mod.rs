mod configure;
mod deploy;
mod tasks;
mod validate;

pub use configure::{parse_extra, run_configure};
pub use deploy::run_deploy;
pub use tasks::run_tasks;
pub use validate::run_validate;
