use super::outcome::{AggregateOutcome, TargetOutcome};
use crate::config::RemoteTarget;
use crate::registry::RemoteGroup;
use std::future::Future;

/// Run `per_target` against every member of `group` concurrently and wait
/// for all of them.
///
/// A failing target never short-circuits the join and nothing is cancelled:
/// each future resolves to its own [`TargetOutcome`] and the aggregate is
/// built only once every target is terminal.
pub(crate) async fn fan_out<'a, F, Fut>(
    operation: impl Into<String>,
    group: &'a RemoteGroup,
    per_target: F,
) -> AggregateOutcome
where
    F: Fn(&'a RemoteTarget) -> Fut,
    Fut: Future<Output = TargetOutcome> + 'a,
{
    let futures: Vec<_> = group.targets().iter().map(per_target).collect();
    let outcomes = futures::future::join_all(futures).await;
    AggregateOutcome::new(operation, outcomes)
}
