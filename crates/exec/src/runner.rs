use std::future::Future;
use std::time::{Duration, Instant};

use apiloom_core::{AutoFlow, AutoFlowStep};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{info, warn};

use crate::error::ExecutionError;
use crate::params::{merge_step_params, Params, ParamsByStep};
use crate::result::{ExecutionResult, FlowExecutionResult, FlowStepResult};

/// Run `flow` through `call`, sequentially or all at once, under a single
/// deadline. Steps still pending when the deadline passes are dropped and
/// reported as `deadlineExceeded`.
///
/// Sequential runs stop at the first failed required step and continue past
/// failed optional ones.
pub(crate) async fn run_flow<F, Fut>(
    flow: &AutoFlow,
    by_step: &ParamsByStep,
    parallel: bool,
    deadline: Duration,
    call: F,
) -> FlowExecutionResult
where
    F: Fn(&AutoFlowStep, Params) -> Fut,
    Fut: Future<Output = ExecutionResult>,
{
    let start = Instant::now();
    let until = tokio::time::Instant::now() + deadline;
    let deadline_ms = deadline.as_millis() as u64;

    let steps = if parallel {
        run_parallel(flow, by_step, until, deadline_ms, start, &call).await
    } else {
        run_sequential(flow, by_step, until, deadline_ms, start, &call).await
    };

    let success = steps.iter().all(|s| s.result.success);
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        flow = %flow.id,
        parallel,
        success,
        executed = steps.len(),
        total = flow.steps.len(),
        duration_ms,
        "flow executed"
    );

    FlowExecutionResult {
        flow_id: flow.id.clone(),
        flow_name: flow.name.clone(),
        parallel,
        success,
        total_steps: flow.steps.len(),
        succeeded_steps: steps.iter().filter(|s| s.result.success).count(),
        steps,
        error: None,
        error_kind: None,
        duration_ms,
    }
}

async fn run_sequential<F, Fut>(
    flow: &AutoFlow,
    by_step: &ParamsByStep,
    until: tokio::time::Instant,
    deadline_ms: u64,
    start: Instant,
    call: &F,
) -> Vec<FlowStepResult>
where
    F: Fn(&AutoFlowStep, Params) -> Fut,
    Fut: Future<Output = ExecutionResult>,
{
    let mut out = Vec::with_capacity(flow.steps.len());
    for (index, step) in flow.steps.iter().enumerate() {
        let params = merge_step_params(index, step, by_step);
        match tokio::time::timeout_at(until, call(step, params)).await {
            Ok(result) => {
                let stop = !result.success && !step.optional;
                out.push(FlowStepResult { index, optional: step.optional, result });
                if stop {
                    break;
                }
            }
            Err(_) => {
                warn!(flow = %flow.id, step = index, "flow deadline exceeded");
                out.extend(
                    flow.steps
                        .iter()
                        .enumerate()
                        .skip(index)
                        .map(|(i, s)| expired(i, s, deadline_ms, start)),
                );
                break;
            }
        }
    }
    out
}

async fn run_parallel<F, Fut>(
    flow: &AutoFlow,
    by_step: &ParamsByStep,
    until: tokio::time::Instant,
    deadline_ms: u64,
    start: Instant,
    call: &F,
) -> Vec<FlowStepResult>
where
    F: Fn(&AutoFlowStep, Params) -> Fut,
    Fut: Future<Output = ExecutionResult>,
{
    let mut pending: FuturesUnordered<_> = flow
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let fut = call(step, merge_step_params(index, step, by_step));
            async move { (index, fut.await) }
        })
        .collect();

    let mut slots: Vec<Option<ExecutionResult>> = vec![None; flow.steps.len()];
    loop {
        match tokio::time::timeout_at(until, pending.next()).await {
            Ok(Some((index, result))) => slots[index] = Some(result),
            Ok(None) => break,
            Err(_) => {
                warn!(flow = %flow.id, pending = pending.len(), "flow deadline exceeded");
                break;
            }
        }
    }
    drop(pending);

    slots
        .into_iter()
        .zip(&flow.steps)
        .enumerate()
        .map(|(index, (slot, step))| match slot {
            Some(result) => FlowStepResult { index, optional: step.optional, result },
            None => expired(index, step, deadline_ms, start),
        })
        .collect()
}

fn expired(index: usize, step: &AutoFlowStep, deadline_ms: u64, start: Instant) -> FlowStepResult {
    let error = ExecutionError::DeadlineExceeded(deadline_ms);
    FlowStepResult {
        index,
        optional: step.optional,
        result: ExecutionResult::failure(&step.endpoint_key, &error, start.elapsed().as_millis() as u64),
    }
}
