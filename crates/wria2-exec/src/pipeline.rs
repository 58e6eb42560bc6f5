//! Step pipelines.
//!
//! A [`SequentialPipeline`] threads a state value through its steps in
//! declared order and stops at the first failure or cancellation. A
//! [`SupervisedPipeline`] starts all of its members at once and lets each run
//! to its own end; one member failing never stops the others.
//!
//! Neither flavour retries or cleans up after a failed step.

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<T> {
    /// Carry on with the next step.
    Continue(T),
    /// The user asked to stop. Not an error.
    Cancelled,
}

impl<T> Flow<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Flow::Cancelled)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Flow<U> {
        match self {
            Flow::Continue(value) => Flow::Continue(f(value)),
            Flow::Cancelled => Flow::Cancelled,
        }
    }

    pub fn into_continue(self) -> Option<T> {
        match self {
            Flow::Continue(value) => Some(value),
            Flow::Cancelled => None,
        }
    }
}

/// A fallible unit of work over the accumulated state `S`.
#[async_trait]
pub trait Step<S, E>: Send + Sync
where
    S: Send + 'static,
{
    fn name(&self) -> &str;

    /// Disabled steps are skipped by the pipeline.
    fn enabled(&self) -> bool {
        true
    }

    async fn run(&self, state: S) -> Result<Flow<S>, E>;
}

/// Boxed future returned by closure steps.
pub type StepFuture<S, E> = BoxFuture<'static, Result<Flow<S>, E>>;

/// A [`Step`] backed by a closure.
pub struct FnStep<F> {
    name: String,
    enabled: bool,
    f: F,
}

impl<F> FnStep<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            f,
        }
    }

    /// Keep the step in the pipeline only when `enabled` holds.
    pub fn when(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl<S, E, F> Step<S, E> for FnStep<F>
where
    S: Send + 'static,
    E: Send + 'static,
    F: Fn(S) -> StepFuture<S, E> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn run(&self, state: S) -> Result<Flow<S>, E> {
        (self.f)(state).await
    }
}

/// Ordered steps with abort-on-first-failure semantics.
pub struct SequentialPipeline<S, E> {
    name: String,
    steps: Vec<Box<dyn Step<S, E>>>,
}

impl<S, E> SequentialPipeline<S, E>
where
    S: Send + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn then<T>(mut self, step: T) -> Self
    where
        T: Step<S, E> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps in declared order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every enabled step in order.
    ///
    /// The first error is returned exactly as the step produced it; no later
    /// step is started. A cancelled step ends the pipeline with
    /// [`Flow::Cancelled`].
    pub async fn run(&self, initial: S) -> Result<Flow<S>, E> {
        let start = Instant::now();
        let mut state = initial;

        for (index, step) in self.steps.iter().enumerate() {
            if !step.enabled() {
                debug!(pipeline = %self.name, step = step.name(), "Skipping disabled step");
                continue;
            }

            debug!(pipeline = %self.name, step = step.name(), index, "Executing step");
            match step.run(state).await {
                Ok(Flow::Continue(next)) => state = next,
                Ok(Flow::Cancelled) => {
                    info!(pipeline = %self.name, step = step.name(), "Pipeline cancelled");
                    return Ok(Flow::Cancelled);
                }
                Err(err) => {
                    warn!(pipeline = %self.name, step = step.name(), "Pipeline aborted");
                    return Err(err);
                }
            }
        }

        debug!(
            pipeline = %self.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Pipeline completed"
        );
        Ok(Flow::Continue(state))
    }
}

/// Final result of one supervised member.
#[derive(Debug)]
pub struct MemberOutcome<E> {
    pub name: String,
    pub result: Result<Flow<()>, E>,
}

/// Per-member outcomes of a supervised pipeline, in declared order.
#[derive(Debug)]
pub struct SupervisedReport<E> {
    pub outcomes: Vec<MemberOutcome<E>>,
}

impl<E> SupervisedReport<E> {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }

    /// The first member failure, in declared order.
    pub fn into_first_error(self) -> Option<E> {
        self.outcomes.into_iter().find_map(|o| o.result.err())
    }
}

/// Concurrently started members with no cross-member cancellation.
pub struct SupervisedPipeline<E> {
    name: String,
    members: Vec<Box<dyn Step<(), E>>>,
}

impl<E> SupervisedPipeline<E>
where
    E: std::fmt::Display,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Add a member process.
    pub fn with<T>(mut self, member: T) -> Self
    where
        T: Step<(), E> + 'static,
    {
        self.members.push(Box::new(member));
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Start every enabled member and wait for all of them to exit.
    ///
    /// For watch processes this future does not resolve until they are
    /// terminated from outside.
    pub async fn run(&self) -> SupervisedReport<E> {
        info!(pipeline = %self.name, members = self.members.len(), "Starting supervised members");

        let runs = self
            .members
            .iter()
            .filter(|m| m.enabled())
            .map(|member| async move {
                let result = member.run(()).await;
                match &result {
                    Ok(_) => info!(pipeline = %self.name, member = member.name(), "Member exited"),
                    Err(err) => warn!(
                        pipeline = %self.name,
                        member = member.name(),
                        error = %err,
                        "Member failed; siblings keep running"
                    ),
                }
                MemberOutcome {
                    name: member.name().to_string(),
                    result,
                }
            });

        SupervisedReport {
            outcomes: join_all(runs).await,
        }
    }
}
