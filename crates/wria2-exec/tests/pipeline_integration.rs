//! Integration tests for sequential and supervised pipelines.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wria2_exec::{
    CommandRunner, ExecContext, Flow, ProcessRunner, SequentialPipeline, Step, SupervisedPipeline,
    ToolError, ToolInvocation, TriggerSet,
};

/// Step that counts its invocations and optionally fails with a fixed error.
struct CountingStep {
    name: String,
    calls: Arc<AtomicUsize>,
    fail_with: Option<(i32, &'static str)>,
}

impl CountingStep {
    fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
        }
    }

    fn failing(name: &str, code: i32, stderr: &'static str) -> Self {
        Self {
            fail_with: Some((code, stderr)),
            ..Self::ok(name)
        }
    }
}

#[async_trait]
impl Step<Vec<String>, ToolError> for CountingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, mut trail: Vec<String>) -> Result<Flow<Vec<String>>, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((code, stderr)) = self.fail_with {
            return Err(ToolError::Failed {
                command: self.name.clone(),
                code,
                stderr: stderr.to_string(),
            });
        }
        trail.push(self.name.clone());
        Ok(Flow::Continue(trail))
    }
}

/// Test: step 2 of 5 fails, steps 3-5 never run and step 2's error comes back unchanged
#[tokio::test]
async fn test_sequential_aborts_on_first_failure() {
    let steps = vec![
        CountingStep::ok("step1"),
        CountingStep::failing("step2", 7, "step2 diagnostics"),
        CountingStep::ok("step3"),
        CountingStep::ok("step4"),
        CountingStep::ok("step5"),
    ];
    let counters: Vec<Arc<AtomicUsize>> = steps.iter().map(|s| s.calls.clone()).collect();

    let pipeline = steps
        .into_iter()
        .fold(SequentialPipeline::new("five"), |p, s| p.then(s));

    let err = pipeline.run(Vec::new()).await.unwrap_err();

    let calls: Vec<usize> = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    assert_eq!(calls, vec![1, 1, 0, 0, 0], "Steps after the failure must not start");

    match err {
        ToolError::Failed {
            command,
            code,
            stderr,
        } => {
            assert_eq!(command, "step2");
            assert_eq!(code, 7);
            assert_eq!(stderr, "step2 diagnostics");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Test: all steps succeed and run in declared order
#[tokio::test]
async fn test_sequential_runs_in_order() {
    let pipeline = ["a", "b", "c"]
        .iter()
        .fold(SequentialPipeline::new("abc"), |p, name| {
            p.then(CountingStep::ok(name))
        });

    let trail = pipeline.run(Vec::new()).await.unwrap().into_continue().unwrap();
    assert_eq!(trail, vec!["a", "b", "c"]);
}

/// Member that records its start and optionally fails right away.
struct WatchMember {
    name: String,
    fail: bool,
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    sibling_failed: Arc<AtomicBool>,
    outlived_failure: Arc<AtomicUsize>,
}

#[async_trait]
impl Step<(), ToolError> for WatchMember {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _: ()) -> Result<Flow<()>, ToolError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            self.sibling_failed.store(true, Ordering::SeqCst);
            return Err(ToolError::Failed {
                command: self.name.clone(),
                code: 1,
                stderr: String::new(),
            });
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.sibling_failed.load(Ordering::SeqCst) {
            self.outlived_failure.fetch_add(1, Ordering::SeqCst);
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(Flow::Continue(()))
    }
}

/// Test: every member starts exactly once and a failing member does not stop the others
#[tokio::test]
async fn test_supervised_failure_does_not_stop_siblings() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let sibling_failed = Arc::new(AtomicBool::new(false));
    let outlived_failure = Arc::new(AtomicUsize::new(0));

    let n = 4;
    let mut pipeline = SupervisedPipeline::new("watch");
    for i in 0..n {
        pipeline = pipeline.with(WatchMember {
            name: format!("member{i}"),
            fail: i == 1,
            started: started.clone(),
            finished: finished.clone(),
            sibling_failed: sibling_failed.clone(),
            outlived_failure: outlived_failure.clone(),
        });
    }
    assert_eq!(pipeline.len(), n);

    let report = pipeline.run().await;

    assert_eq!(started.load(Ordering::SeqCst), n, "Each member starts exactly once");
    assert_eq!(finished.load(Ordering::SeqCst), n - 1);
    assert_eq!(outlived_failure.load(Ordering::SeqCst), n - 1);
    assert_eq!(report.failed_count(), 1);
    assert!(!report.all_succeeded());
    assert_eq!(report.outcomes[1].name, "member1");
}

/// Watch member backed by a real child process.
struct ProcessMember {
    invocation: ToolInvocation,
}

#[async_trait]
impl Step<(), ToolError> for ProcessMember {
    fn name(&self) -> &str {
        &self.invocation.name
    }

    async fn run(&self, _: ()) -> Result<Flow<()>, ToolError> {
        ProcessRunner::new()
            .watch(&self.invocation, &ExecContext::default(), TriggerSet::default())
            .await?;
        Ok(Flow::Continue(()))
    }
}

/// Test: a crashing watch process leaves a sibling process running to completion
#[cfg(unix)]
#[tokio::test]
async fn test_supervised_processes_run_independently() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("survivor.txt");

    let crash = ToolInvocation {
        name: "crash".to_string(),
        command: vec!["sh".into(), "-c".into(), "exit 3".into()],
        cwd: None,
        verbose: true,
        status: false,
    };
    let survivor = ToolInvocation {
        name: "survivor".to_string(),
        command: vec![
            "sh".into(),
            "-c".into(),
            format!("sleep 0.2; echo done > '{}'", marker.display()),
        ],
        cwd: None,
        verbose: true,
        status: false,
    };

    let report = SupervisedPipeline::new("processes")
        .with(ProcessMember { invocation: crash })
        .with(ProcessMember {
            invocation: survivor,
        })
        .run()
        .await;

    assert_eq!(report.failed_count(), 1);
    assert!(marker.exists(), "Survivor must finish after its sibling crashed");
    assert_eq!(report.into_first_error().map(|e| e.code()), Some(3));
}
