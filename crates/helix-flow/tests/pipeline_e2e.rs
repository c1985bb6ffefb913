//! End-to-end pipeline tests over in-memory collaborators.
//!
//! Exercises the full staging → dispatch → execution → status flow the way
//! the platform drives it: through events, with duplicates injected where the
//! real bus would produce them.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};

use helix_core::{MemoryBackend, ObjectId, PipelinePaths, StorageBackend, WritePrecondition};
use helix_flow::{
    DispatchConfig, DispatchOutcome, Dispatcher, ExecutionWorker, JobHealth, JobStateChange,
    JobStatus, MemoryExecutor, ModelParams, Result, SequenceModel, StatusRecorder, Watchdog,
};

/// Test model: uppercases the input.
struct UppercaseModel;

#[async_trait]
impl SequenceModel for UppercaseModel {
    async fn predict(&self, input: &[u8], _params: &ModelParams) -> Result<Bytes> {
        Ok(Bytes::from(input.to_ascii_uppercase()))
    }
}

struct Pipeline {
    storage: Arc<MemoryBackend>,
    executor: Arc<MemoryExecutor>,
    dispatcher: Dispatcher,
    recorder: StatusRecorder,
    worker: ExecutionWorker,
}

fn pipeline() -> Pipeline {
    let storage = Arc::new(MemoryBackend::new());
    let executor = MemoryExecutor::new();
    let paths = PipelinePaths::default();
    Pipeline {
        dispatcher: Dispatcher::new(executor.clone(), paths.clone(), DispatchConfig::default()),
        recorder: StatusRecorder::new(storage.clone(), paths.clone()),
        worker: ExecutionWorker::new(storage.clone(), paths, Arc::new(UppercaseModel)),
        storage,
        executor,
    }
}

/// Stages a payload the way the ingress gate does and returns the
/// notification the store would emit.
async fn stage(
    storage: &Arc<MemoryBackend>,
    id: ObjectId,
    payload: &'static [u8],
) -> helix_flow::ObjectCreated {
    let result = storage
        .put(
            &format!("input/{id}"),
            Bytes::from_static(payload),
            WritePrecondition::DoesNotExist,
        )
        .await
        .expect("staging put");
    assert!(result.is_success(), "fresh id must not collide");

    helix_flow::ObjectCreated {
        bucket: "helix-data".into(),
        object_key: format!("input/{id}"),
    }
}

#[tokio::test]
async fn staged_bytes_round_trip_exactly() {
    let p = pipeline();
    let id = ObjectId::generate();
    stage(&p.storage, id, b"atgcattggc").await;

    let staged = p.storage.get(&format!("input/{id}")).await.expect("get");
    assert_eq!(staged, Bytes::from_static(b"atgcattggc"));

    let inputs = p.storage.list("input/").await.expect("list");
    assert_eq!(inputs.len(), 1, "exactly one staged object");
}

#[tokio::test]
async fn full_pipeline_success_path() {
    let p = pipeline();
    let id = ObjectId::generate();

    // Staging emits a notification; the dispatcher turns it into one job.
    let notification = stage(&p.storage, id, b"atgc").await;
    let outcome = p.dispatcher.handle(&notification).await.expect("dispatch");
    let DispatchOutcome::Submitted { job_name, .. } = outcome else {
        panic!("expected a submission");
    };
    assert_eq!(job_name.as_str(), id.to_string());

    // The executor runs the job; here we run the worker directly with the
    // argument vector the dispatcher produced.
    let submission = p.executor.submission(&job_name).expect("job recorded");
    assert_eq!(submission.command[0], "helix-data");
    assert_eq!(submission.command[1], id.to_string());

    let params = ModelParams {
        model_path: "/models/human.pt".into(),
        beam_width: 100,
        use_gpu: false,
    };
    p.worker.run(id, &params).await.expect("worker run");

    // The executor broadcasts state changes; the recorder captures each.
    for status in [
        JobStatus::Submitted,
        JobStatus::Runnable,
        JobStatus::Starting,
        JobStatus::Running,
        JobStatus::Succeeded,
    ] {
        p.recorder
            .record(&JobStateChange {
                job_name: job_name.clone(),
                status,
                status_reason: None,
            })
            .await
            .expect("record");
    }

    let record_bytes = p
        .storage
        .get(&format!("status/{id}.json"))
        .await
        .expect("status record");
    assert_eq!(
        std::str::from_utf8(&record_bytes).expect("utf8"),
        format!(r#"{{"jobName":"{id}","status":"SUCCEEDED","statusReason":null}}"#)
    );

    let output = p.storage.get(&format!("output/{id}")).await.expect("output");
    assert_eq!(output, Bytes::from_static(b"ATGC"));

    // The watchdog agrees everything is consistent.
    let watchdog = Watchdog::new(
        p.storage.clone(),
        PipelinePaths::default(),
        Duration::minutes(30),
    );
    let health = watchdog
        .check(&job_name, Utc::now())
        .await
        .expect("watchdog");
    assert_eq!(health, JobHealth::Succeeded);
}

#[tokio::test]
async fn redelivered_notification_submits_one_job() {
    let p = pipeline();
    let id = ObjectId::generate();
    let notification = stage(&p.storage, id, b"atgc").await;

    let first = p.dispatcher.handle(&notification).await.expect("first");
    assert!(matches!(first, DispatchOutcome::Submitted { .. }));

    // The bus redelivers; the pipeline must not create a second job.
    let second = p.dispatcher.handle(&notification).await.expect("second");
    assert!(matches!(second, DispatchOutcome::AlreadySubmitted { .. }));
    assert_eq!(p.executor.job_count(), 1);
}

#[tokio::test]
async fn reordered_status_events_still_converge_on_last_delivered() {
    let p = pipeline();
    let id = ObjectId::generate();
    let job_name = id.job_name();

    // Delivery order scrambled relative to emission order; the record
    // reflects the last delivered event by design.
    for status in [JobStatus::Running, JobStatus::Submitted, JobStatus::Succeeded] {
        p.recorder
            .record(&JobStateChange {
                job_name: job_name.clone(),
                status,
                status_reason: None,
            })
            .await
            .expect("record");
    }

    let record = p
        .recorder
        .read(&job_name)
        .await
        .expect("read")
        .expect("exists");
    assert_eq!(record.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn failed_job_is_reported_not_silent() {
    let p = pipeline();
    let id = ObjectId::generate();
    let job_name = id.job_name();
    stage(&p.storage, id, b"atgc").await;

    p.recorder
        .record(&JobStateChange {
            job_name: job_name.clone(),
            status: JobStatus::Failed,
            status_reason: Some("container exited 137".into()),
        })
        .await
        .expect("record");

    let watchdog = Watchdog::new(
        p.storage.clone(),
        PipelinePaths::default(),
        Duration::minutes(30),
    );
    let health = watchdog
        .check(&job_name, Utc::now())
        .await
        .expect("watchdog");
    assert_eq!(
        health,
        JobHealth::Failed {
            reason: Some("container exited 137".into())
        }
    );
}

#[tokio::test]
async fn lost_terminal_event_surfaces_as_stalled() {
    let p = pipeline();
    let id = ObjectId::generate();
    let job_name = id.job_name();
    let staged_at = Utc::now();
    stage(&p.storage, id, b"atgc").await;

    p.recorder
        .record(&JobStateChange {
            job_name: job_name.clone(),
            status: JobStatus::Running,
            status_reason: None,
        })
        .await
        .expect("record");

    let watchdog = Watchdog::new(
        p.storage.clone(),
        PipelinePaths::default(),
        Duration::minutes(30),
    );
    let health = watchdog
        .check_at(&job_name, staged_at, staged_at + Duration::hours(1))
        .await
        .expect("watchdog");
    assert!(matches!(health, JobHealth::Stalled { .. }));
}
