//! In-process job queue and worker
//!
//! Admission enqueues one job per execution; a single worker drains the
//! queue sequentially, so one execution is owned end-to-end by one worker
//! and prefetch is effectively 1. The payload round-trips through JSON so
//! the queue could be swapped for an external broker without touching the
//! executor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use engine::executor::{InputData, WorkflowExecutor};
use engine::graph::GraphData;
use engine::planner::ExecutionPlan;

use crate::error::{OrchestratorError, Result};

/// Queue capacity. The worker drains sequentially; this only bounds the
/// backlog of admitted-but-unstarted executions.
const QUEUE_CAPACITY: usize = 64;

/// One unit of executor work, exactly the admission-time state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionJob {
    pub execution_id: Uuid,
    pub plan: ExecutionPlan,
    pub graph_data: GraphData,
    pub input_data: Option<InputData>,
}

/// Producer half handed to admission.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<ExecutionJob>,
}

impl JobQueue {
    /// Create the queue, returning the producer and the worker's receiver.
    pub fn new() -> (Self, mpsc::Receiver<ExecutionJob>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        (Self { tx }, rx)
    }

    /// Enqueue a job for the worker.
    pub async fn dispatch(&self, job: ExecutionJob) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| OrchestratorError::Engine("job queue is closed".to_string()))
    }
}

/// Consumes jobs and drives the executor, one execution at a time.
pub struct Worker {
    rx: mpsc::Receiver<ExecutionJob>,
    executor: Arc<WorkflowExecutor>,
}

impl Worker {
    pub fn new(rx: mpsc::Receiver<ExecutionJob>, executor: Arc<WorkflowExecutor>) -> Self {
        Self { rx, executor }
    }

    /// Drain jobs until every producer is dropped.
    pub async fn run(mut self) {
        info!("worker started");
        while let Some(job) = self.rx.recv().await {
            let execution_id = job.execution_id;
            info!(execution_id = %execution_id, "job received");

            if let Err(err) = self
                .executor
                .run(
                    execution_id,
                    &job.plan,
                    &job.graph_data,
                    job.input_data.as_ref(),
                )
                .await
            {
                // Storage failures land here; the execution row keeps
                // whatever state was last flushed.
                error!(execution_id = %execution_id, error = %err, "job failed");
            }
        }
        info!("worker stopped, queue closed");
    }

    /// Run the worker on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
