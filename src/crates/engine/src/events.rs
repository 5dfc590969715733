//! Execution event stream
//!
//! Every significant transition publishes a structured JSON event to a
//! per-execution channel named `execution:<uuid>`. Publication is
//! fire-and-forget: failures are logged and swallowed, never affecting the
//! execution outcome. Subscribers must ignore unknown `type` values so the
//! taxonomy can grow.

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of one execution's broadcast channel. Slow subscribers that lag
/// past this many events observe a gap, not backpressure on the executor.
const CHANNEL_CAPACITY: usize = 256;

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Prompt/completion token pair on an `agent_completed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTokens {
    pub prompt: u32,
    pub completion: u32,
}

/// Consumption snapshot on budget events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConsumed {
    pub tokens: u64,
    pub cost: f64,
}

/// Configured caps on budget events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCapsPayload {
    pub max_tokens: Option<u64>,
    pub max_cost: Option<f64>,
}

/// Aggregate totals on the terminal `execution_completed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTotals {
    pub tokens_prompt: u64,
    pub tokens_completion: u64,
    pub cost: f64,
    pub duration_ms: u64,
    pub agents_completed: usize,
    pub agents_failed: usize,
    pub agents_skipped: usize,
}

/// Event types for execution tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// An agent entered the running state
    AgentStarted {
        agent_id: String,
        agent_name: String,
        parallel_group: usize,
        timestamp: String,
    },
    /// An agent call finished successfully
    AgentCompleted {
        agent_id: String,
        agent_name: String,
        tokens: EventTokens,
        cost: f64,
        latency_ms: u64,
        timestamp: String,
    },
    /// One attempt failed; terminal for the agent when `will_retry` is false
    AgentFailed {
        agent_id: String,
        agent_name: String,
        error: String,
        will_retry: bool,
        retries_remaining: u32,
        timestamp: String,
    },
    /// A retry is about to run
    AgentRetrying {
        agent_id: String,
        agent_name: String,
        retry_number: u32,
        timestamp: String,
    },
    /// The fallback agent was launched on behalf of a failed original
    AgentFallback {
        original_agent_id: String,
        fallback_agent_id: String,
        fallback_agent_name: String,
        reason: String,
        timestamp: String,
    },
    /// An agent was skipped without running
    AgentSkipped {
        agent_id: String,
        agent_name: String,
        reason: String,
        timestamp: String,
    },
    /// Consumption crossed 80% of a configured cap (fires once)
    BudgetWarning {
        consumed: BudgetConsumed,
        budget: BudgetCapsPayload,
        percentage: u32,
        timestamp: String,
    },
    /// A cap was reached; remaining agents will not run
    BudgetExceeded {
        consumed: BudgetConsumed,
        budget: BudgetCapsPayload,
        agents_not_run: Vec<String>,
        timestamp: String,
    },
    /// Terminal event; exactly one per execution
    ExecutionCompleted {
        status: String,
        totals: ExecutionTotals,
        timestamp: String,
    },
}

impl ExecutionEvent {
    pub fn agent_started(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        parallel_group: usize,
    ) -> Self {
        ExecutionEvent::AgentStarted {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            parallel_group,
            timestamp: now_iso(),
        }
    }

    pub fn agent_completed(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        tokens: EventTokens,
        cost: f64,
        latency_ms: u64,
    ) -> Self {
        ExecutionEvent::AgentCompleted {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            tokens,
            cost,
            latency_ms,
            timestamp: now_iso(),
        }
    }

    pub fn agent_failed(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        error: impl Into<String>,
        will_retry: bool,
        retries_remaining: u32,
    ) -> Self {
        ExecutionEvent::AgentFailed {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            error: error.into(),
            will_retry,
            retries_remaining,
            timestamp: now_iso(),
        }
    }

    pub fn agent_retrying(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        retry_number: u32,
    ) -> Self {
        ExecutionEvent::AgentRetrying {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            retry_number,
            timestamp: now_iso(),
        }
    }

    pub fn agent_fallback(
        original_agent_id: impl Into<String>,
        fallback_agent_id: impl Into<String>,
        fallback_agent_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ExecutionEvent::AgentFallback {
            original_agent_id: original_agent_id.into(),
            fallback_agent_id: fallback_agent_id.into(),
            fallback_agent_name: fallback_agent_name.into(),
            reason: reason.into(),
            timestamp: now_iso(),
        }
    }

    pub fn agent_skipped(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ExecutionEvent::AgentSkipped {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            reason: reason.into(),
            timestamp: now_iso(),
        }
    }

    pub fn budget_warning(
        consumed: BudgetConsumed,
        budget: BudgetCapsPayload,
        percentage: u32,
    ) -> Self {
        ExecutionEvent::BudgetWarning {
            consumed,
            budget,
            percentage,
            timestamp: now_iso(),
        }
    }

    pub fn budget_exceeded(
        consumed: BudgetConsumed,
        budget: BudgetCapsPayload,
        agents_not_run: Vec<String>,
    ) -> Self {
        ExecutionEvent::BudgetExceeded {
            consumed,
            budget,
            agents_not_run,
            timestamp: now_iso(),
        }
    }

    pub fn execution_completed(status: impl Into<String>, totals: ExecutionTotals) -> Self {
        ExecutionEvent::ExecutionCompleted {
            status: status.into(),
            totals,
            timestamp: now_iso(),
        }
    }

    /// Whether this event terminates the channel.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionEvent::ExecutionCompleted { .. })
    }
}

/// Per-execution pub/sub fan-out over tokio broadcast channels.
///
/// One sender per execution, created lazily by the first publisher or
/// subscriber. The executor publishes; the WebSocket bridge subscribes.
#[derive(Debug, Default)]
pub struct EventBus {
    channels: DashMap<Uuid, broadcast::Sender<ExecutionEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Channel name as surfaced to API clients.
    pub fn channel_name(execution_id: Uuid) -> String {
        format!("execution:{}", execution_id)
    }

    fn sender(&self, execution_id: Uuid) -> broadcast::Sender<ExecutionEvent> {
        self.channels
            .entry(execution_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Subscribe to an execution's event stream.
    pub fn subscribe(&self, execution_id: Uuid) -> broadcast::Receiver<ExecutionEvent> {
        self.sender(execution_id).subscribe()
    }

    /// Publish fire-and-forget. A send error only means nobody is listening.
    pub fn publish(&self, execution_id: Uuid, event: ExecutionEvent) {
        let sender = self.sender(execution_id);
        if let Err(err) = sender.send(event) {
            tracing::debug!(
                channel = %Self::channel_name(execution_id),
                "event dropped, no subscribers: {}",
                err
            );
        }
    }

    /// Drop an execution's channel once it is terminal. Buffered events
    /// already sent remain readable by existing receivers.
    pub fn close(&self, execution_id: Uuid) {
        self.channels.remove(&execution_id);
    }

    /// Drop the channel only if nothing is subscribed. Used by bridges that
    /// subscribed speculatively for an execution that turned out terminal.
    pub fn prune(&self, execution_id: Uuid) {
        self.channels
            .remove_if(&execution_id, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of live channels, for health reporting.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
