//! Budget estimation, downgrade suggestions and mid-flight enforcement
//!
//! The estimator projects workflow cost before admission from node configs
//! and the pricing table. The suggester proposes model downgrades and
//! optional-branch skips when an estimate busts the caller's cap. The
//! enforcer tracks actual consumption during execution and classifies it
//! as ok / warning / exceeded.

use serde::{Deserialize, Serialize};

use crate::graph::{GraphData, Provider};
use crate::planner::ExecutionPlan;
use crate::pricing::{round_cost, PricingTable};

/// Heuristic: 4 characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Fraction of an upstream agent's `max_tokens` assumed to reach downstream
/// prompts.
pub const AVG_OUTPUT_RATIO: f64 = 0.6;

/// Prompt-token floor for agents with no dependencies.
pub const BASE_INPUT_ESTIMATE: u32 = 200;

/// Prompt-formatting overhead added per dependency.
pub const FORMATTING_OVERHEAD_PER_DEP: u32 = 50;

/// Completion-token cap treated as "large" for confidence scoring.
const LARGE_MAX_TOKENS: u32 = 4000;

/// Fixed downgrade path for a model; cheapest-last.
pub fn downgrade_path(model: &str) -> &'static [&'static str] {
    match model {
        "gpt-4o" => &["gpt-4o-mini", "gpt-3.5-turbo"],
        "gpt-4o-mini" => &["gpt-3.5-turbo"],
        "claude-3.5-sonnet" => &["claude-3-haiku"],
        _ => &[],
    }
}

/// Provider owning a downgrade-path model.
fn model_provider(model: &str) -> Option<Provider> {
    match model {
        "gpt-4o" | "gpt-4o-mini" | "gpt-3.5-turbo" => Some(Provider::OpenAi),
        "claude-3.5-sonnet" | "claude-3-haiku" => Some(Provider::Anthropic),
        _ => None,
    }
}

/// How much the estimate can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Projected tokens and cost for one planned agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEstimate {
    pub node_id: String,
    pub model: String,
    pub provider: Provider,
    pub estimated_prompt_tokens: u32,
    pub estimated_completion_tokens: u32,
    pub estimated_cost: f64,
}

/// Pre-flight cost projection for a whole plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub total: f64,
    pub agents: Vec<AgentEstimate>,
    pub confidence: Confidence,
}

/// Cost-reduction action proposed when an estimate exceeds the budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSuggestion {
    pub action: SuggestionAction,
    pub agent: String,
    pub saves: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionAction {
    DowngradeModel,
    SkipAgent,
}

fn estimate_agent_tokens(
    config: &crate::graph::NodeConfig,
    dep_max_tokens: &[u32],
) -> (u32, u32) {
    let system_tokens = (config.system_prompt.chars().count() / CHARS_PER_TOKEN).max(1) as u32;

    let input_tokens = if dep_max_tokens.is_empty() {
        BASE_INPUT_ESTIMATE
    } else {
        let carried: u32 = dep_max_tokens
            .iter()
            .map(|max| (*max as f64 * AVG_OUTPUT_RATIO) as u32)
            .sum();
        carried + FORMATTING_OVERHEAD_PER_DEP * dep_max_tokens.len() as u32
    };

    let prompt_tokens = system_tokens + input_tokens;
    let completion_tokens = config.max_tokens;
    (prompt_tokens, completion_tokens)
}

/// Project the cost of running `plan` over `graph`.
pub fn estimate_workflow_cost(
    plan: &ExecutionPlan,
    graph: &GraphData,
    pricing: &PricingTable,
) -> CostEstimate {
    let configs = graph.node_configs();
    let deps_of = graph.deps_of();

    let mut agents = Vec::with_capacity(plan.total_agents);
    let mut total = 0.0;

    for group in &plan.groups {
        for entry in &group.agents {
            let config = configs.get(&entry.node_id).unwrap_or(&entry.config);

            let dep_max_tokens: Vec<u32> = deps_of
                .get(&entry.node_id)
                .map(|deps| {
                    deps.iter()
                        .map(|d| configs.get(d).map(|c| c.max_tokens).unwrap_or(1000))
                        .collect()
                })
                .unwrap_or_default();

            let (prompt_tokens, completion_tokens) = estimate_agent_tokens(config, &dep_max_tokens);
            let cost = pricing.cost(config.provider, &config.model, prompt_tokens, completion_tokens);

            agents.push(AgentEstimate {
                node_id: entry.node_id.clone(),
                model: config.model.clone(),
                provider: config.provider,
                estimated_prompt_tokens: prompt_tokens,
                estimated_completion_tokens: completion_tokens,
                estimated_cost: cost,
            });
            total += cost;
        }
    }

    let large_max = plan
        .node_ids()
        .any(|id| configs.get(id).map(|c| c.max_tokens).unwrap_or(1000) > LARGE_MAX_TOKENS);

    let confidence = if graph.has_conditions() || large_max {
        Confidence::Low
    } else if plan.total_agents <= 3 {
        Confidence::High
    } else {
        Confidence::Medium
    };

    CostEstimate {
        total: round_cost(total),
        agents,
        confidence,
    }
}

/// True when a node has no outgoing edges (an optional leaf branch).
fn is_optional(node_id: &str, graph: &GraphData) -> bool {
    !graph.edges.iter().any(|e| e.source == node_id)
}

/// Generate cost-reduction suggestions, sorted by savings descending.
pub fn generate_budget_suggestions(
    estimate: &CostEstimate,
    graph: &GraphData,
    pricing: &PricingTable,
) -> Vec<BudgetSuggestion> {
    let mut suggestions = Vec::new();

    for agent in &estimate.agents {
        for target_model in downgrade_path(&agent.model) {
            let target_provider = model_provider(target_model).unwrap_or(agent.provider);
            let new_cost = pricing.cost(
                target_provider,
                target_model,
                agent.estimated_prompt_tokens,
                agent.estimated_completion_tokens,
            );
            let saves = round_cost(agent.estimated_cost - new_cost);

            if saves > 0.0 {
                suggestions.push(BudgetSuggestion {
                    action: SuggestionAction::DowngradeModel,
                    agent: agent.node_id.clone(),
                    saves,
                    from_model: Some(agent.model.clone()),
                    to_model: Some(target_model.to_string()),
                    impact: Some(format!(
                        "{} may produce shorter or less nuanced outputs",
                        target_model
                    )),
                });
            }
        }
    }

    for agent in &estimate.agents {
        if is_optional(&agent.node_id, graph) {
            suggestions.push(BudgetSuggestion {
                action: SuggestionAction::SkipAgent,
                agent: agent.node_id.clone(),
                saves: agent.estimated_cost,
                from_model: None,
                to_model: None,
                impact: Some("Optional branch with no downstream dependencies".to_string()),
            });
        }
    }

    suggestions.sort_by(|a, b| b.saves.partial_cmp(&a.saves).unwrap_or(std::cmp::Ordering::Equal));
    suggestions
}

/// Consumption classification returned by [`BudgetEnforcer::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Ok,
    Warning,
    Exceeded,
}

/// Mid-flight consumption tracker against optional token and cost caps.
///
/// The warning fires at most once per run, the first time any configured cap
/// reaches 80% utilization. Exceeded is sticky: usage only accumulates.
#[derive(Debug, Clone)]
pub struct BudgetEnforcer {
    max_tokens: Option<u64>,
    max_cost: Option<f64>,
    used_tokens: u64,
    used_cost: f64,
    warned: bool,
}

const WARNING_THRESHOLD: f64 = 0.8;

impl BudgetEnforcer {
    pub fn new(max_tokens: Option<u64>, max_cost: Option<f64>) -> Self {
        Self {
            max_tokens,
            max_cost,
            used_tokens: 0,
            used_cost: 0.0,
            warned: false,
        }
    }

    /// Whether any cap is configured. Without caps, `check` is always `Ok`.
    pub fn has_budget(&self) -> bool {
        self.max_tokens.is_some() || self.max_cost.is_some()
    }

    /// Record consumption from one completed agent call.
    pub fn record(&mut self, tokens: u64, cost: f64) {
        self.used_tokens += tokens;
        self.used_cost += cost;
    }

    pub fn used_tokens(&self) -> u64 {
        self.used_tokens
    }

    pub fn used_cost(&self) -> f64 {
        self.used_cost
    }

    pub fn max_tokens(&self) -> Option<u64> {
        self.max_tokens
    }

    pub fn max_cost(&self) -> Option<f64> {
        self.max_cost
    }

    /// Highest configured utilization, as a 0-100 percentage.
    pub fn utilization_percent(&self) -> u32 {
        let mut highest = 0.0f64;
        if let Some(max) = self.max_cost {
            if max > 0.0 {
                highest = highest.max(self.used_cost / max);
            }
        }
        if let Some(max) = self.max_tokens {
            if max > 0 {
                highest = highest.max(self.used_tokens as f64 / max as f64);
            }
        }
        (highest * 100.0).round() as u32
    }

    /// Classify current consumption.
    pub fn check(&mut self) -> BudgetStatus {
        if let Some(max) = self.max_cost {
            if self.used_cost >= max {
                return BudgetStatus::Exceeded;
            }
        }
        if let Some(max) = self.max_tokens {
            if self.used_tokens >= max {
                return BudgetStatus::Exceeded;
            }
        }

        if !self.warned {
            if let Some(max) = self.max_cost {
                if self.used_cost >= max * WARNING_THRESHOLD {
                    self.warned = true;
                    return BudgetStatus::Warning;
                }
            }
            if let Some(max) = self.max_tokens {
                if self.used_tokens as f64 >= max as f64 * WARNING_THRESHOLD {
                    self.warned = true;
                    return BudgetStatus::Warning;
                }
            }
        }

        BudgetStatus::Ok
    }
}
