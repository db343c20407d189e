// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ReACT loop (§4.3): drives a planning model through iterative action
//! selection under pre-act review, with format-repair and multi-signal stop
//! detection. Every step returns a `Result`; recovery (re-prompt, repair
//! retry, escalation) is an explicit early return carrying the iterations
//! built so far, never a caught panic.

use async_trait::async_trait;
use std::collections::HashMap;
use weave_core::Clock;

/// Risk level a reviewer assigns to a proposed action (§4.3 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A tool's entry in the catalog handed to the planner and reviewer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params_schema: serde_json::Value,
}

/// The planner's action proposal, parsed from the outermost JSON object in
/// its free-form response (§4.3 step 3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionProposal {
    pub thought: String,
    pub action: String,
    #[serde(default = "serde_json::Value::default")]
    pub params: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReviewVerdict {
    pub approved: bool,
    pub risk_level: RiskLevel,
    pub feedback: String,
    #[serde(default)]
    pub required_fixes: Vec<String>,
}

/// Result of running a proposal's action through the handler registry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub observation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Iteration {
    pub round: u32,
    pub proposal: ActionProposal,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_feedback: Option<String>,
    pub executed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ActionOutcome>,
}

/// Context handed to the reviewer for pre-act review (§4.3 step 5): the last
/// up-to-3 iterations only, never the whole history.
pub struct ReviewContext<'a> {
    pub task: &'a str,
    pub round: u32,
    pub proposal: &'a ActionProposal,
    pub tools: &'a [ToolSpec],
    pub recent: &'a [Iteration],
}

pub type PlannerResult = Result<String, String>;
pub type ReviewResult = Result<ReviewVerdict, String>;
pub type ActionResult = Result<ActionOutcome, String>;

#[async_trait]
pub trait PlannerClient: Send + Sync {
    async fn propose(&self, prompt: &str) -> PlannerResult;
}

#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, ctx: ReviewContext<'_>) -> ReviewResult;
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, action: &str, params: &serde_json::Value) -> ActionResult;
}

/// Why a loop run stopped (§4.3 "Stop conditions", first match wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactStopReason {
    Complete,
    Fail,
    MaxRounds,
    MaxRejections,
    Stuck,
    NoProgress,
    ProposalError,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReactOutcome {
    pub success: bool,
    pub reason: ReactStopReason,
    pub iterations: Vec<Iteration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_observation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_error: Option<String>,
    pub total_rounds: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ReactConfig {
    pub max_rounds: u32,
    pub max_rejections: u32,
    pub on_stuck: u32,
    pub on_convergence: bool,
    pub complete_actions: Vec<String>,
    pub fail_actions: Vec<String>,
    pub format_fix_max_retries: u32,
    /// Required params per action (e.g. `READ_FILE -> [path]`), §4.3 step 4.
    pub required_params: HashMap<String, Vec<String>>,
}

impl Default for ReactConfig {
    fn default() -> Self {
        let mut required_params = HashMap::new();
        required_params.insert("READ_FILE".to_string(), vec!["path".to_string()]);
        required_params.insert("WRITE_FILE".to_string(), vec!["path".to_string(), "content".to_string()]);
        required_params.insert("SHELL_EXEC".to_string(), vec!["command".to_string()]);
        required_params.insert("FAIL".to_string(), vec!["reason".to_string()]);
        Self {
            max_rounds: 25,
            max_rejections: 3,
            on_stuck: 3,
            on_convergence: true,
            complete_actions: vec!["COMPLETE".to_string()],
            fail_actions: vec!["FAIL".to_string()],
            format_fix_max_retries: 1,
            required_params,
        }
    }
}

#[derive(Debug, Default)]
struct Convergence {
    rejection_streak: u32,
    stuck_count: u32,
    last_rejection_reason: Option<String>,
}

impl Convergence {
    fn record_rejection(&mut self, reason: &str) {
        self.rejection_streak += 1;
        if self.last_rejection_reason.as_deref() == Some(reason) {
            self.stuck_count += 1;
        } else {
            // First occurrence of a reason establishes the baseline; `stuckCount`
            // only grows on a *repeat* of the same reason (§4.3 "stuckCount
            // resets when the rejection reason changes").
            self.stuck_count = 0;
            self.last_rejection_reason = Some(reason.to_string());
        }
    }

    fn record_execution(&mut self) {
        self.rejection_streak = 0;
        self.stuck_count = 0;
        self.last_rejection_reason = None;
    }
}

pub struct ReactLoop<P, R, A, C>
where
    P: PlannerClient,
    R: Reviewer,
    A: ActionHandler,
    C: Clock,
{
    planner: P,
    reviewer: Option<R>,
    action_handler: A,
    clock: C,
    config: ReactConfig,
}

impl<P, R, A, C> ReactLoop<P, R, A, C>
where
    P: PlannerClient,
    R: Reviewer,
    A: ActionHandler,
    C: Clock,
{
    pub fn new(planner: P, reviewer: Option<R>, action_handler: A, clock: C, config: ReactConfig) -> Self {
        Self { planner, reviewer, action_handler, clock, config }
    }

    /// Run the loop to completion (§4.3). `instructions` is prose already
    /// resolved from the runtime-instruction bus for this round; it's folded
    /// into the prompt verbatim rather than re-fetched here, keeping this
    /// type free of a direct dependency on `InstructionBus`.
    pub async fn run(&self, task: &str, tools: &[ToolSpec], pending_instructions: &[String]) -> ReactOutcome {
        let start = self.clock.now();
        let mut iterations: Vec<Iteration> = Vec::new();
        let mut convergence = Convergence::default();
        let mut round: u32 = 1;

        loop {
            let prompt = self.build_prompt(task, &iterations, tools, pending_instructions, round);

            let proposal = match self.obtain_proposal(&prompt).await {
                Ok(p) => p,
                Err(_) => {
                    return self.finish(iterations, ReactStopReason::ProposalError, None, Some("format repair budget exhausted".into()), round, start);
                }
            };

            if let Err(message) = self.validate_fields(&proposal) {
                return self.finish(iterations, ReactStopReason::ProposalError, None, Some(message), round, start);
            }

            let verdict = match &self.reviewer {
                Some(reviewer) => {
                    let recent_start = iterations.len().saturating_sub(3);
                    let ctx = ReviewContext { task, round, proposal: &proposal, tools, recent: &iterations[recent_start..] };
                    match reviewer.review(ctx).await {
                        Ok(v) => Some(v),
                        Err(message) => Some(ReviewVerdict { approved: false, risk_level: RiskLevel::High, feedback: message, required_fixes: Vec::new() }),
                    }
                }
                None => None,
            };

            let approved = verdict.as_ref().map_or(true, |v| v.approved && v.risk_level != RiskLevel::High);

            if !approved {
                let reason = verdict.as_ref().map(|v| v.feedback.clone()).unwrap_or_default();
                iterations.push(Iteration {
                    round,
                    proposal: proposal.clone(),
                    approved: false,
                    review_feedback: verdict.map(|v| v.feedback),
                    executed: false,
                    outcome: None,
                });
                convergence.record_rejection(&reason);
                if let Some(stop) = self.check_stop(&iterations, &convergence, false) {
                    return self.finish(iterations, stop, None, None, round, start);
                }
                round += 1;
                continue;
            }

            let outcome = match self.action_handler.execute(&proposal.action, &proposal.params).await {
                Ok(outcome) => outcome,
                Err(message) => ActionOutcome { success: false, observation: format!("Execution error: {message}"), data: None },
            };
            convergence.record_execution();
            let action = proposal.action.clone();
            let observation = outcome.observation.clone();
            iterations.push(Iteration { round, proposal, approved: true, review_feedback: None, executed: true, outcome: Some(outcome) });

            if let Some(stop) = self.check_stop(&iterations, &convergence, true) {
                return self.finish(iterations, stop, Some(observation), None, round, start);
            }
            let _ = action;
            round += 1;
        }
    }

    fn build_prompt(&self, task: &str, iterations: &[Iteration], tools: &[ToolSpec], pending_instructions: &[String], round: u32) -> String {
        let recent_start = iterations.len().saturating_sub(5);
        let mut out = format!("Task: {task}\nRound: {round}\n");
        for it in &iterations[recent_start..] {
            let verdict = if it.approved { "approved".to_string() } else { format!("rejected: {}", it.review_feedback.clone().unwrap_or_default()) };
            let result = it
                .outcome
                .as_ref()
                .map(|o| if o.success { format!("success: {}", o.observation) } else { format!("error: {}", o.observation) })
                .unwrap_or_default();
            out.push_str(&format!("Round {}: {} ({verdict}) ({result})\n", it.round, it.proposal.action));
        }
        out.push_str("Tools:\n");
        for tool in tools {
            out.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }
        if !pending_instructions.is_empty() {
            out.push_str("Pending instructions:\n");
            for instruction in pending_instructions {
                out.push_str(&format!("- {instruction}\n"));
            }
        }
        out
    }

    async fn obtain_proposal(&self, prompt: &str) -> Result<ActionProposal, ()> {
        let mut attempt = 0;
        let mut current_prompt = prompt.to_string();
        loop {
            let response = self.planner.propose(&current_prompt).await.map_err(|_| ())?;
            match parse_proposal(&response) {
                Ok(proposal) => return Ok(proposal),
                Err(parse_error) => {
                    if attempt >= self.config.format_fix_max_retries {
                        return Err(());
                    }
                    attempt += 1;
                    let truncated: String = response.chars().take(500).collect();
                    current_prompt = format!(
                        "{prompt}\n\nYour previous response could not be parsed as a single JSON action proposal ({parse_error}). Previous response (truncated): {truncated}\nRespond with exactly one JSON object: {{\"thought\",\"action\",\"params\"}}."
                    );
                }
            }
        }
    }

    fn validate_fields(&self, proposal: &ActionProposal) -> Result<(), String> {
        if proposal.thought.is_empty() {
            return Err("proposal missing required field: thought".to_string());
        }
        if proposal.action.is_empty() {
            return Err("proposal missing required field: action".to_string());
        }
        if !proposal.params.is_object() && !proposal.params.is_null() {
            return Err("proposal missing required field: params".to_string());
        }
        if let Some(required) = self.config.required_params.get(&proposal.action) {
            for param in required {
                let present = proposal.params.get(param).is_some();
                if !present {
                    return Err(format!("action {} missing required param: {param}", proposal.action));
                }
            }
        }
        Ok(())
    }

    fn check_stop(&self, iterations: &[Iteration], convergence: &Convergence, just_executed: bool) -> Option<ReactStopReason> {
        if let Some(last) = iterations.last().filter(|_| just_executed) {
            if self.config.complete_actions.iter().any(|a| a == &last.proposal.action) {
                return Some(ReactStopReason::Complete);
            }
            if self.config.fail_actions.iter().any(|a| a == &last.proposal.action) {
                return Some(ReactStopReason::Fail);
            }
        }
        if iterations.len() as u32 >= self.config.max_rounds {
            return Some(ReactStopReason::MaxRounds);
        }
        if convergence.rejection_streak >= self.config.max_rejections {
            return Some(ReactStopReason::MaxRejections);
        }
        if convergence.stuck_count >= self.config.on_stuck {
            return Some(ReactStopReason::Stuck);
        }
        if self.config.on_convergence {
            let observations: Vec<&str> = iterations
                .iter()
                .rev()
                .filter_map(|it| it.outcome.as_ref().map(|o| o.observation.as_str()))
                .take(5)
                .collect();
            if observations.len() >= 3 {
                let unique: std::collections::HashSet<&str> = observations.iter().copied().collect();
                if unique.len() == 1 {
                    let repeats = observations.iter().filter(|o| **o == observations[0]).count();
                    if repeats >= 3 {
                        return Some(ReactStopReason::NoProgress);
                    }
                }
            }
        }
        None
    }

    fn finish(
        &self,
        iterations: Vec<Iteration>,
        reason: ReactStopReason,
        final_observation: Option<String>,
        final_error: Option<String>,
        total_rounds: u32,
        start: std::time::Instant,
    ) -> ReactOutcome {
        let success = match reason {
            ReactStopReason::Complete => true,
            ReactStopReason::Fail | ReactStopReason::MaxRejections | ReactStopReason::Stuck | ReactStopReason::NoProgress | ReactStopReason::ProposalError => false,
            // A max_rounds stop is a protection-stop, not a failure, when the
            // final iteration itself succeeded (§4.3).
            ReactStopReason::MaxRounds => iterations.last().and_then(|it| it.outcome.as_ref()).map(|o| o.success).unwrap_or(false),
        };
        ReactOutcome {
            success,
            reason,
            iterations,
            final_observation,
            final_error,
            total_rounds,
            duration_ms: self.clock.now().saturating_duration_since(start).as_millis() as u64,
        }
    }
}

/// Extract and parse the outermost `{...}` object in `text` (§4.3 step 3).
fn parse_proposal(text: &str) -> Result<ActionProposal, String> {
    let start = text.find('{').ok_or_else(|| "no JSON object found".to_string())?;
    let mut depth = 0i32;
    let mut end = None;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| "unterminated JSON object".to_string())?;
    serde_json::from_str(&text[start..end]).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "react_tests.rs"]
mod tests;
