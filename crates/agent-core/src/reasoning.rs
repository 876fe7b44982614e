//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern: the agent thinks, acts via a
//! tool, observes the result, and repeats until it emits `Finish[...]` or
//! runs out of steps.
//!
//! ```text
//!   Thinking ──► Dispatching ──► Thinking ──► ... ──► Finished
//!      │                                               Aborted
//!      └── no output / step budget / cancelled ──────► Aborted
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::error::{AbortReason, AgentError, Result, StepFailure};
use crate::event::AgentEvent;
use crate::parser::{OutputParser, ParsedDirective};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolRegistry};
use crate::trajectory::{TrajectoryEntry, TrajectoryLog};

/// Identifies one run in logs and outcomes
pub type RunId = Uuid;

/// Default system prompt; `{tools}` is replaced with the tool list.
pub const DEFAULT_SYSTEM_PROMPT: &str = r"You are an assistant that can call external tools.

Available tools:
{tools}

Respond strictly in the following format:

Thought: your reasoning, used to analyse the problem, break it down and plan the next step.
Action: the action you decide to take, which must be one of:
- `{tool_name}[{tool_input}]`: call one of the available tools.
- `Finish[final answer]`: once you have gathered enough information to answer the question.

Write exactly one Thought and one Action per reply, then stop and wait for the Observation.
";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template, `{tools}` is substituted
    pub system_prompt: String,

    /// Maximum model calls per run
    pub max_steps: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_steps: 5,
            generation: GenerationOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Finished,
    Aborted,
}

/// Result of a single run
#[derive(Clone, Debug, Serialize)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub status: RunStatus,

    /// Present iff `Finished`
    pub answer: Option<String>,

    /// Present iff `Aborted`
    pub abort_reason: Option<AbortReason>,

    /// Model calls made
    pub steps_used: usize,

    pub trajectory: TrajectoryLog,
}

impl RunOutcome {
    pub fn is_finished(&self) -> bool {
        self.status == RunStatus::Finished
    }
}

/// Per-run state, owned by the loop for the duration of one `run`
struct RunState {
    question: String,
    step: usize,
    max_steps: usize,
    terminated: bool,
    trajectory: TrajectoryLog,
}

struct PendingCall {
    action: String,
    name: String,
    argument: String,
}

enum Phase {
    Thinking,
    Dispatching(PendingCall),
    Finished(String),
    Aborted(AbortReason),
}

/// The ReAct agent
pub struct ReActAgent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
    events: Option<UnboundedSender<AgentEvent>>,
}

impl ReActAgent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
            events: None,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Send progress events to `tx` while runs are in flight
    #[must_use]
    pub fn with_events(mut self, tx: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Build the full system prompt including tool descriptions
    pub fn build_system_prompt(&self) -> String {
        self.config
            .system_prompt
            .replace("{tools}", &self.tools.describe_all())
    }

    /// Answer `question`, stopping after at most `max_steps` model calls
    pub async fn run(&self, question: &str) -> RunOutcome {
        self.run_with_cancel(question, &CancelToken::new()).await
    }

    /// Like [`ReActAgent::run`], checking `cancel` before each model call
    pub async fn run_with_cancel(&self, question: &str, cancel: &CancelToken) -> RunOutcome {
        let run_id = RunId::new_v4();
        let span = tracing::info_span!("react_run", %run_id, max_steps = self.config.max_steps);
        self.drive(run_id, question, cancel).instrument(span).await
    }

    async fn drive(&self, run_id: RunId, question: &str, cancel: &CancelToken) -> RunOutcome {
        let system_prompt = self.build_system_prompt();
        let mut state = RunState {
            question: question.to_string(),
            step: 0,
            max_steps: self.config.max_steps,
            terminated: false,
            trajectory: TrajectoryLog::new(),
        };
        tracing::info!(question = %state.question, "Starting run");

        let mut phase = Phase::Thinking;
        loop {
            phase = match phase {
                Phase::Thinking => self.think(&system_prompt, &mut state, cancel).await,
                Phase::Dispatching(call) => {
                    self.dispatch(call, &mut state).await;
                    Phase::Thinking
                }
                Phase::Finished(answer) => {
                    state.terminated = true;
                    tracing::info!(steps = state.step, answer = %answer, "Run finished");
                    self.emit(AgentEvent::Finished {
                        answer: answer.clone(),
                        steps_used: state.step,
                    });
                    return RunOutcome {
                        run_id,
                        status: RunStatus::Finished,
                        answer: Some(answer),
                        abort_reason: None,
                        steps_used: state.step,
                        trajectory: state.trajectory,
                    };
                }
                Phase::Aborted(reason) => {
                    state.terminated = true;
                    tracing::warn!(steps = state.step, %reason, "Run aborted");
                    self.emit(AgentEvent::Aborted {
                        reason,
                        steps_used: state.step,
                    });
                    return RunOutcome {
                        run_id,
                        status: RunStatus::Aborted,
                        answer: None,
                        abort_reason: Some(reason),
                        steps_used: state.step,
                        trajectory: state.trajectory,
                    };
                }
            };
            debug_assert!(!state.terminated);
        }
    }

    /// One model call plus parsing; decides the next phase.
    async fn think(&self, system_prompt: &str, state: &mut RunState, cancel: &CancelToken) -> Phase {
        if cancel.is_cancelled() {
            return Phase::Aborted(AbortReason::Cancelled);
        }
        if state.step >= state.max_steps {
            return Phase::Aborted(AbortReason::MaxSteps);
        }

        let user_prompt = render_user_prompt(&state.question, &state.trajectory);
        state.step += 1;
        let step = state.step;
        tracing::info!(step, "Thinking");
        self.emit(AgentEvent::StepStarted { step });

        let reply = match self
            .provider
            .generate(system_prompt, &user_prompt, &self.config.generation)
            .await
        {
            Ok(completion) if !completion.is_empty() => completion.content,
            Ok(_) => {
                tracing::warn!(step, provider = self.provider.name(), "Model returned empty output");
                return Phase::Aborted(AbortReason::ModelUnavailable);
            }
            Err(e) => {
                tracing::warn!(step, provider = self.provider.name(), error = %e, "Model call failed");
                return Phase::Aborted(AbortReason::ModelUnavailable);
            }
        };

        let parsed = OutputParser::parse(&reply);
        if parsed.truncated {
            self.emit(AgentEvent::Truncated { step });
        }
        if let Some(thought) = &parsed.thought {
            tracing::info!(step, thought = %thought, "Thought");
            self.emit(AgentEvent::Thought {
                step,
                text: thought.clone(),
            });
        }
        if let Some(action) = &parsed.action {
            tracing::info!(step, action = %action, "Action");
            self.emit(AgentEvent::Action {
                step,
                text: action.clone(),
            });
        }

        match parsed.directive {
            ParsedDirective::Finish { answer } => Phase::Finished(answer),
            ParsedDirective::ToolCall { name, argument } => {
                let action = parsed
                    .action
                    .unwrap_or_else(|| format!("{name}[{argument}]"));
                Phase::Dispatching(PendingCall {
                    action,
                    name,
                    argument,
                })
            }
            ParsedDirective::Unparseable => {
                tracing::warn!(step, "Could not parse an Action from the reply");
                self.observe(state, StepFailure::ParseFailure.observation());
                Phase::Thinking
            }
        }
    }

    /// Run the requested tool and record the Action/Observation pair.
    async fn dispatch(&self, call: PendingCall, state: &mut RunState) {
        let observation = match self.invoke_tool(&call.name, &call.argument).await {
            Ok(output) => output,
            Err(failure) => {
                tracing::warn!(step = state.step, tool = %call.name, ?failure, "Tool call failed");
                failure.observation()
            }
        };
        state
            .trajectory
            .append(TrajectoryEntry::Action(call.action));
        self.observe(state, observation);
    }

    async fn invoke_tool(&self, name: &str, argument: &str) -> std::result::Result<String, StepFailure> {
        let handler: Arc<dyn Tool> = self
            .tools
            .resolve(name)
            .ok_or_else(|| StepFailure::UnknownTool(name.to_string()))?;

        tracing::debug!(tool = %name, argument = %argument, "Executing tool");
        match AssertUnwindSafe(handler.call(argument)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(StepFailure::ToolExecutionFailure {
                tool: name.to_string(),
                detail: e.to_string(),
            }),
            Err(panic) => Err(StepFailure::ToolExecutionFailure {
                tool: name.to_string(),
                detail: panic_message(panic.as_ref()),
            }),
        }
    }

    fn observe(&self, state: &mut RunState, observation: String) {
        tracing::info!(step = state.step, observation = %observation, "Observation");
        self.emit(AgentEvent::Observation {
            step: state.step,
            text: observation.clone(),
        });
        state
            .trajectory
            .append(TrajectoryEntry::Observation(observation));
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            // Receiver may have gone away; progress reporting is best effort.
            let _ = tx.send(event);
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn render_user_prompt(question: &str, trajectory: &TrajectoryLog) -> String {
    format!("Question: {question}\nHistory: {}", trajectory.render())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "tool panicked".into(), |msg| format!("tool panicked: {msg}"))
}

/// Builder for [`ReActAgent`]
pub struct ReActAgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
    events: Option<UnboundedSender<AgentEvent>>,
}

impl Default for ReActAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReActAgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
            events: None,
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        tool: T,
    ) -> Self {
        self.tools.register(name, description, tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = max;
        self
    }

    #[must_use]
    pub fn events(mut self, tx: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn build(self) -> Result<ReActAgent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        let mut agent = ReActAgent::new(provider, Arc::new(self.tools), self.config);
        agent.events = self.events;
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::provider::{Completion, ModelInfo};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned replies; repeats `fallback` once the script runs out.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String>>>,
        fallback: Option<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Self::build(replies.iter().map(|r| Ok((*r).to_string())).collect(), None)
        }

        fn repeating(reply: &str) -> Arc<Self> {
            Self::build(VecDeque::new(), Some(reply.to_string()))
        }

        fn failing() -> Arc<Self> {
            Self::build(
                VecDeque::from([Err(AgentError::ProviderUnavailable("down".into()))]),
                None,
            )
        }

        fn build(replies: VecDeque<Result<String>>, fallback: Option<String>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                fallback,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn user_prompt(&self, idx: usize) -> String {
            self.prompts.lock().unwrap()[idx].1.clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push((messages[0].content.clone(), messages[1].content.clone()));

            let next = self.replies.lock().unwrap().pop_front();
            let content = match next {
                Some(reply) => reply?,
                None => self.fallback.clone().unwrap_or_default(),
            };
            Ok(Completion::new(content, &options.model))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    type CallLog = Arc<Mutex<Vec<String>>>;

    fn recording_tool(registry: &mut ToolRegistry, name: &str, output: &'static str) -> CallLog {
        let log: CallLog = Arc::default();
        let seen = Arc::clone(&log);
        registry.register_fn(name, format!("{name} tool"), move |arg| {
            seen.lock().unwrap().push(arg.to_string());
            Ok(output.to_string())
        });
        log
    }

    fn agent(provider: Arc<ScriptedProvider>, tools: ToolRegistry, max_steps: usize) -> ReActAgent {
        ReActAgentBuilder::new()
            .provider(provider)
            .tools(tools)
            .max_steps(max_steps)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_capital_of_france() {
        let provider = ScriptedProvider::new(&[
            "Thought: need lookup\nAction: Search[capital of France]",
            "Thought: known\nAction: Finish[Paris]",
        ]);
        let mut tools = ToolRegistry::new();
        let searches = recording_tool(&mut tools, "Search", "Paris");

        let outcome = agent(provider.clone(), tools, 5).run("capital of France").await;

        assert_eq!(outcome.status, RunStatus::Finished);
        assert_eq!(outcome.answer.as_deref(), Some("Paris"));
        assert_eq!(outcome.abort_reason, None);
        assert_eq!(outcome.steps_used, 2);
        assert_eq!(provider.calls(), 2);
        assert_eq!(*searches.lock().unwrap(), ["capital of France"]);
        assert_eq!(
            outcome.trajectory.entries(),
            [
                TrajectoryEntry::Action("Search[capital of France]".into()),
                TrajectoryEntry::Observation("Paris".into()),
            ]
        );
        assert_eq!(
            provider.user_prompt(1),
            "Question: capital of France\nHistory: Action:Search[capital of France]\nObservation:Paris"
        );
    }

    #[tokio::test]
    async fn test_finish_in_one_step() {
        let provider = ScriptedProvider::new(&["Thought: easy\nAction: Finish[ forty two ]"]);
        let outcome = agent(provider.clone(), ToolRegistry::new(), 5).run("q").await;

        assert!(outcome.is_finished());
        assert_eq!(outcome.answer.as_deref(), Some("forty two"));
        assert_eq!(outcome.steps_used, 1);
        assert!(outcome.trajectory.is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_system_prompt_embeds_tool_descriptions() {
        let provider = ScriptedProvider::new(&["Thought: t\nAction: Finish[x]"]);
        let mut tools = ToolRegistry::new();
        tools.register_fn("Search", "Web search", |s| Ok(s.into()));
        let agent = agent(provider.clone(), tools, 5);

        agent.run("q").await;

        let system = provider.prompts.lock().unwrap()[0].0.clone();
        assert!(system.contains("- Search: Web search"));
        assert!(!system.contains("{tools}"));
        assert_eq!(provider.user_prompt(0), "Question: q\nHistory: ");
    }

    #[tokio::test]
    async fn test_nested_brackets_passed_verbatim() {
        let provider = ScriptedProvider::new(&[
            "Thought: t\nAction: Search[list [a, b] items]",
            "Thought: t\nAction: Finish[done]",
        ]);
        let mut tools = ToolRegistry::new();
        let searches = recording_tool(&mut tools, "Search", "ok");

        let outcome = agent(provider, tools, 5).run("q").await;

        assert!(outcome.is_finished());
        assert_eq!(*searches.lock().unwrap(), ["list [a, b] items"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_observation() {
        let provider = ScriptedProvider::new(&[
            "Thought: try\nAction: X[anything]",
            "Thought: ok\nAction: Finish[gave up]",
        ]);
        let outcome = agent(provider, ToolRegistry::new(), 5).run("q").await;

        assert_eq!(outcome.steps_used, 2);
        assert_eq!(
            outcome.trajectory.entries(),
            [
                TrajectoryEntry::Action("X[anything]".into()),
                TrajectoryEntry::Observation("Error: tool 'X' is not defined".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let provider = ScriptedProvider::new(&[
            "Thought: t\nAction: Flaky[x]",
            "Thought: t\nAction: Finish[done]",
        ]);
        let mut tools = ToolRegistry::new();
        tools.register_fn("Flaky", "always fails", |_| {
            Err(AgentError::ToolExecution("boom".into()))
        });

        let outcome = agent(provider, tools, 5).run("q").await;

        assert!(outcome.is_finished());
        assert_eq!(
            outcome.trajectory.entries()[1],
            TrajectoryEntry::Observation(
                "Error: tool 'Flaky' failed: Tool execution error: boom".into()
            )
        );
    }

    #[tokio::test]
    async fn test_tool_panic_is_contained() {
        let provider = ScriptedProvider::new(&[
            "Thought: t\nAction: Crash[x]",
            "Thought: t\nAction: Finish[survived]",
        ]);
        let mut tools = ToolRegistry::new();
        tools.register_fn("Crash", "panics", |_| panic!("kaboom"));

        let outcome = agent(provider, tools, 5).run("q").await;

        assert_eq!(outcome.answer.as_deref(), Some("survived"));
        let observation = outcome.trajectory.entries()[1].text().to_string();
        assert!(observation.starts_with("Error: tool 'Crash' failed:"));
        assert!(observation.contains("kaboom"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_injects_corrective_observation() {
        let provider = ScriptedProvider::new(&[
            "I think the answer is Paris.",
            "Thought: fine\nAction: Finish[Paris]",
        ]);
        let outcome = agent(provider.clone(), ToolRegistry::new(), 5).run("q").await;

        assert!(outcome.is_finished());
        assert_eq!(outcome.steps_used, 2);
        assert_eq!(
            outcome.trajectory.entries(),
            [TrajectoryEntry::Observation(
                StepFailure::ParseFailure.observation()
            )]
        );
        assert!(provider.user_prompt(1).contains("Observation:Unable to parse an Action"));
    }

    #[tokio::test]
    async fn test_multi_pair_reply_only_first_acted_on() {
        let provider = ScriptedProvider::new(&[
            "Thought: look\nAction: Search[rust]\nObservation: invented\n\
             Thought: done\nAction: Finish[invented]",
            "Thought: real\nAction: Finish[a language]",
        ]);
        let mut tools = ToolRegistry::new();
        let searches = recording_tool(&mut tools, "Search", "a language");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let agent = agent(provider, tools, 5).with_events(tx);

        let outcome = agent.run("what is rust").await;

        assert_eq!(outcome.answer.as_deref(), Some("a language"));
        assert_eq!(outcome.steps_used, 2);
        assert_eq!(searches.lock().unwrap().len(), 1);
        assert_eq!(outcome.trajectory.len(), 2);

        drop(agent);
        let mut truncations = 0;
        while let Some(event) = rx.recv().await {
            if matches!(event, AgentEvent::Truncated { step: 1 }) {
                truncations += 1;
            }
        }
        assert_eq!(truncations, 1);
    }

    #[tokio::test]
    async fn test_step_budget_exhausted() {
        let provider = ScriptedProvider::repeating("Thought: again\nAction: Search[more]");
        let mut tools = ToolRegistry::new();
        let searches = recording_tool(&mut tools, "Search", "nothing new");

        let outcome = agent(provider.clone(), tools, 3).run("q").await;

        assert_eq!(outcome.status, RunStatus::Aborted);
        assert_eq!(outcome.abort_reason, Some(AbortReason::MaxSteps));
        assert_eq!(outcome.abort_reason.unwrap().as_str(), "max steps reached");
        assert_eq!(outcome.answer, None);
        assert_eq!(outcome.steps_used, 3);
        assert_eq!(provider.calls(), 3);
        assert_eq!(searches.lock().unwrap().len(), 3);
        assert_eq!(outcome.trajectory.len(), 6);
    }

    #[tokio::test]
    async fn test_step_budget_counts_unparseable_replies() {
        let provider = ScriptedProvider::repeating("no format at all");
        let outcome = agent(provider.clone(), ToolRegistry::new(), 4).run("q").await;

        assert_eq!(outcome.abort_reason, Some(AbortReason::MaxSteps));
        assert_eq!(provider.calls(), 4);
        assert_eq!(outcome.trajectory.len(), 4);
    }

    #[tokio::test]
    async fn test_zero_step_budget_makes_no_calls() {
        let provider = ScriptedProvider::repeating("Thought: t\nAction: Finish[x]");
        let outcome = agent(provider.clone(), ToolRegistry::new(), 0).run("q").await;

        assert_eq!(outcome.abort_reason, Some(AbortReason::MaxSteps));
        assert_eq!(outcome.steps_used, 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_model_output_aborts() {
        let provider = ScriptedProvider::new(&["   \n"]);
        let outcome = agent(provider.clone(), ToolRegistry::new(), 5).run("q").await;

        assert_eq!(outcome.status, RunStatus::Aborted);
        assert_eq!(outcome.abort_reason, Some(AbortReason::ModelUnavailable));
        assert_eq!(outcome.steps_used, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_aborts_without_retry() {
        let provider = ScriptedProvider::failing();
        let outcome = agent(provider.clone(), ToolRegistry::new(), 5).run("q").await;

        assert_eq!(outcome.abort_reason, Some(AbortReason::ModelUnavailable));
        assert_eq!(
            outcome.abort_reason.unwrap().to_string(),
            "model produced no output"
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_model_call() {
        let provider = ScriptedProvider::repeating("Thought: t\nAction: Finish[x]");
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = agent(provider.clone(), ToolRegistry::new(), 5)
            .run_with_cancel("q", &cancel)
            .await;

        assert_eq!(outcome.abort_reason, Some(AbortReason::Cancelled));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_from_tool_stops_at_next_step() {
        let provider = ScriptedProvider::repeating("Thought: t\nAction: Stop[now]");
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let mut tools = ToolRegistry::new();
        tools.register_fn("Stop", "cancels the run", move |_| {
            trigger.cancel();
            Ok("stopping".into())
        });

        let outcome = agent(provider.clone(), tools, 5)
            .run_with_cancel("q", &cancel)
            .await;

        assert_eq!(outcome.abort_reason, Some(AbortReason::Cancelled));
        assert_eq!(outcome.steps_used, 1);
        assert_eq!(outcome.trajectory.len(), 2);
    }

    #[tokio::test]
    async fn test_events_report_each_step() {
        let provider = ScriptedProvider::new(&[
            "Thought: need lookup\nAction: Search[capital of France]",
            "Thought: known\nAction: Finish[Paris]",
        ]);
        let mut tools = ToolRegistry::new();
        recording_tool(&mut tools, "Search", "Paris");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let agent = ReActAgentBuilder::new()
            .provider(provider)
            .tools(tools)
            .events(tx)
            .build()
            .unwrap();

        agent.run("capital of France").await;
        drop(agent);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            [
                AgentEvent::StepStarted { step: 1 },
                AgentEvent::Thought { step: 1, text: "need lookup".into() },
                AgentEvent::Action { step: 1, text: "Search[capital of France]".into() },
                AgentEvent::Observation { step: 1, text: "Paris".into() },
                AgentEvent::StepStarted { step: 2 },
                AgentEvent::Thought { step: 2, text: "known".into() },
                AgentEvent::Action { step: 2, text: "Finish[Paris]".into() },
                AgentEvent::Finished { answer: "Paris".into(), steps_used: 2 },
            ]
        );
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = ReActAgentBuilder::new().build().err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("bad input");
        assert_eq!(panic_message(boxed.as_ref()), "tool panicked: bad input");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "tool panicked");
    }
}
