//! Per-session view over the invocation feed.
//!
//! Invocations are kept by call id and replaced in place; nothing here is
//! appended per update. "Which confirmation is pending" is computed from the
//! entries on demand and never stored.

use crate::dispatch::confirmation::ConfirmationPrompt;
use crate::dispatch::handler::UiAction;
use crate::dispatch::tools::{FrontendToolCall, ProductCardArgs, ToolInfoArgs};
use crate::dispatch::{InvocationState, ToolInvocation};
use serde_json::Value;
use std::collections::HashMap;

/// How the client treats invocations of one tool id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTreatment {
    /// Needs a human choice before a result exists.
    Confirmation,
    /// A local handler computes the result.
    LocalHandler,
    /// Rendered only; the backend drives its lifecycle.
    Display,
    /// Not in the catalogue; shown with the generic fallback.
    Unknown,
}

/// Progress of sending this call's result back to the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Idle,
    /// A handler job is in flight.
    Running,
    Sent,
    /// The last send failed; `result` is kept for retry.
    Failed { result: Value, error: String },
    /// The handler could not reach an external dependency. Nothing was sent;
    /// a retry runs the handler again.
    Interrupted { error: String },
}

/// User-visible error with an optional retry affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub call_id: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub message_id: String,
    pub invocation: ToolInvocation,
    pub treatment: ToolTreatment,
    /// Typed arguments, or the reason they could not be decoded.
    pub call: Result<FrontendToolCall, String>,
    /// Result produced on this side (handler or confirmation), if any.
    pub outcome: Option<Value>,
    pub delivery: Delivery,
    /// Present until the confirmation resolves.
    pub prompt: Option<ConfirmationPrompt>,
    /// Product card shown after a successful handler run.
    pub displayed_product: Option<ProductCardArgs>,
}

impl Entry {
    pub(crate) fn new(
        message_id: String,
        invocation: ToolInvocation,
        treatment: ToolTreatment,
    ) -> Self {
        let call = FrontendToolCall::decode(invocation.tool_id.as_str(), &invocation.arguments);
        let prompt = prompt_for(treatment, &call, invocation.state);
        Self {
            message_id,
            invocation,
            treatment,
            call,
            outcome: None,
            delivery: Delivery::Idle,
            prompt,
            displayed_product: None,
        }
    }

    /// Replace the invocation with a later version of itself.
    pub(crate) fn refresh(&mut self, invocation: ToolInvocation) {
        if invocation.arguments != self.invocation.arguments {
            self.call =
                FrontendToolCall::decode(invocation.tool_id.as_str(), &invocation.arguments);
            if self.outcome.is_none() {
                let next = prompt_for(self.treatment, &self.call, invocation.state);
                self.prompt = match (self.prompt.take(), next) {
                    // Same options: keep the user's progress (e.g. a free-text draft).
                    (Some(mut current), Some(next)) if current.options == next.options => {
                        current.title = next.title;
                        current.question = next.question;
                        current.context = next.context;
                        Some(current)
                    }
                    (_, next) => next,
                };
            }
        }
        self.invocation = invocation;
        if self.state().is_terminal() {
            self.prompt = None;
        }
    }

    pub fn call_id(&self) -> &str {
        &self.invocation.call_id
    }

    pub fn state(&self) -> InvocationState {
        self.invocation.state
    }

    fn awaiting_choice(&self) -> bool {
        self.treatment == ToolTreatment::Confirmation
            && !self.state().is_terminal()
            && self.prompt.as_ref().map(|p| !p.is_resolved()).unwrap_or(false)
    }
}

fn prompt_for(
    treatment: ToolTreatment,
    call: &Result<FrontendToolCall, String>,
    state: InvocationState,
) -> Option<ConfirmationPrompt> {
    match (treatment, call) {
        (ToolTreatment::Confirmation, Ok(FrontendToolCall::AskUserConfirmation(args)))
            if !state.is_terminal() =>
        {
            Some(ConfirmationPrompt::new(args))
        }
        _ => None,
    }
}

/// What a rendered tool shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCard {
    Confirmation {
        question: String,
        /// Interactive only for the pending confirmation.
        prompt: Option<ConfirmationPrompt>,
        answer: Option<Value>,
    },
    ProductCard {
        product: ProductCardArgs,
        displayed: bool,
        outcome: Option<Value>,
    },
    ToolInfo(ToolInfoArgs),
    BackgroundColor {
        requested: String,
        outcome: Option<Value>,
    },
    /// Generic fallback for ids without a treatment.
    Unknown { name: String, arguments: Value },
    /// Arguments did not fit the tool's shape.
    Invalid { tool: String, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTool {
    pub message_id: String,
    pub call_id: String,
    pub state: InvocationState,
    pub card: ToolCard,
}

#[derive(Debug, Default)]
pub struct SessionView {
    turns: Vec<String>,
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    background_color: Option<String>,
    banners: Vec<Banner>,
}

impl SessionView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, call_id: &str) -> Option<&Entry> {
        self.entries.get(call_id)
    }

    pub(crate) fn entry_mut(&mut self, call_id: &str) -> Option<&mut Entry> {
        self.entries.get_mut(call_id)
    }

    /// Record that assistant turn `message_id` exists, tool invocations or not.
    ///
    /// Turns are ordered by first sighting; seeing an older turn again does
    /// not move it.
    pub fn begin_turn(&mut self, message_id: &str) {
        if !self.turns.iter().any(|t| t == message_id) {
            self.turns.push(message_id.to_string());
        }
    }

    /// The most recent assistant turn seen so far.
    pub fn latest_turn(&self) -> Option<&str> {
        self.turns.last().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, entry: Entry) {
        self.begin_turn(&entry.message_id);
        let call_id = entry.call_id().to_string();
        if !self.entries.contains_key(&call_id) {
            self.order.push(call_id.clone());
        }
        self.entries.insert(call_id, entry);
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn background_color(&self) -> Option<&str> {
        self.background_color.as_deref()
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    pub(crate) fn apply(&mut self, call_id: &str, effect: UiAction) {
        match effect {
            UiAction::SetBackground(color) => self.background_color = Some(color),
            UiAction::ShowProductCard(args) => {
                if let Some(entry) = self.entries.get_mut(call_id) {
                    entry.displayed_product = Some(args);
                }
            }
        }
    }

    pub(crate) fn raise(&mut self, banner: Banner) {
        self.banners.retain(|b| b.call_id != banner.call_id);
        self.banners.push(banner);
    }

    pub(crate) fn clear_banner(&mut self, call_id: &str) {
        self.banners.retain(|b| b.call_id != call_id);
    }

    /// The confirmation currently waiting for the user, if any.
    ///
    /// Only the most recent assistant turn is considered, and within it the
    /// first unresolved confirmation. A newer turn without tool invocations
    /// leaves nothing pending.
    pub fn pending_confirmation(&self) -> Option<&str> {
        let turn = self.turns.last()?;
        self.entries()
            .filter(|e| &e.message_id == turn)
            .find(|e| e.awaiting_choice())
            .map(Entry::call_id)
    }

    pub fn render(&self) -> Vec<RenderedTool> {
        let pending = self.pending_confirmation();
        self.entries()
            .map(|entry| RenderedTool {
                message_id: entry.message_id.clone(),
                call_id: entry.call_id().to_string(),
                state: entry.state(),
                card: card_for(entry, pending == Some(entry.call_id())),
            })
            .collect()
    }
}

fn card_for(entry: &Entry, is_pending: bool) -> ToolCard {
    let tool = entry.invocation.tool_id.to_string();
    let call = match &entry.call {
        Ok(call) => call,
        Err(error) => {
            return ToolCard::Invalid {
                tool,
                error: failure_message(entry).unwrap_or_else(|| error.clone()),
            }
        }
    };

    match call {
        FrontendToolCall::AskUserConfirmation(args) => ToolCard::Confirmation {
            question: args.question_text.clone(),
            prompt: if is_pending { entry.prompt.clone() } else { None },
            answer: entry.outcome.clone().or_else(|| entry.invocation.result.clone()),
        },
        FrontendToolCall::DisplayProductCard(args) => ToolCard::ProductCard {
            product: args.clone(),
            displayed: entry.displayed_product.is_some(),
            outcome: entry.outcome.clone(),
        },
        FrontendToolCall::DisplayToolInfo(args) => ToolCard::ToolInfo(args.clone()),
        FrontendToolCall::ChangeBackgroundColor(args) => ToolCard::BackgroundColor {
            requested: args.color_hex_code.clone(),
            outcome: entry.outcome.clone(),
        },
        FrontendToolCall::Unknown { name, arguments } => ToolCard::Unknown {
            name: name.clone(),
            arguments: arguments.clone(),
        },
    }
}

/// The `error` of a locally produced failure result.
fn failure_message(entry: &Entry) -> Option<String> {
    entry
        .outcome
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
