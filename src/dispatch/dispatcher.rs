use crate::catalogue::{names, ToolCatalogue, ToolId};
use crate::dispatch::confirmation::{ConfirmationPrompt, PromptError, Selection};
use crate::dispatch::handler::{
    BackgroundColorHandler, HandlerResult, LocalHandler, ProductCardHandler,
};
use crate::dispatch::view::{Banner, Delivery, Entry, SessionView, ToolTreatment};
use crate::dispatch::{InvocationUpdate, Transition};
use crate::error::{Error, ErrorContext};
use crate::transport::stream::StreamEvent;
use crate::transport::{ImageProbe, ResultSink};
use crate::Result;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for a [`Dispatcher`].
///
/// Catalogue tools without a registration are treated as display tools.
pub struct DispatcherBuilder {
    catalogue: Arc<ToolCatalogue>,
    sink: Arc<dyn ResultSink>,
    treatments: HashMap<ToolId, ToolTreatment>,
    handlers: HashMap<ToolId, Arc<dyn LocalHandler>>,
}

impl DispatcherBuilder {
    pub fn new(catalogue: Arc<ToolCatalogue>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            catalogue,
            sink,
            treatments: HashMap::new(),
            handlers: HashMap::new(),
        }
    }

    /// Resolve `id` through the confirmation prompt.
    pub fn confirmation(mut self, id: &str) -> Self {
        self.handlers.remove(id);
        self.treatments.insert(ToolId::new(id), ToolTreatment::Confirmation);
        self
    }

    /// Resolve `id` by running `handler` locally.
    pub fn local_handler(mut self, id: &str, handler: Arc<dyn LocalHandler>) -> Self {
        self.treatments.insert(ToolId::new(id), ToolTreatment::LocalHandler);
        self.handlers.insert(ToolId::new(id), handler);
        self
    }

    pub fn display(mut self, id: &str) -> Self {
        self.handlers.remove(id);
        self.treatments.insert(ToolId::new(id), ToolTreatment::Display);
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let mut unknown: Vec<&str> = self
            .treatments
            .keys()
            .map(ToolId::as_str)
            .filter(|id| !self.catalogue.contains(id))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(Error::configuration_with_context(
                format!("treatment registered for tools not in the catalogue: {}", unknown.join(", ")),
                ErrorContext::new()
                    .with_field_path(unknown[0])
                    .with_source("dispatcher_builder"),
            ));
        }

        Ok(Dispatcher {
            catalogue: self.catalogue,
            sink: self.sink,
            treatments: self.treatments,
            handlers: self.handlers,
            view: SessionView::new(),
        })
    }
}

enum Work {
    Handler {
        handler: Arc<dyn LocalHandler>,
        arguments: Value,
    },
    Immediate(HandlerResult),
}

/// A result computation handed out by [`Dispatcher::ingest`].
///
/// Jobs own everything they need, so they can run concurrently with new
/// updates being ingested and finish in any order.
pub struct HandlerJob {
    call_id: String,
    tool_id: ToolId,
    work: Work,
}

impl HandlerJob {
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn tool_id(&self) -> &ToolId {
        &self.tool_id
    }

    pub async fn run(self) -> HandlerCompletion {
        let result = match self.work {
            Work::Handler { handler, arguments } => handler.handle(&arguments).await,
            Work::Immediate(result) => result,
        };
        HandlerCompletion {
            call_id: self.call_id,
            result,
        }
    }
}

impl fmt::Debug for HandlerJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.work {
            Work::Handler { .. } => "handler",
            Work::Immediate(_) => "immediate",
        };
        f.debug_struct("HandlerJob")
            .field("call_id", &self.call_id)
            .field("tool_id", &self.tool_id)
            .field("kind", &kind)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerCompletion {
    pub call_id: String,
    pub result: HandlerResult,
}

/// Client-side consumer of the invocation feed for one chat session.
pub struct Dispatcher {
    catalogue: Arc<ToolCatalogue>,
    sink: Arc<dyn ResultSink>,
    treatments: HashMap<ToolId, ToolTreatment>,
    handlers: HashMap<ToolId, Arc<dyn LocalHandler>>,
    view: SessionView,
}

impl Dispatcher {
    pub fn builder(catalogue: Arc<ToolCatalogue>, sink: Arc<dyn ResultSink>) -> DispatcherBuilder {
        DispatcherBuilder::new(catalogue, sink)
    }

    /// Dispatcher over the built-in catalogue with the standard treatments.
    pub fn builtin(sink: Arc<dyn ResultSink>, probe: Arc<dyn ImageProbe>) -> Result<Self> {
        Self::builder(Arc::new(ToolCatalogue::builtin().clone()), sink)
            .confirmation(names::ASK_USER_CONFIRMATION)
            .local_handler(
                names::DISPLAY_PRODUCT_CARD,
                Arc::new(ProductCardHandler::new(probe)),
            )
            .local_handler(
                names::CHANGE_BACKGROUND_COLOR,
                Arc::new(BackgroundColorHandler::new()),
            )
            .display(names::DISPLAY_TOOL_INFO)
            .build()
    }

    pub fn catalogue(&self) -> &ToolCatalogue {
        &self.catalogue
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn banners(&self) -> &[Banner] {
        self.view.banners()
    }

    pub fn background_color(&self) -> Option<&str> {
        self.view.background_color()
    }

    pub fn pending_confirmation(&self) -> Option<&str> {
        self.view.pending_confirmation()
    }

    pub fn treatment_for(&self, id: &str) -> ToolTreatment {
        if !self.catalogue.contains(id) {
            return ToolTreatment::Unknown;
        }
        self.treatments
            .get(id)
            .copied()
            .unwrap_or(ToolTreatment::Display)
    }

    /// Note an assistant turn, even one that carries no tool invocations.
    ///
    /// A newer turn ends the interactivity of confirmations left unanswered
    /// in older turns.
    pub fn observe_turn(&mut self, message_id: &str) {
        if self.view.latest_turn() != Some(message_id) {
            debug!(message_id = %message_id, "assistant turn observed");
        }
        self.view.begin_turn(message_id);
    }

    /// Apply one update of the invocation feed.
    ///
    /// Updates replace the recorded invocation only when they advance its
    /// lifecycle; duplicates and late deliveries are ignored. Returns the
    /// jobs that must run to produce a result (at most one per call id over
    /// the session).
    pub fn ingest(&mut self, update: InvocationUpdate) -> Vec<HandlerJob> {
        let InvocationUpdate {
            message_id,
            invocation,
        } = update;
        let invocation = invocation.normalized();
        let call_id = invocation.call_id.clone();

        match self.view.entry_mut(&call_id) {
            Some(entry) => match entry.state().transition_to(invocation.state) {
                Transition::Advance => {
                    debug!(call_id = %call_id, from = %entry.state(), to = %invocation.state, "invocation advanced");
                    entry.refresh(invocation);
                }
                Transition::Duplicate => {
                    debug!(call_id = %call_id, state = %invocation.state, "duplicate update ignored");
                }
                Transition::Stale => {
                    debug!(call_id = %call_id, recorded = %entry.state(), incoming = %invocation.state, "stale update ignored");
                }
                Transition::Conflict => {
                    warn!(call_id = %call_id, recorded = %entry.state(), incoming = %invocation.state, "conflicting terminal state ignored");
                }
            },
            None => {
                let treatment = self.treatment_for(invocation.tool_id.as_str());
                if treatment == ToolTreatment::Unknown {
                    warn!(call_id = %call_id, tool = %invocation.tool_id, "no treatment for tool, using fallback display");
                }
                self.view.insert(Entry::new(message_id, invocation, treatment));
            }
        }

        self.schedule(&call_id).into_iter().collect()
    }

    fn schedule(&mut self, call_id: &str) -> Option<HandlerJob> {
        let entry = self.view.entry(call_id)?;
        if entry.state().is_terminal() || entry.delivery != Delivery::Idle || entry.outcome.is_some()
        {
            return None;
        }
        let tool_id = entry.invocation.tool_id.clone();

        let work = match entry.treatment {
            ToolTreatment::LocalHandler => {
                let handler = self.handlers.get(&tool_id)?.clone();
                let arguments = entry.invocation.arguments.clone();
                match self.precheck(&tool_id, handler.as_ref(), &arguments) {
                    Ok(()) => Work::Handler { handler, arguments },
                    Err(error) => {
                        debug!(call_id = %call_id, tool = %tool_id, %error, "arguments rejected");
                        Work::Immediate(HandlerResult::failure(error))
                    }
                }
            }
            ToolTreatment::Confirmation => match &entry.call {
                Ok(_) => return None,
                Err(reason) => Work::Immediate(HandlerResult::failure(format!(
                    "Invalid confirmation arguments: {}",
                    reason
                ))),
            },
            ToolTreatment::Display | ToolTreatment::Unknown => return None,
        };

        if let Some(entry) = self.view.entry_mut(call_id) {
            entry.delivery = Delivery::Running;
        }
        Some(HandlerJob {
            call_id: call_id.to_string(),
            tool_id,
            work,
        })
    }

    /// Checks run before a local handler: the handler's own field checks,
    /// then required-field presence from the catalogue.
    fn precheck(
        &self,
        tool_id: &ToolId,
        handler: &dyn LocalHandler,
        arguments: &Value,
    ) -> std::result::Result<(), String> {
        if !arguments.is_object() {
            return Err("Arguments must be a JSON object".to_string());
        }
        handler.validate(arguments)?;

        let missing = self
            .catalogue
            .get(tool_id.as_str())
            .map(|d| d.parameters.missing_required(arguments))
            .unwrap_or_default();
        match missing.as_slice() {
            [] => Ok(()),
            [one] => Err(format!("Missing required field: {}", one)),
            many => Err(format!("Missing required fields: {}", many.join(", "))),
        }
    }

    /// Record a finished job and send its result.
    ///
    /// Returns `None` for a call id this session has never seen. A result
    /// for an invocation the backend already resolved is recorded but not
    /// sent. A result marked unreachable is not sent either: it raises a
    /// retryable banner and [`Dispatcher::retry`] runs the handler again.
    pub async fn complete(&mut self, completion: HandlerCompletion) -> Option<Delivery> {
        let HandlerCompletion { call_id, result } = completion;
        let Some(entry) = self.view.entry_mut(&call_id) else {
            warn!(call_id = %call_id, "completion for unknown call dropped");
            return None;
        };
        if entry.delivery == Delivery::Sent {
            return Some(Delivery::Sent);
        }

        let resolved_remotely = entry.state().is_terminal();
        if let Some(error) = result.unreachable.clone() {
            if resolved_remotely {
                entry.delivery = Delivery::Idle;
                return Some(Delivery::Idle);
            }
            let tool = entry.invocation.tool_id.to_string();
            let delivery = Delivery::Interrupted {
                error: error.clone(),
            };
            entry.delivery = delivery.clone();
            warn!(call_id = %call_id, tool = %tool, %error, "handler dependency unreachable");
            self.view.raise(Banner {
                call_id: call_id.clone(),
                message: format!("{} could not finish: {}", tool, error),
                retryable: true,
            });
            return Some(delivery);
        }

        entry.outcome = Some(result.value.clone());
        if resolved_remotely {
            entry.delivery = Delivery::Idle;
        }
        let succeeded = result.is_success();
        if let (true, Some(effect)) = (succeeded, result.effect) {
            self.view.apply(&call_id, effect);
        }

        if resolved_remotely {
            debug!(call_id = %call_id, "invocation already resolved, result not sent");
            return Some(Delivery::Idle);
        }
        Some(self.deliver(&call_id, result.value).await)
    }

    /// Apply one decoded stream event.
    pub async fn process_event(&mut self, event: StreamEvent) -> Vec<Delivery> {
        match event {
            StreamEvent::TurnStarted { message_id } => {
                self.observe_turn(&message_id);
                Vec::new()
            }
            StreamEvent::Invocation(update) => self.process(update).await,
        }
    }

    /// Ingest an update and run its jobs to completion.
    pub async fn process(&mut self, update: InvocationUpdate) -> Vec<Delivery> {
        let jobs = self.ingest(update);
        let completions = join_all(jobs.into_iter().map(HandlerJob::run)).await;
        let mut deliveries = Vec::new();
        for completion in completions {
            if let Some(delivery) = self.complete(completion).await {
                deliveries.push(delivery);
            }
        }
        deliveries
    }

    async fn deliver(&mut self, call_id: &str, result: Value) -> Delivery {
        let delivery = match self.sink.send_result(call_id, result.clone()).await {
            Ok(()) => {
                info!(call_id = %call_id, "tool result sent");
                self.view.clear_banner(call_id);
                Delivery::Sent
            }
            Err(e) => {
                warn!(call_id = %call_id, error = %e, "sending tool result failed");
                let tool = self
                    .view
                    .entry(call_id)
                    .map(|entry| entry.invocation.tool_id.to_string())
                    .unwrap_or_else(|| call_id.to_string());
                self.view.raise(Banner {
                    call_id: call_id.to_string(),
                    message: format!("Could not send the result of {}: {}", tool, e),
                    retryable: true,
                });
                Delivery::Failed {
                    result,
                    error: e.to_string(),
                }
            }
        };
        if let Some(entry) = self.view.entry_mut(call_id) {
            entry.delivery = delivery.clone();
        }
        delivery
    }

    /// Resend a result whose delivery failed, or rerun a handler that could
    /// not reach its dependency. Already-sent results are not sent again.
    pub async fn retry(&mut self, call_id: &str) -> Result<Delivery> {
        let delivery = self
            .view
            .entry(call_id)
            .map(|entry| entry.delivery.clone())
            .ok_or_else(|| PromptError::UnknownCall {
                call_id: call_id.to_string(),
            })?;
        match delivery {
            Delivery::Failed { result, .. } => Ok(self.deliver(call_id, result).await),
            Delivery::Interrupted { .. } => {
                if let Some(entry) = self.view.entry_mut(call_id) {
                    entry.delivery = Delivery::Idle;
                }
                self.view.clear_banner(call_id);
                let Some(job) = self.schedule(call_id) else {
                    return Ok(Delivery::Idle);
                };
                info!(call_id = %call_id, "rerunning handler");
                let completion = job.run().await;
                Ok(self.complete(completion).await.unwrap_or(Delivery::Idle))
            }
            Delivery::Sent => Ok(Delivery::Sent),
            Delivery::Idle | Delivery::Running => Err(Error::validation_with_context(
                "no failed delivery to retry",
                ErrorContext::new()
                    .with_field_path(call_id)
                    .with_source("dispatcher"),
            )),
        }
    }

    fn active_prompt(&mut self, call_id: &str) -> Result<&mut ConfirmationPrompt> {
        let entry = self
            .view
            .entry(call_id)
            .ok_or_else(|| PromptError::UnknownCall {
                call_id: call_id.to_string(),
            })?;
        if entry.outcome.is_some() || entry.state().is_terminal() {
            return Err(PromptError::AlreadyResolved.into());
        }
        if self.view.pending_confirmation() != Some(call_id) {
            return Err(PromptError::NotActive {
                call_id: call_id.to_string(),
            }
            .into());
        }
        self.view
            .entry_mut(call_id)
            .and_then(|entry| entry.prompt.as_mut())
            .ok_or_else(|| {
                PromptError::NotActive {
                    call_id: call_id.to_string(),
                }
                .into()
            })
    }

    async fn resolve_confirmation(&mut self, call_id: &str, result: Value) -> Delivery {
        if let Some(entry) = self.view.entry_mut(call_id) {
            entry.outcome = Some(result.clone());
            entry.prompt = None;
        }
        self.deliver(call_id, result).await
    }

    /// Choose option `index` of the pending confirmation `call_id`.
    pub async fn select_option(&mut self, call_id: &str, index: usize) -> Result<Selection> {
        let selection = self.active_prompt(call_id)?.select(index)?;
        if let Selection::Resolved(result) = &selection {
            self.resolve_confirmation(call_id, result.clone()).await;
        }
        Ok(selection)
    }

    pub async fn select_label(&mut self, call_id: &str, label: &str) -> Result<Selection> {
        let selection = self.active_prompt(call_id)?.select_label(label)?;
        if let Selection::Resolved(result) = &selection {
            self.resolve_confirmation(call_id, result.clone()).await;
        }
        Ok(selection)
    }

    pub fn update_text(&mut self, call_id: &str, text: &str) -> Result<()> {
        self.active_prompt(call_id)?.update_text(text)?;
        Ok(())
    }

    /// Leave free-text entry of the pending confirmation; the draft is dropped.
    pub fn back_to_options(&mut self, call_id: &str) -> Result<()> {
        self.active_prompt(call_id)?.back_to_options()?;
        Ok(())
    }

    /// Submit the free-text draft of the pending confirmation.
    pub async fn submit_text(&mut self, call_id: &str) -> Result<Value> {
        let result = self.active_prompt(call_id)?.submit_text()?;
        self.resolve_confirmation(call_id, result.clone()).await;
        Ok(result)
    }
}
