//! State machine that executes side effects around the pure transition
//! table.

use super::presentation;
use crate::actions::{ActionContext, ActionProcessing, ActionProcessor, ProcessingTrigger};
use crate::builder::StateMachineBuilder;
use crate::config::MachineConfig;
use crate::core::{
    transition, Action, DismissContinuation, DismissSignal, Error, MachineResult, SideEffect,
    State, StateHistory, StateTransition,
};
use crate::experience::{Experience, RenderContext};
use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::{debug, trace, warn};

/// Where a chain of continuations stopped.
enum Progress {
    Settled(MachineResult),
    /// Waiting on the UI to resume `pending` before submitting `then`
    Suspended {
        pending: Option<DismissContinuation>,
        signal: DismissSignal,
        then: Action,
    },
}

/// Presentation state machine for one render context.
///
/// Submissions are serialized: [`handle_action`](Self::handle_action) holds
/// the machine for the depth-first chain of continuations the action
/// triggers. The one exception is a wait on a dismiss continuation, which
/// releases the machine so other submissions (a forced teardown in
/// particular) can apply to the waiting `EndingStep`. States are published
/// before side effects run, so a UI binding watching [`states`](Self::states)
/// can see an `EndingStep` and resume it while the submission is suspended.
pub struct StateMachine {
    render_context: RenderContext,
    config: MachineConfig,
    processor: Arc<dyn ActionProcessing>,
    current: AsyncMutex<State>,
    history: Mutex<StateHistory>,
    states: watch::Sender<State>,
    results: broadcast::Sender<MachineResult>,
}

impl StateMachine {
    /// Create an idle machine with the default config and action processor.
    pub fn new(render_context: RenderContext) -> Self {
        Self::from_parts(
            render_context,
            MachineConfig::default(),
            Arc::new(ActionProcessor::new()),
        )
    }

    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::new()
    }

    /// `config` must already be validated.
    pub(crate) fn from_parts(
        render_context: RenderContext,
        config: MachineConfig,
        processor: Arc<dyn ActionProcessing>,
    ) -> Self {
        let (states, _) = watch::channel(State::Idling);
        let (results, _) = broadcast::channel(config.result_channel_capacity);
        let history = StateHistory::with_limit(config.history_limit);

        Self {
            render_context,
            config,
            processor,
            current: AsyncMutex::new(State::Idling),
            history: Mutex::new(history),
            states,
            results,
        }
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.render_context
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Processor used for navigate and completion actions.
    pub fn action_processor(&self) -> &Arc<dyn ActionProcessing> {
        &self.processor
    }

    /// Latest published state.
    pub fn state(&self) -> State {
        self.states.borrow().clone()
    }

    /// Receiver for state changes; starts at the current state.
    pub fn watch_state(&self) -> watch::Receiver<State> {
        self.states.subscribe()
    }

    /// Stream of states, starting with the current one.
    pub fn states(&self) -> WatchStream<State> {
        WatchStream::new(self.states.subscribe())
    }

    /// Receiver for every swapped-in state and every reported error.
    pub fn subscribe_results(&self) -> broadcast::Receiver<MachineResult> {
        self.results.subscribe()
    }

    pub fn results(&self) -> BroadcastStream<MachineResult> {
        BroadcastStream::new(self.results.subscribe())
    }

    /// Snapshot of recent transitions.
    pub fn history(&self) -> StateHistory {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Resume the pending dismiss continuation, if the machine is waiting on
    /// one. Returns `true` when this call released the machine.
    pub fn resume_dismiss(&self) -> bool {
        self.state()
            .dismiss_continuation()
            .is_some_and(|dismiss| dismiss.resume())
    }

    /// Start `experience` from idle.
    pub async fn start(&self, experience: Experience) -> MachineResult {
        self.handle_action(Action::StartExperience(Arc::new(experience)))
            .await
    }

    /// Submit an action and run it, and everything it continues into, to
    /// completion.
    ///
    /// Returns the settled state, or the error reported along the way.
    /// Actions that do not apply to the current state are ignored and return
    /// the current state, except `StartExperience` on a busy machine, which
    /// returns [`Error::ExperienceAlreadyActive`].
    ///
    /// When the chain waits on a dismiss and another submission moves the
    /// machine out of that `EndingStep` first, the pending action is dropped
    /// and the state at that point is returned.
    pub async fn handle_action(&self, action: Action) -> MachineResult {
        let mut current = self.current.lock().await;
        let mut progress = self.process(&mut current, action).await;

        loop {
            let (pending, signal, then) = match progress {
                Progress::Settled(result) => return result,
                Progress::Suspended {
                    pending,
                    signal,
                    then,
                } => (pending, signal, then),
            };

            drop(current);
            self.await_dismiss(signal).await;
            current = self.current.lock().await;

            if current.dismiss_continuation() != pending.as_ref() {
                debug!(
                    context = %self.render_context,
                    state = current.name(),
                    dropped = then.name(),
                    "dismiss superseded"
                );
                return Ok(current.clone());
            }

            progress = self.process(&mut current, then).await;
        }
    }

    fn process<'a>(&'a self, current: &'a mut State, action: Action) -> BoxFuture<'a, Progress> {
        async move {
            let Some(transition) = transition(current, &action) else {
                return Progress::Settled(self.ignore(current, &action));
            };

            if let Some(next) = transition.state {
                self.swap(current, next, &action);
            }

            match transition.effect {
                Some(effect) => self.execute(current, effect).await,
                None => Progress::Settled(Ok(current.clone())),
            }
        }
        .boxed()
    }

    fn ignore(&self, current: &State, action: &Action) -> MachineResult {
        trace!(
            context = %self.render_context,
            state = current.name(),
            action = action.name(),
            "action ignored"
        );

        match action {
            Action::StartExperience(_) => Err(Error::already_active()),
            _ => Ok(current.clone()),
        }
    }

    fn swap(&self, current: &mut State, next: State, action: &Action) {
        let previous = std::mem::replace(current, next);
        // Leaving a waiting step releases its waiter; a later resume from
        // the UI is then a no-op.
        if let Some(dismiss) = previous.dismiss_continuation() {
            dismiss.resume();
        }
        debug!(
            context = %self.render_context,
            from = previous.name(),
            to = current.name(),
            action = action.name(),
            step = ?current.current_step_index(),
            "state transition"
        );

        let record = StateTransition {
            from: previous.snapshot(),
            to: current.snapshot(),
            action: action.name().to_string(),
            timestamp: Utc::now(),
        };
        match self.history.lock() {
            Ok(mut history) => *history = history.record(record),
            Err(poisoned) => {
                let mut history = poisoned.into_inner();
                *history = history.record(record);
            }
        }

        self.states.send_replace(current.clone());
        let _ = self.results.send(Ok(current.clone()));
    }

    async fn execute(&self, current: &mut State, effect: SideEffect) -> Progress {
        match effect {
            SideEffect::Continuation(action) => self.process(current, action).await,

            SideEffect::ReportError(error) => {
                warn!(context = %self.render_context, error = %error, "error reported");
                let _ = self.results.send(Err(error.clone()));
                Progress::Settled(Err(error))
            }

            SideEffect::AwaitDismiss { signal, then } => Progress::Suspended {
                pending: current.dismiss_continuation().cloned(),
                signal,
                then,
            },

            SideEffect::PresentContainer {
                experience,
                flat_step_index,
                metadata,
                pre_step_actions,
            } => {
                let outcome = presentation::present_container(
                    self.processor.as_ref(),
                    self.config.max_metadata_attempts,
                    &experience,
                    flat_step_index,
                    &metadata,
                    pre_step_actions,
                )
                .await;
                self.settle(current, outcome).await
            }

            SideEffect::PrepareStep {
                experience,
                flat_step_index,
                metadata,
            } => {
                let outcome = presentation::prepare_step(
                    self.config.max_metadata_attempts,
                    &experience,
                    flat_step_index,
                    &metadata,
                )
                .await;
                self.settle(current, outcome).await
            }

            SideEffect::ProcessActions {
                experience,
                actions,
            } => {
                // Completion actions may drive this machine again, so they
                // must not run while it is held.
                let processor = Arc::clone(&self.processor);
                let context = ActionContext {
                    experience_id: experience.id,
                    flat_step_index: None,
                    trigger: ProcessingTrigger::Completion,
                };
                tokio::spawn(async move {
                    processor.process(actions, context).await;
                });
                Progress::Settled(Ok(current.clone()))
            }
        }
    }

    /// Feed a presentation outcome back into the machine.
    async fn settle(&self, current: &mut State, outcome: Result<(), Error>) -> Progress {
        match outcome {
            Ok(()) => self.process(current, Action::RenderStep).await,
            Err(error) => {
                self.process(current, Action::ReportError { error, fatal: true })
                    .await
            }
        }
    }

    async fn await_dismiss(&self, signal: DismissSignal) {
        let Some(limit) = self.config.dismiss_timeout() else {
            signal.wait().await;
            return;
        };

        if tokio::time::timeout(limit, signal.wait()).await.is_err() {
            warn!(
                context = %self.render_context,
                timeout = ?limit,
                "dismiss was not resumed in time, continuing"
            );
        }
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("render_context", &self.render_context)
            .field("state", &self.state().name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
