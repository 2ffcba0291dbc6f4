use crate::client::backend::SchedulerBackend;
use crate::models::{
    CalendarEvent, ConfirmationState, CreatedEvent, OAuthCredentials, Phase, ProposalResult, Role,
};

pub const IN_PROGRESS_NOTICE: &str = "Request already in progress. Please wait.";
pub const EMPTY_REQUEST_NOTICE: &str = "Please enter the meeting request.";
pub const NO_RETRY_NOTICE: &str = "No previous request to retry.";
pub const DEMO_HINT: &str = "Demo mode uses the server's shared calendar. For production, configure OAuth credentials and enable the Calendar API.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOrigin {
    Request,
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Submitted(String),
    ProposalArrived {
        result: ProposalResult,
        origin: ProposalOrigin,
    },
    ProposalFailed {
        message: String,
        origin: ProposalOrigin,
    },
    SlotSelected(usize),
    ConfirmSucceeded(CreatedEvent),
    ConfirmFailed(String),
    RetryRequested,
    Cleared,
}

/// Network work a transition asks for; the driver runs it and reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Propose { text: String, origin: ProposalOrigin },
    Confirm(CalendarEvent),
}

/// Applies one event. Performs no I/O.
pub fn transition(
    mut state: ConfirmationState,
    event: Event,
    demo_mode: bool,
) -> (ConfirmationState, Option<Effect>) {
    match event {
        Event::Submitted(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                state.push(Role::Assistant, EMPTY_REQUEST_NOTICE);
                return (state, None);
            }
            state.last_request_text = Some(text.clone());
            state.pending_proposal = None;
            state.confirmed = false;
            state.push(Role::User, text.clone());
            (
                state,
                Some(Effect::Propose {
                    text,
                    origin: ProposalOrigin::Request,
                }),
            )
        }

        Event::ProposalArrived { result, origin } if result.slots.is_empty() => transition(
            state,
            Event::ProposalFailed {
                message: "No time slots were proposed.".to_string(),
                origin,
            },
            demo_mode,
        ),

        Event::ProposalArrived { result, origin } => {
            let reply = match origin {
                ProposalOrigin::Request => format!(
                    "Here are {} options for '{}':",
                    result.slots.len(),
                    result.summary
                ),
                ProposalOrigin::Retry => {
                    format!("Retry result: Found {} slots.", result.slots.len())
                }
            };
            state.pending_proposal = Some(result);
            state.confirmed = false;
            state.push(Role::Assistant, reply);
            (state, None)
        }

        Event::ProposalFailed { message, origin } => {
            let reply = match origin {
                ProposalOrigin::Request => format!("❌ {message}"),
                ProposalOrigin::Retry => format!("Retry failed: {message}"),
            };
            state.push(Role::Assistant, reply);
            (state, None)
        }

        Event::SlotSelected(index) => {
            if state.lock_held {
                state.push(Role::Assistant, IN_PROGRESS_NOTICE);
                return (state, None);
            }

            let selected = state.pending_proposal.as_ref().and_then(|p| {
                p.slots.get(index).map(|slot| CalendarEvent {
                    summary: p.summary.clone(),
                    start: slot.start,
                    end: slot.end,
                    timezone: None,
                })
            });

            match selected {
                Some(event) => {
                    state.lock_held = true;
                    state.push(Role::Assistant, "Creating event on server...");
                    (state, Some(Effect::Confirm(event)))
                }
                None => {
                    let notice = if state.pending_proposal.is_some() {
                        format!("There is no option {}.", index + 1)
                    } else {
                        "There are no options to confirm yet.".to_string()
                    };
                    state.push(Role::Assistant, notice);
                    (state, None)
                }
            }
        }

        Event::ConfirmSucceeded(created) => {
            tracing::info!(event_id = %created.id, "meeting confirmed");
            state.lock_held = false;
            state.confirmed = true;
            state.push(Role::Assistant, "✅ Event created!");
            (state, None)
        }

        Event::ConfirmFailed(reason) => {
            state.lock_held = false;
            state.push(
                Role::Assistant,
                format!("❌ Failed to create event: {reason}"),
            );
            if demo_mode {
                state.push(Role::Assistant, DEMO_HINT);
            }
            (state, None)
        }

        Event::RetryRequested => match state.last_request_text.clone() {
            Some(text) => {
                state.retry_count += 1;
                state.push(Role::User, text.clone());
                (
                    state,
                    Some(Effect::Propose {
                        text,
                        origin: ProposalOrigin::Retry,
                    }),
                )
            }
            None => {
                state.push(Role::Assistant, NO_RETRY_NOTICE);
                (state, None)
            }
        },

        Event::Cleared => {
            state.messages.clear();
            state.pending_proposal = None;
            state.confirmed = false;
            (state, None)
        }
    }
}

/// Drives one user session against a backend.
pub struct Coordinator<B> {
    state: ConfirmationState,
    backend: B,
    token: Option<OAuthCredentials>,
    demo_mode: bool,
}

impl<B: SchedulerBackend> Coordinator<B> {
    pub fn new(backend: B, demo_mode: bool) -> Self {
        Self {
            state: ConfirmationState::default(),
            backend,
            token: None,
            demo_mode,
        }
    }

    /// Resumes a session previously taken out with [`Coordinator::into_state`].
    pub fn with_state(mut self, state: ConfirmationState) -> Self {
        self.state = state;
        self
    }

    pub fn into_state(self) -> ConfirmationState {
        self.state
    }

    pub fn with_token(mut self, token: OAuthCredentials) -> Self {
        self.token = Some(token);
        self
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn submit(&mut self, text: &str) {
        self.dispatch(Event::Submitted(text.to_string())).await;
    }

    pub async fn select(&mut self, index: usize) {
        self.dispatch(Event::SlotSelected(index)).await;
    }

    pub async fn retry(&mut self) {
        self.dispatch(Event::RetryRequested).await;
    }

    pub async fn clear(&mut self) {
        self.dispatch(Event::Cleared).await;
    }

    /// Applies `event`, then runs whatever effect it produced and applies the outcome.
    pub async fn dispatch(&mut self, event: Event) {
        let mut next = Some(event);

        while let Some(event) = next.take() {
            let state = std::mem::take(&mut self.state);
            let (state, effect) = transition(state, event, self.demo_mode);
            self.state = state;

            tracing::debug!(phase = self.state.phase().as_str(), "coordinator transition");

            next = match effect {
                Some(effect) => Some(self.run(effect).await),
                None => None,
            };
        }
    }

    async fn run(&self, effect: Effect) -> Event {
        match effect {
            Effect::Propose { text, origin } => match self.backend.propose(&text).await {
                Ok(result) => Event::ProposalArrived { result, origin },
                Err(e) => Event::ProposalFailed {
                    message: e.to_string(),
                    origin,
                },
            },
            Effect::Confirm(event) => {
                match self.backend.confirm(&event, self.token.as_ref()).await {
                    Ok(created) => Event::ConfirmSucceeded(created),
                    Err(e) => Event::ConfirmFailed(e.to_string()),
                }
            }
        }
    }
}
