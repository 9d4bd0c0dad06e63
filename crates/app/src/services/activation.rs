//! Preview-gated activation — destructive rules must show their blast radius
//! before they can be enabled.
//!
//! Enabling a rule whose action deletes torrents or changes their category is
//! never committed directly. The workflow first runs a trial evaluation
//! against live data and parks the candidate payload in a *session*; the
//! operator sees how many (and which) torrents would be affected, may page
//! through further examples, and only an explicit confirmation commits the
//! mutation. Cancelling discards the session without any backend call and
//! reports which enabled value the caller should restore on optimistic UI
//! state.
//!
//! Session lifecycle: `PreviewLoading` → `PreviewReady` → `Committing`, with
//! teardown on commit success, cancellation, or preview-fetch failure. At
//! most one session exists per persisted rule; closing a session invalidates
//! its id, so stale pagination calls land on
//! [`FlotillaError::UnknownSession`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use flotilla_domain::error::FlotillaError;
use flotilla_domain::id::{InstanceId, RuleId, SessionId};
use flotilla_domain::preview::PreviewResult;
use flotilla_domain::rule::{AutomationRule, RulePayload};

use super::rule_service::{as_commit, as_preview_fetch};
use crate::ports::RuleBackend;

/// What a submission is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationTarget {
    /// Create a new rule.
    Create,
    /// Update an existing rule that currently has `prior_enabled`.
    Update {
        rule_id: RuleId,
        prior_enabled: bool,
    },
}

#[derive(Debug, Clone)]
enum SessionState {
    PreviewLoading,
    PreviewReady(PreviewResult),
    Committing(PreviewResult),
}

#[derive(Debug, Clone)]
struct ActivationSession {
    instance: InstanceId,
    target: ActivationTarget,
    payload: RulePayload,
    state: SessionState,
}

/// Outcome of submitting a candidate rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// Saved immediately; no preview was required.
    Committed(AutomationRule),
    /// A preview is awaiting operator confirmation.
    PreviewPending {
        session_id: SessionId,
        preview: PreviewResult,
    },
}

/// A confirmed activation, with the instance the rule belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedActivation {
    pub instance: InstanceId,
    pub rule: AutomationRule,
}

/// Rollback information returned when a pending activation is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledActivation {
    pub instance: InstanceId,
    /// The rule the session was about, absent for creates.
    pub rule_id: Option<RuleId>,
    /// Enabled value to restore on any optimistically flipped toggle.
    pub restored_enabled: Option<bool>,
}

/// State machine orchestrating preview → confirm → commit for destructive
/// rule activations, and the direct commit path for everything else.
pub struct ActivationWorkflow<B> {
    backend: B,
    page_size: u32,
    sessions: Mutex<HashMap<SessionId, ActivationSession>>,
}

impl<B: RuleBackend> ActivationWorkflow<B> {
    /// Create a workflow with the given preview page size.
    pub fn new(backend: B, page_size: u32) -> Self {
        Self {
            backend,
            page_size,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, ActivationSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preview page size used for the initial fetch and for pagination.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Whether a session is pending for the given rule.
    #[must_use]
    pub fn pending_for(&self, rule_id: RuleId) -> bool {
        self.lock().values().any(|session| {
            matches!(session.target, ActivationTarget::Update { rule_id: id, .. } if id == rule_id)
        })
    }

    /// Submit a candidate rule for create or update.
    ///
    /// A preview is required iff the payload's action is destructive and the
    /// submission turns `enabled` on where it was not on before. Everything
    /// else commits straight through.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::Validation`] before any port call,
    /// [`FlotillaError::ActivationInFlight`] when the rule already has a
    /// pending session, [`FlotillaError::PreviewFetch`] when the trial
    /// evaluation fails (retryable), or [`FlotillaError::Commit`] on the
    /// direct path.
    #[tracing::instrument(skip(self, payload), fields(rule_name = %payload.name))]
    pub async fn submit(
        &self,
        instance: InstanceId,
        target: ActivationTarget,
        payload: RulePayload,
    ) -> Result<ActivationOutcome, FlotillaError> {
        payload.validate()?;
        if !needs_preview(target, &payload) {
            let rule = self.commit_target(instance, target, payload).await?;
            return Ok(ActivationOutcome::Committed(rule));
        }
        self.begin_preview(instance, target, payload).await
    }

    /// Toggle a rule's enabled flag.
    ///
    /// Disabling, and enabling non-destructive rules, commit immediately.
    /// Enabling a destructive rule opens a preview session.
    ///
    /// # Errors
    ///
    /// Same as [`ActivationWorkflow::submit`].
    pub async fn toggle(
        &self,
        instance: InstanceId,
        rule: &AutomationRule,
        enable: bool,
    ) -> Result<ActivationOutcome, FlotillaError> {
        let mut payload = rule.to_payload();
        payload.enabled = enable;
        let target = ActivationTarget::Update {
            rule_id: rule.id,
            prior_enabled: rule.enabled,
        };
        self.submit(instance, target, payload).await
    }

    async fn begin_preview(
        &self,
        instance: InstanceId,
        target: ActivationTarget,
        payload: RulePayload,
    ) -> Result<ActivationOutcome, FlotillaError> {
        let session_id = SessionId::new();
        {
            let mut sessions = self.lock();
            if let ActivationTarget::Update { rule_id, .. } = target {
                let already_pending = sessions.values().any(|session| {
                    matches!(
                        session.target,
                        ActivationTarget::Update { rule_id: id, .. } if id == rule_id
                    )
                });
                if already_pending {
                    return Err(FlotillaError::ActivationInFlight);
                }
            }
            sessions.insert(
                session_id,
                ActivationSession {
                    instance,
                    target,
                    payload: payload.clone(),
                    state: SessionState::PreviewLoading,
                },
            );
        }

        let fetched = self
            .backend
            .preview_rule(instance, payload, self.page_size, 0)
            .await;
        match fetched {
            Ok(preview) => {
                let mut sessions = self.lock();
                let Some(session) = sessions.get_mut(&session_id) else {
                    // cancelled while the fetch was in flight
                    return Err(FlotillaError::UnknownSession);
                };
                session.state = SessionState::PreviewReady(preview.clone());
                Ok(ActivationOutcome::PreviewPending {
                    session_id,
                    preview,
                })
            }
            Err(err) => {
                self.lock().remove(&session_id);
                Err(as_preview_fetch(err))
            }
        }
    }

    /// Fetch the next preview page for a pending session and fold it in.
    ///
    /// The offset is the number of examples fetched so far; newly fetched
    /// rows are appended with deduplication by hash and the total count is
    /// overwritten with the freshest value.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::UnknownSession`] for closed sessions,
    /// [`FlotillaError::ActivationInFlight`] while the session is loading or
    /// committing, or [`FlotillaError::PreviewFetch`] on fetch failure.
    pub async fn load_more(&self, session_id: SessionId) -> Result<PreviewResult, FlotillaError> {
        let (instance, payload, offset) = {
            let sessions = self.lock();
            let session = sessions
                .get(&session_id)
                .ok_or(FlotillaError::UnknownSession)?;
            let SessionState::PreviewReady(preview) = &session.state else {
                return Err(FlotillaError::ActivationInFlight);
            };
            (
                session.instance,
                session.payload.clone(),
                preview.examples.len() as u64,
            )
        };

        let page = self
            .backend
            .preview_rule(instance, payload, self.page_size, offset)
            .await
            .map_err(as_preview_fetch)?;

        let mut sessions = self.lock();
        let session = sessions
            .get_mut(&session_id)
            .ok_or(FlotillaError::UnknownSession)?;
        match &mut session.state {
            SessionState::PreviewReady(preview) => {
                preview.absorb(page);
                Ok(preview.clone())
            }
            // closed or confirmed while the fetch was in flight: drop the page
            SessionState::PreviewLoading | SessionState::Committing(_) => {
                Err(FlotillaError::UnknownSession)
            }
        }
    }

    /// Commit a confirmed activation: run the real mutation with the same
    /// payload (preview parameters are not part of it), then clear the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::UnknownSession`] for closed sessions,
    /// [`FlotillaError::ActivationInFlight`] when a commit is already
    /// running, or [`FlotillaError::Commit`] when the mutation fails — the
    /// session then returns to its previewed state so the operator may retry
    /// or cancel.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(
        &self,
        session_id: SessionId,
    ) -> Result<CommittedActivation, FlotillaError> {
        let (instance, target, payload) = {
            let mut sessions = self.lock();
            let session = sessions
                .get_mut(&session_id)
                .ok_or(FlotillaError::UnknownSession)?;
            let state = std::mem::replace(&mut session.state, SessionState::PreviewLoading);
            match state {
                SessionState::PreviewReady(preview) => {
                    session.state = SessionState::Committing(preview);
                }
                other => {
                    session.state = other;
                    return Err(FlotillaError::ActivationInFlight);
                }
            }
            (session.instance, session.target, session.payload.clone())
        };

        match self.commit_target(instance, target, payload).await {
            Ok(rule) => {
                self.lock().remove(&session_id);
                Ok(CommittedActivation { instance, rule })
            }
            Err(err) => {
                let mut sessions = self.lock();
                if let Some(session) = sessions.get_mut(&session_id) {
                    let state = std::mem::replace(&mut session.state, SessionState::PreviewLoading);
                    session.state = match state {
                        SessionState::Committing(preview) => SessionState::PreviewReady(preview),
                        other => other,
                    };
                }
                Err(err)
            }
        }
    }

    /// Dismiss a pending activation without committing anything.
    ///
    /// Never calls the backend. Returns the enabled value the caller should
    /// restore on any optimistically flipped toggle; the session id becomes
    /// invalid, so late pagination calls from a closed dialog are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`FlotillaError::UnknownSession`] when the session is unknown
    /// or already closed.
    pub fn cancel(&self, session_id: SessionId) -> Result<CancelledActivation, FlotillaError> {
        let session = self
            .lock()
            .remove(&session_id)
            .ok_or(FlotillaError::UnknownSession)?;
        Ok(match session.target {
            ActivationTarget::Create => CancelledActivation {
                instance: session.instance,
                rule_id: None,
                restored_enabled: None,
            },
            ActivationTarget::Update {
                rule_id,
                prior_enabled,
            } => CancelledActivation {
                instance: session.instance,
                rule_id: Some(rule_id),
                restored_enabled: Some(prior_enabled),
            },
        })
    }

    async fn commit_target(
        &self,
        instance: InstanceId,
        target: ActivationTarget,
        payload: RulePayload,
    ) -> Result<AutomationRule, FlotillaError> {
        let result = match target {
            ActivationTarget::Create => self.backend.create_rule(instance, payload).await,
            ActivationTarget::Update { rule_id, .. } => {
                self.backend.update_rule(instance, rule_id, payload).await
            }
        };
        result.map_err(as_commit)
    }
}

/// A preview is required iff the action is destructive and the submission
/// turns `enabled` on where it was not on before.
fn needs_preview(target: ActivationTarget, payload: &RulePayload) -> bool {
    if !payload.enabled || !payload.is_destructive() {
        return false;
    }
    match target {
        ActivationTarget::Create => true,
        ActivationTarget::Update { prior_enabled, .. } => !prior_enabled,
    }
}
