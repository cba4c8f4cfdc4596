//! Verification session orchestrator.
//!
//! Drives the fixed four-step flow:
//!
//! | From       | Trigger     | Guard                          | To         |
//! |------------|-------------|--------------------------------|------------|
//! | Email      | submit      | email has `local@domain.tld`   | IdDocument |
//! | IdDocument | continue    | ID image accepted by precheck  | Selfie     |
//! | IdDocument | back        | -                              | Email      |
//! | Selfie     | verify      | selfie set, nothing in flight  | Result     |
//! | Selfie     | back        | -                              | IdDocument |
//! | Result     | start over  | -                              | Email      |
//!
//! Inputs are never cleared by moving between steps; only "start over" resets
//! them. The API key cache outlives "start over" so a second attempt in the same
//! session reuses it.

use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{ClientError, ClientResult, WizardError, WizardResult};
use crate::precheck;
use crate::remote::VerificationApi;
use crate::types::{
    AccessCredential, ImageFile, ImageValidationResult, VerificationInput, VerificationOutcome,
    WizardStep,
};
use crate::wizard::credential::CredentialCache;
use crate::wizard::state::{Retained, WizardState, WizardView};
use crate::wizard::EmailAddress;

/// Shown when no API key could be obtained.
const CREDENTIAL_FAILURE: &str = "Failed to generate API key. Please try again.";

/// Shown when the service refused our API key.
const CREDENTIAL_REJECTED: &str = "Your verification session expired. Please try again.";

/// Shown for network-level failures.
const TRANSPORT_FAILURE: &str =
    "Could not reach the verification service. Please check your connection and try again.";

type Refusal = (WizardState, WizardError);

fn refuse(state: WizardState, action: &'static str) -> Refusal {
    let step = state.step();
    (state, WizardError::InvalidTransition { step, action })
}

/// Stateful controller for one user's verification flow.
pub struct VerificationSession<A> {
    api: A,
    state: WizardState,
    credentials: CredentialCache,
    session_id: Uuid,
    attempts: u32,
    view_tx: watch::Sender<WizardView>,
}

impl<A: VerificationApi> VerificationSession<A> {
    /// Create a session starting at the email step.
    pub fn new(api: A, settings: &Settings) -> Self {
        Self::with_expiry_margin(api, settings.credential_expiry_margin())
    }

    /// Create a session with an explicit API key expiry margin.
    pub fn with_expiry_margin(api: A, expiry_margin: chrono::Duration) -> Self {
        let state = WizardState::default();
        let (view_tx, _) = watch::channel(WizardView::of(&state, false));
        let session_id = Uuid::new_v4();
        tracing::debug!(session_id = %session_id, "Verification session created");

        Self {
            api,
            state,
            credentials: CredentialCache::new(expiry_margin),
            session_id,
            attempts: 0,
            view_tx,
        }
    }

    // =========================================================================
    // Read model
    // =========================================================================

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        self.state.email()
    }

    pub fn id_image(&self) -> Option<&ImageFile> {
        self.state.id_image()
    }

    pub fn selfie(&self) -> Option<&ImageFile> {
        self.state.selfie()
    }

    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        self.state.outcome()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    pub fn has_credential(&self) -> bool {
        self.credentials.is_cached()
    }

    /// Snapshot of everything a UI needs to render the current step.
    pub fn view(&self) -> WizardView {
        WizardView::of(&self.state, self.credentials.is_cached())
    }

    /// Receive a fresh [`WizardView`] after every change, including the moment a
    /// submission starts.
    pub fn subscribe(&self) -> watch::Receiver<WizardView> {
        self.view_tx.subscribe()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Email step: validate the address and advance to the ID document step.
    pub fn submit_email(&mut self, input: &str) -> WizardResult<()> {
        self.transition("submit an email", |state| match state {
            WizardState::Email(retained) => match EmailAddress::parse(input) {
                Ok(email) => Ok((
                    WizardState::IdDocument {
                        email,
                        id_image: retained.id_image,
                        selfie: retained.selfie,
                    },
                    (),
                )),
                Err(errors) => Err((
                    WizardState::Email(retained),
                    WizardError::InvalidEmail { errors },
                )),
            },
            other => Err(refuse(other, "submit an email")),
        })
    }

    /// ID document step: run the precheck and keep the image if it passes.
    ///
    /// A rejected image leaves any previously accepted one in place.
    pub fn select_id_image(&mut self, image: ImageFile) -> WizardResult<ImageValidationResult> {
        let step = self.state.step();
        let WizardState::IdDocument { id_image, .. } = &mut self.state else {
            return Err(WizardError::InvalidTransition {
                step,
                action: "select an ID image",
            });
        };

        let result = precheck::validate(&image);
        if !result.is_valid {
            tracing::info!(
                session_id = %self.session_id,
                errors = ?result.errors,
                "ID image rejected by precheck"
            );
            return Err(WizardError::InvalidImage(result));
        }

        *id_image = Some(image);
        tracing::info!(session_id = %self.session_id, quality = ?result.quality, "ID image accepted");
        self.publish();
        Ok(result)
    }

    /// ID document step: advance to the selfie step.
    pub fn continue_to_selfie(&mut self) -> WizardResult<()> {
        self.transition("continue", |state| match state {
            WizardState::IdDocument {
                email,
                id_image: Some(id_image),
                selfie,
            } => Ok((
                WizardState::Selfie {
                    email,
                    id_image,
                    selfie,
                },
                (),
            )),
            state @ WizardState::IdDocument { id_image: None, .. } => {
                Err((state, WizardError::MissingInput("ID document image")))
            }
            other => Err(refuse(other, "continue")),
        })
    }

    /// Selfie step: store a captured or uploaded selfie, replacing any earlier one.
    pub fn set_selfie(&mut self, image: ImageFile) -> WizardResult<()> {
        let step = self.state.step();
        let WizardState::Selfie { selfie, .. } = &mut self.state else {
            return Err(WizardError::InvalidTransition {
                step,
                action: "set a selfie",
            });
        };

        let retake = selfie.replace(image).is_some();
        tracing::info!(session_id = %self.session_id, retake, "Selfie stored");
        self.publish();
        Ok(())
    }

    /// Go back one step from the ID document or selfie step.
    pub fn go_back(&mut self) -> WizardResult<()> {
        self.transition("go back", |state| match state {
            WizardState::IdDocument {
                email,
                id_image,
                selfie,
            } => Ok((
                WizardState::Email(Retained {
                    email: Some(email),
                    id_image,
                    selfie,
                }),
                (),
            )),
            WizardState::Selfie {
                email,
                id_image,
                selfie,
            } => Ok((
                WizardState::IdDocument {
                    email,
                    id_image: Some(id_image),
                    selfie,
                },
                (),
            )),
            other => Err(refuse(other, "go back")),
        })
    }

    /// Result step: clear all inputs and the outcome and return to the email step.
    ///
    /// The cached API key is kept.
    pub fn start_over(&mut self) -> WizardResult<()> {
        self.transition("start over", |state| match state {
            WizardState::Result { .. } => Ok((WizardState::default(), ())),
            other => Err(refuse(other, "start over")),
        })
    }

    /// Selfie step: move to the result step and submit the collected input.
    ///
    /// Boundary failures do not surface as `Err`; they become the stored
    /// [`VerificationOutcome`]. `Err` means the transition itself was refused and
    /// nothing was sent.
    pub async fn verify(&mut self) -> WizardResult<VerificationOutcome> {
        let input = self.transition("verify", |state| match state {
            WizardState::Selfie {
                email,
                id_image,
                selfie: Some(selfie),
            } => {
                let input = VerificationInput {
                    email,
                    id_image,
                    selfie,
                };
                Ok((
                    WizardState::Result {
                        input: input.clone(),
                        outcome: None,
                    },
                    input,
                ))
            }
            state @ WizardState::Selfie { selfie: None, .. } => {
                Err((state, WizardError::MissingInput("selfie")))
            }
            state @ WizardState::Result { outcome: None, .. } => {
                Err((state, WizardError::SubmissionInProgress))
            }
            other => Err(refuse(other, "verify")),
        })?;

        self.attempts += 1;
        let outcome = self.run_submission(&input).await;
        tracing::info!(
            session_id = %self.session_id,
            attempt = self.attempts,
            outcome = outcome.kind(),
            "Verification finished"
        );

        if let WizardState::Result { outcome: slot, .. } = &mut self.state {
            *slot = Some(outcome.clone());
        }
        self.publish();
        Ok(outcome)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn run_submission(&mut self, input: &VerificationInput) -> VerificationOutcome {
        let credential = match self.credential().await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    code = e.error_code(),
                    "Could not obtain API key"
                );
                return VerificationOutcome::TransportError {
                    message: CREDENTIAL_FAILURE.to_string(),
                };
            }
        };

        match self.api.submit(input, &credential).await {
            Ok(outcome) => outcome,
            Err(ClientError::CredentialRejected(detail)) => {
                self.credentials.invalidate();
                self.publish();
                tracing::warn!(
                    session_id = %self.session_id,
                    detail = %detail,
                    "API key rejected, cached key discarded"
                );
                VerificationOutcome::TransportError {
                    message: CREDENTIAL_REJECTED.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    code = e.error_code(),
                    "Verification request failed"
                );
                VerificationOutcome::TransportError {
                    message: TRANSPORT_FAILURE.to_string(),
                }
            }
        }
    }

    /// Reuse the cached API key unless it is missing or expired.
    async fn credential(&mut self) -> ClientResult<AccessCredential> {
        if let Some(credential) = self.credentials.usable_at(Utc::now()) {
            return Ok(credential.clone());
        }

        let credential = self.api.acquire_credential().await?;
        self.credentials.store(credential.clone());
        self.publish();
        Ok(credential)
    }

    fn transition<T>(
        &mut self,
        action: &'static str,
        apply: impl FnOnce(WizardState) -> Result<(WizardState, T), Refusal>,
    ) -> WizardResult<T> {
        let from = self.state.step();
        match apply(std::mem::take(&mut self.state)) {
            Ok((next, value)) => {
                self.state = next;
                tracing::info!(
                    session_id = %self.session_id,
                    from = %from,
                    to = %self.state.step(),
                    action,
                    "Wizard transition"
                );
                self.publish();
                Ok(value)
            }
            Err((state, err)) => {
                self.state = state;
                tracing::debug!(
                    session_id = %self.session_id,
                    step = %from,
                    action,
                    error = %err,
                    "Wizard transition refused"
                );
                Err(err)
            }
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}
