//! Wizard state machine and its presentation-facing read model.

use serde::Serialize;

use crate::types::{ImageFile, VerificationInput, VerificationOutcome, WizardStep};
use crate::wizard::EmailAddress;

/// Inputs carried back to the email step so going back never loses them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Retained {
    pub email: Option<EmailAddress>,
    pub id_image: Option<ImageFile>,
    pub selfie: Option<ImageFile>,
}

/// One variant per step, each holding only what can exist at that step.
#[derive(Debug, Clone)]
pub(crate) enum WizardState {
    Email(Retained),
    IdDocument {
        email: EmailAddress,
        id_image: Option<ImageFile>,
        selfie: Option<ImageFile>,
    },
    Selfie {
        email: EmailAddress,
        id_image: ImageFile,
        selfie: Option<ImageFile>,
    },
    /// `outcome` is `None` while the submission is in flight.
    Result {
        input: VerificationInput,
        outcome: Option<VerificationOutcome>,
    },
}

impl Default for WizardState {
    fn default() -> Self {
        Self::Email(Retained::default())
    }
}

impl WizardState {
    pub fn step(&self) -> WizardStep {
        match self {
            Self::Email(_) => WizardStep::Email,
            Self::IdDocument { .. } => WizardStep::IdDocument,
            Self::Selfie { .. } => WizardStep::Selfie,
            Self::Result { .. } => WizardStep::Result,
        }
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        match self {
            Self::Email(retained) => retained.email.as_ref(),
            Self::IdDocument { email, .. } | Self::Selfie { email, .. } => Some(email),
            Self::Result { input, .. } => Some(&input.email),
        }
    }

    pub fn id_image(&self) -> Option<&ImageFile> {
        match self {
            Self::Email(retained) => retained.id_image.as_ref(),
            Self::IdDocument { id_image, .. } => id_image.as_ref(),
            Self::Selfie { id_image, .. } => Some(id_image),
            Self::Result { input, .. } => Some(&input.id_image),
        }
    }

    pub fn selfie(&self) -> Option<&ImageFile> {
        match self {
            Self::Email(retained) => retained.selfie.as_ref(),
            Self::IdDocument { selfie, .. } | Self::Selfie { selfie, .. } => selfie.as_ref(),
            Self::Result { input, .. } => Some(&input.selfie),
        }
    }

    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        match self {
            Self::Result { outcome, .. } => outcome.as_ref(),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Result { outcome: None, .. })
    }
}

/// Progress entry for one step, as shown in a step indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub step: WizardStep,
    pub number: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub completed: bool,
    pub current: bool,
}

/// Everything a UI needs to render the wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub step: WizardStep,
    pub progress: Vec<StepProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub has_id_image: bool,
    pub has_selfie: bool,
    pub submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VerificationOutcome>,
    pub has_credential: bool,
}

impl WizardView {
    pub(crate) fn of(state: &WizardState, has_credential: bool) -> Self {
        let current = state.step();
        let outcome = state.outcome().cloned();
        let progress = WizardStep::ALL
            .iter()
            .map(|&step| StepProgress {
                step,
                number: step.number(),
                title: step.title(),
                description: step.description(),
                // The last step only completes once an outcome exists.
                completed: if step == WizardStep::Result {
                    outcome.is_some()
                } else {
                    current > step
                },
                current: current == step,
            })
            .collect();

        Self {
            step: current,
            progress,
            email: state.email().map(|email| email.as_str().to_string()),
            has_id_image: state.id_image().is_some(),
            has_selfie: state.selfie().is_some(),
            submitting: state.is_submitting(),
            outcome,
            has_credential,
        }
    }
}
