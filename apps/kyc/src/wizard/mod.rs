//! The four-step verification wizard.
//!
//! - `email`: address shape check for the first step
//! - `credential`: API key cache shared by every attempt in a session
//! - `session`: the orchestrator driving steps and the single submission
//!
//! The wizard is UI-agnostic: a front end calls the transition methods on
//! [`VerificationSession`] and renders [`WizardView`] snapshots.

pub mod credential;
pub mod email;
pub mod session;
mod state;

pub use credential::CredentialCache;
pub use email::EmailAddress;
pub use session::VerificationSession;
pub use state::{StepProgress, WizardView};
