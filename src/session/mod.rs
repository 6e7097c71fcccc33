//! Session orchestration.
//!
//! - `SessionController`: round sequencing, submission, final scoring
//! - `SessionEvent`: player input and timer expiry fed to the controller
//! - `timer`: waits out mismatch reveal delays
//! - `PlayerContext`: who is playing

mod context;
mod controller;
mod events;
pub mod timer;

pub use context::{PlayerContext, GUEST_USERNAME};
pub use controller::{
    FinalSummary, RoundAdvance, RoundSummary, SessionController, SessionSnapshot, SessionState,
    SubmitOutcome,
};
pub use events::{EventOutcome, SessionEvent};
