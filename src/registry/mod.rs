//! Named, pluggable utilities that run against a reconstruction context.
//!
//! Utilities are registered under a stable string key at startup. There is
//! no global registry; the host owns a [`Registry`] and passes the context
//! explicitly.

mod cancel;
mod sweep;
mod utility;

pub use cancel::CancellationToken;
pub use sweep::{SweepFrame, TimeSweep};
pub use utility::{Registry, Utility, UtilityError, UtilityOutcome, UtilityParams};
