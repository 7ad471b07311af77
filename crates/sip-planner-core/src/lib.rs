pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "calculators")]
pub mod calculators;

#[cfg(feature = "funds")]
pub mod funds;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::SipPlannerError;
pub use types::*;

/// Standard result type for all sip-planner operations
pub type SipResult<T> = Result<T, SipPlannerError>;
