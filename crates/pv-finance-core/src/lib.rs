pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "incentives")]
pub mod incentives;

pub use error::PvFinanceError;
pub use types::*;

/// Standard result type for all pv-finance operations
pub type PvFinanceResult<T> = Result<T, PvFinanceError>;
