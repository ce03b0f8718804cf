pub mod domain;
pub mod error;
pub mod timeparse;
pub mod types;

pub use error::{WatchError, WatchResult};
pub use timeparse::TimeMode;
pub use types::{
    ActivityCode, AlertEvent, AlertKind, AlertSeverity, DomainStatus, Phase, PollResult,
    WatchVerdict,
};
