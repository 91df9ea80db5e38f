//! Error types for binding and dispatch

use thiserror::Error;

use crate::coerce::ValueKind;

/// Error type returned by fallible host callbacks.
pub type HostFault = Box<dyn std::error::Error>;

/// Result type returned by fallible host callbacks.
pub type HostResult = Result<(), HostFault>;

/// Why a plug could not be resolved against its host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("no member '{name}' matching the requested signature")]
    NotFound { name: String },
    #[error("member '{name}' is not granted by the host environment")]
    Unavailable { name: String },
    #[error("member '{name}' is not public and execution is restricted, make it public")]
    Inaccessible { name: String },
    #[error("cannot plug '{name}' with an invalid binding kind")]
    InvalidKind { name: String },
    #[error("host object for '{name}' is gone or busy")]
    HostGone { name: String },
}

/// A fault raised while delivering a value to a resolved plug.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no argument can be produced for parameter kind {0:?}")]
    Unsupported(ValueKind),
    #[error("host object was dropped")]
    HostDropped,
    #[error("host object is already borrowed")]
    HostBusy,
    #[error("target faulted: {0}")]
    Fault(String),
}

impl From<HostFault> for DispatchError {
    fn from(fault: HostFault) -> Self {
        Self::Fault(fault.to_string())
    }
}
