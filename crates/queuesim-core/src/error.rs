use std::fmt;

/// Errors raised by the simulation kernel, station wiring, and model builders.
#[derive(Debug, Clone)]
pub enum Error {
    /// A station graph is wired incorrectly: a required successor is
    /// missing, a client type is unmapped on a type router, or a
    /// transition matrix has mismatched dimensions.
    Wiring(String),

    /// An attempt was made to schedule an event at a time earlier than the
    /// simulator's current virtual time.
    Scheduling(String),

    /// A parameter supplied to a distribution builder, a station, or a
    /// recorder is out of range.
    Parameter(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Wiring(msg) => write!(f, "wiring error: {msg}"),
            Error::Scheduling(msg) => write!(f, "scheduling error: {msg}"),
            Error::Parameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
