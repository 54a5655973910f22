//! Event payloads dispatched by the simulation kernel.
//!
//! Every cross-station handoff — a source emitting a client, a process
//! forwarding a finished client, a decide station routing one — goes
//! through [`Event::Arrival`] rather than a direct call from one station's
//! code into another's. That keeps the kernel in sole control of ordering
//! and lets a station's handler mutate its own state without ever holding
//! a borrow into another station at the same time.

use std::fmt;

use crate::client::ClientId;
use crate::station::StationId;

/// A tagged event payload. No `dyn` dispatch, no closures: each variant
/// carries exactly the data its handler needs.
#[derive(Debug, Clone)]
pub enum Event {
    /// A client arrives at a station, forwarded from an upstream station
    /// (or from a Source that has just created it).
    Arrival { station: StationId, client: ClientId },
    /// A Source's inter-arrival timer has fired; it should emit its next
    /// batch of clients and, unless exhausted, re-arm itself.
    SourceTick { station: StationId },
    /// A batch of clients (size 1 for non-batch service) finishes its
    /// service phase at a Process station. `duration` is the service time
    /// drawn when the batch started, carried along so the completion
    /// handler can charge it to each client without re-sampling.
    ServiceComplete {
        station: StationId,
        batch: Vec<ClientId>,
        duration: f64,
    },
    /// A batch finishes its post-processing phase at a Process station.
    PostProcessingComplete {
        station: StationId,
        batch: Vec<ClientId>,
        duration: f64,
    },
    /// A queued client's patience has run out at a Process station.
    PatienceExpiry { station: StationId, client: ClientId },
    /// A client finishes waiting out a Delay station.
    DelayComplete { station: StationId, client: ClientId },
    /// A Batcher's maximum wait has elapsed; flush whatever it holds.
    BatchFlush { station: StationId },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Arrival { station, client } => {
                write!(f, "Arrival(station={station:?}, client={client:?})")
            }
            Event::SourceTick { station } => write!(f, "SourceTick(station={station:?})"),
            Event::ServiceComplete {
                station, batch, ..
            } => {
                write!(f, "ServiceComplete(station={station:?}, n={})", batch.len())
            }
            Event::PostProcessingComplete {
                station, batch, ..
            } => write!(
                f,
                "PostProcessingComplete(station={station:?}, n={})",
                batch.len()
            ),
            Event::PatienceExpiry { station, client } => {
                write!(f, "PatienceExpiry(station={station:?}, client={client:?})")
            }
            Event::DelayComplete { station, client } => {
                write!(f, "DelayComplete(station={station:?}, client={client:?})")
            }
            Event::BatchFlush { station } => write!(f, "BatchFlush(station={station:?})"),
        }
    }
}
