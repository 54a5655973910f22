//! The station arena: stations live for the whole run in a `Vec` owned by
//! the [`crate::kernel::Simulator`]; all cross-references between them
//! (including cyclic retry loops) are stable [`StationId`] indices, never
//! owning pointers.

use crate::client::ClientId;
use crate::event::Event;
use crate::kernel::Simulator;
use crate::stations::{
    batcher::BatcherState, decide::DecideState, delay::DelayState, dispose::DisposeState,
    process::ProcessState, separator::SeparatorState, source::SourceState,
};

/// A stable, simulator-scoped reference to a station. Indexes into the
/// simulator's station arena; never an owning pointer, so cyclic wiring
/// (retry loops, forwarding loops) is just another `StationId` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationId(pub usize);

/// The sum type of every station kind this crate implements. Dispatch on
/// station kind is a `match`, not a trait object, so that the kernel never
/// needs `dyn` dispatch to decide what a station does with an event.
pub enum StationKind {
    Source(SourceState),
    Process(ProcessState),
    Delay(DelayState),
    Decide(DecideState),
    Dispose(DisposeState),
    Batcher(BatcherState),
    Separator(SeparatorState),
    /// Held only transiently while a station is being mutated by the
    /// dispatch loop (moved out, mutated, moved back in); never observed
    /// outside of `Simulator::dispatch`.
    Placeholder,
}

impl StationKind {
    pub(crate) fn init(&mut self, sim: &mut Simulator, id: StationId) {
        if let StationKind::Source(s) = self {
            s.init(sim, id);
        }
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, id: StationId, client: ClientId) {
        match self {
            StationKind::Source(_) => {
                log::debug!("ignoring external arrival at a Source station");
            }
            StationKind::Process(s) => s.on_arrival(sim, id, client),
            StationKind::Delay(s) => s.on_arrival(sim, id, client),
            StationKind::Decide(s) => s.on_arrival(sim, id, client),
            StationKind::Dispose(s) => s.on_arrival(sim, id, client),
            StationKind::Batcher(s) => s.on_arrival(sim, id, client),
            StationKind::Separator(s) => s.on_arrival(sim, id, client),
            StationKind::Placeholder => unreachable!("placeholder station received an event"),
        }
    }

    pub(crate) fn on_event(&mut self, sim: &mut Simulator, id: StationId, event: Event) {
        match (self, event) {
            (StationKind::Source(s), Event::SourceTick { .. }) => s.on_tick(sim, id),
            (StationKind::Process(s), Event::ServiceComplete { batch, duration, .. }) => {
                s.on_service_complete(sim, id, batch, duration)
            }
            (StationKind::Process(s), Event::PostProcessingComplete { batch, duration, .. }) => {
                s.on_post_processing_complete(sim, id, batch, duration)
            }
            (StationKind::Process(s), Event::PatienceExpiry { client, .. }) => {
                s.on_patience_expiry(sim, id, client)
            }
            (StationKind::Delay(s), Event::DelayComplete { client, .. }) => {
                s.on_delay_complete(sim, id, client)
            }
            (StationKind::Batcher(s), Event::BatchFlush { .. }) => s.on_flush(sim, id),
            (_, event) => {
                log::debug!("station {id:?} received unexpected event {event}");
            }
        }
    }
}
