use crate::dist::Dist;
use crate::event::Event;
use crate::kernel::{spawn_client, Simulator};
use crate::recorder::DiscreteRecorder;
use crate::station::StationId;

/// Injects clients into the network at times drawn from an inter-arrival
/// generator, optionally in batches, optionally bounded to a target count.
pub struct SourceState {
    interarrival: Dist,
    batch_size: Option<Dist>,
    target_count: u64,
    type_name: Option<String>,
    successor: StationId,
    emitted: u64,
    last_tick: Option<f64>,
    interarrival_recorder: DiscreteRecorder,
}

impl SourceState {
    /// `target_count == 0` means unlimited: the source keeps arming
    /// itself for the lifetime of the run.
    pub fn new(
        interarrival: Dist,
        batch_size: Option<Dist>,
        target_count: u64,
        type_name: Option<String>,
        successor: StationId,
    ) -> Self {
        SourceState {
            interarrival,
            batch_size,
            target_count,
            type_name,
            successor,
            emitted: 0,
            last_tick: None,
            interarrival_recorder: DiscreteRecorder::new(),
        }
    }

    /// Rewire this source's successor after construction. Used by network
    /// builders that create a routing `Decide` station only after the
    /// sources it routes between already exist.
    pub fn set_successor(&mut self, successor: StationId) {
        self.successor = successor;
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn successor(&self) -> StationId {
        self.successor
    }

    /// The client type this source stamps onto every client it emits, if
    /// any. Used by by-client-type `Decide` routing and graph export.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn interarrival_statistics(&self) -> &DiscreteRecorder {
        &self.interarrival_recorder
    }

    pub(crate) fn init(&mut self, sim: &mut Simulator, id: StationId) {
        if self.target_count == 0 || self.emitted < self.target_count {
            let delay = sim.sample(&self.interarrival);
            sim.schedule_after(Event::SourceTick { station: id }, delay);
        }
    }

    pub(crate) fn on_tick(&mut self, sim: &mut Simulator, id: StationId) {
        let now = sim.now();
        if let Some(prev) = self.last_tick {
            self.interarrival_recorder.record(now - prev);
        }
        self.last_tick = Some(now);

        let batch = match &self.batch_size {
            Some(dist) => (sim.sample(dist).round().max(1.0)) as u64,
            None => 1,
        };

        for _ in 0..batch {
            let client = spawn_client(sim, self.type_name.clone());
            let client_id = client.id;
            sim.register_client(client);
            sim.schedule_now(Event::Arrival {
                station: self.successor,
                client: client_id,
            });
        }
        self.emitted += batch;

        if self.target_count == 0 || self.emitted < self.target_count {
            let delay = sim.sample(&self.interarrival);
            sim.schedule_after(Event::SourceTick { station: id }, delay);
        }
    }
}
