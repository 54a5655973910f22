use std::collections::HashMap;

use crate::client::ClientId;
use crate::dist::Dist;
use crate::event::Event;
use crate::kernel::Simulator;
use crate::recorder::{ContinuousRecorder, DiscreteRecorder};
use crate::station::StationId;

/// Holds each client for a duration drawn from a generator, then forwards
/// it. Unlimited capacity, no queueing: every client that arrives is
/// delayed independently and concurrently.
pub struct DelayState {
    delay: Dist,
    forward: StationId,
    wip: ContinuousRecorder,
    residence: DiscreteRecorder,
    enqueued_at: HashMap<ClientId, f64>,
    in_flight: usize,
}

impl DelayState {
    pub fn new(delay: Dist, forward: StationId) -> Self {
        DelayState {
            delay,
            forward,
            wip: ContinuousRecorder::new(),
            residence: DiscreteRecorder::new(),
            enqueued_at: HashMap::new(),
            in_flight: 0,
        }
    }

    pub fn wip_statistics(&self) -> &ContinuousRecorder {
        &self.wip
    }

    /// Time each client spent held at this station, counted toward its
    /// overall residence time the same way a Process's waiting time is.
    pub fn residence_statistics(&self) -> &DiscreteRecorder {
        &self.residence
    }

    pub fn forward(&self) -> StationId {
        self.forward
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, id: StationId, client: ClientId) {
        let now = sim.now();
        self.in_flight += 1;
        self.wip.set(now, self.in_flight as f64);
        self.enqueued_at.insert(client, now);
        let delay = sim.sample(&self.delay);
        sim.schedule_after(Event::DelayComplete { station: id, client }, delay);
    }

    pub(crate) fn on_delay_complete(&mut self, sim: &mut Simulator, id: StationId, client: ClientId) {
        let now = sim.now();
        self.in_flight -= 1;
        self.wip.set(now, self.in_flight as f64);
        if let Some(enqueued_at) = self.enqueued_at.remove(&client) {
            let held = now - enqueued_at;
            self.residence.record(held);
            sim.client_mut(client).record_wait(id, held);
        }
        sim.schedule_now(Event::Arrival {
            station: self.forward,
            client,
        });
    }
}
