use crate::client::ClientId;
use crate::event::Event;
use crate::kernel::{EventHandle, Simulator};
use crate::recorder::DiscreteRecorder;
use crate::station::StationId;

struct Pending {
    client: ClientId,
    enqueued_at: f64,
}

/// Accumulates arriving clients until `n` have gathered, or (if set) the
/// oldest has waited `t_max`, then forwards the whole group as one client
/// standing in for the rest — see [`crate::client::Client::group`]. A
/// `Separator` downstream reopens it.
pub struct BatcherState {
    n: usize,
    t_max: Option<f64>,
    forward: StationId,
    pending: Vec<Pending>,
    flush_handle: Option<EventHandle>,
    batch_size: DiscreteRecorder,
    waiting: DiscreteRecorder,
}

impl BatcherState {
    pub fn new(n: usize, t_max: Option<f64>, forward: StationId) -> Self {
        assert!(n >= 1, "Batcher n must be >= 1");
        BatcherState {
            n,
            t_max,
            forward,
            pending: Vec::new(),
            flush_handle: None,
            batch_size: DiscreteRecorder::new(),
            waiting: DiscreteRecorder::new(),
        }
    }

    pub fn batch_size_statistics(&self) -> &DiscreteRecorder {
        &self.batch_size
    }

    pub fn waiting_statistics(&self) -> &DiscreteRecorder {
        &self.waiting
    }

    pub fn held(&self) -> usize {
        self.pending.len()
    }

    pub fn forward(&self) -> StationId {
        self.forward
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, id: StationId, client: ClientId) {
        let now = sim.now();
        if self.pending.is_empty() {
            if let Some(t_max) = self.t_max {
                let handle = sim.schedule_after(Event::BatchFlush { station: id }, t_max);
                self.flush_handle = Some(handle);
            }
        }
        self.pending.push(Pending {
            client,
            enqueued_at: now,
        });

        if self.pending.len() >= self.n {
            self.flush(sim, id);
        }
    }

    pub(crate) fn on_flush(&mut self, sim: &mut Simulator, id: StationId) {
        self.flush_handle = None;
        if !self.pending.is_empty() {
            self.flush(sim, id);
        }
    }

    fn flush(&mut self, sim: &mut Simulator, id: StationId) {
        if let Some(handle) = self.flush_handle.take() {
            sim.cancel(handle);
        }
        let now = sim.now();
        let members: Vec<Pending> = std::mem::take(&mut self.pending);
        self.batch_size.record(members.len() as f64);

        let ids: Vec<ClientId> = members.iter().map(|m| m.client).collect();
        for m in &members {
            let wait = now - m.enqueued_at;
            self.waiting.record(wait);
            sim.client_mut(m.client).record_wait(id, wait);
        }

        let carrier = ids[0];
        sim.client_mut(carrier).set_group(ids.clone());
        sim.schedule_now(Event::Arrival {
            station: self.forward,
            client: carrier,
        });
    }
}
