use crate::client::ClientId;
use crate::kernel::Simulator;
use crate::recorder::DiscreteRecorder;
use crate::station::StationId;

/// The terminal sink: every client that reaches a `Dispose` station leaves
/// the network for good. Records final waiting/service/residence times and
/// the inter-departure process.
pub struct DisposeState {
    order: Vec<ClientId>,
    last_departure: Option<f64>,
    waiting: DiscreteRecorder,
    service: DiscreteRecorder,
    residence: DiscreteRecorder,
    interdeparture: DiscreteRecorder,
}

impl Default for DisposeState {
    fn default() -> Self {
        Self::new()
    }
}

impl DisposeState {
    pub fn new() -> Self {
        DisposeState {
            order: Vec::new(),
            last_departure: None,
            waiting: DiscreteRecorder::new(),
            service: DiscreteRecorder::new(),
            residence: DiscreteRecorder::new(),
            interdeparture: DiscreteRecorder::new(),
        }
    }

    /// Clients in the order they were disposed, for tests and exact replay
    /// checks.
    pub fn disposed_order(&self) -> Vec<ClientId> {
        self.order.clone()
    }

    pub fn waiting_statistics(&self) -> &DiscreteRecorder {
        &self.waiting
    }

    pub fn service_statistics(&self) -> &DiscreteRecorder {
        &self.service
    }

    pub fn residence_statistics(&self) -> &DiscreteRecorder {
        &self.residence
    }

    pub fn interdeparture_statistics(&self) -> &DiscreteRecorder {
        &self.interdeparture
    }

    pub fn disposed_count(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, _id: StationId, client: ClientId) {
        let now = sim.now();
        self.order.push(client);
        if let Some(prev) = self.last_departure {
            self.interdeparture.record(now - prev);
        }
        self.last_departure = Some(now);

        if sim.has_client(client) {
            let c = sim.remove_client(client);
            self.waiting.record(c.waiting_time());
            self.service.record(c.service_time());
            self.residence.record(c.residence_time());
        }
    }
}
