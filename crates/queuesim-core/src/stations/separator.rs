use crate::client::ClientId;
use crate::event::Event;
use crate::kernel::Simulator;
use crate::recorder::DiscreteRecorder;
use crate::station::StationId;

/// Inverse of `Batcher`: releases each member of an arriving group
/// individually, in original order, to its successor. A client that
/// arrives without a group (never passed through a `Batcher`) is treated
/// as a group of one.
pub struct SeparatorState {
    forward: StationId,
    group_size: DiscreteRecorder,
}

impl SeparatorState {
    pub fn new(forward: StationId) -> Self {
        SeparatorState {
            forward,
            group_size: DiscreteRecorder::new(),
        }
    }

    pub fn group_size_statistics(&self) -> &DiscreteRecorder {
        &self.group_size
    }

    pub fn forward(&self) -> StationId {
        self.forward
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, _id: StationId, client: ClientId) {
        let members: Vec<ClientId> = match sim.client_mut(client).take_group() {
            Some(members) => members,
            None => vec![client],
        };
        self.group_size.record(members.len() as f64);

        for member in members {
            sim.schedule_now(Event::Arrival {
                station: self.forward,
                client: member,
            });
        }
    }
}
