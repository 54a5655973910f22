//! The entity that flows through a network of stations.

use std::collections::HashMap;

use crate::station::StationId;

/// Monotone, simulator-scoped client identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

/// A single record of time spent at one station by one client, used by
/// [`Client::hop`] to build a per-station breakdown after the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationHop {
    pub waiting: f64,
    pub service: f64,
}

/// A client flowing through the network. Created by a `Source`, mutated by
/// the stations it passes through, and consumed by a `Dispose`.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub type_name: Option<String>,
    pub arrived_at: f64,
    waiting: f64,
    service: f64,
    hops: HashMap<StationId, StationHop>,
    /// When this client is standing in for a batch formed by a `Batcher`,
    /// the ordered ids of every member (this client's own id included,
    /// first). `None` for an ordinary, ungrouped client.
    group: Option<Vec<ClientId>>,
}

impl Client {
    pub fn new(id: ClientId, arrived_at: f64, type_name: Option<String>) -> Self {
        Client {
            id,
            type_name,
            arrived_at,
            waiting: 0.0,
            service: 0.0,
            hops: HashMap::new(),
            group: None,
        }
    }

    pub fn group(&self) -> Option<&[ClientId]> {
        self.group.as_deref()
    }

    pub fn set_group(&mut self, members: Vec<ClientId>) {
        self.group = Some(members);
    }

    pub fn take_group(&mut self) -> Option<Vec<ClientId>> {
        self.group.take()
    }

    /// Total time spent waiting across every station visited so far.
    pub fn waiting_time(&self) -> f64 {
        self.waiting
    }

    /// Total time spent in service across every station visited so far.
    pub fn service_time(&self) -> f64 {
        self.service
    }

    /// Residence (sojourn) time: waiting plus service.
    pub fn residence_time(&self) -> f64 {
        self.waiting + self.service
    }

    pub fn record_wait(&mut self, station: StationId, duration: f64) {
        self.waiting += duration;
        self.hops.entry(station).or_default().waiting += duration;
    }

    pub fn record_service(&mut self, station: StationId, duration: f64) {
        self.service += duration;
        self.hops.entry(station).or_default().service += duration;
    }

    pub fn hop(&self, station: StationId) -> StationHop {
        self.hops.get(&station).copied().unwrap_or_default()
    }
}
