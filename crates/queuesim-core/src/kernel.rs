//! The simulation kernel: virtual clock, pending-event list, dispatch
//! loop, and the station arena.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::client::{Client, ClientId};
use crate::dist::Dist;
use crate::error::Error;
use crate::event::Event;
use crate::rng::RngSource;
use crate::station::{StationId, StationKind};

/// A handle to a previously scheduled event, usable with
/// [`Simulator::cancel`]. Cancellation is idempotent and safe even if the
/// event has already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

struct PendingEntry {
    time: f64,
    seq: u64,
    event: Event,
}

impl PartialEq for PendingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for PendingEntry {}

impl PartialOrd for PendingEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEntry {
    /// Reversed so that `BinaryHeap`, a max-heap, pops the smallest
    /// `(time, seq)` pair first: earliest time first, and among ties the
    /// one scheduled first (insertion order).
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .partial_cmp(&self.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Owns virtual time, the pending-event list, the client id counter, the
/// random source, and the station arena for one simulation run.
///
/// Two `Simulator`s are always fully independent worlds: there is no
/// global mutable id counter or RNG anywhere in this crate.
pub struct Simulator {
    now: f64,
    heap: BinaryHeap<PendingEntry>,
    cancelled: HashSet<u64>,
    next_seq: u64,
    event_count: u64,
    run_time: Duration,
    next_client_id: u64,
    rng: RngSource,
    stations: Vec<StationKind>,
    init_queue: Vec<StationId>,
    clients: HashMap<ClientId, Client>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// A simulator backed by a non-seedable, OS-entropy RNG.
    pub fn new() -> Self {
        Self::with_rng(RngSource::thread())
    }

    /// A simulator backed by a seeded, deterministic RNG: runs built this
    /// way are bit-exact reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(RngSource::seeded(seed))
    }

    fn with_rng(rng: RngSource) -> Self {
        Simulator {
            now: 0.0,
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
            event_count: 0,
            run_time: Duration::ZERO,
            next_client_id: 0,
            rng,
            stations: Vec::new(),
            init_queue: Vec::new(),
            clients: HashMap::new(),
        }
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn run_time(&self) -> Duration {
        self.run_time
    }

    /// Add a station to the arena, returning its stable id.
    pub fn add_station(&mut self, kind: StationKind) -> StationId {
        self.stations.push(kind);
        StationId(self.stations.len() - 1)
    }

    pub fn station(&self, id: StationId) -> &StationKind {
        &self.stations[id.0]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut StationKind {
        &mut self.stations[id.0]
    }

    /// Register a station's `init()` hook to run exactly once, in
    /// registration order, before the first event fires. Stations that
    /// need to schedule their first event (Sources) must do so only
    /// inside `init()`, never in their constructor, so that the whole
    /// graph can finish being wired before time starts.
    pub fn register_init(&mut self, id: StationId) {
        self.init_queue.push(id);
    }

    /// Allocate the next client identity.
    pub fn next_client_id(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        id
    }

    /// Draw a sample from the simulator's single random source.
    pub fn sample(&mut self, dist: &Dist) -> f64 {
        dist.sample(&mut self.rng)
    }

    /// Register a freshly created client, making it reachable via
    /// [`Simulator::client`] / [`Simulator::client_mut`] for the rest of
    /// its time in the network.
    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Whether `id` refers to a currently registered, not-yet-disposed
    /// client.
    pub fn has_client(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn client(&self, id: ClientId) -> &Client {
        self.clients
            .get(&id)
            .expect("client id must refer to a registered, not-yet-disposed client")
    }

    pub fn client_mut(&mut self, id: ClientId) -> &mut Client {
        self.clients
            .get_mut(&id)
            .expect("client id must refer to a registered, not-yet-disposed client")
    }

    /// Remove a client from the registry, e.g. when it reaches a Dispose
    /// station. Returns the client so its final statistics can be read.
    pub fn remove_client(&mut self, id: ClientId) -> Client {
        self.clients
            .remove(&id)
            .expect("client id must refer to a registered, not-yet-disposed client")
    }

    /// Schedule an event at an absolute virtual time. Fails if `at` is
    /// earlier than the current time.
    pub fn schedule_at(&mut self, event: Event, at: f64) -> Result<EventHandle, Error> {
        if at < self.now {
            return Err(Error::Scheduling(format!(
                "attempted to schedule {event} at {at}, which is before now ({})",
                self.now
            )));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        log::trace!("scheduling {event} at {at} (seq {seq})");
        self.heap.push(PendingEntry { time: at, seq, event });
        Ok(EventHandle(seq))
    }

    /// Schedule an event `delay` virtual-time units from now. `delay` must
    /// be non-negative.
    pub fn schedule_after(&mut self, event: Event, delay: f64) -> EventHandle {
        debug_assert!(delay >= 0.0, "schedule_after delay must be non-negative");
        self.schedule_at(event, self.now + delay.max(0.0))
            .expect("now + non-negative delay is never in the past")
    }

    /// Schedule an event to fire at the current virtual time, after the
    /// event currently being dispatched. Used for all station-to-station
    /// handoffs so that no station handler ever calls into another
    /// station directly.
    pub fn schedule_now(&mut self, event: Event) -> EventHandle {
        self.schedule_after(event, 0.0)
    }

    /// Cancel a previously scheduled event. Idempotent; a no-op if the
    /// event has already fired.
    pub fn cancel(&mut self, handle: EventHandle) {
        self.cancelled.insert(handle.0);
    }

    fn pop_next(&mut self) -> Option<Event> {
        loop {
            let entry = self.heap.pop()?;
            if self.cancelled.remove(&entry.seq) {
                continue;
            }
            debug_assert!(entry.time >= self.now, "virtual time must be monotone");
            self.now = entry.time;
            return Some(entry.event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        log::debug!("t={} dispatching {event}", self.now);
        let id = match &event {
            Event::Arrival { station, .. } => *station,
            Event::SourceTick { station } => *station,
            Event::ServiceComplete { station, .. } => *station,
            Event::PostProcessingComplete { station, .. } => *station,
            Event::PatienceExpiry { station, .. } => *station,
            Event::DelayComplete { station, .. } => *station,
            Event::BatchFlush { station } => *station,
        };

        let mut kind = std::mem::replace(&mut self.stations[id.0], StationKind::Placeholder);
        if let Event::Arrival { client, .. } = event {
            kind.on_arrival(self, id, client);
        } else {
            kind.on_event(self, id, event);
        }
        self.stations[id.0] = kind;
    }

    /// Run the simulator to completion: invoke every registered `init()`
    /// hook once, then repeatedly pop and fire the earliest non-cancelled
    /// event until none remain.
    pub fn run(&mut self) {
        let start = Instant::now();
        let inits = std::mem::take(&mut self.init_queue);
        for id in inits {
            let mut kind = std::mem::replace(&mut self.stations[id.0], StationKind::Placeholder);
            kind.init(self, id);
            self.stations[id.0] = kind;
        }

        while let Some(event) = self.pop_next() {
            self.dispatch(event);
            self.event_count += 1;
        }
        self.run_time = start.elapsed();
        log::info!(
            "run complete: {} events in {:?}, final time {}",
            self.event_count,
            self.run_time,
            self.now
        );
    }
}

/// Constructs a fresh [`Client`] with the next available id.
pub fn spawn_client(sim: &mut Simulator, type_name: Option<String>) -> Client {
    let id = sim.next_client_id();
    Client::new(id, sim.now(), type_name)
}
