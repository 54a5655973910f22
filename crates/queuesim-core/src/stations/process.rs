use std::collections::{HashMap, HashSet};

use crate::client::ClientId;
use crate::dist::Dist;
use crate::error::Error;
use crate::event::Event;
use crate::kernel::{EventHandle, Simulator};
use crate::recorder::{ContinuousRecorder, DiscreteRecorder};
use crate::station::StationId;
use crate::stations::Discipline;

struct QueueEntry {
    client: ClientId,
    enqueued_at: f64,
}

/// A finite server pool fronted by a priority queue, with optional
/// impatience, batch service, post-processing, and blocking at a finite
/// capacity. This is the most involved station in the library: see the
/// module-level ordering of `on_arrival` / `try_dispatch` /
/// `on_service_complete` / `on_patience_expiry` for how the pieces
/// interlock.
pub struct ProcessState {
    service: Dist,
    c: usize,
    patience: Option<Dist>,
    post_processing: Option<Dist>,
    capacity: Option<usize>,
    batch: usize,
    discipline: Discipline,
    priority: Option<Box<dyn Fn(&crate::client::Client, f64) -> f64>>,
    forward: StationId,
    cancel_to: Option<StationId>,
    blocked_to: Option<StationId>,

    queue: Vec<QueueEntry>,
    impatience_events: HashMap<ClientId, EventHandle>,
    slots_busy: usize,
    in_system: HashSet<ClientId>,

    waiting: DiscreteRecorder,
    service_time: DiscreteRecorder,
    queue_length: ContinuousRecorder,
    wip: ContinuousRecorder,
    success: DiscreteRecorder,
    blocked: DiscreteRecorder,
}

impl ProcessState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: Dist,
        c: usize,
        patience: Option<Dist>,
        post_processing: Option<Dist>,
        capacity: Option<usize>,
        batch: usize,
        discipline: Discipline,
        forward: StationId,
        cancel_to: Option<StationId>,
        blocked_to: Option<StationId>,
    ) -> Result<Self, Error> {
        if c == 0 {
            return Err(Error::Parameter("Process c must be >= 1".to_string()));
        }
        if batch == 0 {
            return Err(Error::Parameter("Process batch size must be >= 1".to_string()));
        }
        if let Some(k) = capacity {
            if k < c {
                return Err(Error::Parameter(format!(
                    "Process capacity K ({k}) must be >= c ({c})"
                )));
            }
        }
        Ok(ProcessState {
            service,
            c,
            patience,
            post_processing,
            capacity,
            batch,
            discipline,
            priority: None,
            forward,
            cancel_to,
            blocked_to,
            queue: Vec::new(),
            impatience_events: HashMap::new(),
            slots_busy: 0,
            in_system: HashSet::new(),
            waiting: DiscreteRecorder::new(),
            service_time: DiscreteRecorder::new(),
            queue_length: ContinuousRecorder::new(),
            wip: ContinuousRecorder::new(),
            success: DiscreteRecorder::new(),
            blocked: DiscreteRecorder::new(),
        })
    }

    /// Rewire the cancellation successor after construction. Needed to wire
    /// retry loops, where the retry-decision station cannot be built until
    /// after the `Process` it routes back into already exists.
    pub fn set_cancel_to(&mut self, cancel_to: StationId) {
        self.cancel_to = Some(cancel_to);
    }

    /// Rewire this station's successor after construction. Used by network
    /// builders that insert a routing `Decide` station only after the
    /// process stations it routes between already exist.
    pub fn set_forward(&mut self, forward: StationId) {
        self.forward = forward;
    }

    /// Install a custom priority function: higher value is served first.
    /// When set, this overrides the FIFO/LIFO discipline.
    pub fn with_priority<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::client::Client, f64) -> f64 + 'static,
    {
        self.priority = Some(Box::new(f));
        self
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn servers_busy(&self) -> usize {
        self.slots_busy
    }

    pub fn waiting_statistics(&self) -> &DiscreteRecorder {
        &self.waiting
    }

    pub fn service_statistics(&self) -> &DiscreteRecorder {
        &self.service_time
    }

    pub fn queue_length_statistics(&self) -> &ContinuousRecorder {
        &self.queue_length
    }

    pub fn wip_statistics(&self) -> &ContinuousRecorder {
        &self.wip
    }

    pub fn success_statistics(&self) -> &DiscreteRecorder {
        &self.success
    }

    pub fn blocked_statistics(&self) -> &DiscreteRecorder {
        &self.blocked
    }

    pub fn forward(&self) -> StationId {
        self.forward
    }

    pub fn cancel_to(&self) -> Option<StationId> {
        self.cancel_to
    }

    pub fn blocked_to(&self) -> Option<StationId> {
        self.blocked_to
    }

    fn priority_of(&self, sim: &Simulator, idx: usize, now: f64) -> f64 {
        let entry = &self.queue[idx];
        match &self.priority {
            Some(f) => f(sim.client(entry.client), now - entry.enqueued_at),
            None => match self.discipline {
                Discipline::Fifo => -entry.enqueued_at,
                Discipline::Lifo => entry.enqueued_at,
            },
        }
    }

    fn update_wip(&mut self, now: f64) {
        self.wip.set(now, self.in_system.len() as f64);
    }

    fn update_queue_len(&mut self, now: f64) {
        self.queue_length.set(now, self.queue.len() as f64);
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, id: StationId, client: ClientId) {
        let now = sim.now();
        if let Some(k) = self.capacity {
            if self.queue.len() + self.slots_busy >= k {
                self.blocked.record(1.0);
                log::debug!("station {id:?} blocked client {client:?} at capacity {k}");
                match self.blocked_to {
                    Some(next) => {
                        sim.schedule_now(Event::Arrival { station: next, client });
                    }
                    None => {
                        sim.remove_client(client);
                    }
                }
                return;
            }
        }

        self.in_system.insert(client);
        self.queue.push(QueueEntry {
            client,
            enqueued_at: now,
        });
        self.update_queue_len(now);
        self.update_wip(now);

        if let Some(patience) = &self.patience {
            let delay = sim.sample(patience);
            let handle = sim.schedule_after(Event::PatienceExpiry { station: id, client }, delay);
            self.impatience_events.insert(client, handle);
        }

        self.try_dispatch(sim, id);
    }

    fn try_dispatch(&mut self, sim: &mut Simulator, id: StationId) {
        while self.slots_busy < self.c && self.queue.len() >= self.batch {
            let now = sim.now();
            let mut order: Vec<usize> = (0..self.queue.len()).collect();
            order.sort_by(|&a, &b| {
                let pa = self.priority_of(sim, a, now);
                let pb = self.priority_of(sim, b, now);
                pb.partial_cmp(&pa).unwrap_or(std::cmp::Ordering::Equal)
            });
            let chosen: Vec<usize> = order.into_iter().take(self.batch).collect();
            let batch_clients: Vec<ClientId> =
                chosen.iter().map(|&i| self.queue[i].client).collect();

            let mut remove_idxs = chosen;
            remove_idxs.sort_unstable_by(|a, b| b.cmp(a));
            for idx in remove_idxs {
                let entry = self.queue.remove(idx);
                if let Some(handle) = self.impatience_events.remove(&entry.client) {
                    sim.cancel(handle);
                }
                let wait = now - entry.enqueued_at;
                self.waiting.record(wait);
                sim.client_mut(entry.client).record_wait(id, wait);
            }
            self.update_queue_len(now);

            let duration = sim.sample(&self.service);
            self.service_time.record(duration);
            sim.schedule_after(
                Event::ServiceComplete {
                    station: id,
                    batch: batch_clients,
                    duration,
                },
                duration,
            );
            self.slots_busy += 1;
        }
    }

    pub(crate) fn on_service_complete(
        &mut self,
        sim: &mut Simulator,
        id: StationId,
        batch: Vec<ClientId>,
        duration: f64,
    ) {
        for &c in &batch {
            sim.client_mut(c).record_service(id, duration);
        }
        if let Some(post) = &self.post_processing {
            let delay = sim.sample(post);
            sim.schedule_after(
                Event::PostProcessingComplete {
                    station: id,
                    batch,
                    duration: delay,
                },
                delay,
            );
        } else {
            self.finish_batch(sim, id, batch);
        }
    }

    pub(crate) fn on_post_processing_complete(
        &mut self,
        sim: &mut Simulator,
        id: StationId,
        batch: Vec<ClientId>,
        _duration: f64,
    ) {
        self.finish_batch(sim, id, batch);
    }

    fn finish_batch(&mut self, sim: &mut Simulator, id: StationId, batch: Vec<ClientId>) {
        self.slots_busy -= 1;
        let now = sim.now();
        for c in batch {
            self.in_system.remove(&c);
            self.success.record(1.0);
            sim.schedule_now(Event::Arrival {
                station: self.forward,
                client: c,
            });
        }
        self.update_wip(now);
        self.try_dispatch(sim, id);
    }

    pub(crate) fn on_patience_expiry(&mut self, sim: &mut Simulator, id: StationId, client: ClientId) {
        let now = sim.now();
        let Some(pos) = self.queue.iter().position(|e| e.client == client) else {
            // already dispatched (its impatience handle was cancelled at
            // dispatch time); a stale event should never fire, but ignore
            // it defensively rather than panic.
            return;
        };
        let entry = self.queue.remove(pos);
        self.impatience_events.remove(&client);
        let wait = now - entry.enqueued_at;
        self.waiting.record(wait);
        sim.client_mut(client).record_wait(id, wait);
        self.in_system.remove(&client);
        self.success.record(0.0);
        self.update_queue_len(now);
        self.update_wip(now);

        match self.cancel_to {
            Some(next) => {
                sim.schedule_now(Event::Arrival { station: next, client });
            }
            None => {
                sim.remove_client(client);
            }
        }
        self.try_dispatch(sim, id);
    }
}
