use std::collections::HashMap;

use crate::client::{Client, ClientId};
use crate::error::Error;
use crate::kernel::Simulator;
use crate::recorder::DiscreteRecorder;
use crate::station::StationId;

/// How a `Decide` station picks a successor for an arriving client.
enum Routing {
    /// Route to `successors[i]` with probability proportional to
    /// `weights[i]`.
    Weighted {
        successors: Vec<StationId>,
        weights: Vec<f64>,
    },
    /// Route by evaluating a user function against the client and a
    /// read-only view of the simulator (e.g. to compare queue lengths
    /// across candidate successors); the function returns an index into
    /// `successors`.
    Condition {
        successors: Vec<StationId>,
        f: Box<dyn Fn(&Client, &Simulator) -> usize>,
    },
    /// Route by the client's `type_name`. Unmapped types are a wiring
    /// error, raised the first time they are encountered.
    ByType {
        by_type: HashMap<String, StationId>,
        default: Option<StationId>,
    },
}

/// Routes each arriving client to one of several successors. See
/// [`Routing`] for the three selection strategies.
pub struct DecideState {
    routing: Routing,
    chosen: Vec<DiscreteRecorder>,
    chosen_labels: Vec<String>,
}

impl DecideState {
    /// Weighted random branch selection. `successors.len()` must equal
    /// `weights.len()`, and at least one weight must be positive.
    pub fn by_weight(successors: Vec<StationId>, weights: Vec<f64>) -> Result<Self, Error> {
        if successors.is_empty() || successors.len() != weights.len() {
            return Err(Error::Wiring(
                "decide-by-weight requires equal-length, non-empty successors and weights"
                    .to_string(),
            ));
        }
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) || weights.iter().sum::<f64>() <= 0.0
        {
            return Err(Error::Wiring(
                "decide-by-weight weights must be finite, non-negative, and sum to > 0"
                    .to_string(),
            ));
        }
        let labels = (0..successors.len()).map(|i| format!("branch[{i}]")).collect();
        let n = successors.len();
        Ok(DecideState {
            routing: Routing::Weighted { successors, weights },
            chosen: (0..n).map(|_| DiscreteRecorder::new()).collect(),
            chosen_labels: labels,
        })
    }

    /// Branch selection by a user predicate returning the index of the
    /// chosen successor.
    pub fn by_condition<F>(successors: Vec<StationId>, f: F) -> Result<Self, Error>
    where
        F: Fn(&Client, &Simulator) -> usize + 'static,
    {
        if successors.is_empty() {
            return Err(Error::Wiring(
                "decide-by-condition requires at least one successor".to_string(),
            ));
        }
        let labels = (0..successors.len()).map(|i| format!("branch[{i}]")).collect();
        let n = successors.len();
        Ok(DecideState {
            routing: Routing::Condition {
                successors,
                f: Box::new(f),
            },
            chosen: (0..n).map(|_| DiscreteRecorder::new()).collect(),
            chosen_labels: labels,
        })
    }

    /// Branch selection by a client's `type_name`. `default` is used for
    /// clients whose type has no entry in `by_type`; without a default,
    /// an unmapped type is a wiring error raised at first use.
    pub fn by_client_type(
        by_type: HashMap<String, StationId>,
        default: Option<StationId>,
    ) -> Result<Self, Error> {
        if by_type.is_empty() && default.is_none() {
            return Err(Error::Wiring(
                "decide-by-client-type requires at least one mapping or a default".to_string(),
            ));
        }
        let mut labels: Vec<String> = by_type.keys().cloned().collect();
        labels.sort();
        if default.is_some() {
            labels.push("default".to_string());
        }
        let n = labels.len();
        Ok(DecideState {
            routing: Routing::ByType { by_type, default },
            chosen: (0..n).map(|_| DiscreteRecorder::new()).collect(),
            chosen_labels: labels,
        })
    }

    /// Per-branch counts of how many clients were routed there, indexed the
    /// same way as the successors passed at construction (or, for
    /// by-client-type routing, alphabetically by type name with the
    /// default last).
    pub fn branch_statistics(&self) -> impl Iterator<Item = (&str, &DiscreteRecorder)> {
        self.chosen_labels
            .iter()
            .map(String::as_str)
            .zip(self.chosen.iter())
    }

    /// Every station this `Decide` can route to, for graph export. For
    /// by-client-type routing this includes the default, if any.
    pub fn successors(&self) -> Vec<StationId> {
        match &self.routing {
            Routing::Weighted { successors, .. } => successors.clone(),
            Routing::Condition { successors, .. } => successors.clone(),
            Routing::ByType { by_type, default } => {
                let mut v: Vec<StationId> = by_type.values().copied().collect();
                v.extend(default.iter().copied());
                v
            }
        }
    }

    pub(crate) fn on_arrival(&mut self, sim: &mut Simulator, _id: StationId, client: ClientId) {
        use crate::event::Event;

        let (successor, branch) = match &self.routing {
            Routing::Weighted { successors, weights } => {
                let total: f64 = weights.iter().sum();
                let mut draw = sim_sample_uniform(sim, total);
                let mut idx = successors.len() - 1;
                for (i, w) in weights.iter().enumerate() {
                    if draw < *w {
                        idx = i;
                        break;
                    }
                    draw -= w;
                }
                (successors[idx], idx)
            }
            Routing::Condition { successors, f } => {
                let idx = f(sim.client(client), sim);
                let idx = idx.min(successors.len() - 1);
                (successors[idx], idx)
            }
            Routing::ByType { by_type, default } => {
                let type_name = sim.client(client).type_name.clone();
                let hit = type_name.as_deref().and_then(|t| by_type.get(t));
                match hit.or(default.as_ref()) {
                    Some(successor) => {
                        let idx = match &type_name {
                            Some(t) => self
                                .chosen_labels
                                .iter()
                                .position(|l| l == t)
                                .unwrap_or(self.chosen_labels.len() - 1),
                            None => self.chosen_labels.len() - 1,
                        };
                        (*successor, idx)
                    }
                    None => {
                        panic!(
                            "{}",
                            Error::Wiring(format!(
                                "decide-by-client-type: no route for client type {type_name:?}"
                            ))
                        );
                    }
                }
            }
        };

        self.chosen[branch].record(1.0);
        sim.schedule_now(Event::Arrival {
            station: successor,
            client,
        });
    }
}

fn sim_sample_uniform(sim: &mut Simulator, high: f64) -> f64 {
    use crate::dist::Dist;
    sim.sample(&Dist::uniform(0.0, high).expect("0 <= high always validates"))
}
