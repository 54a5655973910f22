//! A minimal directed-graph description of a wired network, handed off to
//! visualization collaborators outside this crate. This module does not
//! draw anything and does not pull in a graph-traversal dependency: it
//! only walks declared successors once to produce a plain description.

use std::collections::{HashSet, VecDeque};

use queuesim_core::kernel::Simulator;
use queuesim_core::station::{StationId, StationKind};

/// One station, named for display and keyed by discovery order from the
/// given roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub index: usize,
    pub id: StationId,
    pub label: String,
}

/// Walk the network reachable from `roots` (typically every `Source`),
/// breadth-first, and return every discovered node plus the directed edges
/// between them.
pub fn build_graph(sim: &Simulator, roots: &[StationId]) -> (Vec<Node>, Vec<(Node, Node)>) {
    let mut nodes: Vec<Node> = Vec::new();
    let mut seen: HashSet<StationId> = HashSet::new();
    let mut queue: VecDeque<StationId> = VecDeque::new();
    let mut edges: Vec<(StationId, StationId)> = Vec::new();

    for &root in roots {
        if seen.insert(root) {
            queue.push_back(root);
        }
    }

    while let Some(id) = queue.pop_front() {
        nodes.push(Node {
            index: nodes.len(),
            id,
            label: label_for(sim, id),
        });
        for next in successors_of(sim, id) {
            edges.push((id, next));
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let node_by_id = |id: StationId| -> Node {
        nodes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .expect("every edge endpoint was discovered during traversal")
    };
    let edges = edges
        .into_iter()
        .map(|(a, b)| (node_by_id(a), node_by_id(b)))
        .collect();

    (nodes, edges)
}

fn label_for(sim: &Simulator, id: StationId) -> String {
    let (kind, type_name) = match sim.station(id) {
        StationKind::Source(s) => ("Source", s.type_name()),
        StationKind::Process(_) => ("Process", None),
        StationKind::Delay(_) => ("Delay", None),
        StationKind::Decide(_) => ("Decide", None),
        StationKind::Dispose(_) => ("Dispose", None),
        StationKind::Batcher(_) => ("Batcher", None),
        StationKind::Separator(_) => ("Separator", None),
        StationKind::Placeholder => ("Placeholder", None),
    };
    match type_name {
        Some(t) => format!("{kind} {} \"{t}\"", id.0),
        None => format!("{kind} {}", id.0),
    }
}

fn successors_of(sim: &Simulator, id: StationId) -> Vec<StationId> {
    match sim.station(id) {
        StationKind::Source(s) => vec![s.successor()],
        StationKind::Process(p) => {
            let mut next = vec![p.forward()];
            if let Some(cancel) = p.cancel_to() {
                next.push(cancel);
            }
            if let Some(blocked) = p.blocked_to() {
                next.push(blocked);
            }
            next
        }
        StationKind::Delay(d) => vec![d.forward()],
        StationKind::Decide(d) => d.successors(),
        StationKind::Dispose(_) => vec![],
        StationKind::Batcher(b) => vec![b.forward()],
        StationKind::Separator(s) => vec![s.forward()],
        StationKind::Placeholder => vec![],
    }
}
