//! Canned single-queue topologies and a transition-matrix network builder.
//!
//! Every helper here does nothing `queuesim_core` itself could not do
//! directly; they just save callers from re-deriving the same handful of
//! M/M/c-family wirings and the rewiring dance a cyclic retry loop needs.

use queuesim_core::client::Client;
use queuesim_core::dist::Dist;
use queuesim_core::error::Error;
use queuesim_core::kernel::Simulator;
use queuesim_core::station::{StationId, StationKind};
use queuesim_core::stations::decide::DecideState;
use queuesim_core::stations::delay::DelayState;
use queuesim_core::stations::dispose::DisposeState;
use queuesim_core::stations::process::ProcessState;
use queuesim_core::stations::source::SourceState;
use queuesim_core::stations::Discipline;

/// A plain M/M/c model: one source, one process station with `c` servers,
/// one sink.
pub struct MmcModel {
    pub source: StationId,
    pub process: StationId,
    pub dispose: StationId,
    pub mean_i: f64,
    pub mean_s: f64,
    pub c: usize,
}

pub fn mmc_model(
    sim: &mut Simulator,
    mean_i: f64,
    mean_s: f64,
    c: usize,
    count: u64,
) -> Result<MmcModel, Error> {
    let get_i = Dist::exponential(mean_i)?;
    let get_s = Dist::exponential(mean_s)?;

    let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));
    let process = sim.add_station(StationKind::Process(ProcessState::new(
        get_s, c, None, None, None, 1, Discipline::Fifo, dispose, None, None,
    )?));
    let source = sim.add_station(StationKind::Source(SourceState::new(
        get_i, None, count, None, process,
    )));
    sim.register_init(source);

    Ok(MmcModel {
        source,
        process,
        dispose,
        mean_i,
        mean_s,
        c,
    })
}

/// An M/M/c model whose process station serves by a custom priority
/// function instead of FIFO.
pub fn mmc_model_with_priorities<F>(
    sim: &mut Simulator,
    mean_i: f64,
    mean_s: f64,
    c: usize,
    count: u64,
    priority: F,
) -> Result<MmcModel, Error>
where
    F: Fn(&Client, f64) -> f64 + 'static,
{
    let get_i = Dist::exponential(mean_i)?;
    let get_s = Dist::exponential(mean_s)?;

    let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));
    let process_state =
        ProcessState::new(get_s, c, None, None, None, 1, Discipline::Fifo, dispose, None, None)?
            .with_priority(priority);
    let process = sim.add_station(StationKind::Process(process_state));
    let source = sim.add_station(StationKind::Source(SourceState::new(
        get_i, None, count, None, process,
    )));
    sim.register_init(source);

    Ok(MmcModel {
        source,
        process,
        dispose,
        mean_i,
        mean_s,
        c,
    })
}

/// An M/M/c + M model with impatience, and (when `retry_probability > 0`) a
/// retry loop: a cancelled client either retries after a delay or leaves
/// for good.
pub struct ImpatienceAndRetryModel {
    pub source: StationId,
    pub process: StationId,
    pub dispose: StationId,
    pub retry_decide: Option<StationId>,
    pub retry_delay: Option<StationId>,
    pub mean_i: f64,
    pub mean_s: f64,
    pub mean_wt: f64,
    pub c: usize,
}

#[allow(clippy::too_many_arguments)]
pub fn impatience_and_retry_model(
    sim: &mut Simulator,
    mean_i: f64,
    mean_s: f64,
    mean_wt: f64,
    retry_probability: f64,
    mean_retry_delay: f64,
    c: usize,
    count: u64,
) -> Result<ImpatienceAndRetryModel, Error> {
    let get_i = Dist::exponential(mean_i)?;
    let get_s = Dist::exponential(mean_s)?;
    let get_wt = Dist::exponential(mean_wt)?;

    let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));

    let (process, retry_decide, retry_delay) = if retry_probability > 0.0 {
        let process = sim.add_station(StationKind::Process(ProcessState::new(
            get_s,
            c,
            Some(get_wt),
            None,
            None,
            1,
            Discipline::Fifo,
            dispose,
            None,
            None,
        )?));

        let get_delay = Dist::exponential(mean_retry_delay)?;
        let retry_delay = sim.add_station(StationKind::Delay(DelayState::new(get_delay, process)));
        let retry_decide = sim.add_station(StationKind::Decide(DecideState::by_weight(
            vec![retry_delay, dispose],
            vec![retry_probability, 1.0 - retry_probability],
        )?));

        if let StationKind::Process(p) = sim.station_mut(process) {
            p.set_cancel_to(retry_decide);
        }

        (process, Some(retry_decide), Some(retry_delay))
    } else {
        let process = sim.add_station(StationKind::Process(ProcessState::new(
            get_s,
            c,
            Some(get_wt),
            None,
            None,
            1,
            Discipline::Fifo,
            dispose,
            Some(dispose),
            None,
        )?));
        (process, None, None)
    };

    let source = sim.add_station(StationKind::Source(SourceState::new(
        get_i, None, count, None, process,
    )));
    sim.register_init(source);

    Ok(ImpatienceAndRetryModel {
        source,
        process,
        dispose,
        retry_decide,
        retry_delay,
        mean_i,
        mean_s,
        mean_wt,
        c,
    })
}

/// Wires already-constructed sources, process stations, and sinks by
/// transition-rate matrices: `connections1` is `|sources| x |processes|`,
/// `connections2` is `|processes| x (|processes| + |disposes|)`. A row with
/// exactly one positive entry forwards directly; a row with more than one
/// gets a `Decide`-by-weight station inserted automatically.
pub fn build_network_model(
    sim: &mut Simulator,
    sources: &[StationId],
    processes: &[StationId],
    disposes: &[StationId],
    connections1: &[Vec<f64>],
    connections2: &[Vec<f64>],
) -> Result<(), Error> {
    if connections1.len() != sources.len() {
        return Err(Error::Wiring(
            "connections1 row count does not match number of sources".to_string(),
        ));
    }
    if connections2.len() != processes.len() {
        return Err(Error::Wiring(
            "connections2 row count does not match number of processes".to_string(),
        ));
    }

    for (s_index, &source) in sources.iter().enumerate() {
        let row = &connections1[s_index];
        if row.len() > processes.len() {
            return Err(Error::Wiring(
                "connections1 column count does not match number of processes".to_string(),
            ));
        }
        let targets: Vec<(StationId, f64)> = row
            .iter()
            .enumerate()
            .filter(|&(_, &rate)| rate > 0.0)
            .map(|(p_index, &rate)| (processes[p_index], rate))
            .collect();
        let successor = route(sim, &targets)?;
        if let StationKind::Source(s) = sim.station_mut(source) {
            s.set_successor(successor);
        }
    }

    for (p_index, &process) in processes.iter().enumerate() {
        let row = &connections2[p_index];
        if row.len() > processes.len() + disposes.len() {
            return Err(Error::Wiring(
                "connections2 column count does not match sum of processes and disposes"
                    .to_string(),
            ));
        }
        let targets: Vec<(StationId, f64)> = row
            .iter()
            .enumerate()
            .filter(|&(_, &rate)| rate > 0.0)
            .map(|(next_index, &rate)| {
                let target = if next_index < processes.len() {
                    processes[next_index]
                } else {
                    disposes[next_index - processes.len()]
                };
                (target, rate)
            })
            .collect();
        let successor = route(sim, &targets)?;
        if let StationKind::Process(p) = sim.station_mut(process) {
            p.set_forward(successor);
        }
    }

    Ok(())
}

/// Forward directly to the single target, or insert a `Decide`-by-weight
/// station when there is more than one.
fn route(sim: &mut Simulator, targets: &[(StationId, f64)]) -> Result<StationId, Error> {
    match targets {
        [] => Err(Error::Wiring(
            "a network row has no positive-rate successor".to_string(),
        )),
        [(only, _)] => Ok(*only),
        many => {
            let successors = many.iter().map(|(id, _)| *id).collect();
            let weights = many.iter().map(|(_, w)| *w).collect();
            Ok(sim.add_station(StationKind::Decide(DecideState::by_weight(
                successors, weights,
            )?)))
        }
    }
}
