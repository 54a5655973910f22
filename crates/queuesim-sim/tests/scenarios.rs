//! End-to-end reference scenarios: simulated output compared against
//! hand-computed Erlang-C values, plus the cross-cutting laws a queueing
//! simulator must satisfy regardless of topology.

use queuesim_core::dist::Dist;
use queuesim_core::kernel::Simulator;
use queuesim_core::station::{StationId, StationKind};
use queuesim_core::stations::decide::DecideState;
use queuesim_core::stations::dispose::DisposeState;
use queuesim_core::stations::process::ProcessState;
use queuesim_core::stations::source::SourceState;
use queuesim_core::stations::Discipline;

use queuesim_sim::network::{impatience_and_retry_model, mmc_model};

/// Erlang B, via the numerically stable recursion (no factorials).
fn erlang_b(c: usize, a: f64) -> f64 {
    let mut b = 1.0;
    for n in 1..=c {
        b = (a * b) / (n as f64 + a * b);
    }
    b
}

/// Erlang C: probability an arriving client must wait for a free server.
fn erlang_c(c: usize, a: f64) -> f64 {
    let b = erlang_b(c, a);
    let c_f = c as f64;
    (c_f * b) / (c_f - a * (1.0 - b))
}

/// Mean waiting time for an M/M/c queue via Erlang C.
fn erlang_c_mean_wait(c: usize, mean_i: f64, mean_s: f64) -> f64 {
    let lambda = 1.0 / mean_i;
    let mu = 1.0 / mean_s;
    let a = lambda * mean_s;
    let p_wait = erlang_c(c, a);
    p_wait / (c as f64 * mu - lambda)
}

fn process_of(sim: &Simulator, id: StationId) -> &ProcessState {
    match sim.station(id) {
        StationKind::Process(p) => p,
        _ => panic!("expected a Process station"),
    }
}

fn dispose_of(sim: &Simulator, id: StationId) -> &DisposeState {
    match sim.station(id) {
        StationKind::Dispose(d) => d,
        _ => panic!("expected a Dispose station"),
    }
}

#[test]
fn scenario_mm1_matches_erlang_c() {
    let mean_i = 100.0;
    let mean_s = 80.0;
    let mut sim = Simulator::with_seed(1);
    let model = mmc_model(&mut sim, mean_i, mean_s, 1, 300_000).unwrap();
    sim.run();

    let expected_w = erlang_c_mean_wait(1, mean_i, mean_s);
    assert!((expected_w - 320.0).abs() < 1.0, "sanity: {expected_w}");

    let w = process_of(&sim, model.process).waiting_statistics().mean();
    let v = dispose_of(&sim, model.dispose).residence_statistics().mean();

    assert!((w - 320.0).abs() / 320.0 < 0.1, "E[W] was {w}");
    assert!((v - 400.0).abs() / 400.0 < 0.1, "E[V] was {v}");
}

#[test]
fn scenario_mmc_matches_erlang_c() {
    // c=10, rho=0.8: lambda = 0.8*10/80 = 0.1 => mean_i = 10.
    let mean_i = 10.0;
    let mean_s = 80.0;
    let c = 10;
    let mut sim = Simulator::with_seed(2);
    let model = mmc_model(&mut sim, mean_i, mean_s, c, 500_000).unwrap();
    sim.run();

    let expected_w = erlang_c_mean_wait(c, mean_i, mean_s);
    assert!((expected_w - 78.1).abs() < 1.0, "sanity: {expected_w}");
    let expected_v = expected_w + mean_s;
    assert!((expected_v - 878.1).abs() < 1.0, "sanity: {expected_v}");

    let w = process_of(&sim, model.process).waiting_statistics().mean();
    let v = dispose_of(&sim, model.dispose).residence_statistics().mean();
    assert!(
        (w - expected_w).abs() / expected_w < 0.15,
        "E[W] was {w}, expected {expected_w}"
    );
    assert!(
        (v - expected_v).abs() / expected_v < 0.15,
        "E[V] was {v}, expected {expected_v}"
    );
}

/// The waiting-time distribution's tail above the 5th percentile must match
/// the Erlang-C closed form `P(W <= t) = 1 - P_wait * e^{-(c-a)*mu*t}`.
#[test]
fn scenario_mmc_waiting_time_histogram_matches_erlang_c_tail() {
    let mean_i = 10.0;
    let mean_s = 80.0;
    let c = 10;
    let mut sim = Simulator::with_seed(12);
    let model = mmc_model(&mut sim, mean_i, mean_s, c, 500_000).unwrap();
    sim.run();

    let lambda = 1.0 / mean_i;
    let mu = 1.0 / mean_s;
    let a = lambda * mean_s;
    let p_wait = erlang_c(c, a);

    let waiting = process_of(&sim, model.process).waiting_statistics();
    let width = waiting.bucket_width();
    let hist = waiting.histogram();
    let total = waiting.count() as f64;
    assert!(total > 0.0);

    let empirical_cdf_at = |bucket_exclusive_end: usize| -> f64 {
        hist.iter().take(bucket_exclusive_end).sum::<u64>() as f64 / total
    };
    let formula_cdf = |t: f64| -> f64 { 1.0 - p_wait * (-(c as f64 - a) * mu * t).exp() };

    let mut cumulative = 0u64;
    let mut p5_bucket = hist.len();
    for (i, &count) in hist.iter().enumerate() {
        cumulative += count;
        if cumulative as f64 / total >= 0.05 {
            p5_bucket = i;
            break;
        }
    }

    let mut checked = 0;
    for i in p5_bucket..hist.len() {
        let t = (i + 1) as f64 * width;
        let empirical = empirical_cdf_at(i + 1);
        let formula = formula_cdf(t);
        assert!(
            (empirical - formula).abs() < 0.02,
            "bucket mass mismatch at t={t}: empirical={empirical}, formula={formula}"
        );
        checked += 1;
    }
    assert!(checked > 0, "histogram tail above the 5th percentile was empty");
}

#[test]
fn scenario_impatience_cancellation_rises_with_utilization() {
    let mut low_load = Simulator::with_seed(3);
    let low = impatience_and_retry_model(&mut low_load, 200.0, 80.0, 60.0, 0.0, 0.0, 1, 100_000)
        .unwrap();
    low_load.run();
    let low_process = process_of(&low_load, low.process);
    let low_cancel_rate = 1.0 - low_process.success_statistics().mean();

    let mut high_load = Simulator::with_seed(4);
    let high =
        impatience_and_retry_model(&mut high_load, 85.0, 80.0, 60.0, 0.0, 0.0, 1, 100_000)
            .unwrap();
    high_load.run();
    let high_process = process_of(&high_load, high.process);
    let high_cancel_rate = 1.0 - high_process.success_statistics().mean();

    assert!(
        high_cancel_rate > low_cancel_rate,
        "cancellation rate should rise with utilization: low={low_cancel_rate}, high={high_cancel_rate}"
    );
    assert!(low_process.waiting_statistics().mean().is_finite());
    assert!(high_process.waiting_statistics().mean().is_finite());
}

#[test]
fn scenario_retry_increases_mean_waiting_time() {
    let mut no_retry_sim = Simulator::with_seed(5);
    let no_retry =
        impatience_and_retry_model(&mut no_retry_sim, 90.0, 80.0, 60.0, 0.0, 30.0, 1, 150_000)
            .unwrap();
    no_retry_sim.run();
    let no_retry_w = process_of(&no_retry_sim, no_retry.process)
        .waiting_statistics()
        .mean();

    let mut retry_sim = Simulator::with_seed(6);
    let retry =
        impatience_and_retry_model(&mut retry_sim, 90.0, 80.0, 60.0, 0.7, 30.0, 1, 150_000)
            .unwrap();
    retry_sim.run();
    let retry_w = process_of(&retry_sim, retry.process)
        .waiting_statistics()
        .mean();

    assert!(
        retry_w > no_retry_w,
        "retry should increase mean waiting time: no_retry={no_retry_w}, retry={retry_w}"
    );
}

#[test]
fn scenario_join_shortest_queue_beats_random_split() {
    fn build(sim: &mut Simulator, mean_i: f64, mean_s: f64, count: u64, jsq: bool) -> (StationId, StationId) {
        let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));
        let pa = sim.add_station(StationKind::Process(
            ProcessState::new(
                Dist::exponential(mean_s).unwrap(),
                1,
                None,
                None,
                None,
                1,
                Discipline::Fifo,
                dispose,
                None,
                None,
            )
            .unwrap(),
        ));
        let pb = sim.add_station(StationKind::Process(
            ProcessState::new(
                Dist::exponential(mean_s).unwrap(),
                1,
                None,
                None,
                None,
                1,
                Discipline::Fifo,
                dispose,
                None,
                None,
            )
            .unwrap(),
        ));

        let decide = if jsq {
            sim.add_station(StationKind::Decide(
                DecideState::by_condition(vec![pa, pb], move |_client, sim| {
                    let na = match sim.station(pa) {
                        StationKind::Process(p) => p.queue_len() + p.servers_busy(),
                        _ => 0,
                    };
                    let nb = match sim.station(pb) {
                        StationKind::Process(p) => p.queue_len() + p.servers_busy(),
                        _ => 0,
                    };
                    if na <= nb {
                        0
                    } else {
                        1
                    }
                })
                .unwrap(),
            ))
        } else {
            sim.add_station(StationKind::Decide(
                DecideState::by_weight(vec![pa, pb], vec![1.0, 1.0]).unwrap(),
            ))
        };

        let source = sim.add_station(StationKind::Source(SourceState::new(
            Dist::exponential(mean_i).unwrap(),
            None,
            count,
            None,
            decide,
        )));
        sim.register_init(source);
        (pa, pb)
    }

    let mean_i = 45.0;
    let mean_s = 80.0;
    let count = 200_000;

    let mut jsq_sim = Simulator::with_seed(7);
    let (jsq_a, jsq_b) = build(&mut jsq_sim, mean_i, mean_s, count, true);
    jsq_sim.run();
    let jsq_nq = process_of(&jsq_sim, jsq_a).queue_length_statistics().mean()
        + process_of(&jsq_sim, jsq_b).queue_length_statistics().mean();

    let mut random_sim = Simulator::with_seed(8);
    let (rnd_a, rnd_b) = build(&mut random_sim, mean_i, mean_s, count, false);
    random_sim.run();
    let random_nq = process_of(&random_sim, rnd_a).queue_length_statistics().mean()
        + process_of(&random_sim, rnd_b).queue_length_statistics().mean();

    // A single station pooling both servers behind one queue, fed by the
    // same total arrival rate, is the theoretical floor: it can never do
    // worse than splitting the servers into two independent queues no
    // matter how smart the split policy is.
    let mut pooled_sim = Simulator::with_seed(9);
    let pooled_dispose = pooled_sim.add_station(StationKind::Dispose(DisposeState::new()));
    let pooled_process = pooled_sim.add_station(StationKind::Process(
        ProcessState::new(
            Dist::exponential(mean_s).unwrap(),
            2,
            None,
            None,
            None,
            1,
            Discipline::Fifo,
            pooled_dispose,
            None,
            None,
        )
        .unwrap(),
    ));
    let pooled_source = pooled_sim.add_station(StationKind::Source(SourceState::new(
        Dist::exponential(mean_i).unwrap(),
        None,
        count,
        None,
        pooled_process,
    )));
    pooled_sim.register_init(pooled_source);
    pooled_sim.run();
    let pooled_nq = process_of(&pooled_sim, pooled_process)
        .queue_length_statistics()
        .mean();

    assert!(
        jsq_nq < random_nq,
        "join-shortest-queue should have lower E[N_Q]: jsq={jsq_nq}, random={random_nq}"
    );
    assert!(
        jsq_nq > pooled_nq,
        "join-shortest-queue should still trail a fully pooled station: jsq={jsq_nq}, pooled={pooled_nq}"
    );
}

#[test]
fn scenario_blocking_reduces_realized_utilization() {
    let mean_i = 40.0;
    let mean_s = 80.0;
    let c = 1;
    let count = 150_000;

    let mut sim = Simulator::with_seed(9);
    let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));
    let blocked_sink = sim.add_station(StationKind::Dispose(DisposeState::new()));
    let process = sim.add_station(StationKind::Process(
        ProcessState::new(
            Dist::exponential(mean_s).unwrap(),
            c,
            None,
            None,
            Some(2),
            1,
            Discipline::Fifo,
            dispose,
            None,
            Some(blocked_sink),
        )
        .unwrap(),
    ));
    let source = sim.add_station(StationKind::Source(SourceState::new(
        Dist::exponential(mean_i).unwrap(),
        None,
        count,
        None,
        process,
    )));
    sim.register_init(source);
    sim.run();

    let offered_rho = mean_s / mean_i / c as f64;
    let blocked = process_of(&sim, process).blocked_statistics().count() as f64;
    let realized_throughput = count as f64 - blocked;
    let realized_rho = (realized_throughput * mean_s) / (count as f64 * mean_i) / c as f64;

    assert!(blocked > 0.0, "finite capacity should cause some blocking");
    assert!(
        realized_rho < offered_rho,
        "realized utilization ({realized_rho}) should be below offered ({offered_rho})"
    );
}

#[test]
fn scenario_erlang_b_blocking_matches_formula_at_c10_rho1() {
    // A pure-loss system (K == c, no waiting room) is exactly Erlang-B.
    // Offered rho = 1.0 means offered load a == c in erlangs.
    let c = 10;
    let mean_s = 80.0;
    let mean_i = mean_s / c as f64;
    let count = 300_000;

    let a = mean_s / mean_i;
    let expected_block = erlang_b(c, a);
    assert!(
        (expected_block - 0.215).abs() < 0.01,
        "sanity: expected_block={expected_block}"
    );

    let mut sim = Simulator::with_seed(14);
    let dispose = sim.add_station(StationKind::Dispose(DisposeState::new()));
    let blocked_sink = sim.add_station(StationKind::Dispose(DisposeState::new()));
    let process = sim.add_station(StationKind::Process(
        ProcessState::new(
            Dist::exponential(mean_s).unwrap(),
            c,
            None,
            None,
            Some(c),
            1,
            Discipline::Fifo,
            dispose,
            None,
            Some(blocked_sink),
        )
        .unwrap(),
    ));
    let source = sim.add_station(StationKind::Source(SourceState::new(
        Dist::exponential(mean_i).unwrap(),
        None,
        count,
        None,
        process,
    )));
    sim.register_init(source);
    sim.run();

    let blocked = process_of(&sim, process).blocked_statistics().count() as f64;
    let realized_block = blocked / count as f64;
    assert!(
        (realized_block - expected_block).abs() < 0.02,
        "blocking probability was {realized_block}, expected ~0.215 ({expected_block})"
    );

    let offered_rho = a / c as f64;
    let served = count as f64 - blocked;
    let empirical_rho = (served * mean_s) / (count as f64 * mean_i) / c as f64;
    let formula_rho = (1.0 - realized_block) * offered_rho;
    assert!(
        (empirical_rho - formula_rho).abs() < 0.01,
        "realized utilization ({empirical_rho}) should equal (1-P_block)*offered_rho ({formula_rho})"
    );
}

#[test]
fn little_law_holds_for_mmc() {
    let mean_i = 100.0;
    let mean_s = 80.0;
    let mut sim = Simulator::with_seed(10);
    let model = mmc_model(&mut sim, mean_i, mean_s, 1, 300_000).unwrap();
    sim.run();

    let lambda = 1.0 / mean_i;
    let n = process_of(&sim, model.process).wip_statistics().mean();
    let v = dispose_of(&sim, model.dispose).residence_statistics().mean();

    assert!(
        (n - lambda * v).abs() / n < 0.1,
        "Little's law mismatch: N={n}, lambda*V={}",
        lambda * v
    );
}

#[test]
fn fifo_discipline_serves_in_enqueue_order() {
    let mut sim = Simulator::with_seed(11);
    let model = mmc_model(&mut sim, 50.0, 40.0, 1, 50_000).unwrap();
    sim.run();
    let dispose = dispose_of(&sim, model.dispose);
    let order = dispose.disposed_order();
    let ids: Vec<u64> = order.iter().map(|c| c.0).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(
        ids, sorted,
        "with c=1 and FIFO discipline, clients must depart in arrival-id order"
    );
}

#[test]
fn determinism_same_seed_same_outputs() {
    let mut a = Simulator::with_seed(99);
    let ma = mmc_model(&mut a, 100.0, 80.0, 2, 50_000).unwrap();
    a.run();

    let mut b = Simulator::with_seed(99);
    let mb = mmc_model(&mut b, 100.0, 80.0, 2, 50_000).unwrap();
    b.run();

    assert_eq!(a.event_count(), b.event_count());
    assert_eq!(
        process_of(&a, ma.process).waiting_statistics().count(),
        process_of(&b, mb.process).waiting_statistics().count()
    );
    assert_eq!(
        process_of(&a, ma.process).waiting_statistics().mean(),
        process_of(&b, mb.process).waiting_statistics().mean()
    );
}
