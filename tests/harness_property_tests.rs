use proptest::prelude::*;

use tt_harness::models::Accumulator;
use tt_harness::{
    Clock, ClockConfig, Dut, Executor, Harness, HarnessError, ResetConfig, ResetSequencer, Step,
    StimulusDriver, TestRun, TimePoint, TimeUnit, TraceKind, Vector,
};

/// Property testing helper functions
struct PropertyHelper;

impl PropertyHelper {
    /// Reset for one cycle, then for every `(hold, ui_in, uio_in)` apply the
    /// inputs, wait, and sample `uo_out`.
    fn sample_outputs(plan: &[(TimePoint, u8, u8)], half_period: u64) -> Result<Vec<u64>, HarnessError> {
        let mut exec = Executor::new(TimeUnit::Ns);
        let sim = exec.handle();
        let dut = Dut::new(&sim, Accumulator::new())?;
        let plan = plan.to_vec();

        exec.block_on(async move {
            let reset = ResetSequencer::new(
                &sim,
                &dut,
                &ResetConfig::new("rst_n", TimePoint::EdgeCount(1)),
            )?;
            let driver = StimulusDriver::new(&dut)
                .reserve("clk", "clock")
                .reserve("rst_n", "reset sequencer");

            dut.write("ena", 1)?;
            reset.assert()?;
            Clock::start(&sim, &dut, &ClockConfig::new("clk", half_period, TimeUnit::Ns))?;
            reset.apply(TimePoint::EdgeCount(1)).await?;

            let mut samples = Vec::new();
            for (hold, ui_in, uio_in) in plan {
                driver.apply(&Self::inputs(ui_in, uio_in))?;
                sim.advance(hold).await?;
                samples.push(dut.read("uo_out")?.value());
            }
            Ok::<_, HarnessError>(samples)
        })?
    }

    /// Start the clock and immediately wait for `point`.
    fn wait_from_clock_start(point: TimePoint, half_period: u64) -> Result<(u64, u64), HarnessError> {
        let mut exec = Executor::new(TimeUnit::Ns);
        let sim = exec.handle();
        let dut = Dut::new(&sim, Accumulator::new())?;

        exec.block_on(async move {
            Clock::start(&sim, &dut, &ClockConfig::new("clk", half_period, TimeUnit::Ns))?;
            sim.advance(point).await?;
            Ok::<_, HarnessError>((sim.now().ticks(), sim.edges()))
        })?
    }

    fn inputs(ui_in: u8, uio_in: u8) -> Vector {
        let mut vector = Vector::new();
        vector.insert("ui_in".to_string(), u64::from(ui_in));
        vector.insert("uio_in".to_string(), u64::from(uio_in));
        vector
    }

    fn test_run(reset: ResetConfig, steps: &[(TimePoint, u8, u8, Option<u8>)]) -> TestRun {
        let mut test = TestRun::new("prop", ClockConfig::new("clk", 10, TimeUnit::Ns), reset)
            .init("ena", 1);
        for &(hold, ui_in, uio_in, expect) in steps {
            let mut step = Step::hold(hold).drive("ui_in", u64::from(ui_in)).drive("uio_in", u64::from(uio_in));
            if let Some(value) = expect {
                step = step.expect("uo_out", u64::from(value));
            }
            test = test.step(step);
        }
        test
    }
}

// Property test generators

/// Generate a hold in either model, zero included
fn hold() -> impl Strategy<Value = TimePoint> {
    prop_oneof![
        (0u64..5).prop_map(TimePoint::EdgeCount),
        (0u64..80).prop_map(TimePoint::Duration),
    ]
}

/// Generate a valid reset hold
fn reset_hold() -> impl Strategy<Value = TimePoint> {
    prop_oneof![
        (1u64..5).prop_map(TimePoint::EdgeCount),
        (1u64..100).prop_map(TimePoint::Duration),
    ]
}

/// Generate a step without an expectation
fn plain_step() -> impl Strategy<Value = (TimePoint, u8, u8, Option<u8>)> {
    (hold(), any::<u8>(), any::<u8>()).prop_map(|(h, a, b)| (h, a, b, None))
}

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Property: no event is ever recorded at an earlier time (or cycle)
        /// than the one before it
        #[test]
        fn prop_cursor_never_rewinds(
            steps in prop::collection::vec(plain_step(), 0..12)
        ) {
            let test = PropertyHelper::test_run(
                ResetConfig::new("rst_n", TimePoint::EdgeCount(1)),
                &steps,
            );
            let mut harness = Harness::new(Accumulator::new());
            let outcome = harness.run(&test).unwrap();
            prop_assert!(outcome.is_passed());

            let events = harness.trace().unwrap().events();
            for pair in events.windows(2) {
                prop_assert!(pair[0].time <= pair[1].time, "time went backwards: {:?}", pair);
                prop_assert!(pair[0].cycle <= pair[1].cycle, "cycles went backwards: {:?}", pair);
            }
        }

        /// Property: waiting n cycles and waiting 2n half-periods observe the
        /// same device outputs
        #[test]
        fn prop_edge_and_duration_waits_agree(
            plan in prop::collection::vec((1u64..6, any::<u8>(), any::<u8>()), 1..8),
            half_period in 1u64..20
        ) {
            let by_edges: Vec<_> = plan
                .iter()
                .map(|&(n, a, b)| (TimePoint::EdgeCount(n), a, b))
                .collect();
            let by_time: Vec<_> = plan
                .iter()
                .map(|&(n, a, b)| (TimePoint::Duration(2 * n * half_period), a, b))
                .collect();

            let edge_samples = PropertyHelper::sample_outputs(&by_edges, half_period).unwrap();
            let time_samples = PropertyHelper::sample_outputs(&by_time, half_period).unwrap();
            prop_assert_eq!(edge_samples, time_samples);
        }

        /// Property: a wait issued as the clock starts ends at the same
        /// instant in both models, one full period per cycle later
        #[test]
        fn prop_waits_from_clock_start_agree(
            cycles in 1u64..8,
            half_period in 1u64..20
        ) {
            let by_edges = PropertyHelper::wait_from_clock_start(
                TimePoint::EdgeCount(cycles),
                half_period,
            ).unwrap();
            let by_time = PropertyHelper::wait_from_clock_start(
                TimePoint::Duration(2 * cycles * half_period),
                half_period,
            ).unwrap();
            prop_assert_eq!(by_edges, by_time);
            prop_assert_eq!(by_edges.0, 2 * cycles * half_period);
        }

        /// Property: reset is asserted for at least its hold, sees a clock
        /// edge when the hold is edge-counted, and stays released afterwards
        #[test]
        fn prop_reset_respects_hold(
            hold in reset_hold(),
            pre_clock in prop::option::of(0u64..50),
            steps in prop::collection::vec(plain_step(), 0..4)
        ) {
            let mut reset = ResetConfig::new("rst_n", hold);
            reset.pre_clock = pre_clock;
            let test = PropertyHelper::test_run(reset, &steps);

            let mut harness = Harness::new(Accumulator::new());
            prop_assert!(harness.run(&test).unwrap().is_passed());
            let trace = harness.trace().unwrap();

            let resets: Vec<_> = trace.drives("rst_n").collect();
            prop_assert_eq!(resets.len(), 2);
            let (asserted, released) = (resets[0], resets[1]);
            prop_assert_eq!(asserted.value.value(), 0);
            prop_assert_eq!(released.value.value(), 1);

            match hold {
                TimePoint::EdgeCount(n) => {
                    prop_assert!(released.cycle - asserted.cycle >= n);
                    let held = released.time.saturating_since(asserted.time);
                    prop_assert!(held >= 2 * n * test.clock.half_period);
                    prop_assert_eq!(held, pre_clock.unwrap_or(0) + 2 * n * test.clock.half_period);
                    let edge_in_reset = trace.events().iter().any(|e| {
                        &*e.port == "clk"
                            && e.kind == TraceKind::Drive
                            && e.value.value() == 1
                            && e.time >= asserted.time
                            && e.time <= released.time
                    });
                    prop_assert!(edge_in_reset);
                }
                TimePoint::Duration(t) => {
                    let held = released.time.saturating_since(asserted.time);
                    prop_assert!(held >= t);
                    prop_assert_eq!(held, t + pre_clock.unwrap_or(0));
                }
            }
        }

        /// Property: replaying a run on the same device gives the same
        /// outcome, failure detail and trace
        #[test]
        fn prop_replay_is_idempotent(
            steps in prop::collection::vec(
                (hold(), any::<u8>(), any::<u8>(), prop::option::of(any::<u8>())),
                1..8
            )
        ) {
            let test = PropertyHelper::test_run(
                ResetConfig::new("rst_n", TimePoint::EdgeCount(2)),
                &steps,
            );
            let mut harness = Harness::new(Accumulator::new());

            let first = harness.run(&test).unwrap();
            let first_trace = harness.trace().cloned();
            let second = harness.run(&test).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first_trace.as_ref(), harness.trace());
        }
    }
}
