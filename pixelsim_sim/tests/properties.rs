//! Property tests: session invariants under arbitrary action interleavings.

use pixelsim_core::session::RunPhase;
use pixelsim_core::tracker::TrackerId;
use pixelsim_sim::{SimConfig, SimWorld};
use proptest::prelude::*;

/// One user-level action the generator can interleave with ticks.
#[derive(Debug, Clone, Copy)]
enum Action {
    Tick,
    Block(u8),
    Delete(u8),
    ViewProduct,
    Reset,
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => Just(Action::Tick),
        2 => (1u8..=3).prop_map(Action::Block),
        2 => (1u8..=3).prop_map(Action::Delete),
        1 => Just(Action::ViewProduct),
        1 => (0u8..=5).prop_map(|id| Action::Block(id)), // out-of-roster ids too
        1 => Just(Action::Reset),
    ]
}

fn apply(world: &mut SimWorld, action: Action) {
    match action {
        Action::Tick => world.tick(),
        Action::Block(id) => {
            world.block(TrackerId(id));
        }
        Action::Delete(id) => {
            world.delete(TrackerId(id));
        }
        Action::ViewProduct => world.view_product("Smart Watch"),
        Action::Reset => world.engine_mut().reset(),
    }
}

proptest! {
    /// Core counters stay in range no matter what the user does.
    #[test]
    fn invariants_hold_under_interleaving(
        seed in 0u64..1000,
        actions in proptest::collection::vec(action_strategy(), 0..200),
    ) {
        let mut world = SimWorld::new(SimConfig { seed, ..SimConfig::default() });
        world.start_run();

        for action in actions {
            apply(&mut world, action);

            let session = world.engine().session();
            prop_assert!(session.time_remaining <= 45);
            prop_assert!(session.trackers_blocked <= 3);
            prop_assert!(session.data_leaked_kb >= 0.0);

            // Blocked counter always matches the roster state
            let neutralized = world
                .engine()
                .trackers()
                .iter()
                .filter(|t| t.neutralized())
                .count() as u32;
            prop_assert_eq!(session.trackers_blocked, neutralized);

            // A terminal phase always carries an outcome
            if world.engine().phase().is_terminal() {
                prop_assert!(world.engine().outcome().is_some());
            }
        }
    }

    /// Leak accrual is exactly 0.5 KB per active tracker per elapsed second
    /// when nothing is neutralized mid-run.
    #[test]
    fn leak_formula_is_exact_while_idle(
        seed in 0u64..1000,
        ticks in 0u32..45,
    ) {
        let mut world = SimWorld::new(SimConfig { seed, ..SimConfig::default() });
        world.start_run();
        for _ in 0..ticks {
            world.tick();
        }
        let expected = 3.0 * 0.5 * ticks as f64;
        let leaked = world.engine().session().data_leaked_kb;
        prop_assert!((leaked - expected).abs() < 1e-9);
    }

    /// The same seed and action script always produce the same outcome.
    #[test]
    fn sessions_replay_deterministically(
        seed in 0u64..1000,
        actions in proptest::collection::vec(action_strategy(), 0..100),
    ) {
        let run = |seed: u64, actions: &[Action]| {
            let mut world = SimWorld::new(SimConfig { seed, ..SimConfig::default() });
            world.start_run();
            for &action in actions {
                apply(&mut world, action);
            }
            (
                world.engine().phase(),
                world.engine().session().clone(),
                world.events().events(),
            )
        };

        let a = run(seed, &actions);
        let b = run(seed, &actions);
        prop_assert_eq!(a.0, b.0);
        prop_assert_eq!(a.1, b.1);
        prop_assert_eq!(a.2, b.2);
    }
}
