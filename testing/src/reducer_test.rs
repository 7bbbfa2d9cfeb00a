//! Given-When-Then harness for provider reducers
//!
//! A test names a starting state, one or more actions and the checks to run
//! afterwards. State checks see the state after the last action; effect checks
//! see the effects the last action returned.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use unit_frame_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test
///
/// # Example
///
/// ```ignore
/// use unit_frame_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(IFrameReducer::new().with_load_timeout(Some(Duration::from_secs(30))))
///     .with_env(FrameEnvironment::new(test_clock(), Arc::new(RecordingViewport::new())))
///     .given_state(IFrameState::new(&request, 0))
///     .when_action(IFrameAction::Mounted)
///     .when_action(IFrameAction::Resized { height: 480 })
///     .then_state(|state| assert!(state.has_loaded))
///     .then_effects(|effects| assertions::assert_cancels(effects, LOAD_TIMEOUT))
///     .run();
/// ```
pub struct ReducerTest<R: Reducer> {
    reducer: R,
    environment: Option<R::Environment>,
    state: Option<R::State>,
    actions: Vec<R::Action>,
    state_checks: Vec<StateCheck<R::State>>,
    effect_checks: Vec<EffectCheck<R::Action>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::State: 'static,
    R::Action: 'static,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            state: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment the reducer runs against
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Append an action (When); actions are reduced in order
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Check the final state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce every action and run the checks
    ///
    /// # Panics
    ///
    /// Panics if the state, environment or actions are missing, or if a
    /// check fails.
    #[allow(clippy::expect_used, clippy::panic)] // Test harness
    pub fn run(self) {
        let mut state = self.state.expect("Initial state must be set with given_state()");
        let env = self
            .environment
            .expect("Environment must be set with with_env()");
        assert!(!self.actions.is_empty(), "At least one action must be set with when_action()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(&effects);
        }
    }
}

/// Effect assertions for `then_effects`
pub mod assertions {
    use unit_frame_core::effect::{Effect, EffectId};

    /// The effect itself or, for a cancellable effect, the effect it wraps
    fn unwrapped<A>(effect: &Effect<A>) -> &Effect<A> {
        match effect {
            Effect::Cancellable { effect, .. } => unwrapped(effect),
            other => other,
        }
    }

    /// Assert that nothing but `Effect::None` was returned
    ///
    /// # Panics
    ///
    /// Panics if any real effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {effects:?}"
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {expected} effects, but found {}",
            effects.len()
        );
    }

    /// Assert that at least one effect is a `Future`
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(unwrapped(e), Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that at least one effect is a `Delay`, cancellable or not
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(unwrapped(e), Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }

    /// Assert that an effect was started under cancellation id `id`
    ///
    /// # Panics
    ///
    /// Panics if no effect carries `id`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancellable<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancellable { id: found, .. } if *found == id)),
            "Expected an effect cancellable under {id}, but none found"
        );
    }

    /// Assert that the effects cancel `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Effect::Cancel(id)` is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Cancel(found) if *found == id)),
            "Expected {id} to be cancelled, but it was not"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use unit_frame_core::effect::EffectId;
    use unit_frame_core::{smallvec, SmallVec};

    const SETTLE: EffectId = EffectId::new("settle");

    #[derive(Clone, Debug, Default)]
    struct Height {
        px: u32,
        settled: bool,
    }

    #[derive(Clone, Debug)]
    enum HeightAction {
        Watch,
        Reported(u32),
    }

    struct HeightReducer;

    impl Reducer for HeightReducer {
        type State = Height;
        type Action = HeightAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Height,
            action: HeightAction,
            (): &(),
        ) -> SmallVec<[Effect<HeightAction>; 4]> {
            match action {
                HeightAction::Watch => smallvec![Effect::Delay {
                    duration: Duration::from_secs(5),
                    action: Box::new(HeightAction::Reported(0)),
                }
                .cancellable(SETTLE)],
                HeightAction::Reported(px) => {
                    state.px = px;
                    if px > 0 && !state.settled {
                        state.settled = true;
                        smallvec![Effect::Cancel(SETTLE)]
                    } else {
                        smallvec![Effect::None]
                    }
                },
            }
        }
    }

    #[test]
    fn test_single_action() {
        ReducerTest::new(HeightReducer)
            .with_env(())
            .given_state(Height::default())
            .when_action(HeightAction::Watch)
            .then_state(|state| assert!(!state.settled))
            .then_effects(assertions::assert_has_delay_effect)
            .then_effects(|effects| assertions::assert_cancellable(effects, SETTLE))
            .run();
    }

    #[test]
    fn test_checks_see_last_action() {
        ReducerTest::new(HeightReducer)
            .with_env(())
            .given_state(Height::default())
            .when_action(HeightAction::Watch)
            .when_action(HeightAction::Reported(240))
            .then_state(|state| {
                assert_eq!(state.px, 240);
                assert!(state.settled);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_cancels(effects, SETTLE);
            })
            .run();
    }

    #[test]
    fn test_no_effects_accepts_none() {
        assertions::assert_no_effects::<HeightAction>(&[Effect::None]);
        assertions::assert_no_effects::<HeightAction>(&[]);
    }

    #[test]
    #[should_panic(expected = "Expected at least one Future effect")]
    fn test_missing_future_fails() {
        assertions::assert_has_future_effect::<HeightAction>(&[Effect::Cancel(SETTLE)]);
    }
}
