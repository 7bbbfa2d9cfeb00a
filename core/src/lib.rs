//! # Unit Frame Core
//!
//! Core traits and types for the embedded-content controller.
//!
//! Everything that changes over the life of an embedded frame is expressed with
//! the same small set of abstractions:
//!
//! - **State**: What a provider currently knows (load flags, frame height, overlay payload)
//! - **Action**: All possible inputs (native load, cross-frame messages, timers, dismissals)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits (clock, host viewport)
//!
//! ## Example
//!
//! ```
//! use unit_frame_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct HeightState {
//!     height: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum HeightAction {
//!     Resized(u32),
//! }
//!
//! struct HeightReducer;
//!
//! impl Reducer for HeightReducer {
//!     type State = HeightState;
//!     type Action = HeightAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut HeightState,
//!         action: HeightAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<HeightAction>; 4]> {
//!         match action {
//!             HeightAction::Resized(height) => state.height = height,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = HeightState::default();
//! HeightReducer.reduce(&mut state, HeightAction::Resized(480), &());
//! assert_eq!(state.height, 480);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all transition logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Inspects the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce a single effect, so the inline capacity of
        /// four keeps the common path allocation-free.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are cancellable by id.
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier of a cancellable effect
    ///
    /// A reducer tags long-lived work (a load timeout) with an id when it
    /// starts it, and emits [`Effect::Cancel`] with the same id once the work
    /// is no longer needed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Create an id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// Name the id was created with
        #[must_use]
        pub const fn name(self) -> &'static str {
            self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Delayed action (load timeouts)
        ///
        /// Dropped without dispatching if the store closes first.
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect` so that a later [`Effect::Cancel`] with `id` can stop it
        Cancellable {
            /// Cancellation id
            id: EffectId,
            /// Effect to run
            effect: Box<Effect<Action>>,
        },

        /// Stop every in-flight effect started under `id`
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Fire-and-forget work that never feeds an action back
        ///
        /// Used for host callbacks (ready notifications, scrolling) where the
        /// reducer only needs the call to happen.
        #[must_use]
        pub fn run<F>(f: F) -> Effect<Action>
        where
            F: FnOnce() + Send + 'static,
            Action: 'static,
        {
            Effect::Future(Box::pin(async move {
                f();
                None
            }))
        }

        /// Make this effect cancellable under `id`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All host dependencies are abstracted behind traits and injected
/// via the Environment parameter, so reducers stay deterministic under test.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use unit_frame_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Viewport trait - the host window the frame is embedded in
    ///
    /// Scroll restoration and scroll-to-offset requests coming from the
    /// embedded document are forwarded here.
    pub trait Viewport: Send + Sync {
        /// Current vertical scroll position of the host window
        fn scroll_y(&self) -> f64;

        /// Scroll the host window to the given vertical position
        fn scroll_to(&self, y: f64);

        /// Offset of the element with `element_id` from the top of the document,
        /// or `None` when the element is not mounted
        fn element_offset_top(&self, element_id: &str) -> Option<f64>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, EffectId};
    use super::environment::{Clock, SystemClock};
    use std::time::Duration;

    #[test]
    fn test_effect_debug_hides_future() {
        let effect: Effect<u8> = Effect::run(|| {});
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn test_effect_debug_delay() {
        let effect = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(7_u8),
        };
        let rendered = format!("{effect:?}");
        assert!(rendered.contains("Effect::Delay"));
        assert!(rendered.contains('7'));
    }

    #[test]
    fn test_cancellable_wraps_effect() {
        const TIMEOUT: EffectId = EffectId::new("timeout");

        let effect = Effect::Delay {
            duration: Duration::from_secs(1),
            action: Box::new(1_u8),
        }
        .cancellable(TIMEOUT);

        assert!(matches!(
            &effect,
            Effect::Cancellable { id, effect } if *id == TIMEOUT && matches!(**effect, Effect::Delay { .. })
        ));
        assert_eq!(
            format!("{:?}", Effect::<u8>::Cancel(TIMEOUT)),
            r#"Effect::Cancel(EffectId("timeout"))"#
        );
        assert_eq!(TIMEOUT.to_string(), "timeout");
        assert!(Effect::<u8>::None.is_none());
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
