//! # Unit Frame Testing
//!
//! Testing utilities for the unit frame providers.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use unit_frame_testing::{test_clock, RecordingViewport};
//!
//! #[tokio::test]
//! async fn test_scroll_request() {
//!     let viewport = Arc::new(RecordingViewport::new().with_element("unit-iframe", 150.0));
//!     let env = FrameEnvironment::new(test_clock(), Arc::clone(&viewport));
//!     let behavior = IFrameBehavior::mount(&request, &FrameConfig::default(), env).await?;
//!
//!     behavior.handle_raw_message(r#"{"offset":40}"#).await?;
//!     assert_eq!(viewport.scrolls(), vec![190.0]);
//! }
//! ```

use chrono::{DateTime, Utc};
use unit_frame_core::environment::{Clock, Viewport};

pub mod reducer_test;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc, Viewport};
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use unit_frame_testing::mocks::FixedClock;
    /// use unit_frame_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// In-memory host window
    ///
    /// Records every `scroll_to` call so tests can assert on scroll
    /// restoration and scroll-to-offset requests.
    ///
    /// # Example
    ///
    /// ```
    /// use unit_frame_testing::mocks::RecordingViewport;
    /// use unit_frame_core::environment::Viewport;
    ///
    /// let viewport = RecordingViewport::new().with_element("unit-iframe", 120.0);
    /// viewport.scroll_to(80.0);
    /// assert_eq!(viewport.scroll_y(), 80.0);
    /// assert_eq!(viewport.element_offset_top("unit-iframe"), Some(120.0));
    /// assert_eq!(viewport.scrolls(), vec![80.0]);
    /// ```
    #[derive(Debug, Default)]
    pub struct RecordingViewport {
        scroll_y: Mutex<f64>,
        elements: HashMap<String, f64>,
        scrolls: Mutex<Vec<f64>>,
    }

    impl RecordingViewport {
        /// Viewport scrolled to the top with no elements mounted
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Start at the given scroll position
        #[must_use]
        pub fn with_scroll_y(self, y: f64) -> Self {
            self.set_scroll_y(y);
            self
        }

        /// Mount an element at the given offset from the document top
        #[must_use]
        pub fn with_element(mut self, element_id: impl Into<String>, offset_top: f64) -> Self {
            self.elements.insert(element_id.into(), offset_top);
            self
        }

        /// Move the scroll position without recording a scroll call
        /// (the user scrolling)
        pub fn set_scroll_y(&self, y: f64) {
            *self.scroll_y.lock().unwrap_or_else(PoisonError::into_inner) = y;
        }

        /// Every position passed to `scroll_to`, in order
        #[must_use]
        pub fn scrolls(&self) -> Vec<f64> {
            self.scrolls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Viewport for RecordingViewport {
        fn scroll_y(&self) -> f64 {
            *self.scroll_y.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn scroll_to(&self, y: f64) {
            self.set_scroll_y(y);
            self.scrolls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(y);
        }

        fn element_offset_top(&self, element_id: &str) -> Option<f64> {
            self.elements.get(element_id).copied()
        }
    }
}

/// Property-based testing strategies for embed inputs.
pub mod properties {
    use proptest::option;
    use proptest::prelude::*;

    /// Frame source URLs, including the empty string
    pub fn source_url() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "https://[a-z]{1,12}\\.example/[a-z0-9/_-]{0,24}",
            "[a-z-]{1,16}",
        ]
    }

    /// DOM ids
    pub fn element_id() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    /// Free text such as titles and loading messages, with HTML-significant
    /// characters mixed in
    pub fn text() -> impl Strategy<Value = String> {
        "[ -~]{0,32}"
    }

    /// Inline overlay markup; `None` and `Some("")` both mean absent
    pub fn optional_markup() -> impl Strategy<Value = Option<String>> {
        option::of(prop_oneof![Just(String::new()), "<p>[a-z ]{1,20}</p>"])
    }

    /// Overlay URLs; `None` and `Some("")` both mean absent
    pub fn optional_url() -> impl Strategy<Value = Option<String>> {
        option::of(prop_oneof![Just(String::new()), source_url()])
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, RecordingViewport};
pub use reducer_test::{assertions, ReducerTest};
