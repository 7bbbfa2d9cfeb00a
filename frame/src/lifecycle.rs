//! IFrame lifecycle provider state machine.
//!
//! One [`IFrameState`] exists per mount of an [`EmbedRequest`] identity. It
//! settles at most once: either the embedded document reports a positive
//! height (loaded, `on_ready` fires) or it fails first (native load event
//! before any height, or the optional load timeout).

use crate::callback::Callback;
use crate::message::FrameMessage;
use crate::request::{EmbedIdentity, EmbedRequest};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use unit_frame_core::environment::{Clock, Viewport};
use unit_frame_core::effect::{Effect, EffectId};
use unit_frame_core::{reducer::Reducer, smallvec, DateTime, SmallVec, Utc};
use unit_frame_runtime::metrics::FrameMetrics;

const LOAD_FAILED: &str = "Unit iframe failed to load. Server possibly returned 4xx or 5xx response.";

/// Cancellation id of the pending load timeout.
pub const LOAD_TIMEOUT: EffectId = EffectId::new("unit_frame.load_timeout");

/// State owned by one lifecycle provider instance.
#[derive(Debug, Clone, PartialEq)]
pub struct IFrameState {
    /// Identity this state was created for
    pub identity: EmbedIdentity,
    /// The embedded document reported a successful load
    pub has_loaded: bool,
    /// The embedded document failed to load
    pub has_errored: bool,
    /// Current content height in CSS pixels
    pub frame_height: u32,
    /// Host scroll position remembered while a video is full-screen
    pub window_top_offset: Option<f64>,
    /// When the frame was mounted
    pub mounted_at: Option<DateTime<Utc>>,
    /// When the load signal arrived
    pub loaded_at: Option<DateTime<Utc>>,
    on_ready: Option<Callback>,
}

impl IFrameState {
    /// Fresh state for a mount of `request`.
    #[must_use]
    pub fn new(request: &EmbedRequest, initial_height: u32) -> Self {
        Self {
            identity: request.identity(),
            has_loaded: false,
            has_errored: false,
            frame_height: initial_height,
            window_top_offset: None,
            mounted_at: None,
            loaded_at: None,
            on_ready: request.on_ready.clone(),
        }
    }

    /// Whether the mount has either loaded or errored.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.has_loaded || self.has_errored
    }

    /// Snapshot handed to the renderer.
    #[must_use]
    pub fn snapshot(&self, on_frame_loaded: &Callback) -> LifecycleState {
        LifecycleState {
            has_loaded: self.has_loaded,
            has_errored: self.has_errored,
            frame_height: self.frame_height,
            on_frame_loaded: on_frame_loaded.clone(),
        }
    }
}

/// Lifecycle state as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleState {
    /// The frame finished loading
    pub has_loaded: bool,
    /// The frame failed to load
    pub has_errored: bool,
    /// Height bound to the primary frame
    pub frame_height: u32,
    /// Handler for the frame's native load event
    pub on_frame_loaded: Callback,
}

impl LifecycleState {
    /// A mount that has neither loaded nor errored.
    #[must_use]
    pub const fn loading(frame_height: u32, on_frame_loaded: Callback) -> Self {
        Self {
            has_loaded: false,
            has_errored: false,
            frame_height,
            on_frame_loaded,
        }
    }
}

/// Lifecycle provider actions.
#[derive(Debug, Clone, PartialEq)]
pub enum IFrameAction {
    /// The primary frame was mounted
    Mounted,
    /// The frame element fired its native load event
    NativeLoad,
    /// The embedded document reported its content height
    Resized {
        /// Height in CSS pixels
        height: u32,
    },
    /// A video in the embedded document toggled full-screen mode
    VideoFullScreenToggled {
        /// Whether full-screen was entered
        open: bool,
    },
    /// The embedded document asked to scroll the host to an offset
    ScrollRequested {
        /// Offset from the top of the frame
        offset: f64,
    },
    /// The load timeout elapsed
    LoadTimedOut,
}

impl IFrameAction {
    /// Lifecycle action for a cross-frame message, if it is one.
    #[must_use]
    pub const fn from_message(message: &FrameMessage) -> Option<Self> {
        match *message {
            FrameMessage::Resize { height } => Some(Self::Resized { height }),
            FrameMessage::VideoFullScreen { open } => Some(Self::VideoFullScreenToggled { open }),
            FrameMessage::ScrollOffset { offset } => Some(Self::ScrollRequested { offset }),
            FrameMessage::Modal(_) | FrameMessage::Ignored => None,
        }
    }
}

/// Dependencies of the lifecycle reducer.
pub struct FrameEnvironment<C, V> {
    /// Clock for load timestamps
    pub clock: C,
    /// Host window
    pub viewport: Arc<V>,
}

impl<C, V> FrameEnvironment<C, V> {
    /// Create an environment.
    pub fn new(clock: C, viewport: Arc<V>) -> Self {
        Self { clock, viewport }
    }
}

impl<C: Clone, V> Clone for FrameEnvironment<C, V> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            viewport: Arc::clone(&self.viewport),
        }
    }
}

/// Lifecycle reducer.
pub struct IFrameReducer<C, V> {
    load_timeout: Option<Duration>,
    _environment: PhantomData<fn() -> (C, V)>,
}

impl<C, V> IFrameReducer<C, V> {
    /// Create a reducer that never times out.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            load_timeout: None,
            _environment: PhantomData,
        }
    }

    /// Flag the mount as errored if it has not loaded within `timeout`.
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Stops the pending load timeout once the mount has settled.
    fn cancel_load_timeout(&self, effects: &mut SmallVec<[Effect<IFrameAction>; 4]>) {
        if self.load_timeout.is_some() {
            effects.push(Effect::Cancel(LOAD_TIMEOUT));
        }
    }
}

impl<C, V> Default for IFrameReducer<C, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, V> Clone for IFrameReducer<C, V> {
    fn clone(&self) -> Self {
        Self {
            load_timeout: self.load_timeout,
            _environment: PhantomData,
        }
    }
}

impl<C, V> std::fmt::Debug for IFrameReducer<C, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IFrameReducer")
            .field("load_timeout", &self.load_timeout)
            .finish()
    }
}

impl<C, V> Reducer for IFrameReducer<C, V>
where
    C: Clock,
    V: Viewport + 'static,
{
    type State = IFrameState;
    type Action = IFrameAction;
    type Environment = FrameEnvironment<C, V>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            IFrameAction::Mounted => {
                state.mounted_at = Some(env.clock.now());
                tracing::debug!(
                    source_url = %state.identity.source_url,
                    correlation_id = %state.identity.correlation_id,
                    "Unit iframe mounted"
                );

                match self.load_timeout {
                    Some(duration) if !state.is_settled() => smallvec![Effect::Delay {
                        duration,
                        action: Box::new(IFrameAction::LoadTimedOut),
                    }
                    .cancellable(LOAD_TIMEOUT)],
                    _ => smallvec![Effect::None],
                }
            },

            IFrameAction::NativeLoad => {
                let mut effects: SmallVec<[Effect<Self::Action>; 4]> = SmallVec::new();
                if !state.is_settled() {
                    state.has_errored = true;
                    tracing::error!(
                        source_url = %state.identity.source_url,
                        correlation_id = %state.identity.correlation_id,
                        "{LOAD_FAILED}"
                    );
                    FrameMetrics::record_errored("native_load");
                    self.cancel_load_timeout(&mut effects);
                }

                if effects.is_empty() {
                    effects.push(Effect::None);
                }
                effects
            },

            IFrameAction::Resized { height } => {
                state.frame_height = height;
                let mut effects: SmallVec<[Effect<Self::Action>; 4]> = SmallVec::new();

                if let Some(top) = state.window_top_offset {
                    let viewport = Arc::clone(&env.viewport);
                    effects.push(Effect::run(move || viewport.scroll_to(top)));
                }

                if height > 0 && !state.is_settled() {
                    let now = env.clock.now();
                    let latency = state
                        .mounted_at
                        .and_then(|mounted| (now - mounted).to_std().ok())
                        .unwrap_or_default();

                    state.has_loaded = true;
                    state.loaded_at = Some(now);
                    tracing::info!(
                        source_url = %state.identity.source_url,
                        correlation_id = %state.identity.correlation_id,
                        ?latency,
                        "Unit iframe loaded"
                    );
                    FrameMetrics::record_loaded(latency);
                    self.cancel_load_timeout(&mut effects);

                    if let Some(on_ready) = state.on_ready.clone() {
                        effects.push(Effect::run(move || on_ready.invoke()));
                    }
                }

                if effects.is_empty() {
                    effects.push(Effect::None);
                }
                effects
            },

            IFrameAction::VideoFullScreenToggled { open } => {
                state.window_top_offset = open.then(|| env.viewport.scroll_y());
                tracing::trace!(open, "Video full-screen toggled");
                smallvec![Effect::None]
            },

            IFrameAction::ScrollRequested { offset } => {
                let viewport = Arc::clone(&env.viewport);
                let element_id = state.identity.element_id.clone();

                smallvec![Effect::run(move || {
                    match viewport.element_offset_top(&element_id) {
                        Some(top) => viewport.scroll_to(offset + top),
                        None => tracing::debug!(%element_id, "Scroll requested for unmounted frame"),
                    }
                })]
            },

            IFrameAction::LoadTimedOut => {
                if !state.is_settled() {
                    state.has_errored = true;
                    tracing::error!(
                        source_url = %state.identity.source_url,
                        correlation_id = %state.identity.correlation_id,
                        timeout = ?self.load_timeout,
                        "Unit iframe did not report a load before the timeout"
                    );
                    FrameMetrics::record_errored("timeout");
                }
                smallvec![Effect::None]
            },
        }
    }
}
