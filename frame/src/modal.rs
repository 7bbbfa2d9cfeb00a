//! Modal content provider state machine.
//!
//! The embedded document asks for an overlay with a `plugin.modal` message.
//! The payload shape is decided once, here, when the request arrives: inline
//! markup beats a second URL, and a request carrying neither opens nothing.
//! The renderer only ever matches on [`OverlayPayload`].

use crate::callback::Callback;
use crate::tree::TrustedMarkup;
use serde::{Deserialize, Serialize};
use unit_frame_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use unit_frame_runtime::metrics::OverlayMetrics;

/// Overlay request as posted by the embedded document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalRequest {
    /// Dialog title
    #[serde(default)]
    pub title: Option<String>,
    /// Inline markup, already sanitized upstream
    #[serde(default)]
    pub body: Option<String>,
    /// Document to load in a second frame
    #[serde(default)]
    pub url: Option<String>,
}

/// What the overlay shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverlayPayload {
    /// Nothing to show
    #[default]
    None,
    /// Inline markup wrapped in a container
    Body(TrustedMarkup),
    /// A second, borderless frame
    Url {
        /// Document URL
        url: String,
        /// Accessible title of the frame
        title: Option<String>,
    },
}

impl OverlayPayload {
    /// Decide the payload shape of a request. Empty strings count as absent.
    #[must_use]
    pub fn from_request(request: &ModalRequest) -> Self {
        let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_owned);

        if let Some(body) = present(&request.body) {
            Self::Body(TrustedMarkup::new(body))
        } else if let Some(url) = present(&request.url) {
            Self::Url {
                url,
                title: request.title.clone(),
            }
        } else {
            Self::None
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Body(_) => "body",
            Self::Url { .. } => "url",
        }
    }
}

/// Modal provider state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalState {
    /// Whether the overlay is open
    pub open: bool,
    /// Dialog title
    pub title: Option<String>,
    /// Content
    pub payload: OverlayPayload,
}

impl ModalState {
    /// Snapshot handed to the renderer.
    #[must_use]
    pub fn snapshot(&self, on_dismiss: &Callback) -> OverlayState {
        OverlayState {
            is_open: self.open,
            title: self.title.clone(),
            payload: self.payload.clone(),
            on_dismiss: on_dismiss.clone(),
        }
    }
}

/// Overlay state as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayState {
    /// Whether the overlay should be shown
    pub is_open: bool,
    /// Dialog title
    pub title: Option<String>,
    /// Content
    pub payload: OverlayPayload,
    /// Closes the overlay
    pub on_dismiss: Callback,
}

impl OverlayState {
    /// A closed overlay.
    #[must_use]
    pub fn closed(on_dismiss: Callback) -> Self {
        Self {
            is_open: false,
            title: None,
            payload: OverlayPayload::None,
            on_dismiss,
        }
    }

    /// An open overlay with the payload decided from `request`.
    #[must_use]
    pub fn open(request: &ModalRequest, on_dismiss: Callback) -> Self {
        Self {
            is_open: true,
            title: request.title.clone(),
            payload: OverlayPayload::from_request(request),
            on_dismiss,
        }
    }

    /// Inline markup, when that is the payload.
    #[must_use]
    pub const fn body_markup(&self) -> Option<&TrustedMarkup> {
        match &self.payload {
            OverlayPayload::Body(markup) => Some(markup),
            _ => None,
        }
    }

    /// Second frame URL, when that is the payload.
    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        match &self.payload {
            OverlayPayload::Url { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Modal provider actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// The embedded document asked for the overlay
    Requested(ModalRequest),
    /// The dismiss control was used
    Dismissed,
}

/// Modal provider reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalReducer;

impl Reducer for ModalReducer {
    type State = ModalState;
    type Action = ModalAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ModalAction::Requested(request) => {
                let payload = OverlayPayload::from_request(&request);
                if matches!(payload, OverlayPayload::None) {
                    tracing::warn!("Overlay requested without a body or url; ignoring");
                } else {
                    tracing::debug!(kind = payload.kind(), "Overlay opened");
                    OverlayMetrics::record_opened(payload.kind());
                    state.open = true;
                    state.title = request.title;
                    state.payload = payload;
                }
            },
            ModalAction::Dismissed => {
                if state.open {
                    tracing::debug!("Overlay dismissed");
                    OverlayMetrics::record_dismissed();
                }
                *state = ModalState::default();
            },
        }

        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_frame_testing::{assertions, ReducerTest};

    fn request(body: Option<&str>, url: Option<&str>) -> ModalRequest {
        ModalRequest {
            title: Some("test-modal-title".to_string()),
            body: body.map(str::to_owned),
            url: url.map(str::to_owned),
        }
    }

    #[test]
    fn test_body_wins_over_url() {
        let payload = OverlayPayload::from_request(&request(Some("test-body"), Some("test-modal-url")));
        assert_eq!(payload, OverlayPayload::Body(TrustedMarkup::new("test-body")));
    }

    #[test]
    fn test_empty_body_falls_back_to_url() {
        let payload = OverlayPayload::from_request(&request(Some(""), Some("test-modal-url")));
        assert_eq!(
            payload,
            OverlayPayload::Url {
                url: "test-modal-url".to_string(),
                title: Some("test-modal-title".to_string()),
            }
        );
    }

    #[test]
    fn test_neither_is_none() {
        assert_eq!(OverlayPayload::from_request(&request(None, Some(""))), OverlayPayload::None);
    }

    #[test]
    fn test_request_opens_overlay() {
        ReducerTest::new(ModalReducer)
            .with_env(())
            .given_state(ModalState::default())
            .when_action(ModalAction::Requested(request(None, Some("test-modal-url"))))
            .then_state(|state| {
                assert!(state.open);
                assert_eq!(state.title.as_deref(), Some("test-modal-title"));
                assert_eq!(state.payload.kind(), "url");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_empty_request_keeps_overlay_closed() {
        ReducerTest::new(ModalReducer)
            .with_env(())
            .given_state(ModalState::default())
            .when_action(ModalAction::Requested(ModalRequest::default()))
            .then_state(|state| assert_eq!(*state, ModalState::default()))
            .run();
    }

    #[test]
    fn test_dismiss_resets_state() {
        let open = ModalState {
            open: true,
            title: Some("t".to_string()),
            payload: OverlayPayload::Body(TrustedMarkup::new("<b>x</b>")),
        };

        ReducerTest::new(ModalReducer)
            .with_env(())
            .given_state(open)
            .when_action(ModalAction::Dismissed)
            .then_state(|state| assert!(!state.open))
            .run();
    }

    #[test]
    fn test_snapshot_accessors() {
        let on_dismiss = Callback::noop();
        let overlay = OverlayState::open(&request(Some("test-body"), None), on_dismiss.clone());
        assert_eq!(overlay.body_markup().map(TrustedMarkup::as_str), Some("test-body"));
        assert_eq!(overlay.target_url(), None);
        assert_eq!(overlay.on_dismiss, on_dismiss);

        let closed = OverlayState::closed(Callback::noop());
        assert!(!closed.is_open);
        assert!(closed.body_markup().is_none());
    }
}
