//! The content frame renderer.
//!
//! [`render`] is a pure function of the caller's props and the two provider
//! snapshots. The primary region follows a fixed decision table:
//!
//! | visible | `has_loaded` | `has_errored` | primary region    |
//! |---------|--------------|---------------|-------------------|
//! | false   | any          | any           | nothing           |
//! | true    | false        | true          | error surface     |
//! | true    | false        | false         | loading indicator |
//! | true    | true         | any           | the embed frame   |
//!
//! The overlay is rendered next to the primary region whenever it is open
//! and the embed is visible at all.

use crate::lifecycle::LifecycleState;
use crate::modal::{OverlayPayload, OverlayState};
use crate::policy::FeaturePolicy;
use crate::provider::{LifecycleSource, OverlaySource};
use crate::request::EmbedRequest;
use crate::tree::{
    Frame, FrameStyle, Modal, Node, ReferrerPolicy, RenderTree, Scrolling, CONTENT_IFRAME_TEST_ID,
    IFRAME_WRAPPER_CLASS, MODAL_CONTAINER_CLASS, MODAL_DIALOG_CLASS,
};
use unit_frame_runtime::metrics::FrameMetrics;

/// Caller-supplied inputs of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFrameProps {
    /// What to embed
    pub request: EmbedRequest,
    /// Whether the embed subsystem renders at all
    pub visible: bool,
    /// Screen-reader message of the loading indicator
    pub loading_message: String,
    /// Accessible title of the primary frame
    pub title: String,
    /// Permission allow-list for both frames
    pub policy: FeaturePolicy,
}

impl ContentFrameProps {
    /// Visible props with an empty title and loading message.
    #[must_use]
    pub fn new(request: EmbedRequest) -> Self {
        Self {
            request,
            visible: true,
            loading_message: String::new(),
            title: String::new(),
            policy: FeaturePolicy::same_origin(),
        }
    }

    /// Set the visibility flag.
    #[must_use]
    pub const fn visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the loading indicator message.
    #[must_use]
    pub fn loading_message(mut self, message: impl Into<String>) -> Self {
        self.loading_message = message.into();
        self
    }

    /// Set the primary frame title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the permission allow-list.
    #[must_use]
    pub fn policy(mut self, policy: FeaturePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// What the primary region shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryRegion {
    /// Nothing at all
    Hidden,
    /// The error surface
    Error,
    /// The loading indicator
    Loading,
    /// The embed frame
    Frame,
}

impl PrimaryRegion {
    /// Evaluate the decision table.
    #[must_use]
    pub const fn decide(visible: bool, lifecycle: &LifecycleState) -> Self {
        match (visible, lifecycle.has_loaded, lifecycle.has_errored) {
            (false, _, _) => Self::Hidden,
            (true, true, _) => Self::Frame,
            (true, false, true) => Self::Error,
            (true, false, false) => Self::Loading,
        }
    }

    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Error => "error",
            Self::Loading => "loading",
            Self::Frame => "frame",
        }
    }
}

/// Build the render tree for one pass.
#[must_use]
pub fn render(
    props: &ContentFrameProps,
    lifecycle: &LifecycleState,
    overlay: &OverlayState,
) -> RenderTree {
    let primary = match PrimaryRegion::decide(props.visible, lifecycle) {
        PrimaryRegion::Hidden => return RenderTree::empty(),
        PrimaryRegion::Error => Node::ErrorPage,
        PrimaryRegion::Loading => Node::LoadingIndicator {
            sr_message: props.loading_message.clone(),
        },
        PrimaryRegion::Frame => Node::Container {
            class_name: IFRAME_WRAPPER_CLASS,
            children: vec![Node::Frame(primary_frame(props, lifecycle))],
        },
    };

    let mut nodes = vec![primary];
    if let Some(modal) = overlay_modal(props, overlay) {
        nodes.push(Node::Modal(modal));
    }
    RenderTree::from_nodes(nodes)
}

/// Query both providers once and render.
pub async fn render_with<L, O>(props: &ContentFrameProps, lifecycle: &L, overlay: &O) -> RenderTree
where
    L: LifecycleSource,
    O: OverlaySource,
{
    let lifecycle = lifecycle.lifecycle_state().await;
    let overlay = overlay.overlay_state().await;

    let region = PrimaryRegion::decide(props.visible, &lifecycle);
    tracing::trace!(region = region.as_str(), overlay_open = overlay.is_open, "Rendering content frame");
    FrameMetrics::record_render(region.as_str());

    render(props, &lifecycle, &overlay)
}

fn primary_frame(props: &ContentFrameProps, lifecycle: &LifecycleState) -> Frame {
    Frame {
        title: Some(props.title.clone()),
        allow_full_screen: true,
        scrolling: Some(Scrolling::No),
        referrer_policy: Some(ReferrerPolicy::Origin),
        id: Some(props.request.element_id.clone()),
        height: Some(lifecycle.frame_height),
        on_load: Some(lifecycle.on_frame_loaded.clone()),
        test_id: Some(CONTENT_IFRAME_TEST_ID),
        ..Frame::new(props.request.source_url.clone(), props.policy.allow_attribute())
    }
}

fn overlay_modal(props: &ContentFrameProps, overlay: &OverlayState) -> Option<Modal> {
    if !overlay.is_open {
        return None;
    }

    let body = match &overlay.payload {
        OverlayPayload::None => return None,
        OverlayPayload::Body(markup) => Node::Container {
            class_name: MODAL_CONTAINER_CLASS,
            children: vec![Node::Markup(markup.clone())],
        },
        OverlayPayload::Url { url, title } => Node::Frame(Frame {
            title: title.clone(),
            frame_border: Some(0),
            style: Some(FrameStyle::fill_viewport()),
            ..Frame::new(url.clone(), props.policy.allow_attribute())
        }),
    };

    Some(Modal {
        open: true,
        title: overlay.title.clone(),
        dialog_class: MODAL_DIALOG_CLASS,
        body: Box::new(body),
        on_close: overlay.on_dismiss.clone(),
    })
}
