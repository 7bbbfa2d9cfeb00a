//! Integration tests for the content frame renderer
//!
//! Renders against fixed provider snapshots and queries the resulting tree
//! the way a host adapter or UI test would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use unit_frame::tree::{Frame, FrameStyle, ReferrerPolicy, Scrolling, TrustedMarkup};
use unit_frame::{
    dispatch, render, render_with, Callback, ContentFrameProps, EmbedRequest, FeaturePolicy,
    FrameConfig, FrameEnvironment, IFrameBehavior, LifecycleState, ModalIFrameData, ModalRequest,
    Node, NodeKind, OverlayPayload, OverlayState, CONTENT_IFRAME_TEST_ID, IFRAME_FEATURE_POLICY,
};
use unit_frame_testing::{test_clock, RecordingViewport};

// ============================================================================
// Test Fixtures
// ============================================================================

struct Fixture {
    props: ContentFrameProps,
    on_frame_loaded: Callback,
    on_dismiss: Callback,
}

impl Fixture {
    fn new() -> Self {
        let request = EmbedRequest::new("test-iframe-url", "test-id", "test-element-id")
            .on_ready(Callback::noop());
        Self {
            props: ContentFrameProps::new(request)
                .loading_message("test-loading-message")
                .title("test-title"),
            on_frame_loaded: Callback::noop(),
            on_dismiss: Callback::noop(),
        }
    }

    fn lifecycle(&self, has_loaded: bool, has_errored: bool) -> LifecycleState {
        LifecycleState {
            has_loaded,
            has_errored,
            frame_height: 20,
            on_frame_loaded: self.on_frame_loaded.clone(),
        }
    }

    fn closed(&self) -> OverlayState {
        OverlayState::closed(self.on_dismiss.clone())
    }

    fn with_body(&self) -> OverlayState {
        OverlayState::open(
            &ModalRequest {
                title: None,
                body: Some("test-body".to_string()),
                url: None,
            },
            self.on_dismiss.clone(),
        )
    }

    fn with_url(&self) -> OverlayState {
        OverlayState::open(
            &ModalRequest {
                title: Some("test-modal-title".to_string()),
                body: None,
                url: Some("test-modal-url".to_string()),
            },
            self.on_dismiss.clone(),
        )
    }
}

// ============================================================================
// Primary region
// ============================================================================

#[test]
fn test_error_surface_when_errored() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(false, true), &fixture.closed());

    assert_eq!(tree.count(NodeKind::ErrorPage), 1);
    assert_eq!(tree.count(NodeKind::LoadingIndicator), 0);
    assert!(tree.find_by_test_id(CONTENT_IFRAME_TEST_ID).is_empty());
}

#[test]
fn test_loading_indicator_carries_message() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(false, false), &fixture.closed());

    let indicators = tree.find_by_kind(NodeKind::LoadingIndicator);
    assert_eq!(indicators.len(), 1);
    match indicators[0] {
        Node::LoadingIndicator { sr_message } => assert_eq!(sr_message, "test-loading-message"),
        other => panic!("unexpected node: {other:?}"),
    }
    assert_eq!(tree.count(NodeKind::ErrorPage), 0);
}

#[test]
fn test_loaded_hides_loading_and_error() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(true, false), &fixture.closed());

    assert_eq!(tree.count(NodeKind::LoadingIndicator), 0);
    assert_eq!(tree.count(NodeKind::ErrorPage), 0);
}

#[test]
fn test_primary_frame_attributes() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(true, false), &fixture.closed());

    let frames = tree.find_by_test_id(CONTENT_IFRAME_TEST_ID);
    assert_eq!(frames.len(), 1);

    let expected = Frame {
        src: "test-iframe-url".to_string(),
        title: Some("test-title".to_string()),
        allow: IFRAME_FEATURE_POLICY.into(),
        allow_full_screen: true,
        scrolling: Some(Scrolling::No),
        referrer_policy: Some(ReferrerPolicy::Origin),
        id: Some("test-element-id".to_string()),
        height: Some(20),
        frame_border: None,
        style: None,
        on_load: Some(fixture.on_frame_loaded.clone()),
        test_id: Some(CONTENT_IFRAME_TEST_ID),
    };
    assert_eq!(*frames[0], expected);
}

#[test]
fn test_hidden_renders_nothing() {
    let fixture = Fixture::new();
    let props = fixture.props.clone().visibility(false);

    for (loaded, errored) in [(false, false), (false, true), (true, false), (true, true)] {
        let tree = render(&props, &fixture.lifecycle(loaded, errored), &fixture.with_body());
        assert_eq!(tree.count(NodeKind::LoadingIndicator), 0);
        assert_eq!(tree.count(NodeKind::ErrorPage), 0);
        assert!(tree.find_by_test_id(CONTENT_IFRAME_TEST_ID).is_empty());
        assert!(tree.modal().is_none());
    }
}

// ============================================================================
// Overlay region
// ============================================================================

#[test]
fn test_closed_overlay_not_rendered() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(true, false), &fixture.closed());
    assert_eq!(tree.count(NodeKind::Modal), 0);
}

#[test]
fn test_body_overlay_wraps_markup() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(true, false), &fixture.with_body());

    let modal = tree.modal().expect("overlay rendered");
    assert_eq!(modal.on_close, fixture.on_dismiss);
    assert_eq!(
        *modal.body,
        Node::Container {
            class_name: "unit-modal",
            children: vec![Node::Markup(TrustedMarkup::new("test-body"))],
        }
    );
}

#[test]
fn test_url_overlay_renders_second_frame() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(false, false), &fixture.with_url());

    let modal = tree.modal().expect("overlay rendered");
    assert!(modal.open);
    assert_eq!(modal.on_close, fixture.on_dismiss);
    assert_eq!(modal.dialog_class, "modal-lti");

    let expected = Frame {
        title: Some("test-modal-title".to_string()),
        frame_border: Some(0),
        style: Some(FrameStyle::fill_viewport()),
        ..Frame::new("test-modal-url", IFRAME_FEATURE_POLICY.into())
    };
    assert_eq!(*modal.body, Node::Frame(expected));

    // The overlay shows next to the loading indicator.
    assert_eq!(tree.count(NodeKind::LoadingIndicator), 1);
}

#[test]
fn test_body_wins_over_url() {
    let fixture = Fixture::new();
    let overlay = OverlayState::open(
        &ModalRequest {
            title: Some("test-modal-title".to_string()),
            body: Some("test-body".to_string()),
            url: Some("test-modal-url".to_string()),
        },
        fixture.on_dismiss.clone(),
    );
    assert!(matches!(overlay.payload, OverlayPayload::Body(_)));

    let tree = render(&fixture.props, &fixture.lifecycle(true, false), &overlay);
    // Only the primary frame; the overlay holds no second frame.
    assert_eq!(tree.count(NodeKind::Frame), 1);
    assert_eq!(tree.count(NodeKind::Markup), 1);
}

#[test]
fn test_trusted_origin_reaches_both_frames() {
    let fixture = Fixture::new();
    let props = fixture
        .props
        .clone()
        .policy(FeaturePolicy::same_origin().trust_origin("https://lti.example"));
    let tree = render(&props, &fixture.lifecycle(true, false), &fixture.with_url());

    for node in tree.find_by_kind(NodeKind::Frame) {
        let Node::Frame(frame) = node else {
            panic!("not a frame")
        };
        assert!(frame.allow.contains("camera 'self' https://lti.example"));
    }
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_html_output() {
    let fixture = Fixture::new();
    let tree = render(&fixture.props, &fixture.lifecycle(true, false), &fixture.with_url());
    let html = tree.to_html();

    assert!(html.starts_with(r#"<div class="unit-iframe-wrapper"><iframe src="test-iframe-url""#));
    assert!(html.contains(r#"referrerpolicy="origin""#));
    assert!(html.contains(r#"id="test-element-id""#));
    assert!(html.contains(r#"data-testid="content-iframe-test-id""#));
    assert!(html.contains("allow=\"fullscreen &#39;self&#39;;"));
    assert!(html.contains(r#"style="width: 100%; height: 100vh""#));
    assert!(html.contains(r#"class="modal-lti""#));
}

#[test]
fn test_rendering_is_idempotent() {
    let fixture = Fixture::new();
    let lifecycle = fixture.lifecycle(true, false);
    let overlay = fixture.with_url();

    assert_eq!(
        render(&fixture.props, &lifecycle, &overlay),
        render(&fixture.props, &lifecycle, &overlay)
    );
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_full_flow_through_providers() {
    let viewport = Arc::new(RecordingViewport::new().with_element("test-element-id", 100.0));
    let env = FrameEnvironment::new(test_clock(), Arc::clone(&viewport));
    let fixture = Fixture::new();
    let behavior = IFrameBehavior::mount(&fixture.props.request, &FrameConfig::default(), env)
        .await
        .unwrap();
    let mut modal = ModalIFrameData::new();

    let tree = render_with(&fixture.props, &behavior, &modal).await;
    assert_eq!(tree.count(NodeKind::LoadingIndicator), 1);

    dispatch(&behavior, &modal, r#"{"type":"plugin.resize","payload":{"height":640}}"#)
        .await
        .unwrap();
    dispatch(
        &behavior,
        &modal,
        r#"{"type":"plugin.modal","payload":{"body":"<p>Check your answer</p>"}}"#,
    )
    .await
    .unwrap();

    let tree = render_with(&fixture.props, &behavior, &modal).await;
    let frame = tree.find_by_test_id(CONTENT_IFRAME_TEST_ID)[0];
    assert_eq!(frame.height, Some(640));
    assert_eq!(frame.on_load, Some(behavior.on_frame_loaded()));
    assert!(tree.to_html().contains("<p>Check your answer</p>"));

    // Same provider state, same tree.
    assert_eq!(tree, render_with(&fixture.props, &behavior, &modal).await);

    let modal_node = tree.modal().unwrap();
    modal_node.on_close.invoke();
    modal.process_events().await.unwrap();

    let tree = render_with(&fixture.props, &behavior, &modal).await;
    assert!(tree.modal().is_none());
    assert_eq!(tree.count(NodeKind::Frame), 1);
}
