//! Unit frame demo binary
//!
//! Mounts a content frame, replays the messages an embedded unit would post,
//! and prints the HTML of every render pass.
//!
//! # Running the Example
//!
//! ```bash
//! UNIT_FRAME_LOAD_TIMEOUT_MS=5000 cargo run -p unit-frame-demo
//! ```

#![allow(missing_docs)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unit_frame::{
    dispatch, render_with, Callback, ContentFrameProps, EmbedRequest, FeaturePolicy, FrameConfig,
    FrameEnvironment, IFrameBehavior, ModalIFrameData,
};
use unit_frame_core::environment::{SystemClock, Viewport};
use unit_frame_runtime::metrics::MetricsRecorder;

const ELEMENT_ID: &str = "unit-iframe";

/// Host window without a real document; scroll calls are logged.
#[derive(Debug, Default)]
struct HeadlessViewport {
    scroll_y: AtomicU64,
}

impl Viewport for HeadlessViewport {
    fn scroll_y(&self) -> f64 {
        f64::from_bits(self.scroll_y.load(Ordering::Relaxed))
    }

    fn scroll_to(&self, y: f64) {
        tracing::info!(y, "Host window scrolled");
        self.scroll_y.store(y.to_bits(), Ordering::Relaxed);
    }

    fn element_offset_top(&self, element_id: &str) -> Option<f64> {
        (element_id == ELEMENT_ID).then_some(120.0)
    }
}

/// Messages an embedded unit posts while it loads and runs.
const MESSAGES: &[&str] = &[
    r#"{"type":"plugin.resize","payload":{"height":0}}"#,
    r#"{"type":"plugin.resize","payload":{"height":812}}"#,
    r#"{"event_name":"edx.ui.lms.link_clicked"}"#,
    r#"{"offset":340}"#,
    r#"{"type":"plugin.videoFullScreen","payload":{"open":true}}"#,
    r#"{"type":"plugin.resize","payload":{"height":1024}}"#,
    r#"{"type":"plugin.videoFullScreen","payload":{"open":false}}"#,
    r#"{"type":"plugin.modal","payload":{"title":"Launch tool","url":"https://lti.example/launch?x=1&y=2"}}"#,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unit_frame=debug,unit_frame_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut recorder = MetricsRecorder::new();
    recorder.install()?;

    let config = FrameConfig::try_from_env()?;
    tracing::info!(?config, "Loaded configuration");

    let request = EmbedRequest::new(
        "https://lms.example/xblock/block-v1:demo+type@vertical+block@unit1",
        "block-v1:demo+type@vertical+block@unit1",
        ELEMENT_ID,
    )
    .on_ready(Callback::new(|| tracing::info!("Unit ready")));

    let props = ContentFrameProps::new(request.clone())
        .loading_message("Loading learning sequence...")
        .title("Unit 1: Getting started")
        .policy(FeaturePolicy::same_origin());

    let env = FrameEnvironment::new(SystemClock, Arc::new(HeadlessViewport::default()));
    let behavior = IFrameBehavior::mount(&request, &config, env).await?;
    let mut modal = ModalIFrameData::new();

    println!("=== Unit Frame Demo ===\n");
    println!("{}\n", render_with(&props, &behavior, &modal).await.to_html());

    for raw in MESSAGES {
        println!(">>> {raw}");
        if let Err(error) = dispatch(&behavior, &modal, raw).await {
            tracing::warn!(%error, "Message rejected");
        }
        println!("{}\n", render_with(&props, &behavior, &modal).await.to_html());
    }

    println!(">>> dismiss overlay");
    modal.on_dismiss().invoke();
    modal.process_events().await?;
    println!("{}\n", render_with(&props, &behavior, &modal).await.to_html());

    println!(">>> hide");
    let hidden = props.clone().visibility(false);
    println!("{:?}\n", render_with(&hidden, &behavior, &modal).await.to_html());

    if let Err(error) = behavior.retire().await {
        tracing::warn!(%error, "Frame retired with effects still pending");
    }

    if let Some(metrics) = recorder.render() {
        println!("=== Metrics ===\n{metrics}");
    }

    Ok(())
}
