//! # Unit Frame
//!
//! Embedded course content: a primary `<iframe>` whose lifecycle is tracked
//! by a provider, an optional overlay requested by the embedded document, and
//! a pure renderer that turns both into a [`RenderTree`].
//!
//! ## Components
//!
//! - **Lifecycle provider** ([`IFrameBehavior`]): loaded / errored flags, the
//!   content height, and the native load handler for one [`EmbedRequest`]
//! - **Modal provider** ([`ModalIFrameData`]): overlay open state and payload
//! - **Renderer** ([`render`]): decision table from the provider snapshots to
//!   the render tree
//!
//! Both providers are reducers running in their own `Store`; cross-frame
//! messages ([`FrameMessage`]) and handler calls become actions.
//!
//! ## Example
//!
//! ```ignore
//! use unit_frame::*;
//!
//! let request = EmbedRequest::new(url, block_id, "unit-iframe").on_ready(Callback::new(on_ready));
//! let props = ContentFrameProps::new(request.clone()).title("Unit 1");
//! let behavior = IFrameBehavior::mount(&request, &FrameConfig::from_env(), env).await?;
//! let modal = ModalIFrameData::new();
//!
//! dispatch(&behavior, &modal, raw_message).await?;
//! let html = render_with(&props, &behavior, &modal).await.to_html();
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod modal;
pub mod policy;
pub mod provider;
pub mod render;
pub mod request;
pub mod tree;

pub use callback::Callback;
pub use config::FrameConfig;
pub use error::FrameError;
pub use lifecycle::{
    FrameEnvironment, IFrameAction, IFrameReducer, IFrameState, LifecycleState, LOAD_TIMEOUT,
};
pub use message::FrameMessage;
pub use modal::{ModalAction, ModalReducer, ModalRequest, ModalState, OverlayPayload, OverlayState};
pub use policy::{Feature, FeaturePolicy, IFRAME_FEATURE_POLICY};
pub use provider::{dispatch, IFrameBehavior, LifecycleSource, ModalIFrameData, OverlaySource};
pub use render::{render, render_with, ContentFrameProps, PrimaryRegion};
pub use request::{EmbedIdentity, EmbedRequest};
pub use tree::{Node, NodeKind, RenderTree, CONTENT_IFRAME_TEST_ID};
