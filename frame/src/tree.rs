//! Render tree produced by the content frame renderer.
//!
//! The tree is plain data: a host adapter turns it into real DOM nodes, tests
//! query it with [`RenderTree::find_by_kind`] / [`RenderTree::find_by_test_id`],
//! and [`RenderTree::to_html`] serializes it for server-side output.

use crate::callback::Callback;
use std::borrow::Cow;
use std::fmt::{self, Write};

/// Test/automation identity of the primary frame, independent of its DOM id.
pub const CONTENT_IFRAME_TEST_ID: &str = "content-iframe-test-id";

/// Class of the wrapper around the primary frame.
pub const IFRAME_WRAPPER_CLASS: &str = "unit-iframe-wrapper";

/// Class of the container wrapping inline overlay markup.
pub const MODAL_CONTAINER_CLASS: &str = "unit-modal";

/// Dialog class applied to the overlay.
pub const MODAL_DIALOG_CLASS: &str = "modal-lti";

/// Markup the caller vouches for.
///
/// It is emitted verbatim: no escaping, no transformation. Sanitizing it is the
/// job of whoever constructs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrustedMarkup(String);

impl TrustedMarkup {
    /// Wrap already-sanitized markup.
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// The raw markup.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `scrolling` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scrolling {
    /// Never show scrollbars
    No,
}

impl Scrolling {
    /// Attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::No => "no",
        }
    }
}

/// `referrerpolicy` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferrerPolicy {
    /// Send only the origin, never the path
    Origin,
}

impl ReferrerPolicy {
    /// Attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Origin => "origin",
        }
    }
}

/// Inline size of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStyle {
    /// CSS width
    pub width: &'static str,
    /// CSS height
    pub height: &'static str,
}

impl FrameStyle {
    /// Full width, full viewport height.
    #[must_use]
    pub const fn fill_viewport() -> Self {
        Self {
            width: "100%",
            height: "100vh",
        }
    }
}

impl fmt::Display for FrameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "width: {}; height: {}", self.width, self.height)
    }
}

/// An `<iframe>` and its attributes. Unset attributes are not rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Document URL
    pub src: String,
    /// Accessible title
    pub title: Option<String>,
    /// Permission allow-list
    pub allow: Cow<'static, str>,
    /// `allowfullscreen`
    pub allow_full_screen: bool,
    /// `scrolling`
    pub scrolling: Option<Scrolling>,
    /// `referrerpolicy`
    pub referrer_policy: Option<ReferrerPolicy>,
    /// DOM id
    pub id: Option<String>,
    /// Height in CSS pixels
    pub height: Option<u32>,
    /// `frameborder`
    pub frame_border: Option<u8>,
    /// Inline size
    pub style: Option<FrameStyle>,
    /// Native load handler
    pub on_load: Option<Callback>,
    /// `data-testid`
    pub test_id: Option<&'static str>,
}

impl Frame {
    /// A frame with only `src` and `allow` set.
    pub fn new(src: impl Into<String>, allow: Cow<'static, str>) -> Self {
        Self {
            src: src.into(),
            title: None,
            allow,
            allow_full_screen: false,
            scrolling: None,
            referrer_policy: None,
            id: None,
            height: None,
            frame_border: None,
            style: None,
            on_load: None,
            test_id: None,
        }
    }
}

/// Dismissible overlay shown above the embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    /// Always true when rendered; closing removes the node instead
    pub open: bool,
    /// Dialog title
    pub title: Option<String>,
    /// Dialog class
    pub dialog_class: &'static str,
    /// Content
    pub body: Box<Node>,
    /// Dismiss control handler
    pub on_close: Callback,
}

/// Node kinds, for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Spinner with a screen-reader message
    LoadingIndicator,
    /// Generic error surface
    ErrorPage,
    /// `<iframe>`
    Frame,
    /// Overlay
    Modal,
    /// `<div class=..>`
    Container,
    /// Trusted raw markup
    Markup,
}

/// One node of the render tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Loading indicator annotated with a screen-reader message
    LoadingIndicator {
        /// Message announced to assistive technology
        sr_message: String,
    },
    /// Error surface; its content belongs to the host's error page
    ErrorPage,
    /// An embedded frame
    Frame(Frame),
    /// The overlay
    Modal(Modal),
    /// A classed wrapper element
    Container {
        /// Class name
        class_name: &'static str,
        /// Children
        children: Vec<Node>,
    },
    /// Verbatim markup
    Markup(TrustedMarkup),
}

impl Node {
    /// Kind of this node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::LoadingIndicator { .. } => NodeKind::LoadingIndicator,
            Self::ErrorPage => NodeKind::ErrorPage,
            Self::Frame(_) => NodeKind::Frame,
            Self::Modal(_) => NodeKind::Modal,
            Self::Container { .. } => NodeKind::Container,
            Self::Markup(_) => NodeKind::Markup,
        }
    }

    fn visit<'a>(&'a self, out: &mut Vec<&'a Self>) {
        out.push(self);
        match self {
            Self::Container { children, .. } => {
                for child in children {
                    child.visit(out);
                }
            },
            Self::Modal(modal) => modal.body.visit(out),
            _ => {},
        }
    }

    fn write_html(&self, out: &mut String) -> fmt::Result {
        match self {
            Self::LoadingIndicator { sr_message } => {
                out.push_str(r#"<div class="page-loading" role="status"><span class="sr-only">"#);
                escape_into(out, sr_message);
                out.push_str("</span></div>");
            },
            Self::ErrorPage => out.push_str(r#"<div class="error-page" role="alert"></div>"#),
            Self::Frame(frame) => write_frame(out, frame)?,
            Self::Modal(modal) => {
                out.push_str(r#"<div role="dialog" aria-modal="true" class=""#);
                out.push_str(modal.dialog_class);
                out.push('"');
                if let Some(title) = &modal.title {
                    out.push_str(r#" aria-label=""#);
                    escape_into(out, title);
                    out.push('"');
                }
                out.push('>');
                out.push_str(r#"<button type="button" class="modal-close" aria-label="Close"></button>"#);
                modal.body.write_html(out)?;
                out.push_str("</div>");
            },
            Self::Container {
                class_name,
                children,
            } => {
                write!(out, r#"<div class="{class_name}">"#)?;
                for child in children {
                    child.write_html(out)?;
                }
                out.push_str("</div>");
            },
            Self::Markup(markup) => out.push_str(markup.as_str()),
        }
        Ok(())
    }
}

fn write_frame(out: &mut String, frame: &Frame) -> fmt::Result {
    out.push_str("<iframe");
    push_attr(out, "src", &frame.src);
    if let Some(title) = &frame.title {
        push_attr(out, "title", title);
    }
    push_attr(out, "allow", &frame.allow);
    if frame.allow_full_screen {
        out.push_str(" allowfullscreen");
    }
    if let Some(scrolling) = frame.scrolling {
        push_attr(out, "scrolling", scrolling.as_str());
    }
    if let Some(policy) = frame.referrer_policy {
        push_attr(out, "referrerpolicy", policy.as_str());
    }
    if let Some(id) = &frame.id {
        push_attr(out, "id", id);
    }
    if let Some(height) = frame.height {
        write!(out, r#" height="{height}""#)?;
    }
    if let Some(border) = frame.frame_border {
        write!(out, r#" frameborder="{border}""#)?;
    }
    if let Some(style) = frame.style {
        write!(out, r#" style="{style}""#)?;
    }
    if let Some(test_id) = frame.test_id {
        push_attr(out, "data-testid", test_id);
    }
    out.push_str("></iframe>");
    Ok(())
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(out, value);
    out.push('"');
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Output of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTree {
    nodes: Vec<Node>,
}

impl RenderTree {
    /// A tree with no nodes.
    #[must_use]
    pub const fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Build a tree from its top-level nodes.
    #[must_use]
    pub const fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Top-level nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Whether nothing was rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node, depth-first, including overlay content.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.visit(&mut out);
        }
        out
    }

    /// Every node of the given kind.
    #[must_use]
    pub fn find_by_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.descendants()
            .into_iter()
            .filter(|node| node.kind() == kind)
            .collect()
    }

    /// Number of nodes of the given kind.
    #[must_use]
    pub fn count(&self, kind: NodeKind) -> usize {
        self.find_by_kind(kind).len()
    }

    /// Frames carrying the given `data-testid`.
    #[must_use]
    pub fn find_by_test_id(&self, test_id: &str) -> Vec<&Frame> {
        self.descendants()
            .into_iter()
            .filter_map(|node| match node {
                Node::Frame(frame) if frame.test_id.is_some_and(|id| id == test_id) => Some(frame),
                _ => None,
            })
            .collect()
    }

    /// The overlay, if rendered.
    #[must_use]
    pub fn modal(&self) -> Option<&Modal> {
        self.nodes.iter().find_map(|node| match node {
            Node::Modal(modal) => Some(modal),
            _ => None,
        })
    }

    /// Serialize to HTML. Handlers are not part of the markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            // Writing into a String cannot fail
            let _ = node.write_html(&mut out);
        }
        out
    }
}
