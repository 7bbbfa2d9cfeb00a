//! Feature policy descriptor for embedded frames.
//!
//! The `allow` attribute value is a compatibility contract: dependents that
//! build their own frames reuse [`IFRAME_FEATURE_POLICY`] verbatim, and both the
//! primary frame and the overlay's URL frame carry the same value.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Permission allow-list applied to every embedded frame.
///
/// Each capability is scoped to the host's own origin.
pub const IFRAME_FEATURE_POLICY: &str = "fullscreen 'self'; clipboard-read 'self'; \
clipboard-write 'self'; encrypted-media 'self'; microphone 'self'; camera 'self'; \
midi 'self'; geolocation 'self'; autoplay 'self'; payment 'self'";

/// A browser capability the embedded document may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Element full-screen API
    Fullscreen,
    /// Reading from the clipboard
    ClipboardRead,
    /// Writing to the clipboard
    ClipboardWrite,
    /// Encrypted Media Extensions (DRM video)
    EncryptedMedia,
    /// Microphone capture
    Microphone,
    /// Camera capture
    Camera,
    /// Web MIDI
    Midi,
    /// Geolocation
    Geolocation,
    /// Media autoplay
    Autoplay,
    /// Payment Request API
    Payment,
}

impl Feature {
    /// Every feature, in the order it appears in the allow attribute.
    pub const ALL: [Self; 10] = [
        Self::Fullscreen,
        Self::ClipboardRead,
        Self::ClipboardWrite,
        Self::EncryptedMedia,
        Self::Microphone,
        Self::Camera,
        Self::Midi,
        Self::Geolocation,
        Self::Autoplay,
        Self::Payment,
    ];

    /// Directive name used in the `allow` attribute.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Fullscreen => "fullscreen",
            Self::ClipboardRead => "clipboard-read",
            Self::ClipboardWrite => "clipboard-write",
            Self::EncryptedMedia => "encrypted-media",
            Self::Microphone => "microphone",
            Self::Camera => "camera",
            Self::Midi => "midi",
            Self::Geolocation => "geolocation",
            Self::Autoplay => "autoplay",
            Self::Payment => "payment",
        }
    }
}

/// Allow-list builder.
///
/// The default policy renders exactly [`IFRAME_FEATURE_POLICY`]. Trusting an
/// embedded origin extends every directive with that origin.
///
/// ```
/// use unit_frame::policy::{FeaturePolicy, IFRAME_FEATURE_POLICY};
///
/// assert_eq!(FeaturePolicy::default().allow_attribute(), IFRAME_FEATURE_POLICY);
///
/// let trusted = FeaturePolicy::default().trust_origin("https://studio.example.org");
/// assert!(trusted
///     .allow_attribute()
///     .starts_with("fullscreen 'self' https://studio.example.org;"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePolicy {
    trusted_origins: Vec<String>,
}

impl FeaturePolicy {
    /// Policy scoped to the host origin only.
    #[must_use]
    pub const fn same_origin() -> Self {
        Self {
            trusted_origins: Vec::new(),
        }
    }

    /// Extend every directive with an explicitly trusted origin.
    #[must_use]
    pub fn trust_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        if !self.trusted_origins.contains(&origin) {
            self.trusted_origins.push(origin);
        }
        self
    }

    /// Origins trusted beyond the host's own.
    #[must_use]
    pub fn trusted_origins(&self) -> &[String] {
        &self.trusted_origins
    }

    /// Value for the frame's `allow` attribute.
    #[must_use]
    pub fn allow_attribute(&self) -> Cow<'static, str> {
        if self.trusted_origins.is_empty() {
            Cow::Borrowed(IFRAME_FEATURE_POLICY)
        } else {
            Cow::Owned(self.to_string())
        }
    }
}

impl fmt::Display for FeaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, feature) in Feature::ALL.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} 'self'", feature.directive())?;
            for origin in &self.trusted_origins {
                write!(f, " {origin}")?;
            }
        }
        Ok(())
    }
}
