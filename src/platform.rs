//! Host platform collaborators
//!
//! The tracker and router never touch a rendering environment directly.
//! They talk to these traits; the browser adapter (`web`) implements them on
//! top of the DOM and the `fake` module implements them in memory.
//!
//! ```text
//! platform ──samples──► VisibilityTracker ──on_reveal──► RevealHook
//!                              │
//!                              └── observe / unobserve / disconnect ──► VisibilityObserver
//!
//! NavControl ──► NavigationRouter ──find_by_id──► ElementLocator
//!                      │
//!                      ├── scroll_into_view ──► ScrollExecutor
//!                      └── entry callback
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ScrollOptions;
use crate::section::SectionId;

/// Errors raised by a host platform implementation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Visibility detection is not available on this platform")]
    Unavailable,

    #[error("No rendered element for section '{0}'")]
    ElementMissing(SectionId),

    #[error("Host call failed: {0}")]
    Host(String),
}

/// Result type for platform calls
pub type PlatformResult<T> = Result<T, PlatformError>;

/// One visibility notification delivered by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySample {
    pub section: SectionId,
    /// Fraction of the section's rendered area inside the viewport
    pub ratio: f64,
}

impl VisibilitySample {
    pub fn new(section: impl Into<SectionId>, ratio: f64) -> Self {
        Self {
            section: section.into(),
            ratio,
        }
    }
}

/// Push-style visibility subscription owned by the tracker
///
/// Samples are delivered back to the tracker by whoever owns the platform
/// callback; this trait only covers the registration lifecycle.
pub trait VisibilityObserver {
    /// Whether the platform can detect visibility at all
    fn is_available(&self) -> bool {
        true
    }

    /// Start delivering samples for a section
    fn observe(&mut self, section: &SectionId) -> PlatformResult<()>;

    /// Stop delivering samples for a single section
    fn unobserve(&mut self, section: &SectionId);

    /// Release every observation handle. No sample may be delivered afterwards.
    fn disconnect(&mut self);
}

/// Lookup of rendered elements by id
pub trait ElementLocator {
    type Element;

    fn find_by_id(&self, id: &str) -> Option<Self::Element>;
}

/// Animated scroll primitive. Fire-and-forget: returns before the animation ends.
pub trait ScrollExecutor<E> {
    fn scroll_into_view(&mut self, element: &E, options: &ScrollOptions);
}

/// Called once per section on its false→true reveal transition
pub trait RevealHook {
    fn on_reveal(&mut self, section: &SectionId);

    /// A section was registered by a mount and must show its default,
    /// not-yet-revealed state
    fn on_reset(&mut self, _section: &SectionId) {}
}

impl<F> RevealHook for F
where
    F: FnMut(&SectionId),
{
    fn on_reveal(&mut self, section: &SectionId) {
        self(section)
    }
}
