//! Navigation router
//!
//! Maps a navigation intent to its effect: a smooth scroll to a rendered
//! section, or a hand-off to the host application's entry callback. The
//! router keeps no state between activations.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::config::ScrollOptions;
use crate::platform::{ElementLocator, ScrollExecutor};
use crate::section::SectionId;

/// Zero-argument hand-off into the host application
pub type EntryCallback = Box<dyn FnMut()>;

/// What a navigation control asks for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavTarget {
    /// Jump to the section with this id
    Section(SectionId),
    /// Leave the landing page for the application
    EnterApplication,
}

impl NavTarget {
    pub fn section(id: impl Into<SectionId>) -> Self {
        Self::Section(id.into())
    }
}

impl fmt::Display for NavTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section(id) => write!(f, "#{}", id),
            Self::EnterApplication => f.write_str("enter-application"),
        }
    }
}

/// What an activation actually did
///
/// None of these are failures: a missing target or callback is an accepted
/// "nothing happens" outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavOutcome {
    Scrolled { section: SectionId },
    Entered,
    TargetNotFound { section: SectionId },
    NoEntryCallback,
}

impl NavOutcome {
    /// Whether the activation produced any effect
    pub fn is_effective(&self) -> bool {
        matches!(self, Self::Scrolled { .. } | Self::Entered)
    }
}

pub struct NavigationRouter<L, S> {
    locator: L,
    scroller: S,
    options: ScrollOptions,
    on_enter: Option<EntryCallback>,
}

impl<L, S> NavigationRouter<L, S>
where
    L: ElementLocator,
    S: ScrollExecutor<L::Element>,
{
    pub fn new(locator: L, scroller: S, options: ScrollOptions) -> Self {
        Self {
            locator,
            scroller,
            options,
            on_enter: None,
        }
    }

    pub fn with_entry_callback(mut self, on_enter: EntryCallback) -> Self {
        self.on_enter = Some(on_enter);
        self
    }

    pub fn set_entry_callback(&mut self, on_enter: Option<EntryCallback>) {
        self.on_enter = on_enter;
    }

    pub fn has_entry_callback(&self) -> bool {
        self.on_enter.is_some()
    }

    pub fn scroll_options(&self) -> &ScrollOptions {
        &self.options
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn scroller(&self) -> &S {
        &self.scroller
    }

    /// Resolve and execute a navigation intent
    ///
    /// Returns as soon as the scroll has been requested; the animation itself
    /// belongs to the platform.
    pub fn activate(&mut self, target: &NavTarget) -> NavOutcome {
        match target {
            NavTarget::Section(id) => match self.locator.find_by_id(id.as_str()) {
                Some(element) => {
                    self.scroller.scroll_into_view(&element, &self.options);
                    info!(section = %id, "Scrolling to section");
                    NavOutcome::Scrolled {
                        section: id.clone(),
                    }
                }
                None => {
                    debug!(section = %id, "Navigation target not rendered");
                    NavOutcome::TargetNotFound {
                        section: id.clone(),
                    }
                }
            },
            NavTarget::EnterApplication => match self.on_enter.as_mut() {
                Some(on_enter) => {
                    info!("Entering application");
                    on_enter();
                    NavOutcome::Entered
                }
                None => {
                    debug!("No entry callback configured");
                    NavOutcome::NoEntryCallback
                }
            },
        }
    }
}
