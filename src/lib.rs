//! LandMine landing page controller
//!
//! Reveals page sections as they scroll into view and routes the page's
//! navigation controls either to an in-page smooth scroll or to the host
//! application's entry callback.
//!
//! The core is platform-free: [`VisibilityTracker`] and [`NavigationRouter`]
//! work against the traits in [`platform`]. The browser adapter (`web`,
//! wasm32 only) implements them on the DOM; [`fake`] implements them in
//! memory for tests and the `landing_replay` tool.

pub mod config;
pub mod fake;
pub mod layout;
pub mod navigation;
pub mod page;
pub mod platform;
pub mod replay;
pub mod section;
pub mod visibility;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ConfigError, ConfigLoader, LandingConfig, ScrollOptions};
pub use layout::{NavControl, PageLayout, Placement};
pub use navigation::{EntryCallback, NavOutcome, NavTarget, NavigationRouter};
pub use page::{LandingPage, SharedPage, WeakPage};
pub use platform::{
    ElementLocator, PlatformError, RevealHook, ScrollExecutor, VisibilityObserver,
    VisibilitySample,
};
pub use section::{Section, SectionId};
pub use visibility::{RevealTransition, TrackerPhase, VisibilityTracker};
