//! Landing page outline
//!
//! The controls every visitor sees and where each one leads. The header,
//! hero and closing call-to-action all carry an "enter application" control;
//! they resolve to the same target.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::LandingConfig;
use crate::navigation::NavTarget;
use crate::section::SectionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown navigation control: {0}")]
pub struct UnknownControl(pub String);

/// Where a control is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Header,
    Hero,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavControl {
    NavHero,
    NavSample,
    NavAbout,
    NavDocs,
    NavTryNow,
    HeroOpenDemo,
    HeroSeeSample,
    CtaDashboard,
}

impl NavControl {
    pub const ALL: [NavControl; 8] = [
        NavControl::NavHero,
        NavControl::NavSample,
        NavControl::NavAbout,
        NavControl::NavDocs,
        NavControl::NavTryNow,
        NavControl::HeroOpenDemo,
        NavControl::HeroSeeSample,
        NavControl::CtaDashboard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::NavHero => "nav-hero",
            Self::NavSample => "nav-sample",
            Self::NavAbout => "nav-about",
            Self::NavDocs => "nav-docs",
            Self::NavTryNow => "nav-try-now",
            Self::HeroOpenDemo => "hero-open-demo",
            Self::HeroSeeSample => "hero-see-sample",
            Self::CtaDashboard => "cta-dashboard",
        }
    }

    /// Button text
    pub fn label(self) -> &'static str {
        match self {
            Self::NavHero => "Hero",
            Self::NavSample => "Test run",
            Self::NavAbout => "About",
            Self::NavDocs => "Docs",
            Self::NavTryNow => "Try now",
            Self::HeroOpenDemo => "Open demo dashboard",
            Self::HeroSeeSample => "See test run sample",
            Self::CtaDashboard => "Go to login & dashboard",
        }
    }

    pub fn placement(self) -> Placement {
        match self {
            Self::NavHero | Self::NavSample | Self::NavAbout | Self::NavDocs | Self::NavTryNow => {
                Placement::Header
            }
            Self::HeroOpenDemo | Self::HeroSeeSample => Placement::Hero,
            Self::CtaDashboard => Placement::Closing,
        }
    }

    pub fn target(self) -> NavTarget {
        match self {
            Self::NavHero => NavTarget::section("hero"),
            Self::NavSample | Self::HeroSeeSample => NavTarget::section("sample"),
            Self::NavAbout => NavTarget::section("about"),
            Self::NavDocs => NavTarget::section("docs"),
            Self::NavTryNow | Self::HeroOpenDemo | Self::CtaDashboard => {
                NavTarget::EnterApplication
            }
        }
    }
}

impl fmt::Display for NavControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NavControl {
    type Err = UnknownControl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|control| control.name() == s)
            .ok_or_else(|| UnknownControl(s.to_string()))
    }
}

/// Static outline of the rendered page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    brand: String,
    sections: Vec<SectionId>,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::from_config(&LandingConfig::default())
    }
}

impl PageLayout {
    pub fn from_config(config: &LandingConfig) -> Self {
        Self {
            brand: config.brand.clone(),
            sections: config.sections.clone(),
        }
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Observed sections in render order
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    pub fn controls(&self, placement: Placement) -> impl Iterator<Item = NavControl> {
        NavControl::ALL
            .into_iter()
            .filter(move |control| control.placement() == placement)
    }

    /// Sections no control navigates to
    pub fn unreachable_sections(&self) -> Vec<&SectionId> {
        self.sections
            .iter()
            .filter(|id| {
                !NavControl::ALL
                    .iter()
                    .any(|control| control.target() == NavTarget::Section((*id).clone()))
            })
            .collect()
    }

    /// Tracking key for the `index`-th rendered section element
    ///
    /// An element id wins. A section rendered without one takes the
    /// configured id at the same render position, so the closing call to
    /// action is tracked as `cta` rather than an anonymous key.
    pub fn section_key(&self, element_id: &str, index: usize) -> SectionId {
        if !element_id.is_empty() {
            return SectionId::from(element_id);
        }
        self.sections
            .get(index)
            .cloned()
            .unwrap_or_else(|| SectionId::new(format!("section-{}", index)))
    }

    pub fn footer_text(&self, year: i32) -> String {
        format!("© {} {} · demo prototype", year, self.brand)
    }

    /// Footer line for the current local year
    pub fn current_footer_text(&self) -> String {
        self.footer_text(chrono::Local::now().year())
    }
}
