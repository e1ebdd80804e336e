//! Visibility tracker
//!
//! Promotes each section to "revealed" the first time enough of it enters the
//! viewport, then stops watching it. Sections are never demoted while mounted,
//! so scrolling back and forth across a boundary cannot make them flicker.
//!
//! ## Lifecycle
//!
//! ```text
//! Detached ──attach()──► Attached ──detach()──► Detached
//!     │                      │
//!     │                      └── attach() again: new ids only, nothing reset
//!     └──attach() without platform support──► Degraded ──detach()──► Detached
//! ```

use std::collections::BTreeSet;
use tracing::{debug, info, trace, warn};

use crate::config::{ClassNames, DEFAULT_REVEAL_THRESHOLD};
use crate::platform::{RevealHook, VisibilityObserver, VisibilitySample};
use crate::section::{Section, SectionId};

/// Where the tracker is in its mount lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    Detached,
    Attached,
    /// Mounted, but the platform cannot detect visibility. Sections keep
    /// their default styling.
    Degraded,
}

/// A single false→true reveal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealTransition {
    pub section: SectionId,
}

/// Outcome of an `attach` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    /// Sections newly registered and now being observed
    pub observed: Vec<SectionId>,
    /// Ids skipped because they were already registered
    pub already_registered: Vec<SectionId>,
    /// Sections registered but not observed (platform refused)
    pub unobserved: Vec<SectionId>,
}

pub struct VisibilityTracker<O: VisibilityObserver> {
    observer: O,
    threshold: f64,
    classes: ClassNames,
    phase: TrackerPhase,
    /// Mounted sections in registration order
    sections: Vec<Section>,
    /// Sections still waiting for their reveal
    watching: BTreeSet<SectionId>,
    hooks: Vec<Box<dyn RevealHook>>,
}

impl<O: VisibilityObserver> VisibilityTracker<O> {
    /// A threshold outside `(0, 1]` falls back to the default: a NaN would
    /// otherwise make every sample, even 0%, pass the comparison.
    pub fn new(observer: O, threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(1.0)
        } else {
            warn!(threshold, "Invalid reveal threshold, using default");
            DEFAULT_REVEAL_THRESHOLD
        };
        Self {
            observer,
            threshold,
            classes: ClassNames::default(),
            phase: TrackerPhase::Detached,
            sections: Vec::new(),
            watching: BTreeSet::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_classes(mut self, classes: ClassNames) -> Self {
        self.classes = classes;
        self
    }

    /// Register a hook fired once per section when it is revealed
    pub fn add_reveal_hook(&mut self, hook: impl RevealHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Register sections for observation
    ///
    /// Safe to call repeatedly while mounted: ids already registered are
    /// skipped, revealed flags are left alone. Calling it after `detach`
    /// starts a fresh mount with every flag cleared.
    pub fn attach<I>(&mut self, sections: I) -> AttachReport
    where
        I: IntoIterator<Item = SectionId>,
    {
        if self.phase == TrackerPhase::Detached {
            self.sections.clear();
            self.watching.clear();
            self.phase = if self.observer.is_available() {
                TrackerPhase::Attached
            } else {
                debug!("Visibility detection unavailable, sections keep default styling");
                TrackerPhase::Degraded
            };
        }

        let mut report = AttachReport::default();
        for id in sections {
            if self.position(&id).is_some() {
                report.already_registered.push(id);
                continue;
            }
            self.sections.push(Section::new(id.clone()));
            for hook in &mut self.hooks {
                hook.on_reset(&id);
            }

            if self.phase == TrackerPhase::Degraded {
                report.unobserved.push(id);
                continue;
            }

            match self.observer.observe(&id) {
                Ok(()) => {
                    self.watching.insert(id.clone());
                    report.observed.push(id);
                }
                Err(err) => {
                    warn!(section = %id, error = %err, "Section not observed");
                    report.unobserved.push(id);
                }
            }
        }

        debug!(
            observed = report.observed.len(),
            skipped = report.already_registered.len(),
            unobserved = report.unobserved.len(),
            "Visibility tracker attached"
        );
        report
    }

    /// Apply one visibility notification
    ///
    /// Returns the reveal transition if this sample caused one. Samples for
    /// revealed, unknown or detached sections are ignored.
    pub fn handle_sample(&mut self, sample: &VisibilitySample) -> Option<RevealTransition> {
        if self.phase != TrackerPhase::Attached {
            trace!(section = %sample.section, "Sample after detach ignored");
            return None;
        }
        if !self.watching.contains(&sample.section) {
            return None;
        }
        if !sample.ratio.is_finite() {
            trace!(section = %sample.section, "Non-finite intersection ratio ignored");
            return None;
        }

        let ratio = sample.ratio.clamp(0.0, 1.0);
        if ratio < self.threshold {
            return None;
        }

        let idx = self.position(&sample.section)?;
        if !self.sections[idx].reveal() {
            return None;
        }

        let id = sample.section.clone();
        self.watching.remove(&id);
        self.observer.unobserve(&id);
        for hook in &mut self.hooks {
            hook.on_reveal(&id);
        }

        info!(section = %id, ratio, "Section revealed");
        Some(RevealTransition { section: id })
    }

    /// Apply a batch of notifications in delivery order
    pub fn handle_samples<'a, I>(&mut self, samples: I) -> Vec<RevealTransition>
    where
        I: IntoIterator<Item = &'a VisibilitySample>,
    {
        samples
            .into_iter()
            .filter_map(|sample| self.handle_sample(sample))
            .collect()
    }

    /// Release all observation. A no-op when not attached.
    pub fn detach(&mut self) {
        if self.phase == TrackerPhase::Detached {
            return;
        }
        self.observer.disconnect();
        self.watching.clear();
        self.phase = TrackerPhase::Detached;
        debug!(
            revealed = self.revealed_count(),
            total = self.sections.len(),
            "Visibility tracker detached"
        );
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_revealed(&self, id: &SectionId) -> bool {
        self.position(id)
            .map(|idx| self.sections[idx].is_revealed())
            .unwrap_or(false)
    }

    /// Whether the section is still waiting for its reveal sample
    pub fn is_watching(&self, id: &SectionId) -> bool {
        self.watching.contains(id)
    }

    pub fn revealed_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_revealed()).count()
    }

    /// Class string for rendering a section in its current state
    pub fn section_class(&self, id: &SectionId) -> String {
        if self.is_revealed(id) {
            format!("{} {}", self.classes.section, self.classes.revealed)
        } else {
            self.classes.section.clone()
        }
    }

    fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id() == id)
    }
}

/// Dropping a mounted tracker releases its observation first, so the platform
/// never calls back into a tracker that no longer exists.
impl<O: VisibilityObserver> Drop for VisibilityTracker<O> {
    fn drop(&mut self) {
        self.detach();
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::fake::FakeViewport;
    use proptest::prelude::*;

    const NAMES: [&str; 4] = ["hero", "sample", "about", "docs"];

    fn arb_sample() -> impl Strategy<Value = VisibilitySample> {
        (0..NAMES.len(), 0.0f64..=1.0)
            .prop_map(|(idx, ratio)| VisibilitySample::new(NAMES[idx], ratio))
    }

    proptest! {
        /// Once revealed, a section stays revealed no matter what follows,
        /// and each section transitions at most once.
        #[test]
        fn reveal_is_monotonic(samples in prop::collection::vec(arb_sample(), 0..64)) {
            let mut tracker = VisibilityTracker::new(FakeViewport::new(), 0.25);
            tracker.attach(NAMES.iter().map(|n| SectionId::from(*n)));

            let mut revealed: Vec<bool> = vec![false; NAMES.len()];
            let mut transitions = vec![0usize; NAMES.len()];

            for sample in &samples {
                if let Some(t) = tracker.handle_sample(sample) {
                    let idx = NAMES.iter().position(|n| *n == t.section.as_str()).unwrap();
                    transitions[idx] += 1;
                }
                for (idx, name) in NAMES.iter().enumerate() {
                    let now = tracker.is_revealed(&SectionId::from(*name));
                    prop_assert!(!(revealed[idx] && !now));
                    revealed[idx] = now;
                }
            }

            for (idx, name) in NAMES.iter().enumerate() {
                let expected = samples
                    .iter()
                    .any(|s| s.section.as_str() == *name && s.ratio >= 0.25);
                prop_assert_eq!(revealed[idx], expected);
                prop_assert!(transitions[idx] <= 1);
            }
        }
    }
}
