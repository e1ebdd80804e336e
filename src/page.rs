//! Landing page lifecycle
//!
//! Wires the tracker and router to the page outline: mount attaches every
//! section, unmount detaches, clicks go through the router.
//!
//! `SharedPage` is the handle a host event loop holds. Host callbacks (the
//! entry hand-off, reveal hooks) may call back into it while the page is
//! busy; such calls are queued and applied once the page is released.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

use crate::config::{ConfigError, LandingConfig};
use crate::layout::{NavControl, PageLayout};
use crate::navigation::{EntryCallback, NavOutcome, NavTarget, NavigationRouter};
use crate::platform::{
    ElementLocator, RevealHook, ScrollExecutor, VisibilityObserver, VisibilitySample,
};
use crate::section::SectionId;
use crate::visibility::{AttachReport, RevealTransition, VisibilityTracker};

pub struct LandingPage<O, L, S>
where
    O: VisibilityObserver,
{
    layout: PageLayout,
    tracker: VisibilityTracker<O>,
    router: NavigationRouter<L, S>,
}

impl<O, L, S> LandingPage<O, L, S>
where
    O: VisibilityObserver,
    L: ElementLocator,
    S: ScrollExecutor<L::Element>,
{
    pub fn new(
        config: &LandingConfig,
        observer: O,
        locator: L,
        scroller: S,
        on_enter: Option<EntryCallback>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker = VisibilityTracker::new(observer, config.reveal_threshold)
            .with_classes(config.classes.clone());
        let mut router = NavigationRouter::new(locator, scroller, config.scroll);
        router.set_entry_callback(on_enter);

        Ok(Self {
            layout: PageLayout::from_config(config),
            tracker,
            router,
        })
    }

    /// Attach every section of the layout
    pub fn mount(&mut self) -> AttachReport {
        let sections = self.layout.sections().to_vec();
        self.mount_sections(sections)
    }

    /// Attach the sections actually found in the render tree
    pub fn mount_sections<I>(&mut self, sections: I) -> AttachReport
    where
        I: IntoIterator<Item = SectionId>,
    {
        self.tracker.attach(sections)
    }

    pub fn unmount(&mut self) {
        self.tracker.detach();
    }

    pub fn on_visibility<'a, I>(&mut self, samples: I) -> Vec<RevealTransition>
    where
        I: IntoIterator<Item = &'a VisibilitySample>,
    {
        self.tracker.handle_samples(samples)
    }

    pub fn click(&mut self, control: NavControl) -> NavOutcome {
        debug!(control = %control, "Control activated");
        self.router.activate(&control.target())
    }

    pub fn navigate(&mut self, target: &NavTarget) -> NavOutcome {
        self.router.activate(target)
    }

    pub fn set_entry_callback(&mut self, on_enter: Option<EntryCallback>) {
        self.router.set_entry_callback(on_enter);
    }

    pub fn add_reveal_hook(&mut self, hook: impl RevealHook + 'static) {
        self.tracker.add_reveal_hook(hook);
    }

    pub fn is_revealed(&self, id: &SectionId) -> bool {
        self.tracker.is_revealed(id)
    }

    pub fn section_class(&self, id: &SectionId) -> String {
        self.tracker.section_class(id)
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn tracker(&self) -> &VisibilityTracker<O> {
        &self.tracker
    }

    pub fn router(&self) -> &NavigationRouter<L, S> {
        &self.router
    }
}

struct SharedState<O: VisibilityObserver, L, S> {
    page: RefCell<LandingPage<O, L, S>>,
    /// Host entry point, run only after the page borrow is released
    on_enter: RefCell<Option<EntryCallback>>,
    entry_requested: Rc<Cell<bool>>,
    unmount_pending: Cell<bool>,
}

/// Reference-counted landing page for callback-driven hosts
pub struct SharedPage<O: VisibilityObserver, L, S> {
    state: Rc<SharedState<O, L, S>>,
}

impl<O: VisibilityObserver, L, S> Clone for SharedPage<O, L, S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

/// Non-owning handle for platform callbacks that must not keep the page alive
pub struct WeakPage<O: VisibilityObserver, L, S> {
    state: Weak<SharedState<O, L, S>>,
}

impl<O: VisibilityObserver, L, S> WeakPage<O, L, S> {
    pub fn upgrade(&self) -> Option<SharedPage<O, L, S>> {
        self.state.upgrade().map(|state| SharedPage { state })
    }
}

impl<O, L, S> SharedPage<O, L, S>
where
    O: VisibilityObserver,
    L: ElementLocator,
    S: ScrollExecutor<L::Element>,
{
    /// Take ownership of `page`. `on_enter` replaces whatever entry callback
    /// the page had; the router only records the request and the callback
    /// runs once the click has finished with the page.
    pub fn new(mut page: LandingPage<O, L, S>, on_enter: Option<EntryCallback>) -> Self {
        let entry_requested = Rc::new(Cell::new(false));
        let flag = entry_requested.clone();
        page.set_entry_callback(
            on_enter
                .is_some()
                .then(|| -> EntryCallback { Box::new(move || flag.set(true)) }),
        );

        Self {
            state: Rc::new(SharedState {
                page: RefCell::new(page),
                on_enter: RefCell::new(on_enter),
                entry_requested,
                unmount_pending: Cell::new(false),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakPage<O, L, S> {
        WeakPage {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Read access to the page, `None` while it is busy
    pub fn with<R>(&self, f: impl FnOnce(&LandingPage<O, L, S>) -> R) -> Option<R> {
        self.state.page.try_borrow().ok().map(|page| f(&page))
    }

    /// Attach sections found in the render tree. `None` while the page is busy.
    pub fn mount_sections<I>(&self, sections: I) -> Option<AttachReport>
    where
        I: IntoIterator<Item = SectionId>,
    {
        self.settle();
        let mut page = self.state.page.try_borrow_mut().ok()?;
        Some(page.mount_sections(sections))
    }

    pub fn mount(&self) -> Option<AttachReport> {
        self.settle();
        let mut page = self.state.page.try_borrow_mut().ok()?;
        Some(page.mount())
    }

    /// Detach now, or as soon as the page is released if it is busy
    pub fn unmount(&self) {
        self.state.unmount_pending.set(true);
        self.settle();
    }

    /// Deliver samples one at a time. An unmount requested by a reveal hook
    /// takes effect before the next sample of the same batch.
    pub fn on_visibility<'a, I>(&self, samples: I) -> Vec<RevealTransition>
    where
        I: IntoIterator<Item = &'a VisibilitySample>,
    {
        let mut transitions = Vec::new();
        for sample in samples {
            if self.state.unmount_pending.get() {
                break;
            }
            let Ok(mut page) = self.state.page.try_borrow_mut() else {
                warn!(section = %sample.section, "Page busy, visibility sample dropped");
                break;
            };
            transitions.extend(page.on_visibility([sample]));
        }
        self.settle();
        transitions
    }

    /// `None` if the page is busy (a click from inside a reveal hook)
    pub fn click(&self, control: NavControl) -> Option<NavOutcome> {
        self.navigate(&control.target())
    }

    pub fn navigate(&self, target: &NavTarget) -> Option<NavOutcome> {
        let outcome = {
            let mut page = self.state.page.try_borrow_mut().ok()?;
            page.navigate(target)
        };
        self.settle();
        if self.state.entry_requested.replace(false) {
            self.run_entry();
        }
        Some(outcome)
    }

    pub fn add_reveal_hook(&self, hook: impl RevealHook + 'static) -> bool {
        match self.state.page.try_borrow_mut() {
            Ok(mut page) => {
                page.add_reveal_hook(hook);
                true
            }
            Err(_) => false,
        }
    }

    fn run_entry(&self) {
        // Taken out so the callback may navigate again without a double borrow
        let taken = self
            .state
            .on_enter
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        let Some(mut on_enter) = taken else {
            warn!("Entry callback already running, nested entry ignored");
            return;
        };
        on_enter();
        if let Ok(mut slot) = self.state.on_enter.try_borrow_mut() {
            slot.get_or_insert(on_enter);
        }
        self.settle();
    }

    /// Apply a queued unmount if the page is free
    fn settle(&self) {
        if !self.state.unmount_pending.get() {
            return;
        }
        match self.state.page.try_borrow_mut() {
            Ok(mut page) => {
                self.state.unmount_pending.set(false);
                page.unmount();
            }
            Err(_) => debug!("Page busy, unmount deferred"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{EntryProbe, FakeDocument, FakeViewport};
    use crate::visibility::TrackerPhase;

    #[test]
    fn test_mount_attaches_layout_sections() {
        let viewport = FakeViewport::new();
        let document = FakeDocument::with_ids(["hero", "sample", "about", "docs"]);
        let mut page = LandingPage::new(
            &LandingConfig::default(),
            viewport.clone(),
            document.clone(),
            document,
            None,
        )
        .expect("default config is valid");

        let report = page.mount();
        assert_eq!(report.observed.len(), 5);
        assert_eq!(page.tracker().phase(), TrackerPhase::Attached);

        page.unmount();
        assert_eq!(viewport.disconnect_count(), 1);
        assert_eq!(page.tracker().phase(), TrackerPhase::Detached);
    }

    #[test]
    fn test_every_entry_control_hands_off() {
        let document = FakeDocument::new();
        let probe = EntryProbe::new();
        let mut page = LandingPage::new(
            &LandingConfig::default(),
            FakeViewport::new(),
            document.clone(),
            document.clone(),
            Some(probe.callback()),
        )
        .expect("default config is valid");

        for control in [
            NavControl::NavTryNow,
            NavControl::HeroOpenDemo,
            NavControl::CtaDashboard,
        ] {
            assert_eq!(page.click(control), NavOutcome::Entered);
        }
        assert_eq!(probe.calls(), 3);
        assert_eq!(document.scroll_count(), 0);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let document = FakeDocument::new();
        let config = LandingConfig {
            reveal_threshold: f64::NAN,
            ..LandingConfig::default()
        };
        let result = LandingPage::new(
            &config,
            FakeViewport::new(),
            document.clone(),
            document,
            None,
        );
        assert!(matches!(result, Err(ConfigError::InvalidThreshold(_))));
    }

    type FakePage = SharedPage<FakeViewport, FakeDocument, FakeDocument>;
    type FakeWeakPage = WeakPage<FakeViewport, FakeDocument, FakeDocument>;

    fn shared(on_enter: Option<EntryCallback>) -> (FakePage, FakeViewport, FakeDocument) {
        let viewport = FakeViewport::new();
        let document = FakeDocument::with_ids(["hero", "sample", "about", "docs"]);
        let page = LandingPage::new(
            &LandingConfig::default(),
            viewport.clone(),
            document.clone(),
            document.clone(),
            None,
        )
        .expect("default config is valid");
        (SharedPage::new(page, on_enter), viewport, document)
    }

    #[test]
    fn test_entry_callback_may_unmount_the_page() {
        let slot: Rc<RefCell<Option<FakeWeakPage>>> = Rc::default();
        let target = slot.clone();
        let entries = Rc::new(Cell::new(0));
        let counter = entries.clone();
        let on_enter: EntryCallback = Box::new(move || {
            counter.set(counter.get() + 1);
            if let Some(page) = target.borrow().as_ref().and_then(FakeWeakPage::upgrade) {
                page.unmount();
            }
        });

        let (page, viewport, _document) = shared(Some(on_enter));
        *slot.borrow_mut() = Some(page.downgrade());
        page.mount();

        assert_eq!(page.click(NavControl::HeroOpenDemo), Some(NavOutcome::Entered));
        assert_eq!(entries.get(), 1);
        assert_eq!(viewport.disconnect_count(), 1);
        assert_eq!(
            page.with(|p| p.tracker().phase()),
            Some(TrackerPhase::Detached)
        );

        // A sample queued by the platform before disconnect lands late
        page.on_visibility(&[VisibilitySample::new("docs", 1.0)]);
        assert_eq!(page.with(|p| p.is_revealed(&"docs".into())), Some(false));
    }

    #[test]
    fn test_unmount_from_reveal_hook_is_deferred() {
        let (page, viewport, _document) = shared(None);
        let weak = page.downgrade();
        page.add_reveal_hook(move |_: &SectionId| {
            if let Some(page) = weak.upgrade() {
                page.unmount();
            }
        });
        page.mount();

        let transitions = page.on_visibility(&[
            VisibilitySample::new("hero", 0.5),
            VisibilitySample::new("docs", 0.9),
        ]);

        assert_eq!(transitions.len(), 1);
        assert_eq!(viewport.disconnect_count(), 1);
        assert_eq!(
            page.with(|p| (p.tracker().phase(), p.is_revealed(&"docs".into()))),
            Some((TrackerPhase::Detached, false))
        );
    }

    #[test]
    fn test_shared_page_without_entry_callback() {
        let (page, _viewport, document) = shared(None);
        assert_eq!(
            page.click(NavControl::CtaDashboard),
            Some(NavOutcome::NoEntryCallback)
        );
        assert_eq!(
            page.click(NavControl::NavDocs),
            Some(NavOutcome::Scrolled {
                section: "docs".into()
            })
        );
        assert_eq!(document.scroll_count(), 1);
    }
}
