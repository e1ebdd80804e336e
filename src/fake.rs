//! In-memory platform for tests and scripted replays
//!
//! Each fake is a cheap handle over shared state, so a test can hand one
//! clone to the tracker or router and keep another to inspect what happened.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::config::ScrollOptions;
use crate::navigation::EntryCallback;
use crate::platform::{
    ElementLocator, PlatformError, PlatformResult, ScrollExecutor, VisibilityObserver,
};
use crate::section::SectionId;

#[derive(Debug, Default)]
struct ViewportState {
    unavailable: bool,
    observed: BTreeSet<SectionId>,
    failing: BTreeSet<SectionId>,
    observe_calls: usize,
    disconnects: usize,
}

/// Fake visibility facility recording every registration call
#[derive(Debug, Clone, Default)]
pub struct FakeViewport {
    state: Rc<RefCell<ViewportState>>,
}

impl FakeViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform without visibility detection
    pub fn unavailable() -> Self {
        let viewport = Self::default();
        viewport.state.borrow_mut().unavailable = true;
        viewport
    }

    /// Make `observe` fail for one section
    pub fn fail_on(&self, section: &SectionId) {
        self.state.borrow_mut().failing.insert(section.clone());
    }

    /// Sections currently observed, sorted
    pub fn observed(&self) -> Vec<SectionId> {
        self.state.borrow().observed.iter().cloned().collect()
    }

    pub fn is_observing(&self, section: &SectionId) -> bool {
        self.state.borrow().observed.contains(section)
    }

    pub fn observe_calls(&self) -> usize {
        self.state.borrow().observe_calls
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.borrow().disconnects
    }
}

impl VisibilityObserver for FakeViewport {
    fn is_available(&self) -> bool {
        !self.state.borrow().unavailable
    }

    fn observe(&mut self, section: &SectionId) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        if state.unavailable {
            return Err(PlatformError::Unavailable);
        }
        if state.failing.contains(section) {
            return Err(PlatformError::ElementMissing(section.clone()));
        }
        state.observe_calls += 1;
        state.observed.insert(section.clone());
        Ok(())
    }

    fn unobserve(&mut self, section: &SectionId) {
        self.state.borrow_mut().observed.remove(section);
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.observed.clear();
        state.disconnects += 1;
    }
}

/// Element handle returned by [`FakeDocument`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub id: String,
}

/// A recorded scroll request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollCall {
    pub target: String,
    pub options: ScrollOptions,
}

#[derive(Debug, Default)]
struct DocumentState {
    rendered: BTreeSet<String>,
    scrolls: Vec<ScrollCall>,
}

/// Fake render tree: element lookup plus a scroll recorder
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    state: Rc<RefCell<DocumentState>>,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let document = Self::default();
        document
            .state
            .borrow_mut()
            .rendered
            .extend(ids.into_iter().map(Into::into));
        document
    }

    pub fn render(&self, id: impl Into<String>) {
        self.state.borrow_mut().rendered.insert(id.into());
    }

    pub fn remove(&self, id: &str) {
        self.state.borrow_mut().rendered.remove(id);
    }

    pub fn scrolls(&self) -> Vec<ScrollCall> {
        self.state.borrow().scrolls.clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.state.borrow().scrolls.len()
    }
}

impl ElementLocator for FakeDocument {
    type Element = FakeElement;

    fn find_by_id(&self, id: &str) -> Option<FakeElement> {
        self.state
            .borrow()
            .rendered
            .contains(id)
            .then(|| FakeElement { id: id.to_string() })
    }
}

impl ScrollExecutor<FakeElement> for FakeDocument {
    fn scroll_into_view(&mut self, element: &FakeElement, options: &ScrollOptions) {
        self.state.borrow_mut().scrolls.push(ScrollCall {
            target: element.id.clone(),
            options: *options,
        });
    }
}

/// Counts invocations of the host application's entry callback
#[derive(Debug, Clone, Default)]
pub struct EntryProbe {
    calls: Rc<Cell<usize>>,
}

impl EntryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> EntryCallback {
        let calls = self.calls.clone();
        Box::new(move || calls.set(calls.get() + 1))
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}
