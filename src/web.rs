//! Browser adapter
//!
//! Implements the platform traits on the DOM and exports `LandingHandle` to
//! the JS page shell.
//!
//! ```text
//! IntersectionObserver ──Closure──► SampleDispatch ──WeakPage──► SharedPage ──► class_list.add
//! JS click handler ──► LandingHandle.navigate() ──► scrollIntoView({behavior: "smooth"})
//!                                              └──► onEnter() (after the page is released)
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    ScrollIntoViewOptions, ScrollLogicalPosition,
};

use crate::config::{LandingConfig, ScrollBehavior, ScrollBlock, ScrollOptions};
use crate::layout::{NavControl, PageLayout};
use crate::navigation::EntryCallback;
use crate::page::{LandingPage, SharedPage};
use crate::platform::{
    ElementLocator, PlatformError, PlatformResult, RevealHook, ScrollExecutor, VisibilityObserver,
    VisibilitySample,
};
use crate::section::SectionId;
use crate::visibility::TrackerPhase;

/// Attribute carrying a section's tracking key (its id, or a generated one)
const KEY_ATTR: &str = "data-lp-section";

type ElementMap = Rc<RefCell<HashMap<SectionId, Element>>>;
type SampleDispatch = Rc<RefCell<Option<Box<dyn FnMut(Vec<VisibilitySample>)>>>>;
type ObserverCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

pub type DomLandingPage = SharedPage<DomVisibilityObserver, DomDocument, DomDocument>;

/// `IntersectionObserver` behind the `VisibilityObserver` trait
///
/// The JS observer and its callback are created on first `observe` and
/// dropped on `disconnect`, so a later mount starts from a clean slate.
pub struct DomVisibilityObserver {
    threshold: f64,
    supported: bool,
    elements: ElementMap,
    dispatch: SampleDispatch,
    active: Option<(IntersectionObserver, ObserverCallback)>,
}

impl DomVisibilityObserver {
    fn new(threshold: f64, elements: ElementMap, dispatch: SampleDispatch) -> Self {
        let supported = js_sys::Reflect::has(&js_sys::global(), &"IntersectionObserver".into())
            .unwrap_or(false);
        Self {
            threshold,
            supported,
            elements,
            dispatch,
            active: None,
        }
    }

    fn connect(&mut self) -> PlatformResult<&IntersectionObserver> {
        if self.active.is_none() {
            let dispatch = self.dispatch.clone();
            let callback = ObserverCallback::new(
                move |entries: js_sys::Array, _observer: IntersectionObserver| {
                    let samples: Vec<VisibilitySample> = entries
                        .iter()
                        .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                        .filter_map(|entry| {
                            let key = entry.target().get_attribute(KEY_ATTR)?;
                            Some(VisibilitySample::new(key, entry.intersection_ratio()))
                        })
                        .collect();

                    match dispatch.try_borrow_mut() {
                        Ok(mut deliver) => {
                            if let Some(deliver) = deliver.as_mut() {
                                deliver(samples);
                            }
                        }
                        Err(_) => {
                            tracing::warn!(count = samples.len(), "Visibility samples dropped")
                        }
                    }
                },
            );

            let init = IntersectionObserverInit::new();
            init.set_threshold(&JsValue::from_f64(self.threshold));
            let observer =
                IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                    .map_err(|err| {
                        self.supported = false;
                        PlatformError::Host(format!("{:?}", err))
                    })?;
            self.active = Some((observer, callback));
        }

        self.active
            .as_ref()
            .map(|(observer, _)| observer)
            .ok_or(PlatformError::Unavailable)
    }
}

impl VisibilityObserver for DomVisibilityObserver {
    fn is_available(&self) -> bool {
        self.supported
    }

    fn observe(&mut self, section: &SectionId) -> PlatformResult<()> {
        let element = self
            .elements
            .borrow()
            .get(section)
            .cloned()
            .ok_or_else(|| PlatformError::ElementMissing(section.clone()))?;
        self.connect()?.observe(&element);
        Ok(())
    }

    fn unobserve(&mut self, section: &SectionId) {
        if let (Some((observer, _)), Some(element)) =
            (self.active.as_ref(), self.elements.borrow().get(section))
        {
            observer.unobserve(element);
        }
    }

    fn disconnect(&mut self) {
        if let Some((observer, _callback)) = self.active.take() {
            observer.disconnect();
        }
    }
}

impl Drop for DomVisibilityObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Element lookup and smooth scrolling on the live document
#[derive(Clone)]
pub struct DomDocument {
    document: Document,
}

impl ElementLocator for DomDocument {
    type Element = Element;

    fn find_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }
}

impl ScrollExecutor<Element> for DomDocument {
    fn scroll_into_view(&mut self, element: &Element, options: &ScrollOptions) {
        let opts = ScrollIntoViewOptions::new();
        opts.set_behavior(match options.behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
            ScrollBehavior::Auto => web_sys::ScrollBehavior::Auto,
        });
        opts.set_block(match options.block {
            ScrollBlock::Start => ScrollLogicalPosition::Start,
            ScrollBlock::Center => ScrollLogicalPosition::Center,
            ScrollBlock::End => ScrollLogicalPosition::End,
            ScrollBlock::Nearest => ScrollLogicalPosition::Nearest,
        });
        element.scroll_into_view_with_scroll_into_view_options(&opts);
    }
}

/// Adds the revealed class on reveal, removes it when a mount resets the section
struct RevealClass {
    elements: ElementMap,
    class: String,
}

impl RevealHook for RevealClass {
    fn on_reveal(&mut self, section: &SectionId) {
        if let Some(element) = self.elements.borrow().get(section) {
            if let Err(err) = element.class_list().add_1(&self.class) {
                tracing::warn!(section = %section, error = ?err, "Failed to add reveal class");
            }
        }
    }

    fn on_reset(&mut self, section: &SectionId) {
        if let Some(element) = self.elements.borrow().get(section) {
            if let Err(err) = element.class_list().remove_1(&self.class) {
                tracing::warn!(section = %section, error = ?err, "Failed to clear reveal class");
            }
        }
    }
}

/// Find every rendered section and stamp its tracking key
fn discover_sections(
    document: &Document,
    class: &str,
    layout: &PageLayout,
) -> Result<Vec<(SectionId, Element)>, JsValue> {
    let nodes = document.query_selector_all(&format!(".{}", class))?;
    let mut found = Vec::with_capacity(nodes.length() as usize);

    for idx in 0..nodes.length() {
        let Some(element) = nodes.get(idx).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let key = match element.get_attribute(KEY_ATTR) {
            Some(key) if !key.is_empty() => SectionId::new(key),
            _ => layout.section_key(&element.id(), idx as usize),
        };
        element.set_attribute(KEY_ATTR, key.as_str())?;
        found.push((key, element));
    }

    Ok(found)
}

#[wasm_bindgen]
pub struct LandingHandle {
    document: Document,
    class: String,
    layout: PageLayout,
    elements: ElementMap,
    page: DomLandingPage,
}

fn busy() -> JsValue {
    JsValue::from_str("Landing page busy")
}

#[wasm_bindgen]
impl LandingHandle {
    /// `on_enter` is the host application's entry point; `config_yaml`
    /// overrides the built-in configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(
        on_enter: Option<js_sys::Function>,
        config_yaml: Option<String>,
    ) -> Result<LandingHandle, JsValue> {
        let config = match config_yaml {
            Some(yaml) => LandingConfig::from_yaml(&yaml)
                .map_err(|err| JsValue::from_str(&format!("{:#}", err)))?,
            None => LandingConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;

        let elements: ElementMap = Rc::default();
        let dispatch: SampleDispatch = Rc::new(RefCell::new(None));
        let observer =
            DomVisibilityObserver::new(config.reveal_threshold, elements.clone(), dispatch.clone());
        let dom = DomDocument {
            document: document.clone(),
        };

        let on_enter = on_enter.map(|f| -> EntryCallback {
            Box::new(move || {
                if let Err(err) = f.call0(&JsValue::NULL) {
                    tracing::warn!(error = ?err, "Entry callback threw");
                }
            })
        });

        let mut page = LandingPage::new(&config, observer, dom.clone(), dom, None)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        page.add_reveal_hook(RevealClass {
            elements: elements.clone(),
            class: config.classes.revealed.clone(),
        });
        let layout = page.layout().clone();
        let page = SharedPage::new(page, on_enter);

        let weak = page.downgrade();
        *dispatch.borrow_mut() = Some(Box::new(move |samples: Vec<VisibilitySample>| {
            if let Some(page) = weak.upgrade() {
                page.on_visibility(&samples);
            }
        }));

        Ok(LandingHandle {
            document,
            class: config.classes.section,
            layout,
            elements,
            page,
        })
    }

    /// Discover `.lp-section` elements and start observing them.
    /// Returns the number of newly observed sections.
    pub fn mount(&self) -> Result<usize, JsValue> {
        let fresh = self
            .page
            .with(|page| page.tracker().phase() == TrackerPhase::Detached)
            .ok_or_else(busy)?;
        let discovered = discover_sections(&self.document, &self.class, &self.layout)?;
        {
            let mut elements = self.elements.borrow_mut();
            if fresh {
                elements.clear();
            }
            elements.extend(discovered.iter().map(|(id, el)| (id.clone(), el.clone())));
        }

        let report = self
            .page
            .mount_sections(discovered.into_iter().map(|(id, _)| id))
            .ok_or_else(busy)?;
        Ok(report.observed.len())
    }

    /// Stop observing. Called from inside a page callback, the detach
    /// happens as soon as that callback returns.
    pub fn unmount(&self) {
        self.page.unmount();
    }

    /// Activate a control by name (`nav-about`, `cta-dashboard`, ...).
    /// Returns whether anything happened.
    pub fn navigate(&self, control: &str) -> Result<bool, JsValue> {
        let control: NavControl = control
            .parse()
            .map_err(|err: crate::layout::UnknownControl| JsValue::from_str(&err.to_string()))?;
        let outcome = self.page.click(control).ok_or_else(busy)?;
        Ok(outcome.is_effective())
    }

    pub fn is_revealed(&self, section: &str) -> bool {
        self.page
            .with(|page| page.is_revealed(&SectionId::from(section)))
            .unwrap_or(false)
    }

    pub fn section_class(&self, section: &str) -> String {
        self.page
            .with(|page| page.section_class(&SectionId::from(section)))
            .unwrap_or_else(|| self.class.clone())
    }

    pub fn footer_text(&self) -> String {
        self.layout.current_footer_text()
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    web_sys::console::log_1(&"LandMine landing controller loaded".into());
}
