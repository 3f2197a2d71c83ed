//! In-page navigation: smooth scrolling and active-section highlighting.
//!
//! DESIGN
//! ======
//! Anchor clicks are intercepted and turned into smooth scrolls. A throttled
//! window scroll handler recomputes which `section[id]` contains the scroll
//! offset and marks the matching `.nav-links a` as `active`.
//!
//! Sections are evaluated in document order and the last match wins, so a
//! later section takes precedence where ranges overlap.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::app::Component;
use crate::config::NavigationConfig;
use crate::dom::{Dom, EventKind, Flow, Selector, Subscriptions, Target};
use crate::error::InitError;
use crate::rate_limit::{Throttled, throttle};

const ANCHOR_SELECTOR: &str = r##"a[href^="#"]"##;
const SECTION_SELECTOR: &str = "section[id]";
const NAV_LINK_SELECTOR: &str = ".nav-links a";
const ACTIVE_CLASS: &str = "active";

/// Vertical extent of a tracked section.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

/// The id of the last section whose `[top - lookahead, top - lookahead + height)`
/// range contains `scroll_y`.
#[must_use]
pub fn resolve_active_section(scroll_y: f64, sections: &[SectionBounds], lookahead: f64) -> Option<&str> {
    sections
        .iter()
        .rev()
        .find(|s| {
            let start = s.top - lookahead;
            scroll_y >= start && scroll_y < start + s.height
        })
        .map(|s| s.id.as_str())
}

/// Section id targeted by an in-page `href`, e.g. `#about` → `about`.
fn fragment(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

struct NavState<D: Dom> {
    dom: Rc<D>,
    sections: Vec<D::Node>,
    links: Vec<D::Node>,
    lookahead: f64,
    active: RefCell<Option<String>>,
}

impl<D: Dom> NavState<D> {
    fn section_bounds(&self) -> Vec<SectionBounds> {
        self.sections
            .iter()
            .filter_map(|section| {
                Some(SectionBounds {
                    id: self.dom.attribute(section, "id")?,
                    top: self.dom.offset_top(section),
                    height: self.dom.client_height(section),
                })
            })
            .collect()
    }

    fn update(&self) {
        let bounds = self.section_bounds();
        let active = resolve_active_section(self.dom.scroll_y(), &bounds, self.lookahead).map(str::to_owned);

        for link in &self.links {
            self.dom.remove_class(link, ACTIVE_CLASS);
            let href = self.dom.attribute(link, "href");
            if active.is_some() && href.as_deref().and_then(fragment) == active.as_deref() {
                self.dom.add_class(link, ACTIVE_CLASS);
            }
        }

        let mut current = self.active.borrow_mut();
        if *current != active {
            log::debug!("active section: {}", active.as_deref().unwrap_or("<none>"));
            *current = active;
        }
    }
}

pub struct NavigationManager<D: Dom> {
    dom: Rc<D>,
    state: Rc<NavState<D>>,
    scroll: Throttled<D, ()>,
    subscriptions: Subscriptions,
}

impl<D: Dom> NavigationManager<D> {
    /// Bind anchor clicks and the throttled scroll tracker.
    ///
    /// # Errors
    ///
    /// Only selector parse failures; every DOM target here is optional.
    pub fn init(dom: Rc<D>, config: &NavigationConfig) -> Result<Self, InitError> {
        let anchors = dom.query_all(&Selector::parse(ANCHOR_SELECTOR)?);
        let sections = dom.query_all(&Selector::parse(SECTION_SELECTOR)?);
        let links = dom.query_all(&Selector::parse(NAV_LINK_SELECTOR)?);

        let mut subscriptions = Subscriptions::new();
        for anchor in &anchors {
            let weak_dom: Weak<D> = Rc::downgrade(&dom);
            let anchor_node = anchor.clone();
            subscriptions.listener(dom.listen(
                Target::Node(anchor),
                EventKind::Click,
                Box::new(move |_| {
                    if let Some(dom) = weak_dom.upgrade() {
                        let href = dom.attribute(&anchor_node, "href");
                        match href.as_deref().and_then(fragment).and_then(|id| dom.element_by_id(id)) {
                            Some(target) => dom.scroll_into_view(&target),
                            None => log::debug!("anchor target {} not found", href.as_deref().unwrap_or("")),
                        }
                    }
                    Flow::PreventDefault
                }),
            ));
        }

        let state = Rc::new(NavState {
            dom: Rc::clone(&dom),
            sections,
            links,
            lookahead: config.section_lookahead_px,
            active: RefCell::new(None),
        });

        let weak_state: Weak<NavState<D>> = Rc::downgrade(&state);
        let scroll = throttle(Rc::clone(&dom), config.scroll_throttle_ms, move |()| {
            if let Some(state) = weak_state.upgrade() {
                state.update();
            }
        });

        let on_scroll = scroll.clone();
        subscriptions.listener(dom.listen(
            Target::Window,
            EventKind::Scroll,
            Box::new(move |_| {
                on_scroll.call(());
                Flow::Continue
            }),
        ));

        log::debug!("navigation bound {} anchors, tracking {} sections", anchors.len(), state.sections.len());
        Ok(Self { dom, state, scroll, subscriptions })
    }

    /// Id of the section most recently resolved as active.
    #[must_use]
    pub fn active_section(&self) -> Option<String> {
        self.state.active.borrow().clone()
    }

    /// Recompute the active section now, bypassing the throttle.
    pub fn refresh(&self) {
        self.state.update();
    }
}

impl<D: Dom> Component for NavigationManager<D> {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn dispose(&mut self) {
        self.subscriptions.release(&*self.dom);
        self.scroll.cancel();
    }
}
