//! Keyboard-focus styling, the skip link and icon-only control labels.

#[cfg(test)]
#[path = "accessibility_test.rs"]
mod accessibility_test;

use std::rc::{Rc, Weak};

use crate::app::Component;
use crate::dom::{Dom, EventKind, Flow, Selector, Subscriptions, Target};
use crate::error::InitError;

pub const KEYBOARD_CLASS: &str = "keyboard-navigation";
const LABEL_CANDIDATES: &str = "button, a";
const ICON_SELECTOR: &str = "i";

const SKIP_LINK_TEXT: &str = "Skip to main content";
const SKIP_LINK_HIDDEN_TOP: &str = "-40px";
const SKIP_LINK_FOCUSED_TOP: &str = "6px";

/// Icon class fragment → accessible name. Later entries win.
const ICON_LABELS: [(&str, &str); 3] = [
    ("fa-moon", "Switch to dark theme"),
    ("fa-sun", "Switch to light theme"),
    ("fa-bars", "Open mobile menu"),
];

/// Accessible name for an icon-only control with this icon class.
#[must_use]
pub fn icon_label(icon_class: &str) -> Option<&'static str> {
    ICON_LABELS
        .iter()
        .rev()
        .find(|(fragment, _)| icon_class.contains(fragment))
        .map(|&(_, label)| label)
}

pub struct AccessibilityManager<D: Dom> {
    dom: Rc<D>,
    skip_link: D::Node,
    subscriptions: Subscriptions,
}

impl<D: Dom> AccessibilityManager<D> {
    /// Bind keyboard tracking, insert the skip link and backfill labels.
    ///
    /// # Errors
    ///
    /// [`InitError::MissingElement`] without a `<body>`;
    /// [`InitError::CreateElement`] if the skip link cannot be created.
    pub fn init(dom: Rc<D>) -> Result<Self, InitError> {
        let body = dom.body().ok_or(InitError::MissingElement("body"))?;
        let mut subscriptions = Subscriptions::new();

        let weak: Weak<D> = Rc::downgrade(&dom);
        let on_key = body.clone();
        subscriptions.listener(dom.listen(
            Target::Document,
            EventKind::KeyDown,
            Box::new(move |event| {
                if let Some(dom) = weak.upgrade()
                    && event.key.as_deref() == Some("Tab")
                {
                    dom.add_class(&on_key, KEYBOARD_CLASS);
                }
                Flow::Continue
            }),
        ));

        let weak: Weak<D> = Rc::downgrade(&dom);
        let on_mouse = body.clone();
        subscriptions.listener(dom.listen(
            Target::Document,
            EventKind::MouseDown,
            Box::new(move |_| {
                if let Some(dom) = weak.upgrade() {
                    dom.remove_class(&on_mouse, KEYBOARD_CLASS);
                }
                Flow::Continue
            }),
        ));

        let skip_link = Self::insert_skip_link(&dom, &body, &mut subscriptions)?;
        let labelled = Self::backfill_labels(&dom)?;
        log::debug!("accessibility ready, {labelled} controls labelled");

        Ok(Self { dom, skip_link, subscriptions })
    }

    fn insert_skip_link(dom: &Rc<D>, body: &D::Node, subscriptions: &mut Subscriptions) -> Result<D::Node, InitError> {
        let link = dom.create_element("a").ok_or(InitError::CreateElement("a"))?;
        dom.set_attribute(&link, "href", "#main");
        dom.set_class_name(&link, "skip-link sr-only");
        dom.set_text_content(&link, SKIP_LINK_TEXT);
        for (property, value) in [
            ("position", "absolute"),
            ("top", SKIP_LINK_HIDDEN_TOP),
            ("left", "6px"),
            ("background", "var(--accent-primary)"),
            ("color", "white"),
            ("padding", "8px"),
            ("text-decoration", "none"),
            ("border-radius", "4px"),
            ("z-index", "1000"),
        ] {
            dom.set_style(&link, property, value);
        }

        for (kind, top) in [(EventKind::Focus, SKIP_LINK_FOCUSED_TOP), (EventKind::Blur, SKIP_LINK_HIDDEN_TOP)] {
            let weak: Weak<D> = Rc::downgrade(dom);
            let node = link.clone();
            subscriptions.listener(dom.listen(
                Target::Node(&link),
                kind,
                Box::new(move |_| {
                    if let Some(dom) = weak.upgrade() {
                        dom.set_style(&node, "top", top);
                    }
                    Flow::Continue
                }),
            ));
        }

        dom.prepend_child(body, &link);
        Ok(link)
    }

    /// Give icon-only buttons and links an `aria-label`. Returns how many
    /// were labelled.
    fn backfill_labels(dom: &Rc<D>) -> Result<usize, InitError> {
        let icon = Selector::parse(ICON_SELECTOR)?;
        let mut labelled = 0;
        for control in dom.query_all(&Selector::parse(LABEL_CANDIDATES)?) {
            if dom.has_attribute(&control, "aria-label") || !dom.text_content(&control).trim().is_empty() {
                continue;
            }
            let label = dom
                .query_within(&control, &icon)
                .and_then(|i| icon_label(&dom.class_name(&i)));
            if let Some(label) = label {
                dom.set_attribute(&control, "aria-label", label);
                labelled += 1;
            }
        }
        Ok(labelled)
    }

    /// The inserted skip link.
    #[must_use]
    pub fn skip_link(&self) -> &D::Node {
        &self.skip_link
    }
}

impl<D: Dom> Component for AccessibilityManager<D> {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn dispose(&mut self) {
        self.subscriptions.release(&*self.dom);
    }
}
