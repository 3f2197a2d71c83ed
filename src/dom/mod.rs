//! The DOM surface the page components are written against.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components receive an `Rc<impl Dom>` instead of reaching for `web_sys`
//! globals. The browser build plugs in [`web::WebDom`]; tests and headless
//! hosts use [`memory::MemoryDom`], which evaluates the same selectors and
//! drives timers on a virtual clock.

pub mod memory;
pub mod selector;
#[cfg(feature = "hydrate")]
pub mod web;

pub use selector::{Selector, SelectorError};

use std::rc::Rc;

use crate::timer::Scheduler;

/// DOM events the page components subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Scroll,
    Load,
    DomContentLoaded,
    KeyDown,
    MouseDown,
    Focus,
    Blur,
    Input,
    Submit,
}

impl EventKind {
    /// Event type string passed to `addEventListener`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::KeyDown => "keydown",
            Self::MouseDown => "mousedown",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Input => "input",
            Self::Submit => "submit",
        }
    }
}

/// The parts of a DOM event handlers look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: EventKind,
    /// `KeyboardEvent.key` for keyboard events.
    pub key: Option<String>,
}

impl DomEvent {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self { kind, key: None }
    }
}

/// Whether the browser's default action should still run after a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    PreventDefault,
}

/// Whether an intersection observer keeps watching an element after it
/// reported as intersecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Watch {
    Keep,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Where a listener is attached.
#[derive(Clone, Copy, Debug)]
pub enum Target<'a, N> {
    Window,
    Document,
    Node(&'a N),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// `IntersectionObserver` construction options.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionOptions {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        Self { threshold: 0.0, root_margin: "0px".to_owned() }
    }
}

pub type EventHandler = Box<dyn FnMut(&DomEvent) -> Flow>;
pub type IntersectionHandler<N> = Box<dyn FnMut(&N) -> Watch>;

/// Injected DOM interface.
///
/// Mutating calls are fire-and-forget: implementations log failures rather
/// than surface them, matching how page scripts treat the DOM.
pub trait Dom: Scheduler + 'static {
    /// Element handle. Cheap to clone; equality is element identity.
    type Node: Clone + PartialEq + 'static;

    // --- Queries ---

    fn query_all(&self, selector: &Selector) -> Vec<Self::Node>;

    fn query(&self, selector: &Selector) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    /// Descendants of `root` matching `selector`, in document order.
    fn query_all_within(&self, root: &Self::Node, selector: &Selector) -> Vec<Self::Node>;

    fn query_within(&self, root: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        self.query_all_within(root, selector).into_iter().next()
    }

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    // --- Tree ---

    fn create_element(&self, tag: &str) -> Option<Self::Node>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` before the first child of `parent`.
    fn prepend_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Detach `node` from the tree.
    fn remove(&self, node: &Self::Node);

    // --- Attributes, classes, style ---

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn class_name(&self, node: &Self::Node) -> String {
        self.attribute(node, "class").unwrap_or_default()
    }

    fn set_class_name(&self, node: &Self::Node, value: &str) {
        self.set_attribute(node, "class", value);
    }

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.class_name(node).split_whitespace().any(|c| c == class)
    }

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    // --- Content ---

    fn text_content(&self, node: &Self::Node) -> String;

    fn set_text_content(&self, node: &Self::Node, text: &str);

    fn inner_html(&self, node: &Self::Node) -> String;

    fn set_inner_html(&self, node: &Self::Node, html: &str);

    // --- Forms ---

    /// Current value of an `input` / `textarea`; empty for other elements.
    fn value(&self, node: &Self::Node) -> String;

    fn set_disabled(&self, node: &Self::Node, disabled: bool);

    fn reset_form(&self, form: &Self::Node);

    // --- Layout ---

    fn scroll_y(&self) -> f64;

    fn offset_top(&self, node: &Self::Node) -> f64;

    fn client_height(&self, node: &Self::Node) -> f64;

    /// Smooth-scroll so `node` aligns with the top of the viewport.
    fn scroll_into_view(&self, node: &Self::Node);

    // --- Storage / environment ---

    fn storage_get(&self, key: &str) -> Option<String>;

    fn storage_set(&self, key: &str, value: &str);

    fn ready_state(&self) -> ReadyState;

    /// `navigator.connection.effectiveType`, when the browser exposes it.
    fn connection_type(&self) -> Option<String>;

    // --- Events ---

    fn listen(&self, target: Target<'_, Self::Node>, kind: EventKind, handler: EventHandler) -> ListenerId;

    fn unlisten(&self, id: ListenerId);

    fn observe(
        &self,
        targets: &[Self::Node],
        options: &IntersectionOptions,
        handler: IntersectionHandler<Self::Node>,
    ) -> ObserverId;

    fn disconnect(&self, id: ObserverId);
}

/// Listener and observer registrations owned by one component.
#[derive(Debug, Default)]
pub struct Subscriptions {
    listeners: Vec<ListenerId>,
    observers: Vec<ObserverId>,
}

impl Subscriptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener(&mut self, id: ListenerId) {
        self.listeners.push(id);
    }

    pub fn observer(&mut self, id: ObserverId) {
        self.observers.push(id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len() + self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unregister everything. Safe to call more than once.
    pub fn release<D: Dom + ?Sized>(&mut self, dom: &D) {
        for id in self.listeners.drain(..) {
            dom.unlisten(id);
        }
        for id in self.observers.drain(..) {
            dom.disconnect(id);
        }
    }
}

/// Run `work` once the window has loaded.
///
/// `load` never fires again for a document that is already complete, so in
/// that case `work` runs right away. Otherwise it runs from a `load`
/// listener recorded in `subscriptions`.
pub fn when_loaded<D: Dom>(dom: &Rc<D>, subscriptions: &mut Subscriptions, work: impl Fn(&Rc<D>) + 'static) {
    if dom.ready_state() == ReadyState::Complete {
        work(dom);
        return;
    }
    let weak = Rc::downgrade(dom);
    subscriptions.listener(dom.listen(
        Target::Window,
        EventKind::Load,
        Box::new(move |_| {
            if let Some(dom) = weak.upgrade() {
                work(&dom);
            }
            Flow::Continue
        }),
    ));
}
