//! In-memory DOM for tests and headless hosting.
//!
//! DESIGN
//! ======
//! Nodes live in an arena indexed by [`MemoryNode`]. Layout is not computed:
//! `offset_top` / `client_height` come from [`MemoryDom::set_layout`]. Markup
//! is never parsed, so `inner_html` is plain text. Events do not bubble and
//! intersections are reported only when [`MemoryDom::intersect`] says so.
//! Timers run on an embedded [`ManualScheduler`].
//!
//! Handlers are invoked with no internal borrow held, so they may freely
//! query and mutate the document, register listeners or schedule timers.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use selectors::OpaqueElement;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{ElementSelectorFlags, MatchingContext};

use super::selector::{CssName, CssString, HtmlNamespace, NoPseudoClass, NoPseudoElement, PageSelectors};
use super::{
    Dom, DomEvent, EventHandler, EventKind, Flow, IntersectionHandler, IntersectionOptions, ListenerId,
    ObserverId, ReadyState, Selector, Target, Watch,
};
use crate::timer::{ManualScheduler, Scheduler, TimerCallback, TimerId};

/// Element handle into a [`MemoryDom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    disabled: bool,
    parent: Option<usize>,
    children: Vec<usize>,
    top: f64,
    height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TargetKey {
    Window,
    Document,
    Node(usize),
}

struct Listener {
    target: TargetKey,
    kind: EventKind,
    handler: Rc<RefCell<EventHandler>>,
}

struct Observer {
    targets: Vec<usize>,
    options: IntersectionOptions,
    handler: Rc<RefCell<IntersectionHandler<MemoryNode>>>,
}

pub struct MemoryDom {
    nodes: RefCell<Vec<NodeData>>,
    root: usize,
    body: usize,
    storage: RefCell<HashMap<String, String>>,
    scroll_y: Cell<f64>,
    ready: Cell<ReadyState>,
    connection: RefCell<Option<String>>,
    creation_blocked: Cell<bool>,
    listeners: RefCell<BTreeMap<u64, Listener>>,
    observers: RefCell<BTreeMap<u64, Observer>>,
    next_handle: Cell<u64>,
    scrolled_into_view: RefCell<Vec<MemoryNode>>,
    timers: ManualScheduler,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// An empty `<html><head></head><body></body></html>` document that has
    /// finished loading.
    #[must_use]
    pub fn new() -> Self {
        let html = NodeData { tag: "html".to_owned(), children: vec![1, 2], ..NodeData::default() };
        let head = NodeData { tag: "head".to_owned(), parent: Some(0), ..NodeData::default() };
        let body = NodeData { tag: "body".to_owned(), parent: Some(0), ..NodeData::default() };
        Self {
            nodes: RefCell::new(vec![html, head, body]),
            root: 0,
            body: 2,
            storage: RefCell::new(HashMap::new()),
            scroll_y: Cell::new(0.0),
            ready: Cell::new(ReadyState::Complete),
            connection: RefCell::new(None),
            creation_blocked: Cell::new(false),
            listeners: RefCell::new(BTreeMap::new()),
            observers: RefCell::new(BTreeMap::new()),
            next_handle: Cell::new(1),
            scrolled_into_view: RefCell::new(Vec::new()),
            timers: ManualScheduler::new(),
        }
    }

    // --- Fixture building ---

    /// Create `<tag>` with `attrs` and append it to `parent`.
    pub fn element(&self, parent: MemoryNode, tag: &str, attrs: &[(&str, &str)]) -> MemoryNode {
        let node = self.alloc(tag);
        {
            let mut nodes = self.nodes.borrow_mut();
            for (name, value) in attrs {
                nodes[node].attrs.insert((*name).to_owned(), (*value).to_owned());
            }
        }
        self.attach(parent.0, node, false);
        MemoryNode(node)
    }

    /// Like [`MemoryDom::element`] with text content.
    pub fn text_element(&self, parent: MemoryNode, tag: &str, attrs: &[(&str, &str)], text: &str) -> MemoryNode {
        let node = self.element(parent, tag, attrs);
        self.nodes.borrow_mut()[node.0].text = text.to_owned();
        node
    }

    #[must_use]
    pub fn document_body(&self) -> MemoryNode {
        MemoryNode(self.body)
    }

    #[must_use]
    pub fn document_head(&self) -> MemoryNode {
        MemoryNode(1)
    }

    pub fn set_value(&self, node: MemoryNode, value: &str) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node.0) {
            data.value = value.to_owned();
        }
    }

    pub fn set_layout(&self, node: MemoryNode, top: f64, height: f64) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node.0) {
            data.top = top;
            data.height = height;
        }
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.ready.set(state);
    }

    pub fn set_connection_type(&self, effective_type: Option<&str>) {
        *self.connection.borrow_mut() = effective_type.map(str::to_owned);
    }

    /// Make `create_element` return `None`, as a document refusing new nodes would.
    pub fn set_creation_blocked(&self, blocked: bool) {
        self.creation_blocked.set(blocked);
    }

    /// Set `window.scrollY` without firing `scroll`.
    pub fn set_scroll_y(&self, y: f64) {
        self.scroll_y.set(y);
    }

    /// Set `window.scrollY` and fire `scroll` on the window.
    pub fn scroll_to(&self, y: f64) {
        self.scroll_y.set(y);
        self.dispatch(Target::Window, &DomEvent::new(EventKind::Scroll));
    }

    // --- Driving ---

    /// Deliver `event` to listeners on `target` (no bubbling).
    ///
    /// Returns [`Flow::PreventDefault`] when any handler asked for it.
    pub fn dispatch(&self, target: Target<'_, MemoryNode>, event: &DomEvent) -> Flow {
        let key = match target {
            Target::Window => TargetKey::Window,
            Target::Document => TargetKey::Document,
            Target::Node(node) => TargetKey::Node(node.0),
        };
        let handlers: Vec<Rc<RefCell<EventHandler>>> = self
            .listeners
            .borrow()
            .values()
            .filter(|l| l.target == key && l.kind == event.kind)
            .map(|l| Rc::clone(&l.handler))
            .collect();

        let mut flow = Flow::Continue;
        for handler in handlers {
            // A handler that re-dispatches its own event is skipped rather than
            // re-entered.
            let Ok(mut handler) = handler.try_borrow_mut() else {
                continue;
            };
            if (&mut *handler)(event) == Flow::PreventDefault {
                flow = Flow::PreventDefault;
            }
        }
        flow
    }

    /// Shorthand for dispatching `kind` on a node.
    pub fn fire(&self, node: MemoryNode, kind: EventKind) -> Flow {
        self.dispatch(Target::Node(&node), &DomEvent::new(kind))
    }

    /// Fire `keydown` on the document with `key`.
    pub fn key_down(&self, key: &str) -> Flow {
        self.dispatch(
            Target::Document,
            &DomEvent { kind: EventKind::KeyDown, key: Some(key.to_owned()) },
        )
    }

    /// Report `node` as intersecting to every observer watching it.
    pub fn intersect(&self, node: MemoryNode) {
        let handlers: Vec<(u64, Rc<RefCell<IntersectionHandler<MemoryNode>>>)> = self
            .observers
            .borrow()
            .iter()
            .filter(|(_, o)| o.targets.contains(&node.0))
            .map(|(id, o)| (*id, Rc::clone(&o.handler)))
            .collect();

        for (id, handler) in handlers {
            let watch = match handler.try_borrow_mut() {
                Ok(mut handler) => (&mut *handler)(&node),
                Err(_) => continue,
            };
            if watch == Watch::Stop {
                if let Some(observer) = self.observers.borrow_mut().get_mut(&id) {
                    observer.targets.retain(|&t| t != node.0);
                }
            }
        }
    }

    /// Advance the virtual clock, firing due timers.
    pub fn advance(&self, ms: u64) {
        self.timers.advance(ms);
    }

    // --- Inspection ---

    #[must_use]
    pub fn scheduler(&self) -> &ManualScheduler {
        &self.timers
    }

    #[must_use]
    pub fn children(&self, node: MemoryNode) -> Vec<MemoryNode> {
        self.nodes
            .borrow()
            .get(node.0)
            .map_or_else(Vec::new, |d| d.children.iter().copied().map(MemoryNode).collect())
    }

    #[must_use]
    pub fn tag(&self, node: MemoryNode) -> String {
        self.nodes.borrow().get(node.0).map_or_else(String::new, |d| d.tag.clone())
    }

    #[must_use]
    pub fn is_disabled(&self, node: MemoryNode) -> bool {
        self.nodes.borrow().get(node.0).is_some_and(|d| d.disabled)
    }

    /// Whether `node` is reachable from the document root.
    #[must_use]
    pub fn is_attached(&self, node: MemoryNode) -> bool {
        let nodes = self.nodes.borrow();
        let mut cursor = Some(node.0);
        while let Some(idx) = cursor {
            if idx == self.root {
                return true;
            }
            cursor = nodes.get(idx).and_then(|d| d.parent);
        }
        false
    }

    #[must_use]
    pub fn scrolled_into_view(&self) -> Vec<MemoryNode> {
        self.scrolled_into_view.borrow().clone()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Whether any live observer still watches `node`.
    #[must_use]
    pub fn is_observed(&self, node: MemoryNode) -> bool {
        self.observers.borrow().values().any(|o| o.targets.contains(&node.0))
    }

    /// Options of the observer watching `node`, if any.
    #[must_use]
    pub fn observer_options(&self, node: MemoryNode) -> Option<IntersectionOptions> {
        self.observers
            .borrow()
            .values()
            .find(|o| o.targets.contains(&node.0))
            .map(|o| o.options.clone())
    }

    // --- Internals ---

    fn alloc(&self, tag: &str) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData { tag: tag.to_ascii_lowercase(), ..NodeData::default() });
        nodes.len() - 1
    }

    fn next_handle(&self) -> u64 {
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        id
    }

    fn detach(nodes: &mut [NodeData], child: usize) {
        if let Some(parent) = nodes[child].parent.take() {
            nodes[parent].children.retain(|&c| c != child);
        }
    }

    fn attach(&self, parent: usize, child: usize, first: bool) {
        let mut nodes = self.nodes.borrow_mut();
        if parent >= nodes.len() || child >= nodes.len() || parent == child {
            return;
        }
        Self::detach(&mut nodes, child);
        nodes[child].parent = Some(parent);
        if first {
            nodes[parent].children.insert(0, child);
        } else {
            nodes[parent].children.push(child);
        }
    }

    /// Pre-order traversal of the subtree under `root`, excluding `root`.
    fn descendants(nodes: &[NodeData], root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = nodes[root].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(nodes[idx].children.iter().rev().copied());
        }
        out
    }

    fn matches(nodes: &[NodeData], idx: usize, selector: &Selector) -> bool {
        selector.matches(&ElementRef { nodes, idx })
    }

    fn collect_text(nodes: &[NodeData], idx: usize, out: &mut String) {
        out.push_str(&nodes[idx].text);
        for &child in &nodes[idx].children {
            Self::collect_text(nodes, child, out);
        }
    }
}

impl Scheduler for MemoryDom {
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TimerId {
        self.timers.set_timeout(delay_ms, callback)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.clear_timeout(id);
    }

    fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }
}

impl Dom for MemoryDom {
    type Node = MemoryNode;

    fn query_all(&self, selector: &Selector) -> Vec<MemoryNode> {
        let nodes = self.nodes.borrow();
        Self::descendants(&nodes, self.root)
            .into_iter()
            .filter(|&idx| Self::matches(&nodes, idx, selector))
            .map(MemoryNode)
            .collect()
    }

    fn query_all_within(&self, root: &MemoryNode, selector: &Selector) -> Vec<MemoryNode> {
        let nodes = self.nodes.borrow();
        if root.0 >= nodes.len() {
            return Vec::new();
        }
        Self::descendants(&nodes, root.0)
            .into_iter()
            .filter(|&idx| Self::matches(&nodes, idx, selector))
            .map(MemoryNode)
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<MemoryNode> {
        let nodes = self.nodes.borrow();
        Self::descendants(&nodes, self.root)
            .into_iter()
            .find(|&idx| nodes[idx].attrs.get("id").is_some_and(|v| v == id))
            .map(MemoryNode)
    }

    fn body(&self) -> Option<MemoryNode> {
        Some(MemoryNode(self.body))
    }

    fn parent(&self, node: &MemoryNode) -> Option<MemoryNode> {
        self.nodes.borrow().get(node.0).and_then(|d| d.parent).map(MemoryNode)
    }

    fn create_element(&self, tag: &str) -> Option<MemoryNode> {
        if self.creation_blocked.get() {
            return None;
        }
        Some(MemoryNode(self.alloc(tag)))
    }

    fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        self.attach(parent.0, child.0, false);
    }

    fn prepend_child(&self, parent: &MemoryNode, child: &MemoryNode) {
        self.attach(parent.0, child.0, true);
    }

    fn remove(&self, node: &MemoryNode) {
        let mut nodes = self.nodes.borrow_mut();
        if node.0 < nodes.len() {
            Self::detach(&mut nodes, node.0);
        }
    }

    fn attribute(&self, node: &MemoryNode, name: &str) -> Option<String> {
        self.nodes.borrow().get(node.0).and_then(|d| d.attrs.get(name).cloned())
    }

    fn set_attribute(&self, node: &MemoryNode, name: &str, value: &str) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node.0) {
            data.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    fn add_class(&self, node: &MemoryNode, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let current = self.class_name(node);
        let next = if current.trim().is_empty() { class.to_owned() } else { format!("{} {class}", current.trim()) };
        self.set_class_name(node, &next);
    }

    fn remove_class(&self, node: &MemoryNode, class: &str) {
        if !self.has_attribute(node, "class") {
            return;
        }
        let next = self
            .class_name(node)
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_class_name(node, &next);
    }

    fn set_style(&self, node: &MemoryNode, property: &str, value: &str) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node.0) {
            data.style.insert(property.to_owned(), value.to_owned());
        }
    }

    fn style(&self, node: &MemoryNode, property: &str) -> Option<String> {
        self.nodes.borrow().get(node.0).and_then(|d| d.style.get(property).cloned())
    }

    fn text_content(&self, node: &MemoryNode) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        if node.0 < nodes.len() {
            Self::collect_text(&nodes, node.0, &mut out);
        }
        out
    }

    fn set_text_content(&self, node: &MemoryNode, text: &str) {
        let mut nodes = self.nodes.borrow_mut();
        if node.0 >= nodes.len() {
            return;
        }
        for child in std::mem::take(&mut nodes[node.0].children) {
            nodes[child].parent = None;
        }
        nodes[node.0].text = text.to_owned();
    }

    fn inner_html(&self, node: &MemoryNode) -> String {
        self.text_content(node)
    }

    fn set_inner_html(&self, node: &MemoryNode, html: &str) {
        self.set_text_content(node, html);
    }

    fn value(&self, node: &MemoryNode) -> String {
        self.nodes.borrow().get(node.0).map_or_else(String::new, |d| d.value.clone())
    }

    fn set_disabled(&self, node: &MemoryNode, disabled: bool) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(node.0) {
            data.disabled = disabled;
        }
    }

    fn reset_form(&self, form: &MemoryNode) {
        let mut nodes = self.nodes.borrow_mut();
        if form.0 >= nodes.len() {
            return;
        }
        for idx in Self::descendants(&nodes, form.0) {
            let data = &mut nodes[idx];
            if data.tag == "input" || data.tag == "textarea" {
                data.value = data.attrs.get("value").cloned().unwrap_or_default();
            }
        }
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn offset_top(&self, node: &MemoryNode) -> f64 {
        self.nodes.borrow().get(node.0).map_or(0.0, |d| d.top)
    }

    fn client_height(&self, node: &MemoryNode) -> f64 {
        self.nodes.borrow().get(node.0).map_or(0.0, |d| d.height)
    }

    fn scroll_into_view(&self, node: &MemoryNode) {
        self.scrolled_into_view.borrow_mut().push(*node);
    }

    fn storage_get(&self, key: &str) -> Option<String> {
        self.storage.borrow().get(key).cloned()
    }

    fn storage_set(&self, key: &str, value: &str) {
        self.storage.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    fn ready_state(&self) -> ReadyState {
        self.ready.get()
    }

    fn connection_type(&self) -> Option<String> {
        self.connection.borrow().clone()
    }

    fn listen(&self, target: Target<'_, MemoryNode>, kind: EventKind, handler: EventHandler) -> ListenerId {
        let target = match target {
            Target::Window => TargetKey::Window,
            Target::Document => TargetKey::Document,
            Target::Node(node) => TargetKey::Node(node.0),
        };
        let id = self.next_handle();
        self.listeners
            .borrow_mut()
            .insert(id, Listener { target, kind, handler: Rc::new(RefCell::new(handler)) });
        ListenerId::from_raw(id)
    }

    fn unlisten(&self, id: ListenerId) {
        let removed = self.listeners.borrow_mut().remove(&id.raw());
        drop(removed);
    }

    fn observe(
        &self,
        targets: &[MemoryNode],
        options: &IntersectionOptions,
        handler: IntersectionHandler<MemoryNode>,
    ) -> ObserverId {
        let id = self.next_handle();
        self.observers.borrow_mut().insert(
            id,
            Observer {
                targets: targets.iter().map(|n| n.0).collect(),
                options: options.clone(),
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        ObserverId::from_raw(id)
    }

    fn disconnect(&self, id: ObserverId) {
        let removed = self.observers.borrow_mut().remove(&id.raw());
        drop(removed);
    }
}

// =============================================================
// Selector matching
// =============================================================

/// An arena element as seen by `selectors`.
#[derive(Clone, Copy)]
struct ElementRef<'a> {
    nodes: &'a [NodeData],
    idx: usize,
}

impl std::fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRef").field("idx", &self.idx).field("tag", &self.data().tag).finish()
    }
}

impl<'a> ElementRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.nodes[self.idx]
    }

    fn at(&self, idx: usize) -> Self {
        Self { nodes: self.nodes, idx }
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.data().attrs.get(name).map(String::as_str)
    }

    fn siblings(&self) -> &'a [usize] {
        match self.data().parent {
            Some(parent) => &self.nodes[parent].children,
            None => &[],
        }
    }

    fn position(&self) -> Option<usize> {
        self.siblings().iter().position(|&sibling| sibling == self.idx)
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = PageSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.data())
    }

    fn parent_element(&self) -> Option<Self> {
        self.data().parent.map(|parent| self.at(parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let pos = self.position()?;
        let prev = pos.checked_sub(1)?;
        Some(self.at(self.siblings()[prev]))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let pos = self.position()?;
        self.siblings().get(pos + 1).map(|&next| self.at(next))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.data().children.first().map(|&child| self.at(child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &CssName) -> bool {
        self.data().tag == local_name.as_str()
    }

    fn has_namespace(&self, _ns: &HtmlNamespace) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data().tag == other.data().tag
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&HtmlNamespace>,
        local_name: &CssName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        self.attr(local_name.as_str()).is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(&self, pc: &NoPseudoClass, _context: &mut MatchingContext<PageSelectors>) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(&self, pe: &NoPseudoElement, _context: &mut MatchingContext<PageSelectors>) -> bool {
        match *pe {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.data().tag.as_str(), "a" | "area") && self.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.data().tag == "slot"
    }

    fn has_id(&self, id: &CssName, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("id").is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.as_str().as_bytes()))
    }

    fn has_class(&self, name: &CssName, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("class").is_some_and(|classes| {
            classes.split_whitespace().any(|class| case_sensitivity.eq(class.as_bytes(), name.as_str().as_bytes()))
        })
    }

    fn imported_part(&self, _name: &CssName) -> Option<CssName> {
        None
    }

    fn is_part(&self, _name: &CssName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.data().children.is_empty() && self.data().text.is_empty()
    }

    fn is_root(&self) -> bool {
        self.data().parent.is_none() && self.data().tag == "html"
    }
}
