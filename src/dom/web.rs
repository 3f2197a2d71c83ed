//! `web-sys` implementation of [`Dom`] for the hydrated page.
//!
//! Listener and observer closures are owned here, keyed by handle, so
//! `unlisten` / `disconnect` can detach them and free the Rust side.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, Window,
};

use super::{
    Dom, DomEvent, EventHandler, EventKind, Flow, IntersectionHandler, IntersectionOptions, ListenerId, ObserverId,
    ReadyState, Selector, Target, Watch,
};
use crate::timer::{BrowserScheduler, Scheduler, TimerCallback, TimerId};

struct RegisteredListener {
    target: EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(Event)>,
}

struct RegisteredObserver {
    observer: IntersectionObserver,
    _closure: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

pub struct WebDom {
    window: Window,
    document: Document,
    timers: BrowserScheduler,
    next_handle: Cell<u64>,
    listeners: RefCell<HashMap<u64, RegisteredListener>>,
    observers: RefCell<HashMap<u64, RegisteredObserver>>,
}

impl WebDom {
    /// Bind to the global `window` / `document`. `None` outside a browser.
    #[must_use]
    pub fn new() -> Option<Rc<Self>> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Rc::new(Self {
            window,
            document,
            timers: BrowserScheduler::default(),
            next_handle: Cell::new(1),
            listeners: RefCell::new(HashMap::new()),
            observers: RefCell::new(HashMap::new()),
        }))
    }

    fn next_handle(&self) -> u64 {
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        id
    }

    fn collect(list: &web_sys::NodeList) -> Vec<Element> {
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }
}

fn report(context: &str, result: Result<impl Sized, JsValue>) {
    if let Err(err) = result {
        log::warn!("{context} failed: {err:?}");
    }
}

impl Scheduler for WebDom {
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

impl Dom for WebDom {
    type Node = Element;

    fn query_all(&self, selector: &Selector) -> Vec<Element> {
        match self.document.query_selector_all(selector.as_str()) {
            Ok(list) => Self::collect(&list),
            Err(err) => {
                log::warn!("querySelectorAll({selector}) failed: {err:?}");
                Vec::new()
            }
        }
    }

    fn query_all_within(&self, root: &Element, selector: &Selector) -> Vec<Element> {
        match root.query_selector_all(selector.as_str()) {
            Ok(list) => Self::collect(&list),
            Err(err) => {
                log::warn!("querySelectorAll({selector}) failed: {err:?}");
                Vec::new()
            }
        }
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        match self.document.create_element(tag) {
            Ok(el) => Some(el),
            Err(err) => {
                log::warn!("createElement({tag}) failed: {err:?}");
                None
            }
        }
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        report("appendChild", parent.append_child(child));
    }

    fn prepend_child(&self, parent: &Element, child: &Element) {
        report("insertBefore", parent.insert_before(child, parent.first_child().as_ref()));
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        report("setAttribute", node.set_attribute(name, value));
    }

    fn has_attribute(&self, node: &Element, name: &str) -> bool {
        node.has_attribute(name)
    }

    fn class_name(&self, node: &Element) -> String {
        node.class_name()
    }

    fn set_class_name(&self, node: &Element, value: &str) {
        node.set_class_name(value);
    }

    fn add_class(&self, node: &Element, class: &str) {
        report("classList.add", node.class_list().add_1(class));
    }

    fn remove_class(&self, node: &Element, class: &str) {
        report("classList.remove", node.class_list().remove_1(class));
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            report("style.setProperty", el.style().set_property(property, value));
        }
    }

    fn style(&self, node: &Element, property: &str) -> Option<String> {
        let el = node.dyn_ref::<HtmlElement>()?;
        match el.style().get_property_value(property) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            return input.value();
        }
        if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            return area.value();
        }
        String::new()
    }

    fn set_disabled(&self, node: &Element, disabled: bool) {
        if disabled {
            report("setAttribute(disabled)", node.set_attribute("disabled", ""));
        } else {
            report("removeAttribute(disabled)", node.remove_attribute("disabled"));
        }
    }

    fn reset_form(&self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn offset_top(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>().map_or(0.0, |el| f64::from(el.offset_top()))
    }

    fn client_height(&self, node: &Element) -> f64 {
        f64::from(node.client_height())
    }

    fn scroll_into_view(&self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn storage_get(&self, key: &str) -> Option<String> {
        let storage = self.window.local_storage().ok().flatten()?;
        storage.get_item(key).ok().flatten()
    }

    fn storage_set(&self, key: &str, value: &str) {
        match self.window.local_storage() {
            Ok(Some(storage)) => report("localStorage.setItem", storage.set_item(key, value)),
            Ok(None) => log::debug!("localStorage unavailable; {key} not persisted"),
            Err(err) => log::warn!("localStorage access failed: {err:?}"),
        }
    }

    fn ready_state(&self) -> ReadyState {
        match self.document.ready_state().as_str() {
            "loading" => ReadyState::Loading,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Complete,
        }
    }

    fn connection_type(&self) -> Option<String> {
        let navigator = self.window.navigator();
        let connection = js_sys::Reflect::get(&navigator, &JsValue::from_str("connection")).ok()?;
        if connection.is_undefined() || connection.is_null() {
            return None;
        }
        js_sys::Reflect::get(&connection, &JsValue::from_str("effectiveType"))
            .ok()?
            .as_string()
    }

    fn listen(&self, target: Target<'_, Element>, kind: EventKind, mut handler: EventHandler) -> ListenerId {
        let target: EventTarget = match target {
            Target::Window => self.window.clone().into(),
            Target::Document => self.document.clone().into(),
            Target::Node(node) => node.clone().into(),
        };
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let key = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key);
            if handler(&DomEvent { kind, key }) == Flow::PreventDefault {
                event.prevent_default();
            }
        });
        report(
            "addEventListener",
            target.add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref()),
        );
        let id = self.next_handle();
        self.listeners
            .borrow_mut()
            .insert(id, RegisteredListener { target, kind, closure });
        ListenerId::from_raw(id)
    }

    fn unlisten(&self, id: ListenerId) {
        let removed = self.listeners.borrow_mut().remove(&id.raw());
        if let Some(listener) = removed {
            report(
                "removeEventListener",
                listener
                    .target
                    .remove_event_listener_with_callback(listener.kind.as_str(), listener.closure.as_ref().unchecked_ref()),
            );
        }
    }

    fn observe(
        &self,
        targets: &[Element],
        options: &IntersectionOptions,
        mut handler: IntersectionHandler<Element>,
    ) -> ObserverId {
        let closure = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    if handler(&target) == Watch::Stop {
                        observer.unobserve(&target);
                    }
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);

        let id = self.next_handle();
        match IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                for target in targets {
                    observer.observe(target);
                }
                self.observers
                    .borrow_mut()
                    .insert(id, RegisteredObserver { observer, _closure: closure });
            }
            Err(err) => log::warn!("IntersectionObserver unavailable: {err:?}"),
        }
        ObserverId::from_raw(id)
    }

    fn disconnect(&self, id: ObserverId) {
        let removed = self.observers.borrow_mut().remove(&id.raw());
        if let Some(registered) = removed {
            registered.observer.disconnect();
        }
    }
}
