use super::*;

fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

// =============================================================
// Queries
// =============================================================

#[test]
fn query_all_returns_document_order() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let a = dom.element(body, "section", &[("id", "a")]);
    let inner = dom.element(a, "section", &[("id", "inner")]);
    let b = dom.element(body, "section", &[("id", "b")]);
    assert_eq!(dom.query_all(&sel("section[id]")), vec![a, inner, b]);
}

#[test]
fn descendant_selector_requires_matching_ancestor() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let nav = dom.element(body, "ul", &[("class", "nav-links")]);
    let li = dom.element(nav, "li", &[]);
    let inside = dom.element(li, "a", &[("href", "#about")]);
    let outside = dom.element(body, "a", &[("href", "#about")]);
    assert_eq!(dom.query_all(&sel(".nav-links a")), vec![inside]);
    assert_eq!(dom.query_all(&sel("a")), vec![inside, outside]);
}

#[test]
fn query_within_matches_against_full_ancestry() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let hero = dom.element(body, "div", &[("class", "hero-content")]);
    let h1 = dom.element(hero, "h1", &[]);
    assert_eq!(dom.query_within(&hero, &sel(".hero-content h1")), Some(h1));
    assert_eq!(dom.query_within(&h1, &sel("h1")), None);
}

#[test]
fn attribute_tests_and_child_combinator() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let list = dom.element(body, "ul", &[("class", "nav-links")]);
    let first = dom.element(list, "li", &[]);
    let second = dom.element(list, "li", &[]);
    let internal = dom.element(first, "a", &[("href", "#about")]);
    let external = dom.element(second, "a", &[("href", "https://example.com")]);
    let nested = dom.element(internal, "span", &[]);

    assert_eq!(dom.query_all(&sel(r##"a[href^="#"]"##)), vec![internal]);
    assert_eq!(dom.query_all(&sel("a[href]")), vec![internal, external]);
    assert_eq!(dom.query_all(&sel(".nav-links > li:first-child a")), vec![internal]);
    assert_eq!(dom.query_all(&sel(".nav-links > span")), Vec::<MemoryNode>::new());
    assert_eq!(dom.query_all(&sel("li + li a")), vec![external]);
    assert_eq!(dom.query_all(&sel("span:empty")), vec![nested]);
}

#[test]
fn element_by_id_skips_detached_nodes() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let form = dom.element(body, "form", &[("id", "contactForm")]);
    assert_eq!(dom.element_by_id("contactForm"), Some(form));
    dom.remove(&form);
    assert_eq!(dom.element_by_id("contactForm"), None);
    assert!(!dom.is_attached(form));
}

// =============================================================
// Tree and attributes
// =============================================================

#[test]
fn prepend_inserts_before_existing_children() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let first = dom.element(body, "header", &[]);
    let link = dom.create_element("a").unwrap();
    dom.prepend_child(&body, &link);
    assert_eq!(dom.children(body), vec![link, first]);
    assert_eq!(dom.parent(&link), Some(body));
}

#[test]
fn class_helpers_add_once_and_remove() {
    let dom = MemoryDom::new();
    let el = dom.element(dom.document_body(), "div", &[("class", "card")]);
    dom.add_class(&el, "active");
    dom.add_class(&el, "active");
    assert_eq!(dom.class_name(&el), "card active");
    dom.remove_class(&el, "card");
    assert_eq!(dom.class_name(&el), "active");
    assert!(dom.has_class(&el, "active"));
    assert!(!dom.has_class(&el, "card"));
}

#[test]
fn text_content_concatenates_descendants() {
    let dom = MemoryDom::new();
    let button = dom.text_element(dom.document_body(), "button", &[], "Send ");
    dom.text_element(button, "span", &[], "now");
    assert_eq!(dom.text_content(&button), "Send now");
    dom.set_text_content(&button, "Sending...");
    assert_eq!(dom.text_content(&button), "Sending...");
    assert!(dom.children(button).is_empty());
}

#[test]
fn reset_form_restores_default_values() {
    let dom = MemoryDom::new();
    let form = dom.element(dom.document_body(), "form", &[]);
    let name = dom.element(form, "input", &[("name", "name")]);
    let subject = dom.element(form, "input", &[("name", "subject"), ("value", "Hello")]);
    let message = dom.element(form, "textarea", &[("name", "message")]);
    dom.set_value(name, "Ada");
    dom.set_value(subject, "Changed");
    dom.set_value(message, "Hi there");
    dom.reset_form(&form);
    assert_eq!(dom.value(&name), "");
    assert_eq!(dom.value(&subject), "Hello");
    assert_eq!(dom.value(&message), "");
}

// =============================================================
// Events and observers
// =============================================================

#[test]
fn dispatch_reaches_only_matching_target_and_kind() {
    let dom = MemoryDom::new();
    let button = dom.element(dom.document_body(), "button", &[]);
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    dom.listen(
        Target::Node(&button),
        EventKind::Click,
        Box::new(move |_| {
            h.set(h.get() + 1);
            Flow::PreventDefault
        }),
    );
    assert_eq!(dom.fire(button, EventKind::Click), Flow::PreventDefault);
    assert_eq!(dom.fire(button, EventKind::Blur), Flow::Continue);
    assert_eq!(dom.dispatch(Target::Window, &DomEvent::new(EventKind::Click)), Flow::Continue);
    assert_eq!(hits.get(), 1);
}

#[test]
fn unlisten_removes_handler() {
    let dom = MemoryDom::new();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let id = dom.listen(
        Target::Window,
        EventKind::Scroll,
        Box::new(move |_| {
            h.set(h.get() + 1);
            Flow::Continue
        }),
    );
    dom.scroll_to(10.0);
    dom.unlisten(id);
    dom.scroll_to(20.0);
    assert_eq!(hits.get(), 1);
    assert_eq!(dom.listener_count(), 0);
}

#[test]
fn handlers_may_mutate_the_document() {
    let dom = Rc::new(MemoryDom::new());
    let body = dom.document_body();
    let weak = Rc::downgrade(&dom);
    dom.listen(
        Target::Document,
        EventKind::KeyDown,
        Box::new(move |event| {
            if let Some(dom) = weak.upgrade() {
                if event.key.as_deref() == Some("Tab") {
                    dom.add_class(&body, "keyboard-navigation");
                }
            }
            Flow::Continue
        }),
    );
    dom.key_down("Tab");
    assert!(dom.has_class(&body, "keyboard-navigation"));
}

#[test]
fn intersection_stop_unobserves_only_that_node() {
    let dom = MemoryDom::new();
    let body = dom.document_body();
    let a = dom.element(body, "img", &[]);
    let b = dom.element(body, "img", &[]);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    dom.observe(
        &[a, b],
        &IntersectionOptions::default(),
        Box::new(move |node| {
            s.borrow_mut().push(*node);
            Watch::Stop
        }),
    );
    dom.intersect(a);
    dom.intersect(a);
    assert_eq!(*seen.borrow(), vec![a]);
    assert!(!dom.is_observed(a));
    assert!(dom.is_observed(b));
}

#[test]
fn timers_run_through_the_embedded_scheduler() {
    let dom = MemoryDom::new();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    dom.set_timeout(100, Box::new(move || h.set(h.get() + 1)));
    dom.advance(99);
    assert_eq!(hits.get(), 0);
    dom.advance(1);
    assert_eq!(hits.get(), 1);
}
