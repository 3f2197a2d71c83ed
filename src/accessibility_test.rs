use super::*;
use crate::dom::DomEvent;
use crate::dom::memory::MemoryDom;

#[test]
fn icon_label_mapping() {
    assert_eq!(icon_label("fas fa-moon"), Some("Switch to dark theme"));
    assert_eq!(icon_label("fas fa-sun"), Some("Switch to light theme"));
    assert_eq!(icon_label("fas fa-bars"), Some("Open mobile menu"));
    assert_eq!(icon_label("fab fa-github"), None);
}

#[test]
fn icon_label_last_match_wins() {
    assert_eq!(icon_label("fa-moon fa-bars"), Some("Open mobile menu"));
    assert_eq!(icon_label("fa-sun fa-moon"), Some("Switch to light theme"));
}

#[test]
fn tab_enables_and_mouse_disables_keyboard_class() {
    let dom = Rc::new(MemoryDom::new());
    let body = dom.document_body();
    let _manager = AccessibilityManager::init(Rc::clone(&dom)).unwrap();

    dom.key_down("Enter");
    assert!(!dom.has_class(&body, KEYBOARD_CLASS));

    dom.key_down("Tab");
    assert!(dom.has_class(&body, KEYBOARD_CLASS));

    dom.dispatch(Target::Document, &DomEvent::new(EventKind::MouseDown));
    assert!(!dom.has_class(&body, KEYBOARD_CLASS));
}

#[test]
fn skip_link_is_first_child_and_moves_on_focus() {
    let dom = Rc::new(MemoryDom::new());
    let body = dom.document_body();
    dom.element(body, "nav", &[]);
    let manager = AccessibilityManager::init(Rc::clone(&dom)).unwrap();
    let link = *manager.skip_link();

    assert_eq!(dom.children(body).first(), Some(&link));
    assert_eq!(dom.attribute(&link, "href").as_deref(), Some("#main"));
    assert_eq!(dom.class_name(&link), "skip-link sr-only");
    assert_eq!(dom.text_content(&link), "Skip to main content");
    assert_eq!(dom.style(&link, "top").as_deref(), Some("-40px"));

    dom.fire(link, EventKind::Focus);
    assert_eq!(dom.style(&link, "top").as_deref(), Some("6px"));
    dom.fire(link, EventKind::Blur);
    assert_eq!(dom.style(&link, "top").as_deref(), Some("-40px"));
}

#[test]
fn icon_only_controls_receive_labels() {
    let dom = Rc::new(MemoryDom::new());
    let body = dom.document_body();
    let toggle = dom.element(body, "button", &[("class", "theme-toggle")]);
    dom.element(toggle, "i", &[("class", "fas fa-moon")]);
    let menu = dom.element(body, "div", &[("class", "hamburger")]);
    let burger = dom.element(menu, "a", &[]);
    dom.element(burger, "i", &[("class", "fas fa-bars")]);
    let social = dom.element(body, "a", &[("href", "https://github.com")]);
    dom.element(social, "i", &[("class", "fab fa-github")]);
    let labelled = dom.element(body, "button", &[("aria-label", "Custom")]);
    dom.element(labelled, "i", &[("class", "fas fa-sun")]);
    let texty = dom.text_element(body, "button", &[], "Send");
    dom.element(texty, "i", &[("class", "fas fa-sun")]);

    let _manager = AccessibilityManager::init(Rc::clone(&dom)).unwrap();

    assert_eq!(dom.attribute(&toggle, "aria-label").as_deref(), Some("Switch to dark theme"));
    assert_eq!(dom.attribute(&burger, "aria-label").as_deref(), Some("Open mobile menu"));
    assert_eq!(dom.attribute(&social, "aria-label"), None);
    assert_eq!(dom.attribute(&labelled, "aria-label").as_deref(), Some("Custom"));
    assert_eq!(dom.attribute(&texty, "aria-label"), None);
}

#[test]
fn dispose_unbinds_keyboard_tracking() {
    let dom = Rc::new(MemoryDom::new());
    let body = dom.document_body();
    let mut manager = AccessibilityManager::init(Rc::clone(&dom)).unwrap();
    manager.dispose();
    assert_eq!(dom.listener_count(), 0);
    dom.key_down("Tab");
    assert!(!dom.has_class(&body, KEYBOARD_CLASS));
}
