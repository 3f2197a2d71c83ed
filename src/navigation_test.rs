use super::*;
use crate::dom::memory::{MemoryDom, MemoryNode};

fn bounds(id: &str, top: f64, height: f64) -> SectionBounds {
    SectionBounds { id: id.to_owned(), top, height }
}

struct Page {
    dom: Rc<MemoryDom>,
    link_a: MemoryNode,
    link_b: MemoryNode,
    section_b: MemoryNode,
}

/// Sections A (0–500px) and B (500–1000px) with matching nav links.
fn page() -> Page {
    let dom = Rc::new(MemoryDom::new());
    let body = dom.document_body();
    let nav = dom.element(body, "ul", &[("class", "nav-links")]);
    let link_a = dom.element(nav, "a", &[("href", "#a")]);
    let link_b = dom.element(nav, "a", &[("href", "#b")]);
    let section_a = dom.element(body, "section", &[("id", "a")]);
    let section_b = dom.element(body, "section", &[("id", "b")]);
    dom.set_layout(section_a, 0.0, 500.0);
    dom.set_layout(section_b, 500.0, 500.0);
    Page { dom, link_a, link_b, section_b }
}

// =============================================================
// resolve_active_section
// =============================================================

#[test]
fn resolves_section_containing_offset_with_lookahead() {
    let sections = [bounds("a", 0.0, 500.0), bounds("b", 500.0, 500.0)];
    assert_eq!(resolve_active_section(600.0, &sections, 100.0), Some("b"));
    assert_eq!(resolve_active_section(0.0, &sections, 100.0), Some("a"));
    assert_eq!(resolve_active_section(399.0, &sections, 100.0), Some("a"));
    assert_eq!(resolve_active_section(400.0, &sections, 100.0), Some("b"));
    assert_eq!(resolve_active_section(900.0, &sections, 100.0), None);
}

#[test]
fn later_section_wins_on_overlap() {
    let sections = [bounds("outer", 0.0, 2000.0), bounds("inner", 300.0, 200.0)];
    assert_eq!(resolve_active_section(350.0, &sections, 100.0), Some("inner"));
    assert_eq!(resolve_active_section(1000.0, &sections, 100.0), Some("outer"));
}

#[test]
fn no_sections_resolves_to_none() {
    assert_eq!(resolve_active_section(10.0, &[], 100.0), None);
}

// =============================================================
// NavigationManager
// =============================================================

#[test]
fn scroll_marks_only_matching_link_active() {
    let p = page();
    let manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    p.dom.add_class(&p.link_a, "active");

    p.dom.scroll_to(600.0);

    assert_eq!(manager.active_section().as_deref(), Some("b"));
    assert!(p.dom.has_class(&p.link_b, "active"));
    assert!(!p.dom.has_class(&p.link_a, "active"));
}

#[test]
fn scroll_updates_are_throttled() {
    let p = page();
    let manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();

    p.dom.scroll_to(0.0);
    assert_eq!(manager.active_section().as_deref(), Some("a"));

    p.dom.advance(50);
    p.dom.scroll_to(600.0);
    assert_eq!(manager.active_section().as_deref(), Some("a"), "dropped inside the 100ms window");

    p.dom.advance(50);
    p.dom.scroll_to(600.0);
    assert_eq!(manager.active_section().as_deref(), Some("b"));
}

#[test]
fn scrolling_past_all_sections_clears_active_links() {
    let p = page();
    let manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    p.dom.scroll_to(600.0);
    p.dom.advance(100);
    p.dom.scroll_to(5_000.0);
    assert_eq!(manager.active_section(), None);
    assert!(!p.dom.has_class(&p.link_a, "active"));
    assert!(!p.dom.has_class(&p.link_b, "active"));
}

#[test]
fn anchor_click_prevents_default_and_scrolls_to_target() {
    let p = page();
    let _manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    assert_eq!(p.dom.fire(p.link_b, EventKind::Click), Flow::PreventDefault);
    assert_eq!(p.dom.scrolled_into_view(), vec![p.section_b]);
}

#[test]
fn anchor_without_target_is_a_noop() {
    let p = page();
    let body = p.dom.document_body();
    let dangling = p.dom.element(body, "a", &[("href", "#missing")]);
    let bare = p.dom.element(body, "a", &[("href", "#")]);
    let _manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    assert_eq!(p.dom.fire(dangling, EventKind::Click), Flow::PreventDefault);
    assert_eq!(p.dom.fire(bare, EventKind::Click), Flow::PreventDefault);
    assert!(p.dom.scrolled_into_view().is_empty());
}

#[test]
fn external_links_are_not_intercepted() {
    let p = page();
    let external = p.dom.element(p.dom.document_body(), "a", &[("href", "https://example.com")]);
    let _manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    assert_eq!(p.dom.fire(external, EventKind::Click), Flow::Continue);
}

#[test]
fn refresh_bypasses_throttle() {
    let p = page();
    let manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    p.dom.set_scroll_y(600.0);
    manager.refresh();
    assert_eq!(manager.active_section().as_deref(), Some("b"));
}

#[test]
fn dispose_stops_tracking() {
    let p = page();
    let mut manager = NavigationManager::init(Rc::clone(&p.dom), &NavigationConfig::default()).unwrap();
    manager.dispose();
    assert_eq!(p.dom.listener_count(), 0);
    p.dom.scroll_to(600.0);
    assert_eq!(manager.active_section(), None);
}
