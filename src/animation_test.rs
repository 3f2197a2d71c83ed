use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::*;
use crate::dom::{DomEvent, EventKind, ReadyState, Target};
use crate::dom::memory::{MemoryDom, MemoryNode};

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(7)
}

fn init(dom: &Rc<MemoryDom>) -> AnimationManager<MemoryDom> {
    AnimationManager::init(Rc::clone(dom), &AnimationConfig::default(), &mut rng()).unwrap()
}

/// A page still loading images, so `load` is yet to fire.
fn loading_page() -> Rc<MemoryDom> {
    let dom = Rc::new(MemoryDom::new());
    dom.set_ready_state(ReadyState::Interactive);
    dom
}

fn load(dom: &MemoryDom) {
    dom.dispatch(Target::Window, &DomEvent::new(EventKind::Load));
}

struct Hero {
    hero: MemoryNode,
    title: MemoryNode,
    subtitle: MemoryNode,
}

fn hero(dom: &MemoryDom) -> Hero {
    let body = dom.document_body();
    let hero = dom.element(body, "section", &[("class", "hero"), ("id", "home")]);
    let content = dom.element(hero, "div", &[("class", "hero-content")]);
    let title = dom.text_element(content, "h1", &[], "placeholder");
    let subtitle = dom.text_element(content, "h2", &[], "placeholder");
    Hero { hero, title, subtitle }
}

fn parse_unit(raw: Option<String>, unit: &str) -> f64 {
    raw.as_deref().and_then(|v| v.strip_suffix(unit)).and_then(|v| v.parse().ok()).unwrap()
}

// =============================================================
// Scroll reveal
// =============================================================

#[test]
fn sections_are_observed_with_configured_options() {
    let dom = Rc::new(MemoryDom::new());
    let section = dom.element(dom.document_body(), "section", &[("id", "about")]);
    let _manager = init(&dom);
    let options = dom.observer_options(section).unwrap();
    assert!((options.threshold - 0.1).abs() < f64::EPSILON);
    assert_eq!(options.root_margin, "0px 0px -50px 0px");
}

#[test]
fn intersecting_section_reveals_and_staggers_grid_items() {
    let dom = Rc::new(MemoryDom::new());
    let section = dom.element(dom.document_body(), "section", &[("id", "skills")]);
    let grid = dom.element(section, "div", &[("class", "skills-grid")]);
    let cards: Vec<MemoryNode> = (0..3).map(|_| dom.element(grid, "div", &[("class", "skill-category")])).collect();
    let _manager = init(&dom);

    dom.intersect(section);
    assert!(dom.has_class(&section, REVEAL_CLASS));

    dom.advance(0);
    assert_eq!(dom.style(&cards[0], "animation").as_deref(), Some(GRID_ITEM_ANIMATION));
    assert_eq!(dom.style(&cards[1], "animation"), None);

    dom.advance(100);
    assert_eq!(dom.style(&cards[1], "animation").as_deref(), Some(GRID_ITEM_ANIMATION));
    assert_eq!(dom.style(&cards[2], "animation"), None);

    dom.advance(100);
    assert_eq!(dom.style(&cards[2], "animation").as_deref(), Some(GRID_ITEM_ANIMATION));
}

#[test]
fn reentering_section_is_idempotent() {
    let dom = Rc::new(MemoryDom::new());
    let section = dom.element(dom.document_body(), "section", &[("id", "projects")]);
    let card = dom.element(section, "div", &[("class", "project-card")]);
    let _manager = init(&dom);

    dom.intersect(section);
    dom.advance(500);
    dom.intersect(section);
    dom.advance(500);

    assert!(dom.is_observed(section));
    assert_eq!(dom.class_name(&section), REVEAL_CLASS);
    assert_eq!(dom.style(&card, "animation").as_deref(), Some(GRID_ITEM_ANIMATION));
}

// =============================================================
// Hero typewriter
// =============================================================

#[test]
fn typewriter_types_title_then_subtitle_after_load() {
    let dom = loading_page();
    let h = hero(&dom);
    let _manager = init(&dom);

    dom.advance(10_000);
    assert_eq!(dom.text_content(&h.title), "placeholder", "nothing happens before load");

    load(&dom);
    dom.advance(499);
    assert_eq!(dom.text_content(&h.title), "placeholder");

    dom.advance(1);
    assert_eq!(dom.text_content(&h.title), "A");

    dom.advance(100);
    assert_eq!(dom.text_content(&h.title), "Ah");

    // "Ahmed Hussain" is 13 characters: the last lands 12 ticks after the first.
    dom.advance(1_100);
    assert_eq!(dom.text_content(&h.title), "Ahmed Hussain");

    // Subtitle starts 2000ms after load.
    assert_eq!(dom.text_content(&h.subtitle), "placeholder");
    dom.advance(300);
    assert_eq!(dom.text_content(&h.subtitle), "A");

    dom.advance(10_000);
    assert_eq!(dom.text_content(&h.subtitle), "Aspiring AI/ML Engineer");
    assert_eq!(dom.text_content(&h.title), "Ahmed Hussain");
    assert_eq!(dom.scheduler().pending(), 0, "no trailing timers");
}

#[test]
fn typewriter_uses_configured_text_and_speed() {
    let dom = loading_page();
    let h = hero(&dom);
    let config = AnimationConfig {
        hero_title: "Hi".to_owned(),
        title_delay_ms: 0,
        type_speed_ms: 10,
        ..AnimationConfig::default()
    };
    let _manager = AnimationManager::init(Rc::clone(&dom), &config, &mut rng()).unwrap();
    load(&dom);
    dom.advance(0);
    assert_eq!(dom.text_content(&h.title), "H");
    dom.advance(10);
    assert_eq!(dom.text_content(&h.title), "Hi");
}

#[test]
fn typewriter_starts_at_once_when_page_already_loaded() {
    let dom = Rc::new(MemoryDom::new());
    let h = hero(&dom);
    let _manager = init(&dom);
    assert_eq!(dom.listener_count(), 0, "load already fired; nothing to wait for");

    dom.advance(499);
    assert_eq!(dom.text_content(&h.title), "placeholder");
    dom.advance(1);
    assert_eq!(dom.text_content(&h.title), "A");

    dom.advance(10_000);
    assert_eq!(dom.text_content(&h.title), "Ahmed Hussain");
    assert_eq!(dom.text_content(&h.subtitle), "Aspiring AI/ML Engineer");
}

#[test]
fn missing_hero_text_targets_are_skipped() {
    let dom = Rc::new(MemoryDom::new());
    let _manager = init(&dom);
    assert_eq!(dom.listener_count(), 0);
    load(&dom);
    dom.advance(5_000);
    assert_eq!(dom.scheduler().pending(), 0);
}

#[test]
fn dispose_halts_typewriter_mid_word() {
    let dom = loading_page();
    let h = hero(&dom);
    let mut manager = init(&dom);
    load(&dom);
    dom.advance(700);
    assert_eq!(dom.text_content(&h.title), "Ahm");

    manager.dispose();
    dom.advance(10_000);
    assert_eq!(dom.text_content(&h.title), "Ahm");
    assert_eq!(dom.text_content(&h.subtitle), "placeholder");
    assert_eq!(dom.listener_count(), 0);
    assert_eq!(dom.observer_count(), 0);
}

// =============================================================
// Particles
// =============================================================

#[test]
fn particles_are_appended_to_hero_with_randomized_styles() {
    let dom = Rc::new(MemoryDom::new());
    let h = hero(&dom);
    let manager = init(&dom);

    let container = *manager.particles().unwrap();
    assert_eq!(dom.parent(&container), Some(h.hero));
    assert_eq!(dom.class_name(&container), "particles");
    assert_eq!(dom.style(&h.hero, "position").as_deref(), Some("relative"));

    let particles = dom.children(container);
    assert_eq!(particles.len(), 50);
    for particle in particles {
        assert_eq!(dom.class_name(&particle), "particle");
        let left = parse_unit(dom.style(&particle, "left"), "%");
        let delay = parse_unit(dom.style(&particle, "animation-delay"), "s");
        let duration = parse_unit(dom.style(&particle, "animation-duration"), "s");
        assert!((0.0..100.0).contains(&left), "left {left}");
        assert!((0.0..6.0).contains(&delay), "delay {delay}");
        assert!((3.0..6.0).contains(&duration), "duration {duration}");
    }
}

#[test]
fn particle_count_is_configurable() {
    let dom = Rc::new(MemoryDom::new());
    hero(&dom);
    let config = AnimationConfig { particle_count: 3, ..AnimationConfig::default() };
    let manager = AnimationManager::init(Rc::clone(&dom), &config, &mut rng()).unwrap();
    assert_eq!(dom.children(*manager.particles().unwrap()).len(), 3);
}

#[test]
fn absent_hero_skips_particles() {
    let dom = Rc::new(MemoryDom::new());
    let manager = init(&dom);
    assert!(manager.particles().is_none());
    assert!(dom.query_all(&Selector::parse(".particle").unwrap()).is_empty());
}
