//! Scroll reveal, hero typewriter and the decorative particle field.
//!
//! DESIGN
//! ======
//! Every deferred step (stagger, typewriter tick, hero delays) is a one-shot
//! timer that holds only a `Weak` reference to the DOM plus the component's
//! `live` flag. After `dispose` the flag is cleared and any timer still in
//! flight returns without touching the page.

#[cfg(test)]
#[path = "animation_test.rs"]
mod animation_test;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use rand::Rng;

use crate::app::Component;
use crate::config::AnimationConfig;
use crate::dom::{Dom, IntersectionOptions, Selector, Subscriptions, Watch, when_loaded};
use crate::error::InitError;

const SECTION_SELECTOR: &str = "section";
const GRID_ITEM_SELECTOR: &str = ".skill-category, .project-card, .cert-card";
const HERO_SELECTOR: &str = ".hero";
const HERO_TITLE_SELECTOR: &str = ".hero-content h1";
const HERO_SUBTITLE_SELECTOR: &str = ".hero-content h2";

pub const REVEAL_CLASS: &str = "fade-in-up";
pub const GRID_ITEM_ANIMATION: &str = "fadeInUp 0.8s ease forwards";

/// Types `chars` into `node` one character per tick.
struct Typewriter<D: Dom> {
    dom: Weak<D>,
    node: D::Node,
    chars: Vec<char>,
    typed: usize,
    speed_ms: u32,
    live: Rc<Cell<bool>>,
}

impl<D: Dom> Typewriter<D> {
    fn start(dom: &Rc<D>, node: D::Node, text: &str, speed_ms: u32, live: Rc<Cell<bool>>) {
        dom.set_text_content(&node, "");
        Self { dom: Rc::downgrade(dom), node, chars: text.chars().collect(), typed: 0, speed_ms, live }.step();
    }

    fn step(mut self) {
        if !self.live.get() {
            return;
        }
        let Some(dom) = self.dom.upgrade() else {
            return;
        };
        let Some(&next) = self.chars.get(self.typed) else {
            return;
        };
        let mut text = dom.text_content(&self.node);
        text.push(next);
        dom.set_text_content(&self.node, &text);
        self.typed += 1;

        if self.typed < self.chars.len() {
            let speed = self.speed_ms;
            dom.set_timeout(speed, Box::new(move || self.step()));
        }
    }
}

/// Schedule a typewriter run on `node` after `delay_ms`.
fn schedule_typing<D: Dom>(dom: &Rc<D>, node: D::Node, text: String, delay_ms: u32, speed_ms: u32, live: &Rc<Cell<bool>>) {
    let weak = Rc::downgrade(dom);
    let live = Rc::clone(live);
    dom.set_timeout(
        delay_ms,
        Box::new(move || {
            if let Some(dom) = weak.upgrade().filter(|_| live.get()) {
                Typewriter::start(&dom, node, &text, speed_ms, live);
            }
        }),
    );
}

/// Reveal `section` and stagger its grid cards.
fn reveal<D: Dom>(dom: &Rc<D>, section: &D::Node, grid: &Selector, step_ms: u32, live: &Rc<Cell<bool>>) {
    dom.add_class(section, REVEAL_CLASS);
    for (index, item) in dom.query_all_within(section, grid).into_iter().enumerate() {
        let delay = u32::try_from(index).unwrap_or(u32::MAX).saturating_mul(step_ms);
        let weak = Rc::downgrade(dom);
        let live = Rc::clone(live);
        dom.set_timeout(
            delay,
            Box::new(move || {
                if let Some(dom) = weak.upgrade().filter(|_| live.get()) {
                    dom.set_style(&item, "animation", GRID_ITEM_ANIMATION);
                }
            }),
        );
    }
}

pub struct AnimationManager<D: Dom> {
    dom: Rc<D>,
    live: Rc<Cell<bool>>,
    subscriptions: Subscriptions,
    particles: Option<D::Node>,
}

impl<D: Dom> AnimationManager<D> {
    /// Observe sections, arm the hero typewriter and spawn particles.
    ///
    /// # Errors
    ///
    /// [`InitError::CreateElement`] when the particle elements cannot be
    /// created. Missing hero elements are skipped.
    pub fn init<R: Rng>(dom: Rc<D>, config: &AnimationConfig, rng: &mut R) -> Result<Self, InitError> {
        let live = Rc::new(Cell::new(true));
        let mut subscriptions = Subscriptions::new();

        let sections = dom.query_all(&Selector::parse(SECTION_SELECTOR)?);
        if !sections.is_empty() {
            let grid = Selector::parse(GRID_ITEM_SELECTOR)?;
            let weak = Rc::downgrade(&dom);
            let flag = Rc::clone(&live);
            let step_ms = config.stagger_step_ms;
            let options = IntersectionOptions {
                threshold: config.reveal_threshold,
                root_margin: config.reveal_root_margin.clone(),
            };
            subscriptions.observer(dom.observe(
                &sections,
                &options,
                Box::new(move |section| {
                    if let Some(dom) = weak.upgrade() {
                        reveal(&dom, section, &grid, step_ms, &flag);
                    }
                    Watch::Keep
                }),
            ));
        }

        let title = dom.query(&Selector::parse(HERO_TITLE_SELECTOR)?);
        let subtitle = dom.query(&Selector::parse(HERO_SUBTITLE_SELECTOR)?);
        if title.is_some() || subtitle.is_some() {
            let flag = Rc::clone(&live);
            let config = config.clone();
            when_loaded(&dom, &mut subscriptions, move |dom| {
                if let Some(node) = &title {
                    let text = config.hero_title.clone();
                    schedule_typing(dom, node.clone(), text, config.title_delay_ms, config.type_speed_ms, &flag);
                }
                if let Some(node) = &subtitle {
                    let text = config.hero_subtitle.clone();
                    schedule_typing(dom, node.clone(), text, config.subtitle_delay_ms, config.type_speed_ms, &flag);
                }
            });
        }

        let particles = spawn_particles(&dom, config.particle_count, rng)?;

        log::debug!("animations watching {} sections", sections.len());
        Ok(Self { dom, live, subscriptions, particles })
    }

    /// The `.particles` container, when a hero was present.
    #[must_use]
    pub fn particles(&self) -> Option<&D::Node> {
        self.particles.as_ref()
    }
}

/// Append a `.particles` field of `count` randomized `.particle` divs to `.hero`.
fn spawn_particles<D: Dom, R: Rng>(dom: &Rc<D>, count: usize, rng: &mut R) -> Result<Option<D::Node>, InitError> {
    let Some(hero) = dom.query(&Selector::parse(HERO_SELECTOR)?) else {
        log::debug!("no {HERO_SELECTOR}; skipping particles");
        return Ok(None);
    };

    let container = dom.create_element("div").ok_or(InitError::CreateElement("div"))?;
    dom.set_class_name(&container, "particles");
    for _ in 0..count {
        let particle = dom.create_element("div").ok_or(InitError::CreateElement("div"))?;
        dom.set_class_name(&particle, "particle");
        dom.set_style(&particle, "left", &format!("{}%", rng.random_range(0.0_f64..100.0)));
        dom.set_style(&particle, "animation-delay", &format!("{}s", rng.random_range(0.0_f64..6.0)));
        dom.set_style(&particle, "animation-duration", &format!("{}s", rng.random_range(3.0_f64..6.0)));
        dom.append_child(&container, &particle);
    }

    dom.set_style(&hero, "position", "relative");
    dom.append_child(&hero, &container);
    Ok(Some(container))
}

impl<D: Dom> Component for AnimationManager<D> {
    fn name(&self) -> &'static str {
        "animation"
    }

    fn dispose(&mut self) {
        self.live.set(false);
        self.subscriptions.release(&*self.dom);
    }
}
