//! Lazy images and the page-load timing log.

#[cfg(test)]
#[path = "performance_test.rs"]
mod performance_test;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::app::Component;
use crate::dom::{Dom, IntersectionOptions, Selector, Subscriptions, Watch, when_loaded};
use crate::error::InitError;

const LAZY_IMAGE_SELECTOR: &str = "img[data-src]";
const IMAGE_SELECTOR: &str = "img";

pub struct PerformanceManager<D: Dom> {
    dom: Rc<D>,
    load_time_ms: Rc<Cell<Option<f64>>>,
    subscriptions: Subscriptions,
}

impl<D: Dom> PerformanceManager<D> {
    /// `started_ms` is the scheduler clock reading taken when the script
    /// started; the load log reports time elapsed since then.
    ///
    /// # Errors
    ///
    /// Only selector parse failures.
    pub fn init(dom: Rc<D>, started_ms: f64) -> Result<Self, InitError> {
        let mut subscriptions = Subscriptions::new();

        let lazy = dom.query_all(&Selector::parse(LAZY_IMAGE_SELECTOR)?);
        if !lazy.is_empty() {
            let weak: Weak<D> = Rc::downgrade(&dom);
            subscriptions.observer(dom.observe(
                &lazy,
                &IntersectionOptions::default(),
                Box::new(move |img| {
                    if let Some(dom) = weak.upgrade() {
                        if let Some(src) = dom.attribute(img, "data-src") {
                            dom.set_attribute(img, "src", &src);
                        }
                        dom.remove_class(img, "lazy");
                    }
                    Watch::Stop
                }),
            ));
        }

        let mut marked = 0_usize;
        for img in dom.query_all(&Selector::parse(IMAGE_SELECTOR)?) {
            if !dom.has_attribute(&img, "loading") {
                dom.set_attribute(&img, "loading", "lazy");
                marked += 1;
            }
        }
        log::debug!("{} lazy images observed, {marked} marked loading=lazy", lazy.len());

        let load_time_ms = Rc::new(Cell::new(None));
        let recorded = Rc::clone(&load_time_ms);
        when_loaded(&dom, &mut subscriptions, move |dom| {
            let elapsed = dom.now_ms() - started_ms;
            recorded.set(Some(elapsed));
            log::info!("portfolio loaded in {elapsed:.2}ms");
            if let Some(connection) = dom.connection_type() {
                log::info!("connection: {connection}");
            }
        });

        Ok(Self { dom, load_time_ms, subscriptions })
    }

    /// Milliseconds from script start to window `load`. Recorded during
    /// `init` when the page had already loaded.
    #[must_use]
    pub fn load_time_ms(&self) -> Option<f64> {
        self.load_time_ms.get()
    }
}

impl<D: Dom> Component for PerformanceManager<D> {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn dispose(&mut self) {
        self.subscriptions.release(&*self.dom);
    }
}
