//! Page startup: builds every component in a fixed order and keeps them for
//! the life of the page.
//!
//! DESIGN
//! ======
//! Startup waits for `DOMContentLoaded` when the document is still loading.
//! Components are built Theme, Navigation, Animation, ContactForm,
//! Performance, Accessibility. The first [`InitError`] is logged and ends
//! startup; components already built stay registered and working.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::accessibility::AccessibilityManager;
use crate::animation::AnimationManager;
use crate::config::PortfolioConfig;
use crate::contact_form::{ContactFormManager, Spawner, Transport};
use crate::dom::{Dom, EventKind, Flow, ListenerId, ReadyState, Target};
use crate::error::InitError;
use crate::navigation::NavigationManager;
use crate::performance::PerformanceManager;
use crate::theme::{Theme, ThemeManager};

/// A page feature owned by the [`Registry`].
pub trait Component: Any {
    fn name(&self) -> &'static str;

    /// Release listeners and observers and stop pending work. Idempotent.
    fn dispose(&mut self);
}

/// Components in construction order.
#[derive(Default)]
pub struct Registry {
    components: Vec<Box<dyn Component>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<C: Component>(&mut self, component: C) {
        log::debug!("registered {}", component.name());
        self.components.push(Box::new(component));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// First registered component of type `T`.
    #[must_use]
    pub fn find<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(|c| {
            let any: &dyn Any = &**c;
            any.downcast_ref::<T>()
        })
    }

    /// Dispose every component, newest first.
    pub fn dispose_all(&mut self) {
        for component in self.components.iter_mut().rev() {
            component.dispose();
        }
    }
}

/// Host-provided collaborators for components that do I/O.
#[derive(Clone)]
pub struct Services {
    pub transport: Rc<dyn Transport>,
    pub spawner: Rc<dyn Spawner>,
}

struct AppInner<D: Dom> {
    dom: Rc<D>,
    config: PortfolioConfig,
    services: Services,
    started_ms: f64,
    registry: RefCell<Registry>,
    initialized: Cell<bool>,
    ready_listener: Cell<Option<ListenerId>>,
}

impl<D: Dom> AppInner<D> {
    fn initialize(&self) {
        if self.initialized.replace(true) {
            return;
        }
        match self.build() {
            Ok(()) => log::info!("portfolio initialized: {}", self.registry.borrow().names().join(", ")),
            Err(err) => log::error!("portfolio initialization failed: {err}"),
        }
    }

    fn build(&self) -> Result<(), InitError> {
        let dom = &self.dom;
        let config = &self.config;
        let mut registry = self.registry.borrow_mut();

        registry.push(ThemeManager::init(Rc::clone(dom), &config.theme)?);
        registry.push(NavigationManager::init(Rc::clone(dom), &config.navigation)?);

        let mut rng = SmallRng::seed_from_u64(dom.now_ms().to_bits());
        registry.push(AnimationManager::init(Rc::clone(dom), &config.animation, &mut rng)?);

        registry.push(ContactFormManager::init(
            Rc::clone(dom),
            &config.contact,
            Rc::clone(&self.services.transport),
            Rc::clone(&self.services.spawner),
        )?);
        registry.push(PerformanceManager::init(Rc::clone(dom), self.started_ms)?);
        registry.push(AccessibilityManager::init(Rc::clone(dom))?);
        Ok(())
    }
}

/// The running page. Cheap to clone.
pub struct App<D: Dom> {
    inner: Rc<AppInner<D>>,
}

impl<D: Dom> Clone for App<D> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<D: Dom> App<D> {
    /// Boot with the page's config block (or defaults).
    pub fn boot(dom: Rc<D>, services: Services) -> Self {
        let config = PortfolioConfig::load(&*dom);
        Self::with_config(dom, config, services)
    }

    /// Initialize now, or on `DOMContentLoaded` while the document is loading.
    pub fn with_config(dom: Rc<D>, config: PortfolioConfig, services: Services) -> Self {
        let started_ms = dom.now_ms();
        let inner = Rc::new(AppInner {
            dom: Rc::clone(&dom),
            config,
            services,
            started_ms,
            registry: RefCell::new(Registry::new()),
            initialized: Cell::new(false),
            ready_listener: Cell::new(None),
        });

        if dom.ready_state() == ReadyState::Loading {
            log::debug!("document loading; waiting for DOMContentLoaded");
            let weak = Rc::downgrade(&inner);
            let id = dom.listen(
                Target::Document,
                EventKind::DomContentLoaded,
                Box::new(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.initialize();
                    }
                    Flow::Continue
                }),
            );
            inner.ready_listener.set(Some(id));
        } else {
            inner.initialize();
        }

        Self { inner }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.get()
    }

    /// Names of the components built so far, in construction order.
    #[must_use]
    pub fn components(&self) -> Vec<&'static str> {
        self.inner.registry.borrow().names()
    }

    /// Toggle the theme. `None` before the theme component exists.
    pub fn toggle_theme(&self) -> Option<Theme> {
        let registry = self.inner.registry.borrow();
        let theme = registry.find::<ThemeManager<D>>()?;
        Some(theme.toggle())
    }

    /// Tear every component down, newest first.
    pub fn dispose(&self) {
        if let Some(id) = self.inner.ready_listener.take() {
            self.inner.dom.unlisten(id);
        }
        self.inner.registry.borrow_mut().dispose_all();
    }
}
