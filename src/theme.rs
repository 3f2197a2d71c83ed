//! Light/dark theme switching.
//!
//! Reads the preference from `localStorage`, applies a `data-theme`
//! attribute to `<body>` and swaps the toggle icon. The toggle control writes
//! the new preference back. A missing or unrecognized stored value means
//! light; storage being unavailable is never an error.

#[cfg(test)]
#[path = "theme_test.rs"]
mod theme_test;

use std::cell::Cell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::app::Component;
use crate::config::ThemeConfig;
use crate::dom::{Dom, EventKind, Flow, Selector, Subscriptions, Target};
use crate::error::InitError;

const TOGGLE_SELECTOR: &str = ".theme-toggle";
const ICON_SELECTOR: &str = ".theme-toggle i";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon offering the *other* theme.
    #[must_use]
    pub fn icon_class(self) -> &'static str {
        match self {
            Self::Light => "fas fa-moon",
            Self::Dark => "fas fa-sun",
        }
    }
}

struct ThemeState<D: Dom> {
    dom: Rc<D>,
    icon: D::Node,
    storage_key: String,
    current: Cell<Theme>,
}

impl<D: Dom> ThemeState<D> {
    fn apply(&self, theme: Theme) {
        if let Some(body) = self.dom.body() {
            self.dom.set_attribute(&body, "data-theme", theme.as_str());
        }
        self.dom.set_class_name(&self.icon, theme.icon_class());
        self.dom.storage_set(&self.storage_key, theme.as_str());
        self.current.set(theme);
    }

    fn toggle(&self) -> Theme {
        let next = self.current.get().toggled();
        self.apply(next);
        log::debug!("theme switched to {}", next.as_str());
        next
    }
}

pub struct ThemeManager<D: Dom> {
    dom: Rc<D>,
    state: Rc<ThemeState<D>>,
    subscriptions: Subscriptions,
}

impl<D: Dom> ThemeManager<D> {
    /// Apply the stored theme and bind the toggle control.
    ///
    /// # Errors
    ///
    /// [`InitError::MissingElement`] when `.theme-toggle` or its icon is absent.
    pub fn init(dom: Rc<D>, config: &ThemeConfig) -> Result<Self, InitError> {
        let toggle = dom
            .query(&Selector::parse(TOGGLE_SELECTOR)?)
            .ok_or(InitError::MissingElement(TOGGLE_SELECTOR))?;
        let icon = dom
            .query(&Selector::parse(ICON_SELECTOR)?)
            .ok_or(InitError::MissingElement(ICON_SELECTOR))?;

        let stored = dom.storage_get(&config.storage_key);
        let initial = stored.as_deref().and_then(Theme::parse).unwrap_or_default();

        let state = Rc::new(ThemeState {
            dom: Rc::clone(&dom),
            icon,
            storage_key: config.storage_key.clone(),
            current: Cell::new(initial),
        });
        state.apply(initial);

        let weak: Weak<ThemeState<D>> = Rc::downgrade(&state);
        let mut subscriptions = Subscriptions::new();
        subscriptions.listener(dom.listen(
            Target::Node(&toggle),
            EventKind::Click,
            Box::new(move |_| {
                if let Some(state) = weak.upgrade() {
                    state.toggle();
                }
                Flow::Continue
            }),
        ));

        Ok(Self { dom, state, subscriptions })
    }

    #[must_use]
    pub fn current(&self) -> Theme {
        self.state.current.get()
    }

    /// Set, persist and display `theme`.
    pub fn apply_theme(&self, theme: Theme) {
        self.state.apply(theme);
    }

    /// Switch to the other theme and return it.
    pub fn toggle(&self) -> Theme {
        self.state.toggle()
    }
}

impl<D: Dom> Component for ThemeManager<D> {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn dispose(&mut self) {
        self.subscriptions.release(&*self.dom);
    }
}
