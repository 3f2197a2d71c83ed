//! Client-side interactivity for a single-page portfolio.
//!
//! Each feature is a small component bound to the page through the injected
//! [`dom::Dom`] interface, so the same code runs against the browser
//! (`hydrate` feature, [`dom::web::WebDom`]) and against the in-memory
//! [`dom::memory::MemoryDom`] used by the tests. Timers go through
//! [`timer::Scheduler`] for the same reason.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`app`] | Startup order, component registry, global theme toggle |
//! | [`theme`] | Persisted light/dark theme |
//! | [`navigation`] | Smooth anchor scrolling and active nav link |
//! | [`animation`] | Scroll reveal, hero typewriter, particles |
//! | [`contact_form`] | Field validation and message submission |
//! | [`performance`] | Lazy images and load timing |
//! | [`accessibility`] | Keyboard focus class, skip link, icon labels |
//! | [`rate_limit`] | `debounce` / `throttle` wrappers |
//! | [`dom`] | DOM interface, CSS selectors, memory and browser backends |
//! | [`timer`] | Scheduler interface, manual and browser clocks |
//! | [`config`] | Tunables loaded from the page's JSON config block |
//! | [`error`] | Error types |

pub mod accessibility;
pub mod animation;
pub mod app;
pub mod config;
pub mod contact_form;
pub mod dom;
pub mod error;
pub mod navigation;
pub mod performance;
pub mod rate_limit;
pub mod theme;
pub mod timer;

#[cfg(feature = "hydrate")]
mod entry;

pub use app::{App, Component, Registry, Services};
pub use config::PortfolioConfig;
pub use error::{ConfigError, FieldError, InitError, SubmitError};
pub use theme::Theme;
