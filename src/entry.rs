//! Browser entry point.
//!
//! `start` runs when the wasm module is instantiated. The running [`App`] is
//! kept in a thread-local so the exported `toggleTheme` can reach it.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;

use crate::app::{App, Services};
use crate::config::PortfolioConfig;
use crate::contact_form::{BrowserSpawner, SimulatedTransport};
use crate::dom::web::WebDom;

thread_local! {
    static APP: RefCell<Option<App<WebDom>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already installed: {err}").into());
    }

    let Some(dom) = WebDom::new() else {
        log::error!("no window/document; portfolio scripts disabled");
        return;
    };

    let config = PortfolioConfig::load(&*dom);
    let services = Services {
        transport: Rc::new(SimulatedTransport::new(Rc::clone(&dom), config.contact.submit_latency_ms)),
        spawner: Rc::new(BrowserSpawner),
    };
    let app = App::with_config(dom, config, services);
    APP.with(|slot| *slot.borrow_mut() = Some(app));

    expose_toggle();
}

/// Flip between light and dark. No-op until the page has initialized.
#[wasm_bindgen(js_name = toggleTheme)]
pub fn toggle_theme() {
    // Clone out of the slot so the toggle runs without the borrow held.
    let app = APP.with(|slot| slot.borrow().clone());
    if let Some(theme) = app.and_then(|app| app.toggle_theme()) {
        log::debug!("toggleTheme -> {}", theme.as_str());
    }
}

/// Install `window.toggleTheme` for inline `onclick` handlers.
fn expose_toggle() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::<dyn Fn()>::new(toggle_theme);
    let installed = js_sys::Reflect::set(&window, &JsValue::from_str("toggleTheme"), callback.as_ref());
    if let Err(err) = installed {
        log::warn!("could not install window.toggleTheme: {err:?}");
    }
    // Lives for the page.
    callback.forget();
}
