//! Contact form validation and submission.
//!
//! DESIGN
//! ======
//! Fields validate on blur and clear their annotation on input. Submission
//! validates every field, then hands a [`ContactMessage`] to the injected
//! [`Transport`]. The returned future is driven by the injected [`Spawner`],
//! so the same code runs under `spawn_local` in the browser and a
//! `LocalPool` in tests.
//!
//! A second submit while one is in flight is ignored. If the component is
//! disposed mid-flight the outcome is dropped.

#[cfg(test)]
#[path = "contact_form_test.rs"]
mod contact_form_test;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app::Component;
use crate::config::ContactConfig;
use crate::dom::{Dom, EventKind, Flow, Selector, Subscriptions, Target};
use crate::error::{FieldError, InitError, SubmitError};
use crate::timer::Scheduler;

const FORM_ID: &str = "contactForm";
const FIELD_SELECTOR: &str = "input, textarea";
const SUBMIT_SELECTOR: &str = r#"button[type="submit"]"#;

pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const FIELD_ERROR_CLASS: &str = "error";
pub const SENDING_HTML: &str = r#"<i class="fas fa-spinner fa-spin"></i> Sending..."#;

const SUCCESS_HTML: &str =
    r#"<i class="fas fa-check-circle"></i> Thank you! Your message has been sent successfully."#;
const FAILURE_HTML: &str =
    r#"<i class="fas fa-exclamation-circle"></i> Sorry, there was an error sending your message. Please try again."#;

/// Values of the named form fields, keyed by `name`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactMessage {
    pub fields: BTreeMap<String, String>,
}

impl ContactMessage {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Delivers a contact message.
pub trait Transport {
    fn send(&self, message: ContactMessage) -> LocalBoxFuture<'static, Result<(), SubmitError>>;
}

/// Drives a `!Send` future to completion on the current thread.
pub trait Spawner {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

impl Spawner for futures::executor::LocalSpawner {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawn_local(future) {
            log::warn!("could not spawn submission task: {err}");
        }
    }
}

/// Spawns onto the browser microtask queue.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

#[cfg(feature = "hydrate")]
impl Spawner for BrowserSpawner {
    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}

/// Stand-in backend: succeeds after a fixed latency.
pub struct SimulatedTransport<S: Scheduler + ?Sized> {
    scheduler: Rc<S>,
    latency_ms: u32,
}

impl<S: Scheduler + ?Sized> SimulatedTransport<S> {
    #[must_use]
    pub fn new(scheduler: Rc<S>, latency_ms: u32) -> Self {
        Self { scheduler, latency_ms }
    }
}

impl<S: Scheduler + ?Sized> Transport for SimulatedTransport<S> {
    fn send(&self, message: ContactMessage) -> LocalBoxFuture<'static, Result<(), SubmitError>> {
        let (tx, rx) = oneshot::channel();
        self.scheduler.set_timeout(
            self.latency_ms,
            Box::new(move || {
                log::debug!("simulated delivery of {} fields", message.fields.len());
                if tx.send(Ok(())).is_err() {
                    log::debug!("submission abandoned before delivery");
                }
            }),
        );
        Box::pin(async move { rx.await.unwrap_or(Err(SubmitError::Interrupted)) })
    }
}

/// `"email"` → `"Email"`.
fn field_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validate one field's raw value.
///
/// # Errors
///
/// [`FieldError::Required`] for a blank value, [`FieldError::InvalidEmail`]
/// when the `email` field does not match `email`.
pub fn validate_value(name: &str, value: &str, email: &Regex) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::Required { label: field_label(name) });
    }
    if name == "email" && !email.is_match(value) {
        return Err(FieldError::InvalidEmail);
    }
    Ok(())
}

/// A form control and the validation note currently shown for it.
struct Field<D: Dom> {
    node: D::Node,
    note: RefCell<Option<D::Node>>,
}

struct FormState<D: Dom> {
    dom: Rc<D>,
    form: D::Node,
    fields: Vec<Field<D>>,
    button: Option<D::Node>,
    email: Regex,
    transport: Rc<dyn Transport>,
    spawner: Rc<dyn Spawner>,
    banner_ttl_ms: u32,
    sending: Cell<bool>,
    live: Cell<bool>,
}

impl<D: Dom> FormState<D> {
    fn validate_field(&self, field: &Field<D>) -> bool {
        self.clear_error(field);
        let name = self.dom.attribute(&field.node, "name").unwrap_or_default();
        match validate_value(&name, &self.dom.value(&field.node), &self.email) {
            Ok(()) => true,
            Err(err) => {
                self.show_error(field, &err.to_string());
                false
            }
        }
    }

    fn show_error(&self, field: &Field<D>, message: &str) {
        self.dom.add_class(&field.node, FIELD_ERROR_CLASS);
        let Some(parent) = self.dom.parent(&field.node) else {
            return;
        };
        let Some(note) = self.dom.create_element("div") else {
            log::warn!("could not create validation message");
            return;
        };
        self.dom.set_class_name(&note, "error-message");
        self.dom.set_text_content(&note, message);
        self.dom.set_style(&note, "color", "var(--accent-primary)");
        self.dom.set_style(&note, "font-size", "0.9rem");
        self.dom.set_style(&note, "margin-top", "0.5rem");
        self.dom.append_child(&parent, &note);
        *field.note.borrow_mut() = Some(note);
    }

    /// Remove this field's own note; notes of fields sharing the parent stay.
    fn clear_error(&self, field: &Field<D>) {
        self.dom.remove_class(&field.node, FIELD_ERROR_CLASS);
        if let Some(note) = field.note.take() {
            self.dom.remove(&note);
        }
    }

    fn collect(&self) -> ContactMessage {
        let fields = self
            .fields
            .iter()
            .filter_map(|field| {
                let name = self.dom.attribute(&field.node, "name").filter(|n| !n.is_empty())?;
                Some((name, self.dom.value(&field.node)))
            })
            .collect();
        ContactMessage { fields }
    }

    fn submit(self: &Rc<Self>) {
        if self.sending.get() {
            log::debug!("submission already in flight");
            return;
        }
        // Every field is validated so all errors show at once.
        let invalid = self.fields.iter().filter(|field| !self.validate_field(field)).count();
        if invalid > 0 {
            log::debug!("contact form has {invalid} invalid fields");
            return;
        }

        let message = self.collect();
        if let Ok(json) = serde_json::to_string(&message) {
            log::debug!("sending contact message {json}");
        }

        let restore = self.button.as_ref().map(|button| {
            let original = self.dom.inner_html(button);
            self.dom.set_inner_html(button, SENDING_HTML);
            self.dom.set_disabled(button, true);
            original
        });
        self.sending.set(true);

        let delivery = self.transport.send(message);
        let state = Rc::clone(self);
        self.spawner.spawn(Box::pin(async move {
            let outcome = delivery.await;
            state.finish(outcome, restore);
        }));
    }

    fn finish(&self, outcome: Result<(), SubmitError>, restore: Option<String>) {
        self.sending.set(false);
        if let (Some(button), Some(original)) = (&self.button, restore) {
            self.dom.set_inner_html(button, &original);
            self.dom.set_disabled(button, false);
        }
        if !self.live.get() {
            return;
        }
        match outcome {
            Ok(()) => {
                log::info!("contact message sent");
                self.banner("success-message", SUCCESS_HTML, ("#d4edda", "#155724"));
                self.dom.reset_form(&self.form);
            }
            Err(err) => {
                log::warn!("contact message failed: {err}");
                self.banner("error-message", FAILURE_HTML, ("#f8d7da", "#721c24"));
            }
        }
    }

    /// Append a status banner to the form that removes itself after the TTL.
    fn banner(&self, class: &str, html: &str, (background, color): (&str, &str)) {
        let Some(banner) = self.dom.create_element("div") else {
            log::warn!("could not create {class} banner");
            return;
        };
        self.dom.set_class_name(&banner, class);
        self.dom.set_inner_html(&banner, html);
        for (property, value) in [
            ("background", background),
            ("color", color),
            ("padding", "1rem"),
            ("border-radius", "8px"),
            ("margin-top", "1rem"),
            ("display", "flex"),
            ("align-items", "center"),
            ("gap", "0.5rem"),
        ] {
            self.dom.set_style(&banner, property, value);
        }
        self.dom.append_child(&self.form, &banner);

        let weak: Weak<D> = Rc::downgrade(&self.dom);
        self.dom.set_timeout(
            self.banner_ttl_ms,
            Box::new(move || {
                if let Some(dom) = weak.upgrade() {
                    dom.remove(&banner);
                }
            }),
        );
    }
}

pub struct ContactFormManager<D: Dom> {
    dom: Rc<D>,
    state: Option<Rc<FormState<D>>>,
    subscriptions: Subscriptions,
}

impl<D: Dom> ContactFormManager<D> {
    /// Bind validation and submission on `#contactForm`. Without the form the
    /// manager is inert.
    ///
    /// # Errors
    ///
    /// [`InitError::Pattern`] or [`InitError::Selector`] if the built-in
    /// patterns fail to compile.
    pub fn init(
        dom: Rc<D>,
        config: &ContactConfig,
        transport: Rc<dyn Transport>,
        spawner: Rc<dyn Spawner>,
    ) -> Result<Self, InitError> {
        let mut subscriptions = Subscriptions::new();
        let Some(form) = dom.element_by_id(FORM_ID) else {
            log::debug!("no #{FORM_ID}; contact form disabled");
            return Ok(Self { dom, state: None, subscriptions });
        };

        let fields = dom
            .query_all_within(&form, &Selector::parse(FIELD_SELECTOR)?)
            .into_iter()
            .map(|node| Field { node, note: RefCell::new(None) })
            .collect();
        let button = dom.query_within(&form, &Selector::parse(SUBMIT_SELECTOR)?);
        let state = Rc::new(FormState {
            dom: Rc::clone(&dom),
            form: form.clone(),
            fields,
            button,
            email: Regex::new(EMAIL_PATTERN)?,
            transport,
            spawner,
            banner_ttl_ms: config.banner_ttl_ms,
            sending: Cell::new(false),
            live: Cell::new(true),
        });

        for (index, field) in state.fields.iter().enumerate() {
            let weak = Rc::downgrade(&state);
            subscriptions.listener(dom.listen(
                Target::Node(&field.node),
                EventKind::Blur,
                Box::new(move |_| {
                    if let Some(state) = weak.upgrade() {
                        if let Some(field) = state.fields.get(index) {
                            state.validate_field(field);
                        }
                    }
                    Flow::Continue
                }),
            ));

            let weak = Rc::downgrade(&state);
            subscriptions.listener(dom.listen(
                Target::Node(&field.node),
                EventKind::Input,
                Box::new(move |_| {
                    if let Some(state) = weak.upgrade() {
                        if let Some(field) = state.fields.get(index) {
                            state.clear_error(field);
                        }
                    }
                    Flow::Continue
                }),
            ));
        }

        let weak = Rc::downgrade(&state);
        subscriptions.listener(dom.listen(
            Target::Node(&form),
            EventKind::Submit,
            Box::new(move |_| {
                if let Some(state) = weak.upgrade() {
                    state.submit();
                }
                Flow::PreventDefault
            }),
        ));

        log::debug!("contact form bound with {} fields", state.fields.len());
        Ok(Self { dom, state: Some(state), subscriptions })
    }

    /// Whether `#contactForm` was found.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Whether a submission is awaiting its transport.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.sending.get())
    }
}

impl<D: Dom> Component for ContactFormManager<D> {
    fn name(&self) -> &'static str {
        "contact_form"
    }

    fn dispose(&mut self) {
        if let Some(state) = &self.state {
            state.live.set(false);
        }
        self.subscriptions.release(&*self.dom);
    }
}
