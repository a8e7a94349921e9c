//! Local email subscriptions.
//!
//! There is no mailing-list backend. A subscription is a record appended to a
//! JSON list in client-local [`Storage`], and the form fakes a network
//! round-trip with a timer so the button has a loading state to show.
//!
//! ## Storage layout
//!
//! One key (`blogSubscribers` by default) holding:
//!
//! ```json
//! [
//!   { "email": "reader@example.com", "subscribedAt": "2026-10-15T09:30:00Z", "id": "…uuid…" }
//! ]
//! ```
//!
//! Unreadable or corrupt data reads as an empty list (logged) so a bad entry
//! can never break the form; the next successful subscribe overwrites it.
//!
//! ## Outcomes
//!
//! | Input | Result | Persisted |
//! |-------|--------|-----------|
//! | malformed address | [`SubscribeError::InvalidEmail`] | no |
//! | already present (any case) | [`SubscribeOutcome::AlreadySubscribed`] | no |
//! | new address | [`SubscribeOutcome::Subscribed`] | appended |

use crate::config::SubscribeConfig;
use crate::dom::{Document, Effect, ElementId};
use crate::scheduler::{TimerHandle, Timers};
use crate::storage::{Storage, StorageError};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub const SUCCESS_MESSAGE: &str = "Thank you for subscribing! You'll hear from me soon.";
pub const ALREADY_SUBSCRIBED_MESSAGE: &str = "You're already subscribed. Thanks for reading!";
pub const LOADING_LABEL: &str = "Subscribing...";

#[derive(Error, Debug)]
pub enum SubscribeError {
    #[error("Please enter a valid email address.")]
    InvalidEmail(String),
    #[error("Could not save your subscription: {0}")]
    Storage(#[from] StorageError),
    #[error("Could not encode subscribers: {0}")]
    Json(#[from] serde_json::Error),
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
    Subscribed(Subscriber),
    /// The address was already on the list; this is the existing record.
    AlreadySubscribed(Subscriber),
}

impl SubscribeOutcome {
    pub fn subscriber(&self) -> &Subscriber {
        match self {
            SubscribeOutcome::Subscribed(s) | SubscribeOutcome::AlreadySubscribed(s) => s,
        }
    }

    /// Message shown to the reader.
    pub fn message(&self) -> &'static str {
        match self {
            SubscribeOutcome::Subscribed(_) => SUCCESS_MESSAGE,
            SubscribeOutcome::AlreadySubscribed(_) => ALREADY_SUBSCRIBED_MESSAGE,
        }
    }
}

/// A downloadable subscriber dump.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub filename: String,
    pub contents: String,
}

/// `local@domain.tld`-shaped, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// The persisted subscriber list.
#[derive(Debug)]
pub struct SubscriptionStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> SubscriptionStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// All subscribers in subscription order. Never fails.
    pub fn subscribers(&self) -> Vec<Subscriber> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Cannot read subscribers: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Stored subscribers are corrupt, starting fresh: {}", e);
                Vec::new()
            }
        }
    }

    /// Add `email` unless it is malformed or already present.
    pub fn subscribe(
        &mut self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<SubscribeOutcome, SubscribeError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(SubscribeError::InvalidEmail(email.to_string()));
        }

        let mut list = self.subscribers();
        let wanted = email.to_lowercase();
        if let Some(existing) = list.iter().find(|s| s.email.to_lowercase() == wanted) {
            tracing::info!("{} is already subscribed", email);
            return Ok(SubscribeOutcome::AlreadySubscribed(existing.clone()));
        }

        let subscriber = Subscriber {
            email: email.to_string(),
            subscribed_at: now,
            id: uuid::Uuid::new_v4().to_string(),
        };
        list.push(subscriber.clone());
        self.storage
            .set_item(&self.key, &serde_json::to_string(&list)?)?;
        tracing::info!("New subscriber {} ({} total)", subscriber.email, list.len());
        Ok(SubscribeOutcome::Subscribed(subscriber))
    }

    /// Serialize the whole list into `subscribers-YYYY-MM-DD.json`.
    pub fn export(&self, today: NaiveDate) -> Result<Export, SubscribeError> {
        let list = self.subscribers();
        Ok(Export {
            filename: format!("subscribers-{}.json", today.format("%Y-%m-%d")),
            contents: serde_json::to_string_pretty(&list)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeTask {
    /// The simulated round-trip finished.
    Complete { email: String },
    CloseModal,
}

/// Status shown under the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    fn class(&self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        }
    }
}

/// The subscribe modal and form.
#[derive(Debug)]
pub struct SubscribeForm {
    modal: ElementId,
    form: ElementId,
    input: ElementId,
    button: ElementId,
    message: ElementId,
    button_label: String,
    delay_ms: u64,
    close_after_ms: u64,
    in_flight: bool,
    /// Auto-close queued after a success.
    close_timer: Option<TimerHandle>,
}

impl SubscribeForm {
    /// Attach to the page. Returns `None` (after logging) if any of the modal,
    /// form, input, button, or message elements is missing.
    pub fn attach(doc: &Document, config: &SubscribeConfig) -> Option<Self> {
        let find = |id: &str| {
            let found = doc.get_element_by_id(id);
            if found.is_none() {
                tracing::warn!("Subscribe element #{} not found; subscribe form disabled", id);
            }
            found
        };
        let modal = find(&config.modal_id)?;
        let form = find(&config.form_id)?;
        let input = find(&config.input_id)?;
        let button = find(&config.button_id)?;
        let message = find(&config.message_id)?;
        Some(Self {
            modal,
            form,
            input,
            button,
            message,
            button_label: doc.text(button).to_string(),
            delay_ms: config.delay_ms,
            close_after_ms: config.close_after_ms,
            in_flight: false,
            close_timer: None,
        })
    }

    pub fn form(&self) -> ElementId {
        self.form
    }

    pub fn modal(&self) -> ElementId {
        self.modal
    }

    /// Show the modal. Any auto-close left over from an earlier success is
    /// cancelled.
    pub fn open(&mut self, doc: &mut Document, timers: &mut impl Timers<SubscribeTask>) {
        self.cancel_close(timers);
        doc.add_class(self.modal, "show");
        doc.set_style(self.modal, "display", "flex");
        self.clear_message(doc);
        doc.focus(self.input);
    }

    pub fn close(&self, doc: &mut Document) {
        doc.remove_class(self.modal, "show");
        doc.set_style(self.modal, "display", "none");
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        doc.has_class(self.modal, "show")
    }

    /// Form submitted. Malformed input is rejected on the spot; otherwise
    /// the button shows its loading state until the simulated round-trip
    /// completes.
    pub fn on_submit(&mut self, doc: &mut Document, timers: &mut impl Timers<SubscribeTask>) {
        if self.in_flight {
            return;
        }
        self.cancel_close(timers);
        let email = doc.value(self.input).trim().to_string();
        if !is_valid_email(&email) {
            self.show_message(
                doc,
                &SubscribeError::InvalidEmail(email).to_string(),
                MessageKind::Error,
            );
            return;
        }
        self.clear_message(doc);
        self.in_flight = true;
        let el = doc.element_mut(self.button);
        el.disabled = true;
        doc.add_class(self.button, "loading");
        doc.set_text(self.button, LOADING_LABEL);
        timers.set_timeout(self.delay_ms, SubscribeTask::Complete { email });
    }

    pub fn on_task<S: Storage>(
        &mut self,
        doc: &mut Document,
        timers: &mut impl Timers<SubscribeTask>,
        store: &mut SubscriptionStore<S>,
        now: DateTime<Utc>,
        task: SubscribeTask,
    ) {
        match task {
            SubscribeTask::Complete { email } => {
                let result = store.subscribe(&email, now);
                self.restore_button(doc);
                match result {
                    Ok(outcome) => {
                        self.show_message(doc, outcome.message(), MessageKind::Success);
                        doc.set_value(self.input, "");
                        self.close_timer = Some(
                            timers.set_timeout(self.close_after_ms, SubscribeTask::CloseModal),
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Subscription failed: {}", e);
                        self.show_message(doc, &e.to_string(), MessageKind::Error);
                    }
                }
            }
            SubscribeTask::CloseModal => {
                self.close_timer = None;
                self.close(doc);
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    fn cancel_close(&mut self, timers: &mut impl Timers<SubscribeTask>) {
        if let Some(handle) = self.close_timer.take() {
            timers.clear_timeout(handle);
        }
    }

    fn restore_button(&mut self, doc: &mut Document) {
        self.in_flight = false;
        doc.element_mut(self.button).disabled = false;
        doc.remove_class(self.button, "loading");
        doc.set_text(self.button, &self.button_label);
    }

    fn show_message(&self, doc: &mut Document, text: &str, kind: MessageKind) {
        doc.set_text(self.message, text);
        doc.set_class_name(self.message, kind.class());
        doc.set_style(self.message, "display", "block");
    }

    fn clear_message(&self, doc: &mut Document) {
        doc.set_text(self.message, "");
        doc.set_style(self.message, "display", "none");
    }
}

/// Export the store and hand the file to the page as a download.
pub fn download_export<S: Storage>(
    doc: &mut Document,
    store: &SubscriptionStore<S>,
    today: NaiveDate,
) -> Result<Export, SubscribeError> {
    let export = store.export(today)?;
    doc.push_effect(Effect::Download {
        filename: export.filename.clone(),
        contents: export.contents.clone(),
    });
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::storage::MemoryStorage;
    use crate::test_helpers::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap()
    }

    fn store() -> SubscriptionStore<MemoryStorage> {
        SubscriptionStore::new(MemoryStorage::new(), "blogSubscribers")
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn email_shapes() {
        for good in ["a@b.co", "first.last@sub.example.org", "x+tag@y.io"] {
            assert!(is_valid_email(good), "{good}");
        }
        for bad in ["not-an-email", "a@b", "@b.co", "a@.", "a b@c.de", "a@b@c.de", ""] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    // =========================================================================
    // Store
    // =========================================================================

    #[test]
    fn new_address_is_persisted() {
        let mut s = store();
        let outcome = s.subscribe("reader@example.com", now()).unwrap();
        let SubscribeOutcome::Subscribed(sub) = outcome else {
            panic!("expected new subscription");
        };
        assert_eq!(sub.email, "reader@example.com");
        assert_eq!(sub.subscribed_at, now());
        assert_eq!(s.subscribers(), vec![sub]);
    }

    #[test]
    fn duplicate_in_any_case_is_stored_once() {
        let mut s = store();
        s.subscribe("A@x.com", now()).unwrap();
        let second = s.subscribe("a@X.com", now()).unwrap();
        assert!(matches!(second, SubscribeOutcome::AlreadySubscribed(ref e) if e.email == "A@x.com"));
        assert_eq!(s.subscribers().len(), 1);
    }

    #[test]
    fn invalid_address_changes_nothing() {
        let mut s = store();
        s.subscribe("keep@example.com", now()).unwrap();
        let before = s.subscribers();
        let err = s.subscribe("not-an-email", now()).unwrap_err();
        assert!(matches!(err, SubscribeError::InvalidEmail(_)));
        assert_eq!(s.subscribers(), before);
    }

    #[test]
    fn ids_are_unique() {
        let mut s = store();
        s.subscribe("one@example.com", now()).unwrap();
        s.subscribe("two@example.com", now()).unwrap();
        let list = s.subscribers();
        assert_ne!(list[0].id, list[1].id);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut s = store();
        s.subscribe("  pad@example.com \n", now()).unwrap();
        assert_eq!(s.subscribers()[0].email, "pad@example.com");
    }

    #[test]
    fn corrupt_storage_reads_as_empty() {
        let mut storage = MemoryStorage::new();
        storage.set_item("blogSubscribers", "{not json").unwrap();
        let mut s = SubscriptionStore::new(storage, "blogSubscribers");
        assert!(s.subscribers().is_empty());
        // and recovers on the next write
        s.subscribe("fresh@example.com", now()).unwrap();
        assert_eq!(s.subscribers().len(), 1);
    }

    #[test]
    fn stored_layout_uses_camel_case() {
        let mut s = store();
        s.subscribe("reader@example.com", now()).unwrap();
        let raw = s.storage().get_item("blogSubscribers").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &value[0];
        assert_eq!(record["email"], "reader@example.com");
        assert_eq!(record["subscribedAt"], "2026-10-15T09:30:00Z");
        assert!(record["id"].is_string());
    }

    #[test]
    fn export_names_file_by_date() {
        let mut s = store();
        s.subscribe("reader@example.com", now()).unwrap();
        let export = s.export(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()).unwrap();
        assert_eq!(export.filename, "subscribers-2026-10-15.json");
        let parsed: Vec<Subscriber> = serde_json::from_str(&export.contents).unwrap();
        assert_eq!(parsed, s.subscribers());
    }

    // =========================================================================
    // Form
    // =========================================================================

    fn form(page: &FixturePage) -> SubscribeForm {
        SubscribeForm::attach(&page.doc, &SubscribeConfig::default()).unwrap()
    }

    #[test]
    fn submit_shows_loading_then_restores() {
        let mut page = fixture_page();
        let mut form = form(&page);
        let mut s = store();
        let mut timers = Scheduler::new();
        form.open(&mut page.doc, &mut timers);
        page.doc.set_value(page.email_input, "reader@example.com");

        form.on_submit(&mut page.doc, &mut timers);
        assert!(page.doc.element(page.submit_button).disabled);
        assert!(page.doc.has_class(page.submit_button, "loading"));
        assert_eq!(page.doc.text(page.submit_button), LOADING_LABEL);
        assert!(s.subscribers().is_empty());

        for task in timers.advance(1000) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }
        assert!(!page.doc.element(page.submit_button).disabled);
        assert!(!page.doc.has_class(page.submit_button, "loading"));
        assert_eq!(page.doc.text(page.submit_button), "Subscribe");
        assert_eq!(page.doc.text(page.message), SUCCESS_MESSAGE);
        assert_eq!(page.doc.value(page.email_input), "");
        assert_eq!(s.subscribers().len(), 1);

        // modal closes after the success message has been read
        assert!(form.is_open(&page.doc));
        for task in timers.advance(2000) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }
        assert!(!form.is_open(&page.doc));
    }

    #[test]
    fn invalid_submit_shows_error_without_loading() {
        let mut page = fixture_page();
        let mut form = form(&page);
        let mut timers = Scheduler::new();
        page.doc.set_value(page.email_input, "not-an-email");
        form.on_submit(&mut page.doc, &mut timers);
        assert_eq!(timers.pending(), 0);
        assert!(!form.is_loading());
        assert!(page.doc.has_class(page.message, "error"));
        assert_eq!(page.doc.text(page.message), "Please enter a valid email address.");
    }

    #[test]
    fn double_submit_while_loading_is_ignored() {
        let mut page = fixture_page();
        let mut form = form(&page);
        let mut timers = Scheduler::new();
        page.doc.set_value(page.email_input, "reader@example.com");
        form.on_submit(&mut page.doc, &mut timers);
        form.on_submit(&mut page.doc, &mut timers);
        assert_eq!(timers.pending(), 1);
    }

    #[test]
    fn already_subscribed_is_a_friendly_success() {
        let mut page = fixture_page();
        let mut form = form(&page);
        let mut s = store();
        s.subscribe("reader@example.com", now()).unwrap();
        let mut timers = Scheduler::new();
        page.doc.set_value(page.email_input, "READER@example.com");
        form.on_submit(&mut page.doc, &mut timers);
        for task in timers.advance(1000) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }
        assert!(page.doc.has_class(page.message, "success"));
        assert_eq!(page.doc.text(page.message), ALREADY_SUBSCRIBED_MESSAGE);
        assert_eq!(s.subscribers().len(), 1);
    }

    #[test]
    fn reopening_cancels_pending_auto_close() {
        let mut page = fixture_page();
        let mut form = form(&page);
        let mut s = store();
        let mut timers = Scheduler::new();
        form.open(&mut page.doc, &mut timers);
        page.doc.set_value(page.email_input, "reader@example.com");
        form.on_submit(&mut page.doc, &mut timers);
        for task in timers.advance(1000) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }
        assert_eq!(timers.pending(), 1);

        form.close(&mut page.doc);
        timers.advance(1500);
        form.open(&mut page.doc, &mut timers);
        assert_eq!(timers.pending(), 0);
        for task in timers.advance(600) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }
        assert!(form.is_open(&page.doc));
    }

    #[test]
    fn second_submit_cancels_pending_auto_close() {
        let mut page = fixture_page();
        let mut form = form(&page);
        let mut s = store();
        let mut timers = Scheduler::new();
        form.open(&mut page.doc, &mut timers);
        page.doc.set_value(page.email_input, "first@example.com");
        form.on_submit(&mut page.doc, &mut timers);
        for task in timers.advance(1000) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }

        page.doc.set_value(page.email_input, "second@example.com");
        form.on_submit(&mut page.doc, &mut timers);
        // only the new round-trip is pending
        assert_eq!(timers.pending(), 1);
        for task in timers.advance(999) {
            form.on_task(&mut page.doc, &mut timers, &mut s, now(), task);
        }
        assert!(form.is_open(&page.doc));
        assert!(form.is_loading());
    }

    #[test]
    fn attach_without_form_is_disabled() {
        let mut page = fixture_page();
        let form = page.form;
        page.doc.element_mut(form).id = None;
        assert!(SubscribeForm::attach(&page.doc, &SubscribeConfig::default()).is_none());
    }

    #[test]
    fn download_export_records_effect() {
        let mut page = fixture_page();
        let mut s = store();
        s.subscribe("reader@example.com", now()).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let export = download_export(&mut page.doc, &s, today).unwrap();
        assert_eq!(
            page.doc.effects(),
            &[Effect::Download {
                filename: export.filename,
                contents: export.contents
            }]
        );
    }
}
