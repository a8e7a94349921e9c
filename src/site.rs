//! Page composition: one document, one scheduler, every component.
//!
//! A [`Site`] plays the part of the page scripts. It attaches components to
//! the document in the same order the page does, routes events to them, and
//! runs their timers:
//!
//! ```text
//! boot()
//! ├── dom_ready()
//! │   ├── body fade prepared
//! │   ├── smooth scrolling, external links
//! │   ├── search box
//! │   ├── language filter (applied from the address right away)
//! │   ├── subscribe form
//! │   └── StartAnimations queued (+100 ms, after filtering settles)
//! └── load()
//!     ├── body revealed
//!     ├── fruit markers rendered
//!     └── sway started
//! ```
//!
//! Time never moves on its own. [`Site::advance`] runs every task due in the
//! window, including follow-ups scheduled by those tasks.

use crate::animate::{self, IntersectionEntry, PostAnimator};
use crate::config::SiteConfig;
use crate::dom::{Document, ElementId, Point};
use crate::fruit::{FruitTask, FruitTree, NewFruit};
use crate::language::{Language, LanguageFilter, LanguageTask};
use crate::links::{self, KeyEvent, SmoothScroller};
use crate::scheduler::{Scheduler, Timers};
use crate::search::{SearchBox, SearchIndex, SearchTask};
use crate::storage::Storage;
use crate::subscribe::{
    Export, SubscribeError, SubscribeForm, SubscribeTask, Subscriber, SubscriptionStore,
    download_export,
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Every timer the page can have pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Search(SearchTask),
    Language(LanguageTask),
    Subscribe(SubscribeTask),
    Fruit(FruitTask),
    /// Begin observing posts for reveal.
    StartAnimations,
}

/// A user interaction, as delivered to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Click(ElementId),
    /// The value of an input changed.
    Input(ElementId),
    /// A key went down; the target is whatever has focus.
    KeyDown(KeyEvent),
    Submit(ElementId),
    PointerOver { target: ElementId, at: Point },
    PointerMove { target: ElementId, at: Point },
    PointerOut(ElementId),
}

pub struct Site<S: Storage> {
    doc: Document,
    timers: Scheduler<Task>,
    config: SiteConfig,
    epoch: DateTime<Utc>,
    rng: StdRng,
    store: SubscriptionStore<S>,
    scroller: SmoothScroller,
    search: Option<SearchBox>,
    language: Option<LanguageFilter>,
    animator: Option<PostAnimator>,
    form: Option<SubscribeForm>,
    fruits: FruitTree,
}

impl<S: Storage> Site<S> {
    /// Wrap `doc`. Nothing is attached until [`boot`](Self::boot).
    ///
    /// `epoch` is the wall-clock time at virtual time zero; subscription
    /// timestamps and export dates are derived from it.
    pub fn new(doc: Document, config: SiteConfig, storage: S, epoch: DateTime<Utc>) -> Self {
        let store = SubscriptionStore::new(storage, config.subscribe.storage_key.clone());
        let fruits = FruitTree::new(&config.fruit);
        Self {
            doc,
            timers: Scheduler::new(),
            config,
            epoch,
            rng: StdRng::from_entropy(),
            store,
            scroller: SmoothScroller::default(),
            search: None,
            language: None,
            animator: None,
            form: None,
            fruits,
        }
    }

    /// Fix the sway randomness.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn boot(&mut self) {
        self.dom_ready();
        self.load();
    }

    pub fn dom_ready(&mut self) {
        animate::prepare_body_fade(&mut self.doc);
        self.scroller = SmoothScroller::attach(&self.doc);
        links::harden_external_links(&mut self.doc);

        let index = SearchIndex::new(self.config.articles.clone());
        self.search = SearchBox::attach(&self.doc, index, &self.config.search);

        let mut language = LanguageFilter::attach(&self.doc, &self.config.language);
        language.apply_from_address(&mut self.doc, &mut self.timers.scoped(Task::Language));
        self.language = Some(language);

        self.form = SubscribeForm::attach(&self.doc, &self.config.subscribe);
        self.fruits.attach(&self.doc);

        self.timers
            .set_timeout(self.config.animation.start_delay_ms, Task::StartAnimations);
        tracing::debug!("Page scripts attached");
    }

    pub fn load(&mut self) {
        animate::reveal_body(&mut self.doc);
        self.fruits.render(&mut self.doc, self.config.fruits.clone());
        self.fruits.start_sway(&mut self.doc, &mut self.rng);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn timers(&self) -> &Scheduler<Task> {
        &self.timers
    }

    /// Wall-clock time at the current virtual instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.epoch + TimeDelta::milliseconds(self.timers.now() as i64)
    }

    pub fn store(&self) -> &SubscriptionStore<S> {
        &self.store
    }

    pub fn search_box(&self) -> Option<&SearchBox> {
        self.search.as_ref()
    }

    pub fn language(&self) -> Option<&LanguageFilter> {
        self.language.as_ref()
    }

    pub fn animator(&self) -> Option<&PostAnimator> {
        self.animator.as_ref()
    }

    pub fn subscribe_form(&self) -> Option<&SubscribeForm> {
        self.form.as_ref()
    }

    pub fn fruit_tree(&self) -> &FruitTree {
        &self.fruits
    }

    // =========================================================================
    // Events and time
    // =========================================================================

    /// Deliver `event`. Returns `true` if the page consumed it (the default
    /// action would be prevented).
    pub fn dispatch(&mut self, event: Event) -> bool {
        match event {
            Event::Click(target) => self.on_click(target),
            Event::Input(target) => {
                if let Some(search) = &mut self.search
                    && search.input() == target
                {
                    search.on_input(&mut self.timers.scoped(Task::Search));
                }
                false
            }
            Event::KeyDown(key) => {
                if let Some(search) = &mut self.search
                    && self.doc.focused() == Some(search.input())
                    && search.on_key(&mut self.doc, &mut self.timers.scoped(Task::Search), &key.key)
                {
                    return true;
                }
                links::home_shortcut(&mut self.doc, &key)
            }
            Event::Submit(target) => match &mut self.form {
                Some(form) if form.form() == target => {
                    form.on_submit(&mut self.doc, &mut self.timers.scoped(Task::Subscribe));
                    true
                }
                _ => false,
            },
            Event::PointerOver { target, at } => self.fruits.on_pointer_over(
                &mut self.doc,
                &mut self.timers.scoped(Task::Fruit),
                target,
                at,
            ),
            Event::PointerMove { target, at } => {
                self.fruits.on_pointer_move(&mut self.doc, target, at)
            }
            Event::PointerOut(target) => self.fruits.on_pointer_out(&mut self.doc, target),
        }
    }

    fn on_click(&mut self, target: ElementId) -> bool {
        let mut prevented = self.scroller.on_click(&mut self.doc, target);

        if let Some(language) = &mut self.language {
            prevented |= language.on_link_click(
                &mut self.doc,
                &mut self.timers.scoped(Task::Language),
                target,
            );
        }

        if let Some(search) = &mut self.search {
            if self.doc.contains(search.button(), target) {
                search.search_now(&mut self.doc, &mut self.timers.scoped(Task::Search));
            }
            search.on_document_click(&mut self.doc, target);
        }

        // backdrop
        if let Some(form) = &self.form
            && form.modal() == target
        {
            form.close(&mut self.doc);
        }

        prevented |= self.fruits.on_click(&mut self.doc, target);
        prevented
    }

    /// Run everything due in the next `ms`, then settle the clock there.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timers.now() + ms;
        while let Some(task) = self.timers.pop_due(until) {
            self.run(task);
        }
        self.timers.settle(until);
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::Search(task) => {
                if let Some(search) = &mut self.search {
                    search.on_task(&mut self.doc, task);
                }
            }
            Task::Language(task) => {
                if let Some(language) = &mut self.language {
                    language.on_task(&mut self.doc, task);
                }
            }
            Task::Subscribe(task) => {
                let now = self.now();
                if let Some(form) = &mut self.form {
                    form.on_task(
                        &mut self.doc,
                        &mut self.timers.scoped(Task::Subscribe),
                        &mut self.store,
                        now,
                        task,
                    );
                }
            }
            Task::Fruit(task) => self.fruits.on_task(&mut self.doc, task),
            Task::StartAnimations => {
                let posts = self.doc.query_class(&self.config.language.post_class);
                self.animator = Some(PostAnimator::observe(
                    &mut self.doc,
                    posts,
                    &self.config.animation,
                ));
            }
        }
    }

    /// Feed visibility-observer entries to the post animator. Ignored until
    /// animations have started.
    pub fn report_intersections(&mut self, entries: &[IntersectionEntry]) {
        if let Some(animator) = &self.animator {
            animator.on_intersection(&mut self.doc, entries);
        }
    }

    /// History back, re-filtering for the restored address.
    pub fn go_back(&mut self) -> bool {
        let moved = self.doc.back();
        if moved {
            self.refilter();
        }
        moved
    }

    pub fn go_forward(&mut self) -> bool {
        let moved = self.doc.forward();
        if moved {
            self.refilter();
        }
        moved
    }

    fn refilter(&mut self) {
        if let Some(language) = &mut self.language {
            language.apply_from_address(&mut self.doc, &mut self.timers.scoped(Task::Language));
        }
    }

    pub fn set_language(&mut self, lang: Language) {
        if let Some(language) = &mut self.language {
            language.set_language(&mut self.doc, &mut self.timers.scoped(Task::Language), lang);
        }
    }

    pub fn open_subscribe(&mut self) {
        if let Some(form) = &mut self.form {
            form.open(&mut self.doc, &mut self.timers.scoped(Task::Subscribe));
        }
    }

    pub fn close_subscribe(&mut self) {
        if let Some(form) = &self.form {
            form.close(&mut self.doc);
        }
    }

    // =========================================================================
    // Admin
    // =========================================================================

    pub fn subscribers(&self) -> Vec<Subscriber> {
        self.store.subscribers()
    }

    /// Export the subscriber list as a dated download.
    pub fn export_subscribers(&mut self) -> Result<Export, SubscribeError> {
        let today = self.now().date_naive();
        download_export(&mut self.doc, &self.store, today)
    }

    pub fn add_fruit_link(&mut self, fruit: NewFruit) -> String {
        self.fruits.add_link(&mut self.doc, &mut self.rng, fruit)
    }

    pub fn update_fruit_link(&mut self, id: &str, name: &str, url: &str) -> bool {
        self.fruits.update_link(&mut self.doc, id, name, url)
    }
}
