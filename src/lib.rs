//! # Simple Blog
//!
//! The client-side behaviors of a small bilingual blog and portfolio page,
//! without a browser. The page is a [`dom::Document`] you can build and
//! inspect, delays run on a virtual clock, and local storage is a trait.
//!
//! # Architecture: Injected Page, Virtual Time
//!
//! Every component takes its element handles, configuration, timers, and
//! storage as arguments instead of reaching for globals:
//!
//! ```text
//!             ┌──────────── Site ─────────────┐
//! Event ────► │ SearchBox  LanguageFilter     │ ──► Document (styles, effects)
//!             │ SubscribeForm  FruitTree      │
//! advance ──► │ PostAnimator  SmoothScroller  │ ──► Storage (subscribers)
//!             └──────── Scheduler<Task> ──────┘
//! ```
//!
//! Side effects a browser would perform (scrolling, opening a tab, navigating,
//! downloading a file) are recorded on the document as [`dom::Effect`]s rather
//! than performed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Composition root: boot order, event routing, timer dispatch, admin operations |
//! | [`dom`] | Element arena with styles, attributes, focus, location, history, recorded effects |
//! | [`scheduler`] | Virtual-time timers: `Timers<T>` trait, `Scheduler`, per-component scoping |
//! | [`storage`] | Key-value storage trait with in-memory and JSON-file backends |
//! | [`search`] | Article catalog query, match highlighting (Maud), debounced search box |
//! | [`language`] | English/Chinese post filter driven by the `lang` query parameter |
//! | [`subscribe`] | Local subscriber list, email validation, export, subscribe form |
//! | [`fruit`] | Portfolio link markers with tooltips and sway |
//! | [`animate`] | Reveal-on-scroll for posts, body fade-in |
//! | [`links`] | External-link hardening, smooth same-page scrolling, `h` home shortcut |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared data: `Article`, `FruitLink` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Timers Are Tasks, Not Closures
//!
//! A debounce or a staggered reveal is a value of a component's task enum
//! queued on a [`scheduler::Scheduler`] and handed back to that component when
//! due. Pending timers can be cancelled by handle, and tests move time forward
//! one step at a time. The [`site::Site`] owns the only scheduler and gives each
//! component a scoped view typed to its own tasks.
//!
//! ## Language Lives In The Address
//!
//! The active language is the `lang` query parameter. Switching languages
//! pushes a history entry and filters in place; going back re-reads the
//! parameter. A missing or unknown value means English, and `中文` is accepted
//! as an alias for Chinese.
//!
//! ## Filtering Before Revealing
//!
//! The language filter runs first and the post animator starts 100 ms later.
//! The animator only ever reveals posts that are still displayed, so a post
//! hidden by the filter stays hidden however often it scrolls into view.
//!
//! ## Highlighting As Segments
//!
//! Search highlighting produces plain/emphasized segments rendered through
//! Maud, never a string with markup spliced in. Stripping emphasis always gives
//! back the original text, and catalog text is escaped on the way out.
//!
//! ## Storage Never Breaks The Page
//!
//! Unreadable or corrupt subscriber data reads as an empty list and is logged.
//! A missing element disables only the component that needed it.

pub mod animate;
pub mod config;
pub mod dom;
pub mod fruit;
pub mod language;
pub mod links;
pub mod output;
pub mod scheduler;
pub mod search;
pub mod site;
pub mod storage;
pub mod subscribe;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
