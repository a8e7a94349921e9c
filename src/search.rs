//! Client-side article search.
//!
//! Two layers:
//!
//! - [`SearchIndex`] is the pure part: a fixed catalog, a case-insensitive
//!   substring query, and match highlighting. No page, no timers.
//! - [`SearchBox`] wires the index to the page: it debounces typing, runs on
//!   button click or `Enter`, renders the results panel, hides it on
//!   `Escape` or an outside click, and navigates when a result is clicked.
//!
//! ## Matching
//!
//! An article matches when `title + " " + summary + " " + content`, lowercased,
//! contains the lowercased query. The query is used as typed (no trimming) so
//! `"blog "` only matches where a space follows; a query that is empty after
//! trimming matches nothing and hides the panel. Matches keep catalog order.
//!
//! ## Highlighting
//!
//! Every case-insensitive occurrence of the query in the title and summary is
//! emphasized. The query goes through [`regex::escape`] before it becomes a
//! pattern, so `c++` or `(draft)` are searched literally. The result is a
//! [`Highlighted`] list of segments rather than a string with markup spliced
//! in, which keeps two things true:
//!
//! - joining the segments gives back the original text exactly, and
//! - rendering through maud escapes the text, so catalog content can never
//!   inject markup into the results panel.

use crate::config::SearchConfig;
use crate::dom::{Document, ElementId};
use crate::scheduler::{TimerHandle, Timers};
use crate::types::Article;
use maud::{Markup, Render, html};
use regex::{Regex, RegexBuilder};

/// Message shown when a query matches nothing.
pub const NO_RESULTS_MESSAGE: &str = "No articles found matching your search.";

/// A run of text, emphasized or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub emphasized: bool,
}

/// Text split into plain and emphasized runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlighted {
    pub segments: Vec<Segment>,
}

impl Highlighted {
    fn plain(text: &str) -> Self {
        Self {
            segments: vec![Segment {
                text: text.to_string(),
                emphasized: false,
            }],
        }
    }

    /// The text with emphasis stripped.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Emphasized runs, in order.
    pub fn emphasized(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter(|s| s.emphasized)
            .map(|s| s.text.as_str())
            .collect()
    }
}

impl Render for Highlighted {
    fn render(&self) -> Markup {
        html! {
            @for segment in &self.segments {
                @if segment.emphasized {
                    span.search-highlight { (segment.text) }
                } @else {
                    (segment.text)
                }
            }
        }
    }
}

/// Case-insensitive literal pattern for `query`. `None` for a blank query,
/// or (logged) if the pattern cannot be built.
fn matcher(query: &str) -> Option<Regex> {
    if query.trim().is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::warn!("Cannot build search pattern for '{}': {}", query, e);
            None
        }
    }
}

/// Emphasize every case-insensitive occurrence of `query` in `text`.
pub fn highlight(text: &str, query: &str) -> Highlighted {
    match matcher(query) {
        Some(pattern) => highlight_with(text, &pattern),
        None => Highlighted::plain(text),
    }
}

fn highlight_with(text: &str, pattern: &Regex) -> Highlighted {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in pattern.find_iter(text) {
        if m.start() > last {
            segments.push(Segment {
                text: text[last..m.start()].to_string(),
                emphasized: false,
            });
        }
        segments.push(Segment {
            text: m.as_str().to_string(),
            emphasized: true,
        });
        last = m.end();
    }
    if last < text.len() || segments.is_empty() {
        segments.push(Segment {
            text: text[last..].to_string(),
            emphasized: false,
        });
    }
    Highlighted { segments }
}

/// One matching article with highlighted title and summary.
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub article: &'a Article,
    pub title: Highlighted,
    pub summary: Highlighted,
}

/// What the results panel should show for a query.
#[derive(Debug, Clone)]
pub enum SearchOutcome<'a> {
    /// Blank query: hide the panel.
    Blank,
    /// Non-blank query with no match: show the "no results" indicator.
    NoResults,
    Hits(Vec<SearchHit<'a>>),
}

/// The fixed article catalog.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    articles: Vec<Article>,
}

impl SearchIndex {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Articles matching `query`, in catalog order. Blank ⇒ empty.
    pub fn search(&self, query: &str) -> Vec<&Article> {
        match matcher(query) {
            Some(pattern) => self.matching(&pattern),
            None => Vec::new(),
        }
    }

    /// Matching uses the same pattern as highlighting, so every hit with a
    /// match in its title or summary shows emphasis there.
    fn matching(&self, pattern: &Regex) -> Vec<&Article> {
        self.articles
            .iter()
            .filter(|a| pattern.is_match(&format!("{} {} {}", a.title, a.summary, a.content)))
            .collect()
    }

    /// Search and highlight.
    pub fn query(&self, query: &str) -> SearchOutcome<'_> {
        if query.trim().is_empty() {
            return SearchOutcome::Blank;
        }
        let Some(pattern) = matcher(query) else {
            return SearchOutcome::NoResults;
        };
        let hits: Vec<SearchHit<'_>> = self
            .matching(&pattern)
            .into_iter()
            .map(|article| SearchHit {
                article,
                title: highlight_with(&article.title, &pattern),
                summary: highlight_with(&article.summary, &pattern),
            })
            .collect();
        if hits.is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Hits(hits)
        }
    }
}

/// Inner markup of one result item.
pub fn render_hit(hit: &SearchHit<'_>) -> Markup {
    html! {
        div.search-result-title { (hit.title) }
        div.search-result-summary { (hit.summary) }
        div.search-result-meta { (hit.article.display_date()) }
    }
}

/// Markup for the "no results" indicator.
pub fn render_no_results() -> Markup {
    html! {
        div.search-no-results { (NO_RESULTS_MESSAGE) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTask {
    /// Debounce window elapsed: search the input's current value.
    Run,
}

/// The search box, results panel, and their event handling.
#[derive(Debug)]
pub struct SearchBox {
    index: SearchIndex,
    input: ElementId,
    button: ElementId,
    panel: ElementId,
    container_class: String,
    debounce_ms: u64,
    pending: Option<TimerHandle>,
    /// Result items currently mounted, with their article links.
    bindings: Vec<(ElementId, String)>,
    /// Every result element created so far, reused by later searches.
    items: Vec<ElementId>,
}

impl SearchBox {
    /// Attach to the page. Returns `None` (after logging) if the input,
    /// button, or results panel is missing.
    pub fn attach(doc: &Document, index: SearchIndex, config: &SearchConfig) -> Option<Self> {
        let input = doc.get_element_by_id(&config.input_id);
        let button = doc.get_element_by_id(&config.button_id);
        let panel = doc.get_element_by_id(&config.results_id);
        let (Some(input), Some(button), Some(panel)) = (input, button, panel) else {
            tracing::warn!(
                "Search elements not found (#{}, #{}, #{}); search disabled",
                config.input_id,
                config.button_id,
                config.results_id
            );
            return None;
        };
        tracing::debug!("Search initialized with {} articles", index.articles().len());
        Some(Self {
            index,
            input,
            button,
            panel,
            container_class: config.container_class.clone(),
            debounce_ms: config.debounce_ms,
            pending: None,
            bindings: Vec::new(),
            items: Vec::new(),
        })
    }

    pub fn input(&self) -> ElementId {
        self.input
    }

    pub fn button(&self) -> ElementId {
        self.button
    }

    pub fn panel(&self) -> ElementId {
        self.panel
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Typing: restart the debounce window.
    pub fn on_input(&mut self, timers: &mut impl Timers<SearchTask>) {
        if let Some(handle) = self.pending.take() {
            timers.clear_timeout(handle);
        }
        self.pending = Some(timers.set_timeout(self.debounce_ms, SearchTask::Run));
    }

    pub fn on_task(&mut self, doc: &mut Document, task: SearchTask) {
        match task {
            SearchTask::Run => {
                self.pending = None;
                let query = doc.value(self.input).to_string();
                self.perform(doc, &query);
            }
        }
    }

    /// Search right away (button click, `Enter`).
    pub fn search_now(&mut self, doc: &mut Document, timers: &mut impl Timers<SearchTask>) {
        if let Some(handle) = self.pending.take() {
            timers.clear_timeout(handle);
        }
        let query = doc.value(self.input).to_string();
        self.perform(doc, &query);
    }

    /// Keyboard on the input. Returns `true` if the key was handled.
    pub fn on_key(
        &mut self,
        doc: &mut Document,
        timers: &mut impl Timers<SearchTask>,
        key: &str,
    ) -> bool {
        match key {
            "Enter" => {
                self.search_now(doc, timers);
                true
            }
            "Escape" => {
                self.hide(doc);
                doc.blur(self.input);
                true
            }
            _ => false,
        }
    }

    /// Any click on the page. Clicking a result navigates to its article;
    /// clicking outside the search container hides the panel.
    pub fn on_document_click(&mut self, doc: &mut Document, target: ElementId) {
        if let Some((_, url)) = self
            .bindings
            .iter()
            .find(|(item, _)| doc.contains(*item, target))
        {
            let url = url.clone();
            doc.navigate(&url);
            return;
        }
        if doc.closest_with_class(target, &self.container_class).is_none() {
            self.hide(doc);
        }
    }

    /// Run `query` and render the outcome into the results panel.
    pub fn perform(&mut self, doc: &mut Document, query: &str) {
        tracing::debug!("Performing search for: {:?}", query);
        doc.clear_children(self.panel);
        self.bindings.clear();

        match self.index.query(query) {
            SearchOutcome::Blank => {
                self.hide(doc);
                return;
            }
            SearchOutcome::NoResults => {
                doc.set_inner_html(self.panel, render_no_results().into_string());
            }
            SearchOutcome::Hits(hits) => {
                tracing::debug!("Search results: {}", hits.len());
                for (slot, hit) in hits.iter().enumerate() {
                    let item = result_item(&mut self.items, doc, self.panel, slot);
                    doc.set_attribute(item, "data-href", &hit.article.url);
                    doc.set_inner_html(item, render_hit(hit).into_string());
                    self.bindings.push((item, hit.article.url.clone()));
                }
            }
        }
        doc.set_style(self.panel, "display", "block");
    }

    pub fn hide(&self, doc: &mut Document) {
        doc.set_style(self.panel, "display", "none");
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        doc.style(self.panel, "display") == Some("block")
    }

    /// Result items currently shown, with their links.
    pub fn result_items(&self) -> &[(ElementId, String)] {
        &self.bindings
    }
}

/// The `slot`-th result element from `items`, appended to `panel`. Elements
/// are created once and reused, so repeated searches do not grow the page.
fn result_item(
    items: &mut Vec<ElementId>,
    doc: &mut Document,
    panel: ElementId,
    slot: usize,
) -> ElementId {
    let item = match items.get(slot) {
        Some(&item) => item,
        None => {
            let item = doc.create_element("div");
            doc.add_class(item, "search-result-item");
            items.push(item);
            item
        }
    };
    doc.append_child(panel, item);
    item
}
