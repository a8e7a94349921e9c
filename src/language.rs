//! Two-language post filter.
//!
//! Post list items carry a `data-language` attribute. Only the partition
//! matching the active language is shown. The active language lives in the
//! page address (`?lang=Chinese`) so reloads and back/forward restore the
//! same view.
//!
//! ## Language identifiers
//!
//! | Input | Canonical |
//! |-------|-----------|
//! | `English` | `English` |
//! | `Chinese` | `Chinese` |
//! | `中文` | `Chinese` |
//! | anything else, or absent | `English` |
//!
//! ## Timing
//!
//! Matching posts are un-hidden immediately at opacity 0 and revealed after
//! `index * stagger + base` milliseconds (index counts all posts, so the
//! cascade keeps its rhythm whichever partition is shown). Non-matching posts
//! are hidden immediately. Reveal timers left over from a previous activation
//! are cancelled, and a reveal re-checks `display` before showing anything.

use crate::config::LanguageConfig;
use crate::dom::{Document, ElementId};
use crate::scheduler::{TimerHandle, Timers};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonical language identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    English,
    Chinese,
}

impl Language {
    /// Fold any identifier to a canonical language. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Chinese" | "中文" => Language::Chinese,
            _ => Language::English,
        }
    }

    /// Identifier used in the address and in `data-language`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "Chinese",
        }
    }

    /// Native label for the toggle link.
    pub fn native_label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "中文",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Language {
    fn from(raw: String) -> Self {
        Language::parse(&raw)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.as_str().to_string()
    }
}

/// Read the active language from `url`'s `param` query parameter.
pub fn language_from_address(url: &Url, param: &str, default: Language) -> Language {
    url.query_pairs()
        .find(|(k, _)| k == param)
        .map(|(_, v)| Language::parse(&v))
        .unwrap_or(default)
}

/// Return `url` with `param` set to `lang`, keeping other parameters.
pub fn address_with_language(url: &Url, param: &str, lang: Language) -> Url {
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut out = url.clone();
    {
        let mut pairs = out.query_pairs_mut();
        pairs.clear();
        for (k, v) in &others {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(param, lang.as_str());
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageTask {
    /// Fade a matching post in.
    Reveal(ElementId),
}

/// Shows only the posts of the active language.
#[derive(Debug)]
pub struct LanguageFilter {
    config: LanguageConfig,
    posts: Vec<ElementId>,
    links: Vec<ElementId>,
    current: Language,
    reveals: Vec<TimerHandle>,
}

impl LanguageFilter {
    /// Collect posts and toggle links and read the language from the address.
    /// Nothing is filtered until [`set_language`](Self::set_language) or
    /// [`apply_from_address`](Self::apply_from_address) runs.
    pub fn attach(doc: &Document, config: &LanguageConfig) -> Self {
        let current = language_from_address(doc.location(), &config.param, config.default);
        Self {
            posts: doc.query_class(&config.post_class),
            links: doc.query_class(&config.link_class),
            config: config.clone(),
            current,
            reveals: Vec::new(),
        }
    }

    pub fn current(&self) -> Language {
        self.current
    }

    pub fn posts(&self) -> &[ElementId] {
        &self.posts
    }

    pub fn is_toggle_link(&self, el: ElementId) -> bool {
        self.links.contains(&el)
    }

    /// Activate `lang`: mark its toggle link active and show only its posts.
    pub fn set_language(
        &mut self,
        doc: &mut Document,
        timers: &mut impl Timers<LanguageTask>,
        lang: Language,
    ) {
        self.current = lang;
        for handle in self.reveals.drain(..) {
            timers.clear_timeout(handle);
        }

        for &link in &self.links {
            let link_lang = Language::parse(doc.attribute(link, "data-lang").unwrap_or_default());
            if link_lang == lang {
                doc.add_class(link, "active");
            } else {
                doc.remove_class(link, "active");
            }
        }

        let mut visible = 0;
        for (index, &post) in self.posts.iter().enumerate() {
            let post_lang = doc
                .attribute(post, &self.config.post_attribute)
                .map(Language::parse)
                .unwrap_or_default();
            doc.set_style(post, "opacity", "0");
            doc.set_style(post, "transform", "translateY(20px)");
            if post_lang == lang {
                doc.set_style(post, "display", "");
                visible += 1;
                let delay = index as u64 * self.config.stagger_ms + self.config.base_delay_ms;
                self.reveals
                    .push(timers.set_timeout(delay, LanguageTask::Reveal(post)));
            } else {
                doc.set_style(post, "display", "none");
            }
        }
        tracing::debug!("Filtered to {}: {} articles visible", lang, visible);
    }

    /// Re-read the address and filter accordingly (initial load, popstate).
    pub fn apply_from_address(&mut self, doc: &mut Document, timers: &mut impl Timers<LanguageTask>) {
        let lang = language_from_address(doc.location(), &self.config.param, self.config.default);
        self.set_language(doc, timers, lang);
    }

    /// Handle a click on a toggle link: record the language in the address
    /// and filter in place. Returns `false` if `target` is not a toggle link.
    pub fn on_link_click(
        &mut self,
        doc: &mut Document,
        timers: &mut impl Timers<LanguageTask>,
        target: ElementId,
    ) -> bool {
        let Some(&link) = self.links.iter().find(|l| doc.contains(**l, target)) else {
            return false;
        };
        let lang = Language::parse(doc.attribute(link, "data-lang").unwrap_or_default());
        let url = address_with_language(doc.location(), &self.config.param, lang);
        if &url != doc.location() {
            doc.push_state(url);
        }
        self.set_language(doc, timers, lang);
        true
    }

    pub fn on_task(&mut self, doc: &mut Document, task: LanguageTask) {
        match task {
            LanguageTask::Reveal(post) => {
                if doc.is_displayed(post) {
                    doc.set_style(post, "opacity", "1");
                    doc.set_style(post, "transform", "translateY(0)");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::test_helpers::*;

    #[test]
    fn alias_folds_to_chinese() {
        assert_eq!(Language::parse("中文"), Language::Chinese);
        assert_eq!(Language::parse("Chinese"), Language::Chinese);
        assert_eq!(Language::parse("English"), Language::English);
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        assert_eq!(Language::parse("Klingon"), Language::English);
        assert_eq!(Language::parse(""), Language::English);
        assert_eq!(Language::parse("chinese"), Language::English);
    }

    #[test]
    fn address_roundtrip_for_every_identifier() {
        let base = Url::parse("https://blog.example/blog/?page=2").unwrap();
        for raw in ["English", "Chinese", "中文"] {
            let lang = Language::parse(raw);
            let url = address_with_language(&base, "lang", lang);
            assert_eq!(language_from_address(&url, "lang", Language::English), lang);
        }
    }

    #[test]
    fn alias_in_address_is_decoded() {
        let url = Url::parse("https://blog.example/?lang=%E4%B8%AD%E6%96%87").unwrap();
        assert_eq!(language_from_address(&url, "lang", Language::English), Language::Chinese);
    }

    #[test]
    fn address_keeps_other_parameters_and_replaces_lang() {
        let base = Url::parse("https://blog.example/?page=2&lang=English").unwrap();
        let url = address_with_language(&base, "lang", Language::Chinese);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("lang".to_string(), "Chinese".to_string())
            ]
        );
    }

    #[test]
    fn absent_parameter_uses_default() {
        let url = Url::parse("https://blog.example/").unwrap();
        assert_eq!(language_from_address(&url, "lang", Language::English), Language::English);
    }

    #[test]
    fn serde_accepts_alias() {
        #[derive(Deserialize)]
        struct Wrap {
            lang: Language,
        }
        let w: Wrap = toml::from_str("lang = \"中文\"").unwrap();
        assert_eq!(w.lang, Language::Chinese);
    }

    #[test]
    fn set_language_shows_only_matching_posts() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut timers = Scheduler::new();
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());

        filter.set_language(&mut doc, &mut timers, Language::Chinese);
        assert_eq!(visible_post_titles(&doc), vec!["你好", "再见"]);

        filter.set_language(&mut doc, &mut timers, Language::English);
        assert_eq!(visible_post_titles(&doc), vec!["Hello", "Notion Sync", "Untagged"]);
    }

    #[test]
    fn set_language_is_idempotent() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut timers = Scheduler::new();
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());

        filter.set_language(&mut doc, &mut timers, Language::Chinese);
        let once = visible_post_titles(&doc);
        filter.set_language(&mut doc, &mut timers, Language::Chinese);
        assert_eq!(visible_post_titles(&doc), once);
        // stale reveals from the first call were cancelled
        assert_eq!(timers.pending(), once.len());
    }

    #[test]
    fn reveals_are_staggered_by_index() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut timers = Scheduler::new();
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());
        filter.set_language(&mut doc, &mut timers, Language::English);

        let first = page.posts[0];
        let third = page.posts[2];
        assert_eq!(doc.style(first, "opacity"), Some("0"));

        // first post (index 0) reveals at 50ms
        for task in timers.advance(50) {
            filter.on_task(&mut doc, task);
        }
        assert_eq!(doc.style(first, "opacity"), Some("1"));
        assert_eq!(doc.style(third, "opacity"), Some("0"));

        // third post (index 2) reveals at 150ms
        for task in timers.advance(100) {
            filter.on_task(&mut doc, task);
        }
        assert_eq!(doc.style(third, "opacity"), Some("1"));
        assert_eq!(doc.style(third, "transform"), Some("translateY(0)"));
    }

    #[test]
    fn reveal_never_shows_hidden_post() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());
        let post = page.posts[0];
        doc.set_style(post, "display", "none");
        filter.on_task(&mut doc, LanguageTask::Reveal(post));
        assert_eq!(doc.style(post, "opacity"), None);
    }

    #[test]
    fn toggle_link_updates_address_and_active_class() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut timers = Scheduler::new();
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());
        filter.apply_from_address(&mut doc, &mut timers);
        assert!(doc.has_class(page.lang_en, "active"));

        assert!(filter.on_link_click(&mut doc, &mut timers, page.lang_zh));
        assert_eq!(filter.current(), Language::Chinese);
        assert_eq!(
            language_from_address(doc.location(), "lang", Language::English),
            Language::Chinese
        );
        assert!(doc.has_class(page.lang_zh, "active"));
        assert!(!doc.has_class(page.lang_en, "active"));
    }

    #[test]
    fn click_elsewhere_is_ignored() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut timers = Scheduler::new();
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());
        assert!(!filter.on_link_click(&mut doc, &mut timers, page.posts[0]));
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn missing_language_attribute_counts_as_english() {
        let page = fixture_page();
        let mut doc = page.doc;
        let mut timers = Scheduler::new();
        let mut filter = LanguageFilter::attach(&doc, &LanguageConfig::default());
        filter.set_language(&mut doc, &mut timers, Language::English);
        assert!(visible_post_titles(&doc).contains(&"Untagged".to_string()));
    }
}
