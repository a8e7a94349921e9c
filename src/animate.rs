//! Reveal-on-scroll for post items, and the page fade-in.
//!
//! The animator only ever *reveals*: when a post is reported intersecting and
//! it is still displayed, it is moved to opacity 1 / `translateY(0)`. It does
//! not hide anything up front and never touches `display`, so posts hidden by
//! the language filter stay hidden however often they scroll past.
//!
//! Intersections are fed in by whoever owns the viewport (a browser observer
//! callback, or a test) through [`PostAnimator::on_intersection`].

use crate::config::AnimationConfig;
use crate::dom::{Document, ElementId};

/// One visibility-observer callback entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Visible fraction of the target, 0.0..=1.0.
    pub ratio: f64,
}

#[derive(Debug)]
pub struct PostAnimator {
    posts: Vec<ElementId>,
    threshold: f64,
    root_margin: String,
}

impl PostAnimator {
    /// Start observing `posts`: give each a staggered transition.
    pub fn observe(doc: &mut Document, posts: Vec<ElementId>, config: &AnimationConfig) -> Self {
        for (index, &post) in posts.iter().enumerate() {
            let delay = millis_rounded(index as f64 * config.stagger_secs);
            doc.set_style(
                post,
                "transition",
                &format!(
                    "opacity {d}s ease {delay}s, transform {d}s ease {delay}s",
                    d = config.duration_secs
                ),
            );
        }
        tracing::debug!("Observing {} posts for reveal", posts.len());
        Self {
            posts,
            threshold: config.threshold,
            root_margin: config.root_margin.clone(),
        }
    }

    pub fn root_margin(&self) -> &str {
        &self.root_margin
    }

    pub fn is_observed(&self, el: ElementId) -> bool {
        self.posts.contains(&el)
    }

    pub fn on_intersection(&self, doc: &mut Document, entries: &[IntersectionEntry]) {
        for entry in entries {
            if !self.is_observed(entry.target) {
                continue;
            }
            let intersecting = entry.ratio > 0.0 && entry.ratio >= self.threshold;
            if intersecting && doc.is_displayed(entry.target) {
                doc.set_style(entry.target, "opacity", "1");
                doc.set_style(entry.target, "transform", "translateY(0)");
            }
        }
    }
}

/// Round seconds to whole milliseconds so CSS reads `0.3s`, not
/// `0.30000000000000004s`.
pub(crate) fn millis_rounded(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Hide the body until load so the page fades in.
pub fn prepare_body_fade(doc: &mut Document) {
    let body = doc.body();
    doc.set_style(body, "opacity", "0");
    doc.set_style(body, "transition", "opacity 0.3s ease");
}

pub fn reveal_body(doc: &mut Document) {
    let body = doc.body();
    doc.set_style(body, "opacity", "1");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn animator(page: &mut FixturePage) -> PostAnimator {
        PostAnimator::observe(&mut page.doc, page.posts.clone(), &AnimationConfig::default())
    }

    #[test]
    fn transitions_are_staggered() {
        let mut page = fixture_page();
        animator(&mut page);
        assert_eq!(
            page.doc.style(page.posts[0], "transition"),
            Some("opacity 0.6s ease 0s, transform 0.6s ease 0s")
        );
        assert_eq!(
            page.doc.style(page.posts[2], "transition"),
            Some("opacity 0.6s ease 0.2s, transform 0.6s ease 0.2s")
        );
    }

    #[test]
    fn intersecting_post_is_revealed() {
        let mut page = fixture_page();
        let anim = animator(&mut page);
        let post = page.posts[1];
        anim.on_intersection(&mut page.doc, &[IntersectionEntry { target: post, ratio: 0.5 }]);
        assert_eq!(page.doc.style(post, "opacity"), Some("1"));
        assert_eq!(page.doc.style(post, "transform"), Some("translateY(0)"));
    }

    #[test]
    fn below_threshold_is_ignored() {
        let mut page = fixture_page();
        let anim = animator(&mut page);
        let post = page.posts[1];
        anim.on_intersection(&mut page.doc, &[IntersectionEntry { target: post, ratio: 0.05 }]);
        assert_eq!(page.doc.style(post, "opacity"), None);
    }

    #[test]
    fn hidden_post_is_never_forced_visible() {
        let mut page = fixture_page();
        let anim = animator(&mut page);
        let post = page.posts[1];
        page.doc.set_style(post, "display", "none");
        page.doc.set_style(post, "opacity", "0");
        anim.on_intersection(&mut page.doc, &[IntersectionEntry { target: post, ratio: 1.0 }]);
        assert_eq!(page.doc.style(post, "opacity"), Some("0"));
        assert!(!page.doc.is_displayed(post));
    }

    #[test]
    fn unobserved_elements_are_untouched() {
        let mut page = fixture_page();
        let anim = animator(&mut page);
        let other = page.search_results;
        anim.on_intersection(&mut page.doc, &[IntersectionEntry { target: other, ratio: 1.0 }]);
        assert_eq!(page.doc.style(other, "opacity"), None);
    }

    #[test]
    fn body_fades_in() {
        let mut page = fixture_page();
        prepare_body_fade(&mut page.doc);
        let body = page.doc.body();
        assert_eq!(page.doc.style(body, "opacity"), Some("0"));
        reveal_body(&mut page.doc);
        assert_eq!(page.doc.style(body, "opacity"), Some("1"));
    }
}
