//! Link behaviors: external-link hardening, same-page smooth scrolling, and
//! the `h` home shortcut.

use crate::dom::{Document, Effect, ElementId, ScrollBehavior};

/// Make every external anchor (`href` starting with `http`) open in a new
/// tab without leaking the referrer or `window.opener`. Anchors that already
/// carry an icon (`svg` child) are styled as external elsewhere and left
/// alone. Returns the number of anchors rewritten.
pub fn harden_external_links(doc: &mut Document) -> usize {
    let mut hardened = 0;
    for link in doc.anchors_with_href_prefix("http") {
        if doc.has_descendant_tag(link, "svg") {
            continue;
        }
        doc.set_attribute(link, "target", "_blank");
        doc.set_attribute(link, "rel", "noopener noreferrer");
        hardened += 1;
    }
    tracing::debug!("Hardened {} external links", hardened);
    hardened
}

/// Intercepts `href="#id"` anchors and scrolls smoothly to the target.
#[derive(Debug, Default)]
pub struct SmoothScroller {
    anchors: Vec<ElementId>,
}

impl SmoothScroller {
    pub fn attach(doc: &Document) -> Self {
        Self {
            anchors: doc.anchors_with_href_prefix("#"),
        }
    }

    /// Handle a click. Returns `true` when the click landed on one of the
    /// same-page anchors, in which case default navigation is suppressed
    /// even if the target does not exist.
    pub fn on_click(&self, doc: &mut Document, target: ElementId) -> bool {
        let Some(&anchor) = self.anchors.iter().find(|a| doc.contains(**a, target)) else {
            return false;
        };
        let fragment = doc
            .attribute(anchor, "href")
            .and_then(|h| h.strip_prefix('#'))
            .unwrap_or_default()
            .to_string();
        if fragment.is_empty() {
            return true;
        }
        match doc.get_element_by_id(&fragment) {
            Some(el) => doc.push_effect(Effect::ScrollIntoView {
                target: el,
                behavior: ScrollBehavior::Smooth,
            }),
            None => tracing::debug!("Anchor target #{} not found", fragment),
        }
        true
    }
}

/// A keydown as seen by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    fn has_modifier(&self) -> bool {
        self.ctrl || self.meta || self.alt
    }
}

/// Press `h` anywhere outside a text field to go to `/`. Returns `true`
/// when navigation happened.
pub fn home_shortcut(doc: &mut Document, key: &KeyEvent) -> bool {
    if key.key != "h" || key.has_modifier() {
        return false;
    }
    let typing = doc
        .focused()
        .is_some_and(|el| matches!(doc.element(el).tag.as_str(), "input" | "textarea"));
    if typing {
        return false;
    }
    doc.navigate("/");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn anchor(doc: &mut Document, href: &str) -> ElementId {
        let a = doc.append_new(doc.body(), "a");
        doc.set_attribute(a, "href", href);
        a
    }

    #[test]
    fn external_links_get_target_and_rel() {
        let mut page = fixture_page();
        let ext = anchor(&mut page.doc, "https://github.com/");
        let internal = anchor(&mut page.doc, "posts/a.html");
        assert_eq!(harden_external_links(&mut page.doc), 1);
        assert_eq!(page.doc.attribute(ext, "target"), Some("_blank"));
        assert_eq!(page.doc.attribute(ext, "rel"), Some("noopener noreferrer"));
        assert_eq!(page.doc.attribute(internal, "target"), None);
    }

    #[test]
    fn links_with_icon_are_left_alone() {
        let mut page = fixture_page();
        let ext = anchor(&mut page.doc, "http://example.com");
        page.doc.append_new(ext, "svg");
        assert_eq!(harden_external_links(&mut page.doc), 0);
        assert_eq!(page.doc.attribute(ext, "target"), None);
    }

    #[test]
    fn same_page_anchor_scrolls_smoothly() {
        let mut page = fixture_page();
        let section = page.doc.append_new(page.doc.body(), "section");
        page.doc.set_element_id(section, "about");
        let a = anchor(&mut page.doc, "#about");
        let label = page.doc.append_new(a, "span");
        let scroller = SmoothScroller::attach(&page.doc);

        assert!(scroller.on_click(&mut page.doc, label));
        assert_eq!(
            page.doc.effects(),
            &[Effect::ScrollIntoView {
                target: section,
                behavior: ScrollBehavior::Smooth
            }]
        );
    }

    #[test]
    fn missing_target_is_swallowed() {
        let mut page = fixture_page();
        let a = anchor(&mut page.doc, "#nowhere");
        let scroller = SmoothScroller::attach(&page.doc);
        assert!(scroller.on_click(&mut page.doc, a));
        assert!(page.doc.effects().is_empty());
    }

    #[test]
    fn other_clicks_pass_through() {
        let mut page = fixture_page();
        let scroller = SmoothScroller::attach(&page.doc);
        assert!(!scroller.on_click(&mut page.doc, page.posts[0]));
    }

    #[test]
    fn h_goes_home() {
        let mut page = fixture_page();
        assert!(home_shortcut(&mut page.doc, &KeyEvent::plain("h")));
        assert!(matches!(
            page.doc.effects(),
            [Effect::Navigate(url)] if url.as_str() == "https://blog.example/"
        ));
    }

    #[test]
    fn h_is_ignored_while_typing_or_with_modifiers() {
        let mut page = fixture_page();
        page.doc.focus(page.search_input);
        assert!(!home_shortcut(&mut page.doc, &KeyEvent::plain("h")));

        page.doc.blur(page.search_input);
        let ctrl_h = KeyEvent {
            ctrl: true,
            ..KeyEvent::plain("h")
        };
        assert!(!home_shortcut(&mut page.doc, &ctrl_h));
        assert!(!home_shortcut(&mut page.doc, &KeyEvent::plain("j")));
    }
}
