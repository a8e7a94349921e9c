//! Headless page model.
//!
//! Every component in this crate manipulates a [`Document`] instead of a live
//! browser DOM. The document is an element arena: elements are addressed by
//! [`ElementId`] handles, hold their own tag/id/classes/attributes/inline
//! style, and are linked into a tree rooted at `<body>`. Lookups walk the tree
//! in document order, so detached elements are invisible to
//! [`Document::get_element_by_id`] just like in a browser.
//!
//! Things a browser would *do* (scroll, open a tab, leave the page, download
//! a file) are recorded as [`Effect`]s for the caller to inspect or carry out.
//!
//! ```text
//! body
//! ├── div.search-container
//! │   ├── input#searchInput
//! │   ├── button#searchBtn
//! │   └── div#searchResults
//! ├── ul
//! │   ├── li.post-item[data-language=English]
//! │   └── li.post-item[data-language=Chinese]
//! └── div#fruits-container
//! ```

use std::collections::BTreeMap;
use url::Url;

/// Handle to an element inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Layout box size in CSS pixels (`offsetWidth` / `offsetHeight`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Viewport coordinates in CSS pixels (`clientX` / `clientY`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single element. Tree links are private; use the [`Document`] accessors.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub text: String,
    /// Raw markup assigned through `innerHTML`, already escaped by the renderer.
    pub inner_html: Option<String>,
    /// Form control value (`input.value`).
    pub value: String,
    pub disabled: bool,
    pub size: Size,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Auto,
    Smooth,
}

/// Side effects a browser would perform on the page's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// `element.scrollIntoView({ behavior, block: 'start' })`
    ScrollIntoView {
        target: ElementId,
        behavior: ScrollBehavior,
    },
    /// `window.open(url, target)`
    OpenWindow { url: String, target: String },
    /// `window.location.href = url`
    Navigate(Url),
    /// A generated file handed to the user.
    Download { filename: String, contents: String },
    Blur(ElementId),
}

#[derive(Debug, Clone)]
struct History {
    entries: Vec<Url>,
    index: usize,
}

/// The page: element tree, address, history, viewport, and recorded effects.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
    body: ElementId,
    history: History,
    /// `window.innerWidth` / `window.innerHeight`.
    pub viewport: Size,
    focused: Option<ElementId>,
    rules: Vec<String>,
    effects: Vec<Effect>,
}

impl Document {
    /// Create an empty page (just `<body>`) loaded at `location`.
    pub fn new(location: Url) -> Self {
        let body = Element {
            tag: "body".to_string(),
            ..Element::default()
        };
        Self {
            elements: vec![body],
            body: ElementId(0),
            history: History {
                entries: vec![location],
                index: 0,
            },
            viewport: Size::new(1280.0, 800.0),
            focused: None,
            rules: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    // ------------------------------------------------------------------
    // Tree construction
    // ------------------------------------------------------------------

    /// Create a detached element.
    /// Number of elements ever created, attached or not.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first if
    /// it already has a parent.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if let Some(old) = self.elements[child.0].parent.take() {
            self.elements[old.0].children.retain(|c| *c != child);
        }
        self.elements[child.0].parent = Some(parent);
        self.elements[parent.0].children.push(child);
    }

    /// Create an element and append it to `parent` in one step.
    pub fn append_new(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let el = self.create_element(tag);
        self.append_child(parent, el);
        el
    }

    /// Detach every child of `parent` (`parent.innerHTML = ''`).
    pub fn clear_children(&mut self, parent: ElementId) {
        let children = std::mem::take(&mut self.elements[parent.0].children);
        for child in children {
            self.elements[child.0].parent = None;
        }
        self.elements[parent.0].inner_html = None;
    }

    pub fn element(&self, el: ElementId) -> &Element {
        &self.elements[el.0]
    }

    pub fn element_mut(&mut self, el: ElementId) -> &mut Element {
        &mut self.elements[el.0]
    }

    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.elements[el.0].parent
    }

    pub fn children(&self, el: ElementId) -> &[ElementId] {
        &self.elements[el.0].children
    }

    // ------------------------------------------------------------------
    // Queries (document order)
    // ------------------------------------------------------------------

    /// Pre-order walk of the subtree under `root`, excluding `root`.
    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).iter().rev().copied().collect();
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(self.children(el).iter().rev().copied());
        }
        out
    }

    /// Whether `el` is attached to the page.
    pub fn is_connected(&self, el: ElementId) -> bool {
        let mut cur = Some(el);
        while let Some(c) = cur {
            if c == self.body {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        std::iter::once(self.body)
            .chain(self.descendants(self.body))
            .find(|el| self.element(*el).id.as_deref() == Some(id))
    }

    /// All attached elements carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Vec<ElementId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|el| self.has_class(*el, class))
            .collect()
    }

    /// `querySelectorAll('a[href^="{prefix}"]')`
    pub fn anchors_with_href_prefix(&self, prefix: &str) -> Vec<ElementId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|el| {
                let e = self.element(*el);
                e.tag == "a"
                    && e.attributes
                        .get("href")
                        .is_some_and(|h| h.starts_with(prefix))
            })
            .collect()
    }

    /// Nearest inclusive ancestor of `from` carrying `class`.
    pub fn closest_with_class(&self, from: ElementId, class: &str) -> Option<ElementId> {
        let mut cur = Some(from);
        while let Some(c) = cur {
            if self.has_class(c, class) {
                return Some(c);
            }
            cur = self.parent(c);
        }
        None
    }

    /// Whether `el` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut cur = Some(el);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    pub fn has_descendant_tag(&self, el: ElementId, tag: &str) -> bool {
        self.descendants(el)
            .into_iter()
            .any(|d| self.element(d).tag == tag)
    }

    // ------------------------------------------------------------------
    // Element state
    // ------------------------------------------------------------------

    pub fn set_element_id(&mut self, el: ElementId, id: &str) {
        self.element_mut(el).id = Some(id.to_string());
    }

    /// Replace the class list from a space-separated `className`.
    pub fn set_class_name(&mut self, el: ElementId, class_name: &str) {
        self.element_mut(el).classes = class_name.split_whitespace().map(str::to_string).collect();
    }

    pub fn add_class(&mut self, el: ElementId, class: &str) {
        if !self.has_class(el, class) {
            self.element_mut(el).classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, el: ElementId, class: &str) {
        self.element_mut(el).classes.retain(|c| c != class);
    }

    pub fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.element(el).classes.iter().any(|c| c == class)
    }

    pub fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        self.element_mut(el)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn attribute(&self, el: ElementId, name: &str) -> Option<&str> {
        self.element(el).attributes.get(name).map(String::as_str)
    }

    /// Set an inline style property. An empty value removes it, as
    /// `el.style.display = ''` does.
    pub fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        let style = &mut self.element_mut(el).style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    pub fn style(&self, el: ElementId, property: &str) -> Option<&str> {
        self.element(el).style.get(property).map(String::as_str)
    }

    /// Not hidden by an inline `display: none`.
    pub fn is_displayed(&self, el: ElementId) -> bool {
        self.style(el, "display") != Some("none")
    }

    pub fn set_text(&mut self, el: ElementId, text: &str) {
        let e = self.element_mut(el);
        e.text = text.to_string();
        e.inner_html = None;
    }

    pub fn text(&self, el: ElementId) -> &str {
        &self.element(el).text
    }

    pub fn set_inner_html(&mut self, el: ElementId, html: String) {
        self.element_mut(el).inner_html = Some(html);
    }

    pub fn set_value(&mut self, el: ElementId, value: &str) {
        self.element_mut(el).value = value.to_string();
    }

    pub fn value(&self, el: ElementId) -> &str {
        &self.element(el).value
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn focus(&mut self, el: ElementId) {
        self.focused = Some(el);
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn blur(&mut self, el: ElementId) {
        if self.focused == Some(el) {
            self.focused = None;
        }
        self.effects.push(Effect::Blur(el));
    }

    // ------------------------------------------------------------------
    // Address and history
    // ------------------------------------------------------------------

    pub fn location(&self) -> &Url {
        &self.history.entries[self.history.index]
    }

    /// `history.pushState`: drop any forward entries and make `url` current.
    pub fn push_state(&mut self, url: Url) {
        self.history.entries.truncate(self.history.index + 1);
        self.history.entries.push(url);
        self.history.index += 1;
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.history.index == 0 {
            return false;
        }
        self.history.index -= 1;
        true
    }

    /// Step forward one entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.history.index + 1 >= self.history.entries.len() {
            return false;
        }
        self.history.index += 1;
        true
    }

    /// Leave the page for `href`, resolved against the current location.
    pub fn navigate(&mut self, href: &str) {
        match self.location().join(href) {
            Ok(url) => self.effects.push(Effect::Navigate(url)),
            Err(e) => tracing::warn!("Cannot navigate to '{}': {}", href, e),
        }
    }

    // ------------------------------------------------------------------
    // Stylesheet and effects
    // ------------------------------------------------------------------

    /// `styleSheet.insertRule(rule, cssRules.length)`
    pub fn insert_rule(&mut self, rule: &str) -> usize {
        self.rules.push(rule.to_string());
        self.rules.len() - 1
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Drain recorded effects.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}
