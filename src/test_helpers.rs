//! Shared test utilities.
//!
//! [`fixture_page`] builds a document with every element the components look
//! for, and returns the handles tests poke at:
//!
//! ```text
//! body
//! ├── nav
//! │   ├── a.lang-link[data-lang=English]
//! │   └── a.lang-link[data-lang=中文]
//! ├── div.search-container
//! │   ├── input#searchInput
//! │   ├── button#searchBtn
//! │   └── div#searchResults
//! ├── ul
//! │   └── li.post-item × 5  (English, Chinese, English, 中文, untagged)
//! ├── div#subscribeModal
//! │   └── form#subscribeForm
//! │       ├── input#subscribeEmail
//! │       ├── button#subscribeBtn
//! │       └── div#subscribeMessage
//! ├── div#fruits-container
//! └── div#tooltip
//! ```

use crate::dom::{Document, ElementId, Size};
use url::Url;

pub struct FixturePage {
    pub doc: Document,
    pub lang_en: ElementId,
    pub lang_zh: ElementId,
    pub search_container: ElementId,
    pub search_input: ElementId,
    pub search_button: ElementId,
    pub search_results: ElementId,
    pub posts: Vec<ElementId>,
    pub modal: ElementId,
    pub form: ElementId,
    pub email_input: ElementId,
    pub submit_button: ElementId,
    pub message: ElementId,
    pub fruits: ElementId,
    pub tooltip: ElementId,
}

pub fn fixture_url() -> Url {
    Url::parse("https://blog.example/blog/index.html").unwrap()
}

pub fn fixture_page() -> FixturePage {
    fixture_page_at(fixture_url())
}

pub fn fixture_page_at(url: Url) -> FixturePage {
    let mut doc = Document::new(url);
    let body = doc.body();

    let nav = doc.append_new(body, "nav");
    let lang_en = lang_link(&mut doc, nav, "English");
    let lang_zh = lang_link(&mut doc, nav, "中文");

    let search_container = doc.append_new(body, "div");
    doc.add_class(search_container, "search-container");
    let search_input = with_id(&mut doc, search_container, "input", "searchInput");
    let search_button = with_id(&mut doc, search_container, "button", "searchBtn");
    let search_results = with_id(&mut doc, search_container, "div", "searchResults");

    let list = doc.append_new(body, "ul");
    let posts = [
        ("Hello", Some("English")),
        ("你好", Some("Chinese")),
        ("Notion Sync", Some("English")),
        ("再见", Some("中文")),
        ("Untagged", None),
    ]
    .into_iter()
    .map(|(title, lang)| {
        let li = doc.append_new(list, "li");
        doc.add_class(li, "post-item");
        doc.set_text(li, title);
        if let Some(lang) = lang {
            doc.set_attribute(li, "data-language", lang);
        }
        li
    })
    .collect();

    let modal = with_id(&mut doc, body, "div", "subscribeModal");
    let form = with_id(&mut doc, modal, "form", "subscribeForm");
    let email_input = with_id(&mut doc, form, "input", "subscribeEmail");
    let submit_button = with_id(&mut doc, form, "button", "subscribeBtn");
    doc.set_text(submit_button, "Subscribe");
    let message = with_id(&mut doc, form, "div", "subscribeMessage");

    let fruits = with_id(&mut doc, body, "div", "fruits-container");
    let tooltip = with_id(&mut doc, body, "div", "tooltip");
    doc.element_mut(tooltip).size = Size::new(120.0, 30.0);

    FixturePage {
        doc,
        lang_en,
        lang_zh,
        search_container,
        search_input,
        search_button,
        search_results,
        posts,
        modal,
        form,
        email_input,
        submit_button,
        message,
        fruits,
        tooltip,
    }
}

fn lang_link(doc: &mut Document, parent: ElementId, lang: &str) -> ElementId {
    let a = doc.append_new(parent, "a");
    doc.add_class(a, "lang-link");
    doc.set_attribute(a, "href", "#");
    doc.set_attribute(a, "data-lang", lang);
    a
}

fn with_id(doc: &mut Document, parent: ElementId, tag: &str, id: &str) -> ElementId {
    let el = doc.append_new(parent, tag);
    doc.set_element_id(el, id);
    el
}

/// Text of every `.post-item` currently displayed, in document order.
pub fn visible_post_titles(doc: &Document) -> Vec<String> {
    doc.query_class("post-item")
        .into_iter()
        .filter(|p| doc.is_displayed(*p))
        .map(|p| doc.text(p).to_string())
        .collect()
}
