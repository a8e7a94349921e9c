//! The fruit tree: link markers hung on a background image.
//!
//! Each [`FruitLink`] becomes a marker positioned by percentage inside the
//! container, with a label underneath:
//!
//! ```text
//! div.fruit-container  (left: x%, top: y%)
//! ├── div#fruit1.fruit.fruit-1   ← hover: tooltip, click: open url
//! └── div.fruit-label            ← short name, or name
//! ```
//!
//! The link list is owned here. It can be changed at runtime only through
//! [`FruitTree::add_link`] and [`FruitTree::update_link`], and both keep any
//! mounted marker in sync. If the page has no container or tooltip element
//! the list still works; there is just nothing to draw.

use crate::animate::millis_rounded;
use crate::config::FruitConfig;
use crate::dom::{Document, Effect, ElementId, Point, Size};
use crate::scheduler::Timers;
use crate::types::{FruitLink, Position};
use rand::Rng;

const FRUIT_TEXTURE: &str = "radial-gradient(circle at 30% 30%, rgba(255, 255, 255, 0.4) 0%, transparent 40%), radial-gradient(circle at 70% 70%, rgba(0, 0, 0, 0.1) 0%, transparent 40%)";

const SWAY_KEYFRAMES: &str = "@keyframes sway {
    0% { transform: rotate(-3deg) translateY(0); }
    50% { transform: rotate(3deg) translateY(5px); }
    100% { transform: rotate(-3deg) translateY(0); }
}";

/// Marker color, selected by a link's `type` number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FruitStyle {
    #[default]
    Red = 1,
    Orange = 2,
    Yellow = 3,
    Green = 4,
    Blue = 5,
}

impl FruitStyle {
    /// Map a configured `type`. Anything outside 1..=5 is [`FruitStyle::Red`].
    pub fn from_type(kind: i64) -> Self {
        match kind {
            2 => FruitStyle::Orange,
            3 => FruitStyle::Yellow,
            4 => FruitStyle::Green,
            5 => FruitStyle::Blue,
            _ => FruitStyle::Red,
        }
    }

    pub fn number(self) -> i64 {
        self as i64
    }

    pub fn class_name(self) -> String {
        format!("fruit-{}", self.number())
    }
}

impl FruitLink {
    pub fn style(&self) -> FruitStyle {
        FruitStyle::from_type(self.kind)
    }
}

/// Arguments for [`FruitTree::add_link`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewFruit {
    pub name: String,
    pub url: String,
    pub position: Position,
    pub kind: Option<i64>,
    pub short_name: Option<String>,
}

impl NewFruit {
    pub fn new(name: &str, url: &str, x: f64, y: f64) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            position: Position { x, y },
            kind: None,
            short_name: None,
        }
    }

    pub fn kind(mut self, kind: i64) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn short_name(mut self, short_name: &str) -> Self {
        self.short_name = Some(short_name.to_string());
        self
    }
}

/// Where the tooltip goes for a pointer at `pointer`.
///
/// Default placement is just right of and above the pointer. Near the right
/// edge it flips to the left; near the top it drops below. The result is then
/// clamped so the whole tooltip stays inside the viewport.
pub fn tooltip_position(pointer: Point, tooltip: Size, viewport: Size, offset: f64) -> Point {
    let mut x = pointer.x + offset;
    let mut y = pointer.y - tooltip.height - offset;
    if x + tooltip.width > viewport.width {
        x = pointer.x - tooltip.width - offset;
    }
    if y < 0.0 {
        y = pointer.y + offset;
    }
    Point {
        x: x.clamp(0.0, (viewport.width - tooltip.width).max(0.0)),
        y: y.clamp(0.0, (viewport.height - tooltip.height).max(0.0)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FruitTask {
    /// Fade the tooltip in once it has been positioned.
    ShowTooltip,
}

#[derive(Debug, Clone)]
struct Marker {
    id: String,
    fruit: ElementId,
    label: ElementId,
}

#[derive(Debug)]
pub struct FruitTree {
    config: FruitConfig,
    links: Vec<FruitLink>,
    container: Option<ElementId>,
    tooltip: Option<ElementId>,
    markers: Vec<Marker>,
    swaying: bool,
    hovering: bool,
}

impl FruitTree {
    pub fn new(config: &FruitConfig) -> Self {
        Self {
            config: config.clone(),
            links: Vec::new(),
            container: None,
            tooltip: None,
            markers: Vec::new(),
            swaying: false,
            hovering: false,
        }
    }

    /// Find the container and tooltip. Returns `false` (after logging) if
    /// either is missing, in which case nothing is drawn.
    pub fn attach(&mut self, doc: &Document) -> bool {
        self.container = doc.get_element_by_id(&self.config.container_id);
        self.tooltip = doc.get_element_by_id(&self.config.tooltip_id);
        if self.container.is_none() || self.tooltip.is_none() {
            tracing::warn!(
                "Fruit tree elements not found (#{}, #{}); markers will not be drawn",
                self.config.container_id,
                self.config.tooltip_id
            );
            return false;
        }
        true
    }

    pub fn links(&self) -> &[FruitLink] {
        &self.links
    }

    pub fn link(&self, id: &str) -> Option<&FruitLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Replace the link list and draw a marker for each.
    pub fn render(&mut self, doc: &mut Document, links: Vec<FruitLink>) {
        if let Some(container) = self.container {
            doc.clear_children(container);
        }
        self.markers.clear();
        self.links = links;
        for index in 0..self.links.len() {
            self.mount(doc, index);
        }
        tracing::debug!("Rendered {} fruit markers", self.markers.len());
    }

    /// Start the idle sway on every marker. Only the first call does
    /// anything; returns whether this call started it.
    pub fn start_sway(&mut self, doc: &mut Document, rng: &mut impl Rng) -> bool {
        if self.swaying {
            return false;
        }
        self.swaying = true;
        for index in 0..self.markers.len() {
            self.sway(doc, rng, index);
        }
        doc.insert_rule(SWAY_KEYFRAMES);
        true
    }

    /// Append a new link and mount it fully wired. Returns its id.
    pub fn add_link(&mut self, doc: &mut Document, rng: &mut impl Rng, new: NewFruit) -> String {
        let id = self.next_id();
        let link = FruitLink {
            id: id.clone(),
            name: new.name,
            short_name: new.short_name,
            url: new.url,
            position: new.position,
            kind: FruitStyle::from_type(new.kind.unwrap_or(1)).number(),
        };
        tracing::info!("Added new fruit: {} ({})", link.name, link.url);
        self.links.push(link);
        if self.mount(doc, self.links.len() - 1) && self.swaying {
            self.sway(doc, rng, self.markers.len() - 1);
        }
        id
    }

    /// Rename and re-point a link. Returns `false` (and logs) for an unknown id.
    pub fn update_link(&mut self, doc: &mut Document, id: &str, name: &str, url: &str) -> bool {
        let Some(link) = self.links.iter_mut().find(|l| l.id == id) else {
            tracing::error!("Fruit with id {} not found", id);
            return false;
        };
        link.name = name.to_string();
        link.url = url.to_string();
        let label = link.label().to_string();

        if let Some(marker) = self.markers.iter().find(|m| m.id == id)
            && doc.is_connected(marker.fruit)
        {
            doc.set_attribute(marker.fruit, "title", name);
            doc.set_text(marker.label, &label);
        }
        tracing::info!("Updated fruit {} to: {} ({})", id, name, url);
        true
    }

    /// Label element of a mounted marker.
    pub fn label_element(&self, id: &str) -> Option<ElementId> {
        self.markers.iter().find(|m| m.id == id).map(|m| m.label)
    }

    /// Marker element of a mounted marker.
    pub fn marker_element(&self, id: &str) -> Option<ElementId> {
        self.markers.iter().find(|m| m.id == id).map(|m| m.fruit)
    }

    // ------------------------------------------------------------------
    // Pointer handling
    // ------------------------------------------------------------------

    fn link_at(&self, doc: &Document, target: ElementId) -> Option<&FruitLink> {
        let marker = self
            .markers
            .iter()
            .find(|m| doc.contains(m.fruit, target))?;
        self.link(&marker.id)
    }

    /// Pointer entered a marker: fill and place the tooltip, fade it in
    /// shortly after. Returns `false` if `target` is not a marker.
    pub fn on_pointer_over(
        &mut self,
        doc: &mut Document,
        timers: &mut impl Timers<FruitTask>,
        target: ElementId,
        at: Point,
    ) -> bool {
        let Some(tooltip) = self.tooltip else {
            return false;
        };
        let Some(name) = self.link_at(doc, target).map(|l| l.name.clone()) else {
            return false;
        };
        doc.set_text(tooltip, &name);
        self.place_tooltip(doc, tooltip, at);
        self.hovering = true;
        timers.set_timeout(5, FruitTask::ShowTooltip);
        true
    }

    pub fn on_pointer_move(&mut self, doc: &mut Document, target: ElementId, at: Point) -> bool {
        let Some(tooltip) = self.tooltip else {
            return false;
        };
        if self.link_at(doc, target).is_none() {
            return false;
        }
        self.place_tooltip(doc, tooltip, at);
        true
    }

    pub fn on_pointer_out(&mut self, doc: &mut Document, target: ElementId) -> bool {
        let Some(tooltip) = self.tooltip else {
            return false;
        };
        if self.link_at(doc, target).is_none() {
            return false;
        }
        self.hovering = false;
        doc.set_style(tooltip, "opacity", "0");
        doc.set_style(tooltip, "transform", "translateY(5px)");
        true
    }

    /// Open the marker's link in a new tab.
    pub fn on_click(&self, doc: &mut Document, target: ElementId) -> bool {
        let Some(url) = self.link_at(doc, target).map(|l| l.url.clone()) else {
            return false;
        };
        doc.push_effect(Effect::OpenWindow {
            url,
            target: "_blank".to_string(),
        });
        true
    }

    pub fn on_task(&mut self, doc: &mut Document, task: FruitTask) {
        match task {
            FruitTask::ShowTooltip => {
                if let Some(tooltip) = self.tooltip
                    && self.hovering
                {
                    doc.set_style(tooltip, "opacity", "1");
                    doc.set_style(tooltip, "transform", "translateY(0)");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// `fruit{n}` for the first unused n, starting after the current count.
    fn next_id(&self) -> String {
        let mut n = self.links.len() + 1;
        loop {
            let id = format!("fruit{n}");
            if self.link(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    fn place_tooltip(&self, doc: &mut Document, tooltip: ElementId, at: Point) {
        let size = doc.element(tooltip).size;
        let pos = tooltip_position(at, size, doc.viewport, self.config.tooltip_offset_px);
        doc.set_style(tooltip, "left", &format!("{}px", pos.x));
        doc.set_style(tooltip, "top", &format!("{}px", pos.y));
    }

    /// Draw the marker for `self.links[index]`. Returns `false` when there is
    /// no container.
    fn mount(&mut self, doc: &mut Document, index: usize) -> bool {
        let Some(container) = self.container else {
            return false;
        };
        let link = &self.links[index];

        let wrapper = doc.append_new(container, "div");
        doc.add_class(wrapper, "fruit-container");
        for (prop, value) in [
            ("position", "absolute".to_string()),
            ("left", format!("{}%", link.position.x)),
            ("top", format!("{}%", link.position.y)),
            ("display", "flex".to_string()),
            ("flex-direction", "column".to_string()),
            ("align-items", "center".to_string()),
            ("width", "80px".to_string()),
            ("transform", "translateX(-40px)".to_string()),
        ] {
            doc.set_style(wrapper, prop, &value);
        }

        let fruit = doc.append_new(wrapper, "div");
        doc.set_element_id(fruit, &link.id);
        doc.set_class_name(fruit, &format!("fruit {}", link.style().class_name()));
        doc.set_style(fruit, "background-image", FRUIT_TEXTURE);

        let label = doc.append_new(wrapper, "div");
        doc.add_class(label, "fruit-label");
        doc.set_text(label, link.label());
        for (prop, value) in [
            ("margin-top", "5px"),
            ("font-size", "12px"),
            ("font-weight", "bold"),
            ("text-align", "center"),
            ("color", "#333"),
            ("text-shadow", "0px 0px 3px white, 0px 0px 3px white, 0px 0px 3px white, 0px 0px 3px white"),
            ("pointer-events", "none"),
        ] {
            doc.set_style(label, prop, value);
        }

        self.markers.push(Marker {
            id: link.id.clone(),
            fruit,
            label,
        });
        true
    }

    fn sway(&self, doc: &mut Document, rng: &mut impl Rng, index: usize) {
        let marker = &self.markers[index];
        let jitter = if self.config.sway_jitter_secs > 0.0 {
            rng.gen_range(0.0..self.config.sway_jitter_secs)
        } else {
            0.0
        };
        let duration = millis_rounded(self.config.sway_min_secs + jitter);
        let delay = millis_rounded(index as f64 * self.config.sway_step_secs);
        doc.set_style(
            marker.fruit,
            "animation",
            &format!("sway {duration}s ease-in-out {delay}s infinite alternate"),
        );
    }
}
