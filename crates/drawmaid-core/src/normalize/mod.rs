//! Schema completion: partial elements in, renderer-ready elements out.
//!
//! Defaulting is presence-based. A supplied `0`, `false` or `""` survives; only absent values
//! (including `null` and wrongly-shaped JSON) are replaced from the [`DefaultTable`].

pub mod defaults;

use crate::capability::{Clock, RandomSource, SystemClock, ThreadRandom};
use crate::scene::{
    DiagramElement, ElementBase, ElementExtension, ElementKind, LinearFields, PartialElement,
    PartialScene, Roundness, SceneDocument, TextFields,
};
use defaults::{DefaultTable, ExtensionRule};
use serde_json::Value;
use std::collections::HashSet;

/// Completes partial elements and scenes.
///
/// The clock and random source are injected; [`Normalizer::new`] wires the system clock and the
/// thread RNG.
#[derive(Debug, Clone)]
pub struct Normalizer<C = SystemClock, R = ThreadRandom> {
    table: DefaultTable,
    clock: C,
    random: R,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_table(DefaultTable::default())
    }

    pub fn with_table(table: DefaultTable) -> Self {
        Self::with_capabilities(table, SystemClock, ThreadRandom)
    }
}

impl<C: Clock, R: RandomSource> Normalizer<C, R> {
    pub fn with_capabilities(table: DefaultTable, clock: C, random: R) -> Self {
        Self {
            table,
            clock,
            random,
        }
    }

    pub fn table(&self) -> &DefaultTable {
        &self.table
    }

    /// Completes every element. Output has the same length and order as `elements`, and ids are
    /// pairwise distinct.
    pub fn normalize_elements(&mut self, elements: &[PartialElement]) -> Vec<DiagramElement> {
        let reserved: HashSet<&str> = elements.iter().filter_map(|e| e.id.as_deref()).collect();
        let mut ids = IdAllocator {
            reserved,
            emitted: HashSet::with_capacity(elements.len()),
        };

        let out: Vec<DiagramElement> = elements
            .iter()
            .map(|element| {
                let id = ids.claim(element.id.as_deref(), &mut self.random);
                self.complete(element, id)
            })
            .collect();
        tracing::debug!(count = out.len(), "normalized elements");
        out
    }

    /// Convenience over [`Normalizer::normalize_elements`] for raw JSON element lists.
    pub fn normalize_values(&mut self, values: &[Value]) -> Vec<DiagramElement> {
        let partial: Vec<PartialElement> = values.iter().map(PartialElement::from_value).collect();
        self.normalize_elements(&partial)
    }

    /// Completes a scene envelope. `None` yields an empty scene with the default `appState`.
    pub fn normalize_scene(&mut self, scene: Option<&PartialScene>) -> SceneDocument {
        let Some(scene) = scene else {
            return SceneDocument {
                elements: Vec::new(),
                app_state: self.table.default_app_state(),
                files: None,
            };
        };

        let elements = match scene.elements.as_deref() {
            Some(elements) => self.normalize_elements(elements),
            None => Vec::new(),
        };
        let app_state = scene
            .app_state
            .clone()
            .unwrap_or_else(|| self.table.default_app_state());
        SceneDocument {
            elements,
            app_state,
            files: scene.files.clone(),
        }
    }

    fn complete(&mut self, element: &PartialElement, id: String) -> DiagramElement {
        let kind = effective_kind(element);
        let rule = kind.rule();
        let d = &self.table.element;

        let width = element.width.unwrap_or(d.width);
        let height = element.height.unwrap_or(d.height);
        let roundness = element
            .roundness
            .clone()
            .or_else(|| rule.roundness.map(|kind| Roundness { kind, value: None }));

        let base = ElementBase {
            id,
            x: element.x.unwrap_or(d.x),
            y: element.y.unwrap_or(d.y),
            width,
            height,
            angle: element.angle.unwrap_or(d.angle),
            stroke_color: element
                .stroke_color
                .clone()
                .unwrap_or_else(|| d.stroke_color.clone()),
            background_color: element
                .background_color
                .clone()
                .unwrap_or_else(|| d.background_color.clone()),
            fill_style: element.fill_style.unwrap_or(d.fill_style),
            stroke_width: element.stroke_width.unwrap_or(d.stroke_width),
            stroke_style: element.stroke_style.unwrap_or(d.stroke_style),
            roughness: element.roughness.unwrap_or(d.roughness),
            opacity: element.opacity.unwrap_or(d.opacity),
            group_ids: element.group_ids.clone().unwrap_or_default(),
            frame_id: element.frame_id.clone(),
            roundness,
            seed: element.seed.unwrap_or_else(|| self.random.next_seed()),
            version: element.version.unwrap_or(d.version),
            version_nonce: element
                .version_nonce
                .unwrap_or_else(|| self.random.next_seed()),
            is_deleted: element.is_deleted.unwrap_or(false),
            bound_elements: element.bound_elements.clone(),
            updated: element
                .updated
                .unwrap_or_else(|| self.clock.now_millis()),
            link: element.link.clone(),
            locked: element.locked.unwrap_or(false),
        };

        let extension = match rule.extension {
            ExtensionRule::None => ElementExtension::Shape {},
            ExtensionRule::Text => ElementExtension::Text(self.text_fields(element)),
            ExtensionRule::Linear { end_arrowhead } => ElementExtension::Linear(LinearFields {
                points: match &element.points {
                    Some(points) if points.len() >= 2 => points.clone(),
                    _ => vec![[0.0, 0.0], [width, height]],
                },
                last_committed_point: element.last_committed_point,
                start_binding: element.start_binding.clone(),
                end_binding: element.end_binding.clone(),
                start_arrowhead: element.start_arrowhead.clone(),
                end_arrowhead: element
                    .end_arrowhead
                    .clone()
                    .or_else(|| end_arrowhead.map(str::to_string)),
            }),
        };

        DiagramElement {
            kind,
            base,
            extension,
        }
    }

    fn text_fields(&self, element: &PartialElement) -> TextFields {
        let t = &self.table.text;
        let text = element.text.clone().unwrap_or_default();
        let font_size = element.font_size.unwrap_or(t.font_size);
        if !text.is_empty() {
            tracing::debug!(text = %text, font_size, "text element");
        }
        TextFields {
            original_text: element.original_text.clone().unwrap_or_else(|| text.clone()),
            text,
            font_size,
            font_family: element.font_family.unwrap_or(t.font_family),
            text_align: element.text_align.unwrap_or(t.text_align),
            vertical_align: element.vertical_align.unwrap_or(t.vertical_align),
            baseline: element.baseline.unwrap_or(font_size),
            container_id: element.container_id.clone(),
            line_height: element.line_height.unwrap_or(t.line_height),
        }
    }
}

/// Explicit `type` wins; otherwise a present `text` field means `text`, and anything else is a
/// rectangle.
pub fn effective_kind(element: &PartialElement) -> ElementKind {
    match (&element.kind, &element.text) {
        (Some(kind), _) => kind.clone(),
        (None, Some(_)) => ElementKind::Text,
        (None, None) => ElementKind::Rectangle,
    }
}

struct IdAllocator<'a> {
    /// Every id supplied anywhere in the batch.
    reserved: HashSet<&'a str>,
    /// Ids already handed out in this batch.
    emitted: HashSet<String>,
}

impl IdAllocator<'_> {
    fn claim(&mut self, requested: Option<&str>, random: &mut impl RandomSource) -> String {
        match requested {
            Some(id) if !id.is_empty() && !self.emitted.contains(id) => {
                self.emitted.insert(id.to_string());
                id.to_string()
            }
            Some(id) => {
                if !id.is_empty() {
                    tracing::warn!(id, "duplicate element id replaced");
                }
                self.fresh(random)
            }
            None => self.fresh(random),
        }
    }

    fn fresh(&mut self, random: &mut impl RandomSource) -> String {
        loop {
            let mut bytes = [0u8; 16];
            random.fill_bytes(&mut bytes);
            let id = uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .simple()
                .to_string();
            if !self.reserved.contains(id.as_str()) && !self.emitted.contains(&id) {
                self.emitted.insert(id.clone());
                return id;
            }
        }
    }
}

/// Normalizes with the built-in table, system clock and thread RNG.
pub fn normalize_elements(elements: &[PartialElement]) -> Vec<DiagramElement> {
    Normalizer::new().normalize_elements(elements)
}

/// Normalizes a scene with the built-in table, system clock and thread RNG.
pub fn normalize_scene(scene: Option<&PartialScene>) -> SceneDocument {
    Normalizer::new().normalize_scene(scene)
}
