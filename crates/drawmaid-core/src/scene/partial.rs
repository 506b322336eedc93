use super::{
    AppState, Binding, BoundElement, ElementKind, FillStyle, Point, Roundness, StrokeStyle,
    TextAlign, VerticalAlign,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Loosely-specified element as emitted by a generator.
///
/// Every field is optional. Reading from JSON never fails: a field that is missing, `null`, or of
/// the wrong shape is treated as absent and later defaulted by the normalizer. Presence is what
/// matters, so `0`, `false` and `""` all count as supplied values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialElement {
    pub id: Option<String>,
    pub kind: Option<ElementKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    pub stroke_color: Option<String>,
    pub background_color: Option<String>,
    pub fill_style: Option<FillStyle>,
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<StrokeStyle>,
    pub roughness: Option<f64>,
    pub opacity: Option<u8>,
    pub group_ids: Option<Vec<String>>,
    pub frame_id: Option<String>,
    pub roundness: Option<Roundness>,
    pub seed: Option<u32>,
    pub version: Option<u32>,
    pub version_nonce: Option<u32>,
    pub is_deleted: Option<bool>,
    pub bound_elements: Option<Vec<BoundElement>>,
    pub updated: Option<i64>,
    pub link: Option<String>,
    pub locked: Option<bool>,

    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<u32>,
    pub text_align: Option<TextAlign>,
    pub vertical_align: Option<VerticalAlign>,
    pub baseline: Option<f64>,
    pub container_id: Option<String>,
    pub original_text: Option<String>,
    pub line_height: Option<f64>,

    pub points: Option<Vec<Point>>,
    pub last_committed_point: Option<Point>,
    pub start_binding: Option<Binding>,
    pub end_binding: Option<Binding>,
    pub start_arrowhead: Option<String>,
    pub end_arrowhead: Option<String>,
}

/// Read-only view over a JSON object with shape-checked accessors.
struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0?.get(key).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str) -> Option<String> {
        self.get(key)?.as_str().map(str::to_string)
    }

    fn finite(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64().filter(|n| n.is_finite())
    }

    fn non_negative(&self, key: &str) -> Option<f64> {
        self.finite(key).filter(|n| *n >= 0.0)
    }

    fn positive(&self, key: &str) -> Option<f64> {
        self.finite(key).filter(|n| *n > 0.0)
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    /// Integer in `0..=max`. Fractional numbers are rejected rather than rounded.
    fn integer_up_to(&self, key: &str, max: u64) -> Option<u64> {
        let value = self.get(key)?;
        let n = value.as_u64().or_else(|| {
            let f = value.as_f64()?;
            (f.fract() == 0.0 && f >= 0.0).then_some(f as u64)
        })?;
        (n <= max).then_some(n)
    }

    fn timestamp(&self, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        value.as_i64().or_else(|| {
            let f = value.as_f64()?;
            (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
        })
    }

    fn decode<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.get(key)?.clone()).ok()
    }

    fn point(&self, key: &str) -> Option<Point> {
        point_from_value(self.get(key)?)
    }

    /// Keeps well-formed entries and drops the rest.
    fn list<T>(&self, key: &str, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
        let arr = self.get(key)?.as_array()?;
        Some(arr.iter().filter_map(item).collect())
    }
}

fn point_from_value(value: &Value) -> Option<Point> {
    let arr = value.as_array()?;
    if arr.len() != 2 {
        return None;
    }
    let x = arr[0].as_f64().filter(|n| n.is_finite())?;
    let y = arr[1].as_f64().filter(|n| n.is_finite())?;
    Some([x, y])
}

fn kind_from_value(value: &Value) -> Option<ElementKind> {
    let kind = value.as_str()?.trim();
    (!kind.is_empty()).then(|| ElementKind::from(kind))
}

impl PartialElement {
    /// Reads an element from arbitrary JSON. Non-object input yields an all-absent element.
    pub fn from_value(value: &Value) -> Self {
        let f = Fields(value.as_object());
        Self {
            id: f.string("id"),
            kind: f.get("type").and_then(kind_from_value),
            x: f.finite("x"),
            y: f.finite("y"),
            width: f.non_negative("width"),
            height: f.non_negative("height"),
            angle: f.finite("angle"),
            stroke_color: f.string("strokeColor"),
            background_color: f.string("backgroundColor"),
            fill_style: f.decode("fillStyle"),
            stroke_width: f.non_negative("strokeWidth"),
            stroke_style: f.decode("strokeStyle"),
            roughness: f.non_negative("roughness"),
            opacity: f.integer_up_to("opacity", 100).map(|n| n as u8),
            group_ids: f.list("groupIds", |v| v.as_str().map(str::to_string)),
            frame_id: f.string("frameId"),
            roundness: f.decode("roundness"),
            seed: f.integer_up_to("seed", u32::MAX as u64).map(|n| n as u32),
            version: f
                .integer_up_to("version", u32::MAX as u64)
                .filter(|n| *n >= 1)
                .map(|n| n as u32),
            version_nonce: f
                .integer_up_to("versionNonce", u32::MAX as u64)
                .map(|n| n as u32),
            is_deleted: f.boolean("isDeleted"),
            bound_elements: f.list("boundElements", |v| {
                serde_json::from_value(v.clone()).ok()
            }),
            updated: f.timestamp("updated"),
            link: f.string("link"),
            locked: f.boolean("locked"),

            text: f.string("text"),
            font_size: f.positive("fontSize"),
            font_family: f
                .integer_up_to("fontFamily", u32::MAX as u64)
                .map(|n| n as u32),
            text_align: f.decode("textAlign"),
            vertical_align: f.decode("verticalAlign"),
            baseline: f.finite("baseline"),
            container_id: f.string("containerId"),
            original_text: f.string("originalText"),
            line_height: f.positive("lineHeight"),

            points: f.list("points", point_from_value),
            last_committed_point: f.point("lastCommittedPoint"),
            start_binding: f.decode("startBinding"),
            end_binding: f.decode("endBinding"),
            start_arrowhead: f.string("startArrowhead"),
            end_arrowhead: f.string("endArrowhead"),
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<&Value> for PartialElement {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

/// Loosely-specified scene envelope (`{ elements, appState, files }`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialScene {
    pub elements: Option<Vec<PartialElement>>,
    pub app_state: Option<AppState>,
    pub files: Option<Map<String, Value>>,
}

impl PartialScene {
    /// Reads a scene from arbitrary JSON. A bare array is taken as the element list.
    pub fn from_value(value: &Value) -> Self {
        if let Some(arr) = value.as_array() {
            return Self {
                elements: Some(arr.iter().map(PartialElement::from_value).collect()),
                ..Self::default()
            };
        }

        let f = Fields(value.as_object());
        Self {
            elements: f.list("elements", |v| Some(PartialElement::from_value(v))),
            app_state: f.get("appState").and_then(AppState::from_value),
            files: f.get("files").and_then(Value::as_object).cloned(),
        }
    }
}
