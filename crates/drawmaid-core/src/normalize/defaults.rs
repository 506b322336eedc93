use crate::config::SceneConfig;
use crate::scene::{
    AppState, ElementKind, FillStyle, Roundness, StrokeStyle, TextAlign, VerticalAlign,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Base-record defaults shared by every kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDefaults {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: FillStyle,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub roughness: f64,
    pub opacity: u8,
    pub version: u32,
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            angle: 0.0,
            stroke_color: "#1e1e1e".to_string(),
            background_color: "transparent".to_string(),
            fill_style: FillStyle::Solid,
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            roughness: 1.0,
            opacity: 100,
            version: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextDefaults {
    pub font_size: f64,
    pub font_family: u32,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub line_height: f64,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            font_family: 1,
            text_align: TextAlign::Center,
            vertical_align: VerticalAlign::Middle,
            line_height: 1.25,
        }
    }
}

/// Fields of the fallback `appState` that do not mirror an element default.
#[derive(Debug, Clone, PartialEq)]
pub struct AppStateDefaults {
    pub view_background_color: String,
    pub text_align: TextAlign,
}

impl Default for AppStateDefaults {
    fn default() -> Self {
        Self {
            view_background_color: "#ffffff".to_string(),
            text_align: TextAlign::Left,
        }
    }
}

/// Which kind-specific record an element carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionRule {
    None,
    Text,
    Linear { end_arrowhead: Option<&'static str> },
}

/// Per-kind defaulting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRule {
    pub roundness: Option<u32>,
    pub extension: ExtensionRule,
}

impl ElementKind {
    pub fn rule(&self) -> KindRule {
        match self {
            ElementKind::Rectangle => KindRule {
                roundness: Some(Roundness::ADAPTIVE_RADIUS),
                extension: ExtensionRule::None,
            },
            ElementKind::Text => KindRule {
                roundness: None,
                extension: ExtensionRule::Text,
            },
            ElementKind::Arrow => KindRule {
                roundness: None,
                extension: ExtensionRule::Linear {
                    end_arrowhead: Some("arrow"),
                },
            },
            ElementKind::Line => KindRule {
                roundness: None,
                extension: ExtensionRule::Linear {
                    end_arrowhead: None,
                },
            },
            ElementKind::Ellipse | ElementKind::Diamond | ElementKind::Other(_) => KindRule {
                roundness: None,
                extension: ExtensionRule::None,
            },
        }
    }
}

/// The complete defaulting table consulted by the normalizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultTable {
    pub element: ElementDefaults,
    pub text: TextDefaults,
    pub app_state: AppStateDefaults,
}

/// Replaces `slot` with the value at `path` when it decodes and passes `accept`.
fn override_from<T: DeserializeOwned>(
    config: &SceneConfig,
    path: &str,
    slot: &mut T,
    accept: impl Fn(&T) -> bool,
) {
    let Some(value) = config.lookup(path) else {
        return;
    };
    match serde_json::from_value::<T>(value.clone()) {
        Ok(v) if accept(&v) => *slot = v,
        Ok(_) => tracing::warn!(path, %value, "ignoring out-of-range config override"),
        Err(err) => tracing::warn!(path, %err, "ignoring malformed config override"),
    }
}

fn any<T>(_: &T) -> bool {
    true
}

fn non_negative(n: &f64) -> bool {
    n.is_finite() && *n >= 0.0
}

fn positive(n: &f64) -> bool {
    n.is_finite() && *n > 0.0
}

impl DefaultTable {
    /// Applies `element.*`, `text.*` and `appState.*` overrides on top of the built-in table.
    ///
    /// Overrides are held to the same ranges as element fields: sizes, stroke width and roughness
    /// non-negative, opacity `0..=100`, font size and line height positive.
    pub fn from_config(config: &SceneConfig) -> Self {
        let mut table = Self::default();
        let el = &mut table.element;
        override_from(config, "element.width", &mut el.width, non_negative);
        override_from(config, "element.height", &mut el.height, non_negative);
        override_from(config, "element.strokeColor", &mut el.stroke_color, any);
        override_from(config, "element.backgroundColor", &mut el.background_color, any);
        override_from(config, "element.fillStyle", &mut el.fill_style, any);
        override_from(config, "element.strokeWidth", &mut el.stroke_width, non_negative);
        override_from(config, "element.strokeStyle", &mut el.stroke_style, any);
        override_from(config, "element.roughness", &mut el.roughness, non_negative);
        override_from(config, "element.opacity", &mut el.opacity, |o| *o <= 100);

        let text = &mut table.text;
        override_from(config, "text.fontSize", &mut text.font_size, positive);
        override_from(config, "text.fontFamily", &mut text.font_family, any);
        override_from(config, "text.textAlign", &mut text.text_align, any);
        override_from(config, "text.verticalAlign", &mut text.vertical_align, any);
        override_from(config, "text.lineHeight", &mut text.line_height, positive);

        let app = &mut table.app_state;
        override_from(
            config,
            "appState.viewBackgroundColor",
            &mut app.view_background_color,
            any,
        );
        override_from(config, "appState.textAlign", &mut app.text_align, any);
        table
    }

    /// The fixed `appState` used when a scene brings none. Mirrors the element defaults so newly
    /// drawn elements match generated ones.
    pub fn default_app_state(&self) -> AppState {
        let el = &self.element;
        let value = json!({
            "viewBackgroundColor": self.app_state.view_background_color,
            "currentItemStrokeColor": el.stroke_color,
            "currentItemBackgroundColor": el.background_color,
            "currentItemFillStyle": el.fill_style,
            "currentItemStrokeWidth": el.stroke_width,
            "currentItemStrokeStyle": el.stroke_style,
            "currentItemRoughness": el.roughness,
            "currentItemOpacity": el.opacity,
            "currentItemFontFamily": self.text.font_family,
            "currentItemFontSize": self.text.font_size,
            "currentItemTextAlign": self.app_state.text_align,
            "currentItemStartArrowhead": Value::Null,
            "currentItemEndArrowhead": "arrow",
        });
        match value {
            Value::Object(map) => AppState(map),
            _ => AppState(Map::new()),
        }
    }
}
