use crate::normalize::defaults::DefaultTable;
use crate::{
    Converter, DiagramResponse, ElementKind, Error, FixedClock, Normalizer, OutputFormat,
    ParserError, ParserOptions, SceneConfig, SceneFragment, SeededRandom, scene_from_response,
    select_response,
};
use futures::executor::block_on;
use serde_json::{Value, json};
use std::cell::RefCell;

type ParseResult = Result<SceneFragment, ParserError>;

fn normalizer() -> Normalizer<FixedClock, SeededRandom> {
    Normalizer::with_capabilities(DefaultTable::default(), FixedClock(0), SeededRandom::new(7))
}

fn two_node_parser(_: &str, _: &ParserOptions) -> ParseResult {
    Ok(SceneFragment {
        elements: vec![
            json!({ "type": "rectangle", "id": "a", "x": 0, "y": 0 }),
            json!({ "type": "arrow", "id": "e", "points": [[0, 0], [0, 80]] }),
            json!({ "type": "text", "id": "t", "text": "Start" }),
        ],
        files: None,
    })
}

#[test]
fn parser_sees_extracted_and_sanitized_syntax() {
    let seen = RefCell::new(None);
    let converter = Converter::new(|syntax: &str, opts: &ParserOptions| -> ParseResult {
        *seen.borrow_mut() = Some((syntax.to_string(), opts.font_size));
        Ok(SceneFragment::default())
    });

    converter
        .convert_sync("```mermaid\ngraph TD\nA[Hello (world)] -->|a: b| B\n```")
        .unwrap();

    let (syntax, font_size) = seen.borrow_mut().take().unwrap();
    assert_eq!(syntax, "graph TD\nA[\"Hello (world)\"] -->|\"a: b\"| B");
    assert_eq!(font_size, 20);
}

#[test]
fn configured_font_size_reaches_the_parser() {
    let seen = RefCell::new(0);
    let options = ParserOptions::from_config(&SceneConfig::from_value(json!({
        "parser": { "fontSize": 14 }
    })));
    let converter = Converter::new(|_: &str, opts: &ParserOptions| -> ParseResult {
        *seen.borrow_mut() = opts.font_size;
        Ok(SceneFragment::default())
    })
    .with_options(options);

    converter.convert_sync("graph TD").unwrap();
    assert_eq!(*seen.borrow(), 14);
}

#[test]
fn parser_options_ignore_bad_config() {
    let zero = SceneConfig::from_value(json!({ "parser": { "fontSize": 0 } }));
    let text = SceneConfig::from_value(json!({ "parser": { "fontSize": "big" } }));
    assert_eq!(ParserOptions::from_config(&zero).font_size, 20);
    assert_eq!(ParserOptions::from_config(&text).font_size, 20);
}

#[test]
fn parser_output_is_returned_unchanged() {
    let converter = Converter::new(two_node_parser);
    let fragment = converter.convert_sync("graph TD\nA-->B").unwrap();
    assert_eq!(fragment, two_node_parser("", &ParserOptions::default()).unwrap());
}

#[test]
fn parser_failures_are_wrapped() {
    let converter = Converter::new(|_: &str, _: &ParserOptions| -> ParseResult {
        Err("Parse error on line 2".into())
    });
    let err = converter.convert_sync("graph TD\nA-->").unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));
    assert_eq!(
        err.to_string(),
        "Failed to convert Mermaid diagram: Parse error on line 2"
    );
}

#[test]
fn async_convert_matches_sync() {
    let converter = Converter::new(two_node_parser);
    let sync = converter.convert_sync("graph TD").unwrap();
    let async_ = block_on(converter.convert("graph TD")).unwrap();
    assert_eq!(sync, async_);
}

#[test]
fn mermaid_response_becomes_a_normalized_scene() {
    let converter = Converter::new(two_node_parser);
    let response = DiagramResponse {
        format: OutputFormat::Mermaid,
        update: Value::Null,
        data: json!("```mermaid\ngraph TD\nA-->B\n```"),
    };
    let scene = scene_from_response(&converter, &mut normalizer(), &response).unwrap();

    assert_eq!(scene.elements.len(), 3);
    assert_eq!(scene.elements[0].id(), "a");
    assert_eq!(scene.elements[1].kind, ElementKind::Arrow);
    assert_eq!(
        scene.elements[1].linear().unwrap().end_arrowhead.as_deref(),
        Some("arrow")
    );
    assert_eq!(scene.elements[2].text().unwrap().font_size, 20.0);
    assert_eq!(scene.app_state, DefaultTable::default().default_app_state());
    assert_eq!(scene.files, None);
}

#[test]
fn mermaid_response_keeps_parser_files() {
    let converter = Converter::new(|_: &str, _: &ParserOptions| -> ParseResult {
        let mut files = serde_json::Map::new();
        files.insert("img".to_string(), json!({ "mimeType": "image/svg+xml" }));
        Ok(SceneFragment {
            elements: Vec::new(),
            files: Some(files),
        })
    });
    let response = DiagramResponse {
        format: OutputFormat::Mermaid,
        update: Value::Null,
        data: json!("graph TD"),
    };
    let scene = scene_from_response(&converter, &mut normalizer(), &response).unwrap();
    let files = scene.files.unwrap();
    assert_eq!(files["img"]["mimeType"], json!("image/svg+xml"));
}

#[test]
fn mermaid_response_with_non_string_data_is_rejected() {
    let converter = Converter::new(two_node_parser);
    let response = DiagramResponse {
        format: OutputFormat::Mermaid,
        update: Value::Null,
        data: json!({ "elements": [] }),
    };
    let err = scene_from_response(&converter, &mut normalizer(), &response).unwrap_err();
    assert!(matches!(err, Error::InvalidResponse { .. }));
}

#[test]
fn excalidraw_response_is_normalized_directly() {
    let converter = Converter::new(two_node_parser);
    let response = DiagramResponse {
        format: OutputFormat::Excalidraw,
        update: Value::Null,
        data: json!({
            "elements": [{ "text": "Hi" }, { "type": "ellipse" }],
            "appState": { "viewBackgroundColor": "#222222" }
        }),
    };
    let scene = scene_from_response(&converter, &mut normalizer(), &response).unwrap();
    assert_eq!(scene.elements.len(), 2);
    assert_eq!(scene.elements[0].kind, ElementKind::Text);
    assert_eq!(scene.app_state.view_background_color(), Some("#222222"));
}

#[test]
fn excalidraw_response_accepts_json_text_and_bare_arrays() {
    let converter = Converter::new(two_node_parser);
    let as_text = DiagramResponse {
        format: OutputFormat::Excalidraw,
        update: Value::Null,
        data: json!(r#"{ "elements": [{ "type": "diamond" }] }"#),
    };
    let as_array = DiagramResponse {
        format: OutputFormat::Excalidraw,
        update: Value::Null,
        data: json!([{ "type": "diamond" }]),
    };
    for response in [as_text, as_array] {
        let scene = scene_from_response(&converter, &mut normalizer(), &response).unwrap();
        assert_eq!(scene.elements.len(), 1);
        assert_eq!(scene.elements[0].kind, ElementKind::Diamond);
    }

    let broken = DiagramResponse {
        format: OutputFormat::Excalidraw,
        update: Value::Null,
        data: json!("{ not json"),
    };
    assert!(matches!(
        scene_from_response(&converter, &mut normalizer(), &broken),
        Err(Error::InvalidResponse { .. })
    ));
}

#[test]
fn excalidraw_response_without_data_is_an_empty_scene() {
    let converter = Converter::new(two_node_parser);
    let response = DiagramResponse {
        format: OutputFormat::Excalidraw,
        update: Value::Null,
        data: Value::Null,
    };
    let scene = scene_from_response(&converter, &mut normalizer(), &response).unwrap();
    assert!(scene.elements.is_empty());
    assert_eq!(scene.app_state, DefaultTable::default().default_app_state());
}

#[test]
fn select_response_takes_the_first_array_entry() {
    let response = select_response(json!([
        { "format": "mermaid", "update": "Added a node", "data": "graph TD" },
        { "format": "excalidraw", "data": null }
    ]))
    .unwrap();
    assert_eq!(response.format, OutputFormat::Mermaid);
    assert_eq!(response.update, json!("Added a node"));
    assert_eq!(response.data, json!("graph TD"));
}

#[test]
fn select_response_accepts_a_bare_object() {
    let response = select_response(json!({ "format": "excalidraw" })).unwrap();
    assert_eq!(response.format, OutputFormat::Excalidraw);
    assert_eq!(response.data, Value::Null);
}

#[test]
fn select_response_rejects_empty_and_malformed_payloads() {
    assert!(matches!(select_response(json!([])), Err(Error::EmptyResponse)));
    assert!(matches!(
        select_response(json!({ "format": "svg", "data": "" })),
        Err(Error::InvalidResponse { .. })
    ));
    assert!(matches!(
        select_response(json!("graph TD")),
        Err(Error::InvalidResponse { .. })
    ));
}
