use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;

fn cli() -> Command {
    Command::new(assert_cmd::cargo_bin!("drawmaid-cli"))
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn sanitize_reads_stdin_and_strips_the_fence() {
    let assert = cli()
        .arg("sanitize")
        .write_stdin("```mermaid\ngraph TD\nA[Hello (world)] -->|a: b| B\n```\n")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout, "graph TD\nA[\"Hello (world)\"] -->|\"a: b\"| B\n");
}

#[test]
fn extract_reads_a_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("response.md");
    fs::write(&path, "```\nflowchart LR\nX-->Y\n```").expect("write input");

    let assert = cli()
        .args(["extract", path.to_string_lossy().as_ref()])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout, "flowchart LR\nX-->Y\n");
}

#[test]
fn seeded_normalize_is_reproducible() {
    let input = r#"{ "elements": [{ "text": "Hi" }, { "type": "arrow" }] }"#;
    let run = || {
        let assert = cli()
            .args(["normalize", "--seed", "7", "--now", "1700000000000"])
            .write_stdin(input)
            .assert()
            .success();
        stdout_json(assert.get_output())
    };
    let first = run();
    assert_eq!(first, run());

    let elements = first["elements"].as_array().unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0]["type"], json!("text"));
    assert_eq!(elements[0]["fontSize"], json!(20.0));
    assert_eq!(elements[1]["endArrowhead"], json!("arrow"));
    assert_eq!(elements[1]["updated"], json!(1_700_000_000_000_i64));
    assert_eq!(first["appState"]["viewBackgroundColor"], json!("#ffffff"));
}

#[test]
fn normalize_applies_a_json5_config() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("drawmaid.json5");
    fs::write(
        &config,
        "{\n  // house style\n  element: { strokeColor: '#ff0000' },\n  appState: { viewBackgroundColor: '#000000' },\n}\n",
    )
    .expect("write config");

    let assert = cli()
        .args(["normalize", "--config", config.to_string_lossy().as_ref()])
        .write_stdin("[{}]")
        .assert()
        .success();
    let out = stdout_json(assert.get_output());
    assert_eq!(out["elements"][0]["strokeColor"], json!("#ff0000"));
    assert_eq!(out["appState"]["viewBackgroundColor"], json!("#000000"));
}

#[test]
fn normalize_without_input_yields_an_empty_scene() {
    let assert = cli().arg("normalize").write_stdin("").assert().success();
    let out = stdout_json(assert.get_output());
    assert_eq!(out["elements"], json!([]));
    assert_eq!(out["appState"]["currentItemEndArrowhead"], json!("arrow"));
}

#[test]
fn malformed_json_fails() {
    cli()
        .arg("normalize")
        .write_stdin("{ elements: ")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn usage_errors_exit_with_code_2() {
    cli().arg("--bogus").assert().failure().code(2);
    cli().arg("generate").assert().failure().code(2);
    cli()
        .args(["generate", "--prompt", "x", "--format", "svg"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn generate_normalizes_an_excalidraw_response() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let endpoint = format!("http://{}/webhook/generate-diagram", listener.local_addr().unwrap());
    let server = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header");
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().expect("content-length");
                }
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("read body");

        let payload = json!([{
            "format": "excalidraw",
            "update": "Added a box",
            "data": { "elements": [{ "type": "rectangle", "id": "box" }] }
        }])
        .to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("write response");
        serde_json::from_slice::<Value>(&body).expect("request JSON")
    });

    let assert = cli()
        .args([
            "generate",
            "--prompt",
            "one box",
            "--format",
            "excalidraw",
            "--endpoint",
            endpoint.as_str(),
        ])
        .assert()
        .success();
    let out = stdout_json(assert.get_output());
    assert_eq!(out["format"], json!("excalidraw"));
    assert_eq!(out["update"], json!("Added a box"));
    assert_eq!(out["data"]["elements"][0]["id"], json!("box"));
    assert_eq!(out["data"]["elements"][0]["roundness"], json!({ "type": 3 }));

    let sent = server.join().unwrap();
    assert_eq!(sent["prompt"], json!("one box"));
    assert_eq!(sent["outputFormat"], json!("excalidraw"));
    assert_eq!(sent["currentScene"], Value::Null);
}
