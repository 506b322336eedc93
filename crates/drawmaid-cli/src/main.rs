use drawmaid::client::{ClientError, DEFAULT_ENDPOINT, GenerationClient};
use drawmaid::{
    Clock, DefaultTable, DiagramRequest, FixedClock, Normalizer, OutputFormat, PartialScene,
    RandomSource, SceneConfig, SeededRandom, SystemClock, ThreadRandom, extract, sanitize,
};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DRAWMAID_LOG";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    Client(ClientError),
    Drawmaid(drawmaid::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Config(msg) => write!(f, "config error: {msg}"),
            CliError::Client(err) => write!(f, "{err}"),
            CliError::Drawmaid(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ClientError> for CliError {
    fn from(value: ClientError) -> Self {
        Self::Client(value)
    }
}

impl From<drawmaid::Error> for CliError {
    fn from(value: drawmaid::Error) -> Self {
        Self::Drawmaid(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Sanitize,
    Extract,
    Normalize,
    Generate,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    seed: Option<u64>,
    now: Option<i64>,
    config: Option<String>,
    prompt: Option<String>,
    format: Option<OutputFormat>,
    endpoint: Option<String>,
    scene: Option<String>,
}

#[derive(Serialize)]
struct GenerateOut<'a> {
    format: OutputFormat,
    update: &'a Value,
    data: Value,
}

fn usage() -> &'static str {
    "drawmaid-cli\n\
\n\
USAGE:\n\
  drawmaid-cli [sanitize] [<path>|-]\n\
  drawmaid-cli extract [<path>|-]\n\
  drawmaid-cli normalize [--pretty] [--seed <n>] [--now <millis>] [--config <path>] [<path>|-]\n\
  drawmaid-cli generate --prompt <text> [--format mermaid|excalidraw] [--endpoint <url>] [--scene <path>] [--pretty] [--seed <n>] [--now <millis>] [--config <path>]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - sanitize strips a surrounding code fence before quoting labels.\n\
  - normalize accepts a scene object, a bare element array, or null.\n\
  - generate prints {format, update, data}: sanitized Mermaid text or a normalized scene.\n\
  - --config reads a JSON5 file with element/text/appState/parser overrides.\n\
  - Set DRAWMAID_LOG (e.g. DRAWMAID_LOG=debug) to log to stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "sanitize" => args.command = Command::Sanitize,
            "extract" => args.command = Command::Extract,
            "normalize" => args.command = Command::Normalize,
            "generate" => args.command = Command::Generate,
            "--pretty" => args.pretty = true,
            "--seed" => {
                let seed = next_value(&mut it)?;
                args.seed = Some(seed.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--now" => {
                let now = next_value(&mut it)?;
                args.now = Some(now.parse::<i64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--prompt" => args.prompt = Some(next_value(&mut it)?.clone()),
            "--format" => {
                let fmt = next_value(&mut it)?;
                args.format = Some(
                    fmt.parse::<OutputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--endpoint" => args.endpoint = Some(next_value(&mut it)?.clone()),
            "--scene" => args.scene = Some(next_value(&mut it)?.clone()),
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if matches!(args.command, Command::Generate) && (args.prompt.is_none() || args.input.is_some())
    {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<SceneConfig, CliError> {
    let Some(path) = path else {
        return Ok(SceneConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let value: Value =
        json5::from_str(&text).map_err(|e| CliError::Config(format!("{path}: {e}")))?;
    if !value.is_object() {
        return Err(CliError::Config(format!("{path}: expected an object")));
    }
    Ok(SceneConfig::from_value(value))
}

fn parse_json_input(text: &str) -> Result<Value, CliError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

/// Runs `f` with a normalizer wired to the requested clock and random source.
fn with_normalizer<T>(
    args: &Args,
    config: &SceneConfig,
    f: impl FnOnce(&mut Normalizer<&dyn Clock, &mut dyn RandomSource>) -> T,
) -> T {
    let clock: Box<dyn Clock> = match args.now {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    };
    let mut random: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };
    let mut normalizer: Normalizer<&dyn Clock, &mut dyn RandomSource> =
        Normalizer::with_capabilities(DefaultTable::from_config(config), &*clock, &mut *random);
    f(&mut normalizer)
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Extract => {
            let text = read_input(args.input.as_deref())?;
            println!("{}", extract(&text));
        }
        Command::Sanitize => {
            let text = read_input(args.input.as_deref())?;
            println!("{}", sanitize(&extract(&text)));
        }
        Command::Normalize => {
            let config = load_config(args.config.as_deref())?;
            let value = parse_json_input(&read_input(args.input.as_deref())?)?;
            let scene = with_normalizer(&args, &config, |normalizer| {
                if value.is_null() {
                    normalizer.normalize_scene(None)
                } else {
                    normalizer.normalize_scene(Some(&PartialScene::from_value(&value)))
                }
            });
            tracing::info!(elements = scene.elements.len(), "scene normalized");
            write_json(&scene, args.pretty)?;
        }
        Command::Generate => {
            let config = load_config(args.config.as_deref())?;
            let current_scene = match args.scene.as_deref() {
                Some(path) => parse_json_input(&std::fs::read_to_string(path)?)?,
                None => Value::Null,
            };
            let request = DiagramRequest {
                prompt: args.prompt.clone().unwrap_or_default(),
                current_scene,
                output_format: args.format.unwrap_or(OutputFormat::Mermaid),
            };

            let endpoint = args.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
            let client = GenerationClient::new(endpoint)?;
            let response = client.generate(&request)?;

            let data = match response.format {
                OutputFormat::Mermaid => {
                    let Some(text) = response.data.as_str() else {
                        return Err(CliError::Drawmaid(drawmaid::Error::InvalidResponse {
                            message: "mermaid response data is not a string".to_string(),
                        }));
                    };
                    Value::String(sanitize(&extract(text)))
                }
                OutputFormat::Excalidraw => {
                    let data = match &response.data {
                        Value::String(text) => parse_json_input(text)?,
                        other => other.clone(),
                    };
                    let scene = with_normalizer(&args, &config, |normalizer| {
                        if data.is_null() {
                            normalizer.normalize_scene(None)
                        } else {
                            normalizer.normalize_scene(Some(&PartialScene::from_value(&data)))
                        }
                    });
                    scene.to_value()
                }
            };
            write_json(
                &GenerateOut {
                    format: response.format,
                    update: &response.update,
                    data,
                },
                args.pretty,
            )?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
