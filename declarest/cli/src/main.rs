use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use declarest_lib::param::{ParamOptions, ParamSet};
use declarest_lib::response::{
    BodyFormat, ResponseValue, TransformPipeline, process_response, process_value,
};
use declarest_lib::uri_template::placeholders;
use declarest_lib::url_builder::build_url;
use declarest_lib::ApiClient;
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build request URLs and normalize REST API responses
#[derive(Parser)]
#[command(name = "declarest", version, about, after_help = AFTER_HELP)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a request URL from a path template and parameters
    Url {
        /// Path template; `{name}` placeholders become required parameters
        template: String,

        /// Parameter as NAME=VALUE (VALUE is parsed as JSON when possible)
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
    },

    /// Flatten and tabularize a response body read from FILE or stdin
    Normalize {
        /// Body to read; stdin when omitted
        file: Option<PathBuf>,

        /// Wire format of the body
        #[arg(short, long, default_value_t = BodyFormat::Json)]
        format: BodyFormat,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Build a URL, GET it and print the normalized response
    Fetch {
        /// Path template; `{name}` placeholders become required parameters
        template: String,

        /// Parameter as NAME=VALUE (VALUE is parsed as JSON when possible)
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Wire format of the response body
        #[arg(short, long, default_value_t = BodyFormat::Json)]
        format: BodyFormat,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },
}

const AFTER_HELP: &str = "\
EXAMPLES:
  declarest url 'https://api.example.com/cities/{id}' -p id=42 -p units=metric
      https://api.example.com/cities/42?units=metric

  declarest url '/search?format=json' -p 'q=New York'
      /search?format=json&q=New%20York

  curl -s https://api.example.com/weather | declarest normalize
  declarest normalize --format yaml stations.yaml
  declarest fetch 'https://api.example.com/weather' -p q=Kyiv -p appid=KEY

NORMALIZATION:
  Nested objects are flattened to dot-joined keys (`main.temp`), null
  entries are dropped, and arrays of objects become tables whose rows all
  share the union of keys (missing cells are null).

LOGGING:
  RUST_LOG overrides the -v levels, e.g. RUST_LOG=declarest_lib=trace.
";

/// Initialize tracing; logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,declarest=info,declarest_lib=info".to_string(),
            2 => "info,declarest=debug,declarest_lib=debug".to_string(),
            _ => "debug,declarest=trace,declarest_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Splits `NAME=VALUE` pairs; values that parse as JSON keep their type.
fn parse_params(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut values = Map::new();
    for pair in pairs {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| eyre!("parameter `{pair}` is not in NAME=VALUE form"))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        values.insert(name.to_string(), value);
    }
    Ok(values)
}

/// Declares placeholders as required positional parameters and every other
/// supplied name as an optional query parameter.
fn adhoc_params(template: &str, values: &Map<String, Value>) -> Result<ParamSet> {
    let mut set = ParamSet::new("adhoc");
    for name in placeholders(template)? {
        set.add(name, ParamOptions::new().positional().required())?;
    }
    for name in values.keys() {
        if set.get(name).is_none() {
            set.add(name.as_str(), ParamOptions::new())?;
        }
    }
    Ok(set)
}

fn adhoc_url(template: &str, pairs: &[String]) -> Result<String> {
    let values = parse_params(pairs)?;
    let params = adhoc_params(template, &values)?;
    let url = build_url(template, &params, &values)?;
    debug!(%url, "built URL");
    Ok(url)
}

fn read_body(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut body = Vec::new();
            std::io::stdin()
                .read_to_end(&mut body)
                .wrap_err("Failed to read stdin")?;
            Ok(body)
        }
    }
}

fn print_value(value: &ResponseValue, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Url { template, params } => {
            println!("{}", adhoc_url(&template, &params)?);
        }
        Command::Normalize {
            file,
            format,
            compact,
        } => {
            let source = file
                .as_ref()
                .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
            let body = read_body(file.as_ref())?;
            let decoded = format
                .decoder()
                .decode(&body)
                .wrap_err_with(|| format!("Failed to decode {source} as {format}"))?;
            let value = process_value(decoded, &TransformPipeline::new(), &source)?;
            print_value(&value, compact)?;
        }
        Command::Fetch {
            template,
            params,
            format,
            timeout,
            compact,
        } => {
            let url = adhoc_url(&template, &params)?;
            let client = ApiClient::builder()
                .timeout(Duration::from_secs(timeout))
                .build()?;
            let raw = client.fetch(&url).await?;
            let value = process_response(&raw, format.decoder().as_ref(), &TransformPipeline::new())?;
            print_value(&value, compact)?;
        }
    }

    Ok(())
}
