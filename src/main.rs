//! Purpose: `sfwire` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON document on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use sfwire::api::{ClientConfig, FabricClient, to_exit_code};
use sfwire::model::health::HealthStateFilter;
use sfwire::model::image_store::ApplicationPackageCleanupPolicy;
use sfwire::{Error, ErrorKind};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

const DEFAULT_ENDPOINT: &str = "http://localhost:19080";

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let gateway = cli.gateway;
    command_dispatch::dispatch_command(cli.command, &gateway)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "sfwire",
    version,
    about = "Typed JSON for the Service Fabric REST gateway",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Payloads are decoded into typed models and re-encoded in canonical form.

Mental model:
  - `decode` checks a saved payload against a named wire type
  - `get` calls the gateway and prints the typed result
  - `types` lists every wire type `decode` understands
"#,
    after_help = r#"EXAMPLES
  $ sfwire types
  $ sfwire decode --type ApplicationUpgradeProgressInfo progress.json
  $ sfwire get upgrade-progress shop
  $ sfwire --endpoint http://10.0.0.4:19080 get partitions shop~cart

LEARN MORE
  $ sfwire <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[command(flatten)]
    gateway: GatewayArgs,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone, Debug)]
struct GatewayArgs {
    #[arg(
        long,
        global = true,
        env = "SFWIRE_ENDPOINT",
        default_value = DEFAULT_ENDPOINT,
        value_hint = ValueHint::Url,
        help = "Gateway endpoint (http or https, no path)"
    )]
    endpoint: String,
    #[arg(
        long,
        global = true,
        env = "SFWIRE_API_VERSION",
        help = "Override the api-version sent with every request"
    )]
    api_version: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Server-side operation timeout, sent as the `timeout` query parameter"
    )]
    timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        default_value_t = 60,
        help = "Client-side limit on a whole request"
    )]
    request_timeout: u64,
}

impl GatewayArgs {
    fn client(&self) -> Result<FabricClient, Error> {
        let mut config = ClientConfig::new(self.endpoint.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout));
        if let Some(api_version) = &self.api_version {
            config = config.with_api_version(api_version.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_server_timeout(timeout);
        }
        FabricClient::with_config(config).map_err(|err| {
            err.with_hint("Pass --endpoint or set SFWIRE_ENDPOINT, e.g. http://localhost:19080.")
        })
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CleanupPolicyCli {
    Default,
    Automatic,
    Manual,
}

impl From<CleanupPolicyCli> for ApplicationPackageCleanupPolicy {
    fn from(value: CleanupPolicyCli) -> Self {
        match value {
            CleanupPolicyCli::Default => ApplicationPackageCleanupPolicy::Default,
            CleanupPolicyCli::Automatic => ApplicationPackageCleanupPolicy::Automatic,
            CleanupPolicyCli::Manual => ApplicationPackageCleanupPolicy::Manual,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "List the wire types known to `decode`",
        long_about = r#"List every record, enumeration, and polymorphic family in the catalog.

Families report their discriminator key and the values it may take."#,
        after_help = r#"EXAMPLES
  $ sfwire types
  $ sfwire types --kind family"#
    )]
    Types {
        #[arg(long, value_parser = ["record", "enumeration", "family"], help = "Only list one kind")]
        kind: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Decode a payload as a wire type and print its canonical form",
        long_about = r#"Decode a JSON payload as the named wire type, then re-encode it.

Unknown properties are dropped, numeric strings are normalized, and absent optional
fields stay absent. Decode failures exit non-zero with the JSON path of the problem."#,
        after_help = r#"EXAMPLES
  $ sfwire decode --type ApplicationUpgradeProgressInfo progress.json
  $ curl -s "$SF/Partitions/$ID?api-version=6.0" | sfwire decode -t ServicePartitionInfo"#
    )]
    Decode {
        #[arg(short = 't', long = "type", value_name = "NAME", help = "Wire type name (see `sfwire types`)")]
        type_name: String,
        #[arg(
            value_name = "FILE",
            help = "Input file, or - for stdin (default: stdin)",
            value_hint = ValueHint::FilePath
        )]
        input: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Query the gateway and print the typed result"
    )]
    Get {
        #[command(subcommand)]
        command: GetCommand,
    },
    #[command(
        arg_required_else_help = true,
        about = "Start a rolling application upgrade",
        after_help = r#"EXAMPLES
  $ sfwire upgrade shop --file upgrade.json
  $ sfwire upgrade shop --name fabric:/shop --version 2.0.0"#
    )]
    Upgrade {
        #[arg(help = "Application id, e.g. `shop` for fabric:/shop")]
        application_id: String,
        #[arg(
            long,
            value_hint = ValueHint::FilePath,
            conflicts_with_all = ["name", "version"],
            help = "ApplicationUpgradeDescription JSON file"
        )]
        file: Option<PathBuf>,
        #[arg(long, requires = "version", help = "Application name, e.g. fabric:/shop")]
        name: Option<String>,
        #[arg(long, requires = "name", help = "Target application type version")]
        version: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Provision an application type from the image store",
        after_help = r#"EXAMPLES
  $ sfwire provision --image-store-path Shop
  $ sfwire provision --image-store-path Shop --async --cleanup-policy automatic"#
    )]
    Provision {
        #[arg(long, value_name = "PATH", help = "Build path relative to the image store root")]
        image_store_path: String,
        #[arg(long = "async", help = "Return once the request is accepted")]
        is_async: bool,
        #[arg(long, value_enum, help = "What to do with the uploaded package afterwards")]
        cleanup_policy: Option<CleanupPolicyCli>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ sfwire completion bash > ~/.local/share/bash-completion/completions/sfwire
  $ sfwire completion zsh > ~/.zfunc/_sfwire"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum GetCommand {
    #[command(about = "Upgrade progress of an application")]
    UpgradeProgress {
        #[arg(help = "Application id, e.g. `shop` for fabric:/shop")]
        application_id: String,
    },
    #[command(about = "Services of an application (one page)")]
    Services {
        application_id: String,
        #[arg(long, help = "Continuation token from a previous page")]
        continuation_token: Option<String>,
    },
    #[command(about = "Partitions of a service")]
    Partitions {
        #[arg(help = "Service id, e.g. `shop~cart` for fabric:/shop/cart")]
        service_id: String,
        #[arg(long, conflicts_with = "all", help = "Continuation token from a previous page")]
        continuation_token: Option<String>,
        #[arg(long, help = "Follow continuation tokens and print every partition")]
        all: bool,
    },
    #[command(about = "One partition by id")]
    Partition {
        #[arg(help = "Partition GUID")]
        partition_id: String,
    },
    #[command(about = "Files and folders at an image store path")]
    ImageStore {
        #[arg(help = "Path relative to the image store root")]
        path: String,
    },
    #[command(about = "Health of a deployed service package, evaluated with a policy")]
    ServicePackageHealth {
        node_name: String,
        application_id: String,
        service_package_name: String,
        #[arg(
            long,
            value_delimiter = ',',
            value_parser = parse_health_filter,
            help = "Events to include: default,none,ok,warning,error,all (comma separated)"
        )]
        events: Vec<HealthStateFilter>,
        #[arg(long, value_hint = ValueHint::FilePath, help = "ApplicationHealthPolicy JSON file")]
        policy: Option<PathBuf>,
        #[arg(long, help = "Override ConsiderWarningAsError in the policy")]
        consider_warning_as_error: Option<bool>,
        #[arg(
            long,
            value_parser = clap::value_parser!(i32).range(0..=100),
            help = "Override MaxPercentUnhealthyDeployedApplications in the policy"
        )]
        max_percent_unhealthy_deployed_applications: Option<i32>,
    },
}

fn parse_health_filter(input: &str) -> Result<HealthStateFilter, String> {
    HealthStateFilter::from_name(input.trim())
        .ok_or_else(|| format!("unknown health state filter `{input}`"))
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check that the input exists and the gateway is reachable.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Re-run with RUST_LOG=debug and report the output.")
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::MissingRequiredField => "missing required field".to_string(),
        ErrorKind::UnknownEnumerationValue => "unknown enumeration value".to_string(),
        ErrorKind::UnknownDiscriminatorValue => "unknown discriminator value".to_string(),
        ErrorKind::InvalidTimestamp => "invalid timestamp".to_string(),
        ErrorKind::MalformedNumber => "malformed number".to_string(),
        ErrorKind::UnexpectedToken => "unexpected token".to_string(),
        ErrorKind::Syntax => "malformed json".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Remote => "gateway error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Internal => "internal error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path));
    }
    if let Some(expected) = err.expected() {
        inner.insert("expected".to_string(), json!(expected));
    }
    if let Some(actual) = err.actual() {
        inner.insert("actual".to_string(), json!(actual));
    }
    if let (Some(line), Some(column)) = (err.line(), err.column()) {
        inner.insert("line".to_string(), json!(line));
        inner.insert("column".to_string(), json!(column));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(code) = err.code() {
        inner.insert("code".to_string(), json!(code));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    let label = |name: &str| colorize_label(name, use_color, AnsiColor::Yellow);
    if let Some(path) = err.path() {
        lines.push(format!("{} {path}", label("at:")));
    }
    if let Some(expected) = err.expected() {
        lines.push(format!("{} {expected}", label("expected:")));
    }
    if let Some(actual) = err.actual() {
        lines.push(format!("{} {actual}", label("found:")));
    }
    if let (Some(line), Some(column)) = (err.line(), err.column()) {
        lines.push(format!("{} line {line}, column {column}", label("position:")));
    }
    if let Some(status) = err.status() {
        let code = err.code().map(|code| format!(" {code}")).unwrap_or_default();
        lines.push(format!("{} {status}{code}", label("gateway:")));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!("{} {hint}", label("hint:")));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!("{} {cause}", label("caused by:")));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `sfwire --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "sfwire") else {
        return "Try `sfwire --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `sfwire --help`.".to_string();
    }
    format!("Try `sfwire {} --help`.", parts.join(" "))
}
