use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use layerchain_core::{
    ChainSummary, DispatchError, Dispatcher, DispatcherConfig, FrameError, PacketContext,
    ProtocolTag, decode_ethernet_frame,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "layerchain")]
#[command(version)]
#[command(
    about = "Decompose a captured frame into its protocol layer chain (EtherCAT / NBNS).",
    long_about = None,
    after_help = "Examples:\n  layerchain decode --hex 'ffffffffffff 020000000001 88a4 0510 0102030405'\n  layerchain decode frame.hex --root ethercat --pretty\n  echo 80940110 | layerchain decode - --root nbns --stdout"
)]
struct Cli {
    /// Increase log verbosity (overridden by RUST_LOG)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one hex-encoded frame and emit the layer chain as JSON.
    #[command(alias = "dissect")]
    Decode {
        /// File with hex text, or '-' for stdin
        input: Option<PathBuf>,

        /// Hex text given inline
        #[arg(long, conflicts_with = "input")]
        hex: Option<String>,

        /// Root protocol: ethernet, ethercat, nbns, ethertype:N or udp:N
        #[arg(long, default_value = "ethernet")]
        root: String,

        /// Output report path (JSON); stdout when omitted
        #[arg(short = 'o', long, conflicts_with = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long)]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Maximum number of layers per chain
        #[arg(long, default_value_t = DispatcherConfig::DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Exit with a non-zero code if the chain stopped early or left bytes undecoded
        #[arg(long)]
        strict: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            input,
            hex,
            root,
            report,
            stdout,
            pretty,
            compact,
            max_depth,
            strict,
            quiet,
        } => cmd_decode(DecodeArgs {
            input,
            hex,
            root,
            report,
            stdout,
            pretty,
            compact,
            max_depth,
            strict,
            quiet,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

struct DecodeArgs {
    input: Option<PathBuf>,
    hex: Option<String>,
    root: String,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    max_depth: usize,
    strict: bool,
    quiet: bool,
}

/// Root selection parsed from `--root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Ethernet,
    Tag(ProtocolTag),
}

/// JSON document written by `decode`.
#[derive(Debug, Serialize)]
struct DecodeReport {
    tool: ToolInfo,
    entry: ProtocolTag,
    /// Offset of the decoded chain within the input frame.
    payload_offset: usize,
    chain: ChainSummary,
}

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: String,
    version: String,
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    if args.max_depth == 0 {
        return Err(CliError::new(
            "--max-depth must be at least 1",
            Some("omit the flag to use the default".to_string()),
        ));
    }
    let root = parse_root(&args.root)?;
    let text = read_hex_text(args.input.as_deref(), args.hex.as_deref())?;
    let frame = decode_hex(&text)?;
    debug!(len = frame.len(), ?root, "decoding frame");

    let dispatcher = Dispatcher::with_config(DispatcherConfig {
        max_depth: args.max_depth,
    });
    let context = PacketContext::default();
    let report = match root {
        Root::Ethernet => {
            let decoded =
                decode_ethernet_frame(&dispatcher, &frame, context).map_err(frame_error)?;
            DecodeReport {
                tool: tool_info(),
                entry: decoded.entry,
                payload_offset: decoded.payload_offset,
                chain: decoded.chain.summary(),
            }
        }
        Root::Tag(tag) => {
            let chain = dispatcher
                .build(&frame, tag, context)
                .map_err(dispatch_error)?;
            DecodeReport {
                tool: tool_info(),
                entry: tag,
                payload_offset: 0,
                chain: chain.summary(),
            }
        }
    };

    let json = serialize_report(&report, args.pretty, args.compact)?;
    match args.report.as_ref() {
        Some(path) if !args.stdout => {
            write_report(path, &json)?;
            if !args.quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
        _ => println!("{}", json),
    }

    if args.strict && !report.chain.is_complete() {
        let detail = report
            .chain
            .stop
            .clone()
            .unwrap_or_else(|| format!("{} bytes undecoded", report.chain.undecoded));
        return Err(CliError::new(
            format!("incomplete chain: {}", detail),
            Some("drop --strict to accept partial chains".to_string()),
        ));
    }
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "layerchain".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn parse_root(value: &str) -> Result<Root, CliError> {
    let lowered = value.trim().to_ascii_lowercase();
    let invalid = || {
        CliError::new(
            format!("invalid root protocol '{}'", value),
            Some("use ethernet, ethercat, nbns, ethertype:0x88a4 or udp:137".to_string()),
        )
    };
    match lowered.as_str() {
        "ethernet" | "eth" => return Ok(Root::Ethernet),
        "ethercat" | "ecat" => return Ok(Root::Tag(ProtocolTag::EtherType(0x88a4))),
        "nbns" => return Ok(Root::Tag(ProtocolTag::UdpPort(137))),
        _ => {}
    }
    let (kind, number) = lowered.split_once(':').ok_or_else(invalid)?;
    let number = parse_u16(number).ok_or_else(invalid)?;
    match kind {
        "ethertype" => Ok(Root::Tag(ProtocolTag::EtherType(number))),
        "udp" | "port" => Ok(Root::Tag(ProtocolTag::UdpPort(number))),
        _ => Err(invalid()),
    }
}

fn parse_u16(value: &str) -> Option<u16> {
    match value.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

fn read_hex_text(input: Option<&Path>, inline: Option<&str>) -> Result<String, CliError> {
    if let Some(text) = inline {
        return Ok(text.to_string());
    }
    let input = input.ok_or_else(|| {
        CliError::new(
            "missing input",
            Some("pass a file, '-' for stdin, or --hex".to_string()),
        )
    })?;
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a file containing hex text".to_string()),
        ));
    }
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    Ok(text)
}

fn decode_hex(text: &str) -> Result<Vec<u8>, CliError> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    let digits = digits
        .strip_prefix("0x")
        .unwrap_or(digits.as_str())
        .to_string();
    if digits.is_empty() {
        return Err(CliError::new(
            "input contains no bytes",
            Some("expected hex text such as '88a4 0510 ...'".to_string()),
        ));
    }
    hex::decode(&digits).map_err(|err| {
        CliError::new(
            format!("invalid hex input: {}", err),
            Some("use pairs of hex digits; whitespace, ':' and '-' are ignored".to_string()),
        )
    })
}

fn frame_error(err: FrameError) -> CliError {
    match err {
        FrameError::Dispatch(err) => dispatch_error(err),
        other => CliError::new(
            format!("frame decoding failed: {}", other),
            Some("check that the input is an Ethernet II frame".to_string()),
        ),
    }
}

fn dispatch_error(err: DispatchError) -> CliError {
    match err {
        DispatchError::UnknownProtocol { .. } => CliError::new(
            err.to_string(),
            Some("supported roots: ethertype 0x88a4 (EtherCAT), udp port 137 (NBNS)".to_string()),
        ),
        DispatchError::Layer(_) => CliError::new(err.to_string(), None),
    }
}

fn serialize_report(
    report: &DecodeReport,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(report)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(report)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))
}
