use futures::executor::block_on;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use topograph::{LayoutOptions, TopologyGraph, TopologyLayout, TopologyProfile};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Profile(topograph::Error),
    Json(serde_json::Error),
    Cancelled,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Profile(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Cancelled => write!(f, "layout pass was cancelled"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<topograph::Error> for CliError {
    fn from(value: topograph::Error) -> Self {
        Self::Profile(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Profile,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    profile: Option<String>,
    break_width: Option<f64>,
    multicluster: bool,
    show_hubs: bool,
    pretty: bool,
    verbose: bool,
}

fn usage() -> &'static str {
    "topograph-cli\n\
\n\
USAGE:\n\
  topograph-cli [layout] [--profile <path>] [--break-width <w>] [--multicluster] [--show-hubs] [--pretty] [--verbose] [<path>|-]\n\
  topograph-cli profile [--profile <path>] [--pretty]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the {nodes, links} graph is read from stdin.\n\
  - --profile accepts JSON or YAML (.yaml/.yml); the built-in hcm profile is used otherwise.\n\
  - layout prints the positioned nodes, edges, titles and bounds as JSON.\n\
  - profile prints the effective profile spec as JSON.\n\
  - Set RUST_LOG to filter log output; --verbose enables debug logs.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "profile" => args.command = Command::Profile,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--multicluster" => args.multicluster = true,
            "--show-hubs" => args.show_hubs = true,
            "--profile" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.profile = Some(path.clone());
            }
            "--break-width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let w = w.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(w.is_finite() && w > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.break_width = Some(w);
            }
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
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
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

fn load_profile(path: Option<&str>, show_hubs: bool) -> Result<TopologyProfile, CliError> {
    let profile = match path {
        None => TopologyProfile::hcm(),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let is_yaml = Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
            if is_yaml {
                TopologyProfile::from_yaml_str(&text)?
            } else {
                TopologyProfile::from_json_str(&text)?
            }
        }
    };
    Ok(if show_hubs {
        profile.show_hubs(true)
    } else {
        profile
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "topograph=debug,topograph_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    let profile = load_profile(args.profile.as_deref(), args.show_hubs)?;

    match args.command {
        Command::Profile => write_json(&profile.spec, args.pretty),
        Command::Layout => {
            let text = read_input(args.input.as_deref())?;
            let graph: TopologyGraph = serde_json::from_str(&text)?;
            let mut options = LayoutOptions {
                multicluster: args.multicluster,
                first_layout: true,
                ..Default::default()
            };
            if let Some(w) = args.break_width {
                options.break_width = w;
            }
            tracing::debug!(
                nodes = graph.nodes.len(),
                links = graph.links.len(),
                "read topology graph"
            );

            let mut engine = TopologyLayout::new(profile);
            let Some(out) = block_on(engine.layout(&graph, &options)) else {
                return Err(CliError::Cancelled);
            };
            write_json(&out, args.pretty)
        }
    }
}

fn main() {
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
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        tracing::warn!(error = %err, "topograph-cli failed");
        eprintln!("{err}");
        std::process::exit(1);
    }
}
