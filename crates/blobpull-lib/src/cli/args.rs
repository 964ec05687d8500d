use clap::{ArgAction, Parser};
use tracing::Level;
use tracing_subscriber::filter::combinator::{And, Or};
use tracing_subscriber::filter::{EnvFilter, FilterExt, LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Environment variable holding the storage connection string when `--key`
/// is not passed.
pub const CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";

/// Everything the user asked for, before any file is read or validated.
#[derive(Clone, Default)]
pub struct DownloadRequest {
    pub paths: Vec<String>,
    pub flagged_paths: Vec<String>,
    pub output_dir: Option<String>,
    pub container: Option<String>,
    pub list_file: Option<String>,
    pub connection_string: Option<String>,
    pub config_path: Option<String>,
    pub delimiter: Option<String>,
    pub transform: bool,
    pub dry_run: bool,
    pub no_rename: bool,
}

impl std::fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("paths", &self.paths)
            .field("flagged_paths", &self.flagged_paths)
            .field("output_dir", &self.output_dir)
            .field("container", &self.container)
            .field("list_file", &self.list_file)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("config_path", &self.config_path)
            .field("delimiter", &self.delimiter)
            .field("transform", &self.transform)
            .field("dry_run", &self.dry_run)
            .field("no_rename", &self.no_rename)
            .finish()
    }
}

pub struct Args {
    pub request: DownloadRequest,
}

/// Directives from `RUST_LOG` (or the verbosity flags), capped at WARN when
/// silent. ERROR events from this crate always pass.
pub type LogFilter<S> = Or<And<EnvFilter, LevelFilter, S>, Targets, S>;

pub fn log_filter<S: tracing::Subscriber>(
    log_level: Level,
    silent: bool,
    env_directives: &str,
) -> LogFilter<S> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse_lossy(env_directives)
        .add_directive("opendal=warn".parse().expect("static directive is valid"));
    let cap = if silent {
        LevelFilter::WARN
    } else {
        LevelFilter::TRACE
    };
    let errors = Targets::new().with_target(env!("CARGO_CRATE_NAME"), LevelFilter::ERROR);

    env_filter.and(cap).or(errors)
}

#[derive(Debug, Parser)]
#[command(
    name = "blobpull",
    version,
    about = "Download files hosted on Azure Storage"
)]
struct Cli {
    #[arg(value_name = "PATH", help = "Path on Azure Storage to download")]
    paths: Vec<String>,

    #[arg(
        short = 'p',
        long = "path",
        value_name = "PATH",
        help = "Path on Azure Storage to download, can be repeated",
        action = ArgAction::Append
    )]
    flagged_paths: Vec<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output folder (default: the current directory)"
    )]
    output: Option<String>,

    #[arg(
        short = 'c',
        long = "container",
        value_name = "NAME",
        help = "Download from a specific container (taken from the first path segment if not supplied)"
    )]
    container: Option<String>,

    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help = "File to read paths to download from (txt, csv)"
    )]
    file: Option<String>,

    #[arg(
        long = "key",
        value_name = "KEY",
        env = CONNECTION_STRING_ENV,
        hide_env_values = true,
        help = "Connection string to access Azure Storage. Remember to quote it."
    )]
    key: Option<String>,

    #[arg(
        long = "config",
        value_name = "FILE",
        help = "Optional config file with defaults and path transform rules"
    )]
    config: Option<String>,

    #[arg(
        long = "transform",
        help = "Transform and normalize file paths so they fit what Azure expects"
    )]
    transform: bool,

    #[arg(
        long = "dry",
        help = "Perform a dry run where nothing is downloaded or created"
    )]
    dry: bool,

    #[arg(
        long = "no-rename",
        help = "Skip files whose name already exists in the output folder instead of renaming them"
    )]
    no_rename: bool,

    #[arg(long = "silent", help = "Only print warnings and errors")]
    silent: bool,

    #[arg(
        long = "delimiter",
        value_name = "DELIM",
        help = "Field delimiter for csv path lists (default: ','; Excel may use ';')"
    )]
    delimiter: Option<String>,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count
    )]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.silent {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn into_request(self) -> DownloadRequest {
        DownloadRequest {
            paths: self.paths,
            flagged_paths: self.flagged_paths,
            output_dir: self.output,
            container: self.container,
            list_file: self.file,
            connection_string: self.key,
            config_path: self.config,
            delimiter: self.delimiter,
            transform: self.transform,
            dry_run: self.dry,
            no_rename: self.no_rename,
        }
    }
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(log_filter(
            cli.log_level(),
            cli.silent,
            &env_directives,
        )))
        .init();

    Args {
        request: cli.into_request(),
    }
}
