use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Ship a static asset tree inside an executable", long_about = None)]
pub struct Cli {
    /// Log debug events (otherwise RUST_LOG, default "warn")
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmbedArg {
    /// Append after the executable with a trailing pointer
    Trailer,
    /// Inject as an object-file section (needs objcopy)
    Section,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle an asset directory into a copy of an executable
    Bundle {
        /// directory whose regular files are bundled
        source: PathBuf,
        /// output executable
        out: PathBuf,
        /// free-form description stored in the header
        description: String,

        #[arg(long, value_enum, default_value_t = EmbedArg::Trailer)]
        embed: EmbedArg,

        /// executable receiving the bundle (defaults to this one)
        #[arg(long)]
        host: Option<PathBuf>,

        /// section name for --embed section
        #[arg(long)]
        section_name: Option<String>,

        /// zero the creation timestamp
        #[arg(long)]
        deterministic: bool,

        /// objcopy binary used for --embed section
        #[arg(long, default_value = "objcopy")]
        objcopy: PathBuf,
    },

    /// Extract bundled assets to a directory
    Unbundle {
        dest: PathBuf,

        /// bundled executable (defaults to this one)
        #[arg(long)]
        file: Option<PathBuf>,

        /// fail on a damaged container instead of keeping what parses
        #[arg(long)]
        strict: bool,
    },

    /// Show the bundle header
    Info {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        strict: bool,
    },

    /// List bundled entries
    List {
        #[arg(long)]
        file: Option<PathBuf>,
        /// include a BLAKE3 digest per entry
        #[arg(long)]
        hashes: bool,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        strict: bool,
    },

    /// Stream one entry (or a range of it) to stdout
    Cat {
        entry: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        start: u64,
        #[arg(long)]
        len: Option<u64>,
        #[arg(long)]
        strict: bool,
    },

    /// Report whether a file carries a bundle (exit status 1 if not)
    Check { file: PathBuf },
}
