use std::{io::Write, path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use spleeter_stems::{
    App, AppConfig, Codec, SeparationSettings, SpleeterCli, SplitterError, StemMode, YtDlp,
};
use tracing_subscriber::EnvFilter;

type CliApp = App<SpleeterCli, YtDlp>;

#[derive(Parser)]
#[command(name = "spleeter-stems")]
#[command(about = "Cached audio stem separation with zip bundling", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Where uploads and downloads are stored
    #[arg(long, global = true, value_name = "DIR")]
    upload_dir: Option<PathBuf>,

    /// Root of the separation cache
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct SettingsArgs {
    /// 2stems, 4stems or 5stems
    #[arg(short, long, default_value = "4stems")]
    mode: StemMode,

    /// wav, mp3, ogg, m4a, wma or flac
    #[arg(short, long, default_value = "mp3")]
    codec: Codec,

    /// Output bitrate in kbps
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Apply multi-channel Wiener filtering
    #[arg(long)]
    mwf: bool,

    /// Use the 16 kHz model variant
    #[arg(long)]
    high_rate: bool,

    /// Seconds of audio to process, 0 for the whole file
    #[arg(short, long, default_value_t = 600)]
    duration: u32,
}

impl SettingsArgs {
    fn build(&self, default_bitrate: u32) -> SeparationSettings {
        SeparationSettings::new(self.mode, self.codec, self.bitrate.unwrap_or(default_bitrate))
            .with_mwf(self.mwf)
            .with_16khz(self.high_rate)
            .with_max_duration(self.duration)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split a single audio file
    Split {
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Skip building the zip archive
        #[arg(long)]
        no_zip: bool,

        #[arg(short, long)]
        quiet: bool,
    },

    /// Split multiple audio files into one zip archive
    Batch {
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,

        #[arg(short, long)]
        quiet: bool,
    },

    /// Fetch audio from a YouTube video or playlist URL as MP3
    Download {
        #[arg(short, long)]
        url: String,

        /// MP3 bitrate in kbps
        #[arg(short, long)]
        bitrate: Option<u32>,

        #[arg(short, long)]
        quiet: bool,
    },

    /// List stem modes and codecs
    Modes,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(&cli).and_then(|config| {
        let mut app = App::from_config(config);
        match cli.command {
            Commands::Split {
                input,
                settings,
                no_zip,
                quiet,
            } => handle_split(&mut app, input, &settings, !no_zip, quiet),
            Commands::Batch {
                input,
                settings,
                quiet,
            } => handle_batch(&mut app, input, &settings, quiet),
            Commands::Download {
                url,
                bitrate,
                quiet,
            } => handle_download(&mut app, &url, bitrate, quiet),
            Commands::Modes => {
                handle_modes();
                Ok(())
            }
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_user_error() {
                eprintln!("  Check the input and settings, then try again.");
            } else {
                eprintln!("  This is a system failure; see the log with -v for details.");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig, SplitterError> {
    let mut config = AppConfig::from_env()?;
    if let Some(dir) = &cli.upload_dir {
        config.upload_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn banner(title: &str, rows: &[(&str, String)]) {
    eprintln!("🎵 {title}");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (k, v) in rows {
        eprintln!("{:<8}{}", format!("{k}:"), v);
    }
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!();
}

fn progress_bar(fraction: f64) {
    let pct = (fraction * 100.0).round() as u64;
    let filled = (fraction * 30.0).round() as usize;
    eprint!("\r🔄 [{:<30}] {:>3}%", "#".repeat(filled.min(30)), pct);
    if fraction >= 1.0 {
        eprintln!();
    }
    let _ = std::io::stderr().flush();
}

fn handle_split(
    app: &mut CliApp,
    input: PathBuf,
    args: &SettingsArgs,
    zip: bool,
    quiet: bool,
) -> Result<(), SplitterError> {
    let settings = args.build(app.config().default_bitrate);

    if !quiet {
        banner(
            "Stem Splitter",
            &[
                ("Input", input.display().to_string()),
                ("Output", app.config().output_dir.display().to_string()),
                ("Mode", settings.mode.label().to_string()),
                ("Tag", settings.tag()),
            ],
        );
    }

    let outcome = app.split_single(&input, &settings, zip)?;

    if !quiet {
        if outcome.already_existed {
            eprintln!("♻️  Reused cached separation");
        } else {
            eprintln!("✅ Split completed successfully!");
        }
        eprintln!();
        eprintln!("Output files:");
        for stem in &outcome.stems {
            eprintln!("  • {}", stem.display());
        }
        if let Some(zip) = &outcome.zip {
            eprintln!("📦 Archive: {}", zip.display());
        }
    } else {
        // Quiet mode: just print paths
        for stem in &outcome.stems {
            println!("{}", stem.display());
        }
        if let Some(zip) = &outcome.zip {
            println!("{}", zip.display());
        }
    }

    Ok(())
}

fn handle_batch(
    app: &mut CliApp,
    inputs: Vec<PathBuf>,
    args: &SettingsArgs,
    quiet: bool,
) -> Result<(), SplitterError> {
    let settings = args.build(app.config().default_bitrate);

    if !quiet {
        banner(
            "Batch Stem Splitter",
            &[
                ("Files", inputs.len().to_string()),
                ("Output", app.config().output_dir.display().to_string()),
                ("Mode", settings.mode.label().to_string()),
                ("Tag", settings.tag()),
            ],
        );
    }

    let zip = app.split_many(&inputs, &settings, |f| {
        if !quiet {
            progress_bar(f);
        }
    })?;

    if quiet {
        println!("{}", zip.display());
    } else {
        eprintln!();
        eprintln!("📦 Archive: {}", zip.display());
    }
    Ok(())
}

fn handle_download(
    app: &mut CliApp,
    url: &str,
    bitrate: Option<u32>,
    quiet: bool,
) -> Result<(), SplitterError> {
    if !quiet {
        eprintln!("📥 Downloading: {}", url);
    }

    let downloads = app.fetch(url, bitrate, &mut |f| {
        if !quiet {
            progress_bar(f);
        }
    })?;

    for d in &downloads {
        if quiet {
            println!("{}", d.path.display());
        } else if d.already_existed {
            eprintln!("  • {} (already downloaded)", d.path.display());
        } else {
            eprintln!("  • {}", d.path.display());
        }
    }
    Ok(())
}

fn handle_modes() {
    eprintln!("📋 Stem modes");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for mode in StemMode::ALL {
        let marker = if mode == StemMode::FourStems { " (default)" } else { "" };
        eprintln!("  • {}{}", mode.label(), marker);
    }
    eprintln!();
    eprintln!("📋 Codecs");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for codec in Codec::ALL {
        let marker = if codec == Codec::default() { " (default)" } else { "" };
        eprintln!("  • {}{}", codec, marker);
    }
    eprintln!();
    eprintln!("Use --mode and --codec to choose");
}
