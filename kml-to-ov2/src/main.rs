use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use kml_to_ov2::{convert_file, ConvertError, ConvertOptions, OutputTarget};

#[derive(Parser)]
#[command(name = "kml2ov2", about = "Convert KML placemarks into TomTom OV2 files")]
struct Args {
    /// Path to a .kml file to convert
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// Where to write. A directory that gets one .ov2 file per layer, or with --single-layer, the
    /// output file. Defaults to next to the input.
    #[arg(long = "out", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Ignore Folders and write all of the Document's own placemarks to one file.
    #[arg(long)]
    single_layer: bool,

    /// Log more detail
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Debug
        } else if self.quiet {
            log::Level::Warn
        } else {
            log::Level::Info
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = simple_logger::init_with_level(args.log_level()) {
        eprintln!("Can't set up logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(
                err.downcast_ref::<ConvertError>()
                    .map_or(1, ConvertError::exit_code),
            )
        }
    }
}

fn run(args: Args) -> Result<()> {
    let options = ConvertOptions {
        legacy_single_layer: args.single_layer,
    };
    let target = OutputTarget::new(&args.input, args.output.as_deref(), &options);
    let written = convert_file(&args.input, &target, &options)
        .with_context(|| format!("Converting {}", args.input.display()))?;
    info!("Wrote {} file(s)", written.len());
    Ok(())
}
