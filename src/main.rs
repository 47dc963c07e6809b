mod binary_utils;
mod chunk_extractor;
mod containers;
mod decompiler;
mod error;
mod manifest;
mod report;
mod unpacker;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use chunk_extractor::ExtractConfig;
use decompiler::{Decompiler, ExternalDecompiler};
use report::LogReporter;
use unpacker::{ModUnpacker, UnpackOutcome};

#[derive(Parser)]
#[command(name = "mslm-unpacker", about = "Unpacks mod sources from MSLM containers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract textures, scripts, codes and the decompiled assembly of a mod.
    Unpack {
        /// Path to the packed mod (.sml).
        #[arg(short = 'n', long = "name")]
        name: PathBuf,
        /// Output folder. Deleted and recreated on every run.
        #[arg(short = 'o', long = "output", default_value = "out")]
        output: PathBuf,
        /// Optimise re-encoded textures with oxipng.
        #[arg(long)]
        optimise_png: bool,
        /// Do not write <mod>.manifest.json.
        #[arg(long)]
        no_manifest: bool,
        /// Decompiler to run on the embedded assembly.
        #[arg(long, default_value = "ilspycmd")]
        decompiler: String,
        /// Write the raw assembly as <mod>.dll and skip decompilation.
        #[arg(long)]
        skip_decompile: bool,
    },
}

fn reset_output_dir(output: &Path) -> Result<()> {
    if output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to remove {}", output.display()))?;
    }
    fs::create_dir_all(output).with_context(|| format!("failed to create {}", output.display()))
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Unpack {
            name,
            output,
            optimise_png,
            no_manifest,
            decompiler,
            skip_decompile,
        } => {
            log::info!("Unpacking {} into {}", name.display(), output.display());
            reset_output_dir(&output)?;

            let config = ExtractConfig {
                optimise_png,
                write_manifest: !no_manifest,
            };
            let external = ExternalDecompiler::new(decompiler);
            let decompiler: Option<&dyn Decompiler> = if skip_decompile {
                None
            } else {
                Some(&external)
            };

            let outcome = ModUnpacker::new(&config, decompiler, &LogReporter)
                .unpack(&name, &output)
                .with_context(|| format!("failed to unpack {}", name.display()))?;

            match outcome {
                UnpackOutcome::Unpacked(summary) => {
                    log::info!(
                        "Successfully unpacked {} {} ({} files, {} byte assembly)",
                        summary.mod_name,
                        summary.version,
                        summary.exported.len(),
                        summary.assembly_len
                    );
                    Ok(true)
                }
                UnpackOutcome::NotRecognized => {
                    log::error!("{} is not an MSLM container", name.display());
                    Ok(false)
                }
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
