mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use cli::{Cli, OutputFormat};
use tonica::audio::decode::{self, ChannelMode};
use tonica::audio::frames::FrameCutter;
use tonica::config::{self, Config};
use tonica::notes::mapper::note_name;
use tonica::notes::{Note, TimedEvent};
use tonica::track_signal;

/// Tracking result of one input file.
#[derive(Serialize)]
struct FileReport {
    path: PathBuf,
    sample_rate: u32,
    channels: usize,
    duration: f32,
    events: Vec<TimedEvent>,
    notes: Vec<Note>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // explicit --config path, or auto-detect tonica.toml / global config
    let config_path = cli.config.clone().or_else(find_config);
    let mut config = match config_path {
        Some(ref path) => {
            let cfg = config::load_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let mode = cli.channel.map_or(ChannelMode::Mix, ChannelMode::Channel);

    log::info!(
        "Tracking {} file(s): frame={} hop={} pitch={} loudness={}",
        cli.inputs.len(),
        config.analysis.frame_size,
        config.analysis.hop_size,
        config.pitch.algorithm,
        config.pitch.loudness_algorithm
    );

    let reports: Vec<FileReport> = if cli.inputs.len() == 1 {
        vec![track_file(&cli.inputs[0], &config, mode, true)?]
    } else {
        // one tracker per file, nothing shared between them
        let pb = ProgressBar::new(cli.inputs.len() as u64);
        pb.set_style(progress_style("files"));
        let reports = cli
            .inputs
            .par_iter()
            .map(|path| {
                let report = track_file(path, &config, mode, false);
                pb.inc(1);
                report
            })
            .collect::<Result<Vec<_>>>()?;
        pb.finish_and_clear();
        reports
    };

    let mut out: Box<dyn Write> = match cli.output {
        Some(ref path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    write_reports(&mut out, &reports, cli.format)?;
    out.flush()?;

    if let Some(ref path) = cli.output {
        log::info!("Done! Output: {}", path.display());
    }
    Ok(())
}

fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("tonica.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("tonica").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("tonica").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

fn progress_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {} ({{eta}} remaining)",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn track_file(path: &Path, config: &Config, mode: ChannelMode, show_progress: bool) -> Result<FileReport> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    let signal = decode::decode_audio(path, mode)?;

    // the file decides the timing base
    let mut config = config.clone();
    config.analysis.sample_rate = signal.sample_rate;

    let total_hops = FrameCutter::frame_count(signal.samples.len(), config.analysis.hop_size);
    let pb = if show_progress {
        let pb = ProgressBar::new(total_hops as u64);
        pb.set_style(progress_style("hops"));
        pb
    } else {
        ProgressBar::hidden()
    };

    let timeline = track_signal(&config, &signal.samples, |hop| {
        if hop % 256 == 0 {
            pb.set_position(hop + 1);
        }
    })
    .with_context(|| format!("Failed to track {}", path.display()))?;
    pb.finish_and_clear();

    log::info!(
        "{}: {} notes from {} events",
        path.display(),
        timeline.notes().len(),
        timeline.events().len()
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        sample_rate: signal.sample_rate,
        channels: signal.source_channels,
        duration: signal.duration(),
        events: timeline.events().to_vec(),
        notes: timeline.notes().to_vec(),
    })
}

fn write_reports(out: &mut dyn Write, reports: &[FileReport], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, reports)?;
        writeln!(out)?;
        return Ok(());
    }

    for report in reports {
        if reports.len() > 1 {
            writeln!(out, "# {}", report.path.display())?;
        }
        match format {
            OutputFormat::Events => {
                for e in &report.events {
                    let kind = match e.event.kind {
                        tonica::EventKind::NoteOn => "noteon",
                        tonica::EventKind::NoteOff => "noteoff",
                    };
                    writeln!(
                        out,
                        "{:>9.3}  {:<7}  {:>3}  {:<4}  {:+.3}",
                        e.time,
                        kind,
                        e.event.note,
                        note_name(e.event.note),
                        e.event.time_compensation
                    )?;
                }
            }
            OutputFormat::Notes => {
                for n in &report.notes {
                    writeln!(
                        out,
                        "{:>9.3}  {:>9.3}  {:>3}  {}",
                        n.start,
                        n.end,
                        n.midi,
                        note_name(n.midi)
                    )?;
                }
            }
            OutputFormat::Json => unreachable!(),
        }
    }
    Ok(())
}
