use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use splice_normalizer::analysis::{BeatTracker, FixedBeatTracker, StratumBeatTracker};
use splice_normalizer::batch::{group_files, is_accepted, run_batch, BatchOptions, JobOutcome};
use splice_normalizer::codec::WavEncoding;
use splice_normalizer::process::JoinMode;
use splice_normalizer::splice::{CrossfadeCurve, SpliceConfig};
use splice_normalizer::validation::verify_outputs;
use splice_normalizer::{Pipeline, ProcessingConfig};
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WavFormat {
    Pcm16,
    Pcm24,
    Float32,
}

impl From<WavFormat> for WavEncoding {
    fn from(f: WavFormat) -> Self {
        match f {
            WavFormat::Pcm16 => WavEncoding::Pcm16,
            WavFormat::Pcm24 => WavEncoding::Pcm24,
            WavFormat::Float32 => WavEncoding::Float32,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "splice-normalizer")]
#[command(about = "Join, loudness-normalize and pad recordings for delivery", long_about = None)]
struct Args {
    /// Input files or directories (name_pt2.ext is joined onto name.ext)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory
    #[arg(short = 'o', long, default_value = ".")]
    output: String,

    /// Target integrated loudness in LUFS
    #[arg(long, default_value = "-14.0", allow_hyphen_values = true)]
    target: f64,

    /// Accepted deviation from the target in LU
    #[arg(long, default_value = "0.1")]
    tolerance: f64,

    /// Seconds of silence appended to every output
    #[arg(long, default_value = "2.0")]
    silence: f64,

    /// Maximum normalization passes
    #[arg(long, default_value = "5")]
    max_iterations: usize,

    /// Join second parts at a beat-aligned splice point instead of a hard cut
    #[arg(long)]
    splice: bool,

    /// Seconds searched at the end of part one and start of part two
    #[arg(long, default_value = "10.0")]
    search_window: f64,

    /// Number of ranked splice candidates
    #[arg(long, default_value = "5")]
    candidates: usize,

    /// Crossfade length in milliseconds
    #[arg(long, default_value = "100")]
    crossfade_ms: u32,

    /// Equal-power crossfade instead of linear
    #[arg(long)]
    equal_power: bool,

    /// Skip beat detection and assume a fixed tempo (beat grid from 0 s)
    #[arg(long)]
    assume_bpm: Option<f32>,

    /// Minimum BPM for detection range
    #[arg(long, default_value = "70")]
    min_bpm: f32,

    /// Maximum BPM for detection range
    #[arg(long, default_value = "170")]
    max_bpm: f32,

    /// Clamp samples to full scale after normalization
    #[arg(long)]
    peak_limit: bool,

    /// Sample format of WAV outputs
    #[arg(long, value_enum, default_value = "pcm16")]
    wav_format: WavFormat,

    /// MP3 bitrate in kbps
    #[arg(long, default_value = "320")]
    mp3_bitrate: u32,

    /// Write WAV outputs only
    #[arg(long)]
    no_mp3: bool,

    /// Directory for intermediate files (defaults to the system temp dir)
    #[arg(long)]
    scratch_dir: Option<String>,

    /// Number of jobs processed in parallel
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Print the per-job report as JSON
    #[arg(long)]
    json: bool,

    /// List ranked splice candidates for each pair and exit
    #[arg(long)]
    show_candidates: bool,

    /// Re-decode outputs and check their loudness
    #[arg(long)]
    verify: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Collect files from the arguments, walking directories recursively
fn collect_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = expand(input);
        if path.is_dir() {
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to read directory {:?}", path))?;
                if entry.file_type().is_file() && is_accepted(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            files.push(path);
        } else {
            anyhow::bail!("Input not found: {:?}", path);
        }
    }
    Ok(files)
}

fn build_config(args: &Args) -> Result<ProcessingConfig> {
    let curve = if args.equal_power {
        CrossfadeCurve::EqualPower
    } else {
        CrossfadeCurve::Linear
    };
    let splice = SpliceConfig::default()
        .with_search_window(args.search_window)
        .with_num_candidates(args.candidates)
        .with_crossfade(args.crossfade_ms as f64 / 1000.0, curve);

    let mut config = ProcessingConfig::new()
        .with_target(args.target, args.tolerance)
        .with_silence_duration(args.silence)
        .with_max_iterations(args.max_iterations)
        .with_splice(splice)
        .with_peak_limit(args.peak_limit)
        .with_outputs(args.wav_format.into(), args.mp3_bitrate);

    if let Some(dir) = &args.scratch_dir {
        config = config.with_scratch_dir(expand(dir));
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Splice Normalizer");
    log::info!("=================");

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    let config = build_config(&args)?;

    if let Some(bpm) = args.assume_bpm {
        log::info!("Assuming fixed tempo: {} BPM", bpm);
        let tracker = FixedBeatTracker::grid(bpm, 0.0)?;
        run(&args, config, tracker)
    } else {
        log::info!("BPM detection range: {}-{} BPM", args.min_bpm, args.max_bpm);
        let tracker = StratumBeatTracker::new().with_bpm_range(args.min_bpm, args.max_bpm);
        run(&args, config, tracker)
    }
}

fn run<T: BeatTracker>(args: &Args, config: ProcessingConfig, tracker: T) -> Result<()> {
    let pipeline = Pipeline::new(config, tracker)?;

    let files = collect_inputs(&args.inputs)?;
    let grouped = group_files(files);
    if !grouped.skipped.is_empty() {
        log::warn!("Skipped {} unsupported file(s)", grouped.skipped.len());
    }
    if grouped.groups.is_empty() {
        anyhow::bail!("No WAV or MP3 inputs found");
    }

    if args.show_candidates {
        return show_candidates(&pipeline, &grouped.groups);
    }

    let output_dir = expand(&args.output);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let join_mode = if args.splice {
        JoinMode::Splice
    } else {
        JoinMode::Concatenate
    };
    let options = BatchOptions::new(output_dir)
        .with_join_mode(join_mode)
        .with_mp3(!args.no_mp3);

    let outcomes = run_batch(&grouped.groups, &pipeline, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        summarize(&outcomes);
    }

    // A missed target fails the run, like a failed job
    if args.verify {
        verify_outcomes(&outcomes, pipeline.config())?;
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} job(s) failed", failed, outcomes.len());
    }
    Ok(())
}

fn show_candidates<T: BeatTracker>(
    pipeline: &Pipeline<T>,
    groups: &[splice_normalizer::batch::InputGroup],
) -> Result<()> {
    for group in groups {
        let (Some(first), Some(second)) = (&group.first, &group.second) else {
            continue;
        };
        log::info!("{}:", group.name);
        let candidates = pipeline
            .splice_candidates(first, second)
            .with_context(|| format!("Failed to rank splice points for {}", group.name))?;
        if candidates.is_empty() {
            log::warn!("  no splice point found");
        }
        for (rank, point) in candidates.iter().enumerate() {
            log::info!("  {}. {}", rank + 1, point);
        }
    }
    Ok(())
}

fn verify_outcomes(outcomes: &[JobOutcome], config: &ProcessingConfig) -> Result<()> {
    log::info!("Running post-process verification...");
    let paths = outcomes
        .iter()
        .flat_map(|o| o.outputs.values())
        .map(PathBuf::as_path);
    verify_outputs(paths, config.target_loudness, config.tolerance * 2.0)?;
    Ok(())
}

fn summarize(outcomes: &[JobOutcome]) {
    for outcome in outcomes {
        match &outcome.error {
            None => log::info!(
                "✅ {}: {:.1} LUFS -> {:?}",
                outcome.filename,
                outcome.final_lufs.unwrap_or(f64::NAN),
                outcome.outputs.values().collect::<Vec<_>>()
            ),
            Some(e) => log::error!("❌ {}: {}", outcome.filename, e),
        }
    }
}
