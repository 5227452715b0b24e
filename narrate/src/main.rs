//! narrate - Turn long text into a single WAV file using remote text-to-speech

mod audio;
mod config;
mod dispatch;
mod error;
mod pipeline;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::NarrateConfig;
use dispatch::{AbortHandle, DispatchSettings, Dispatcher, JobEvent, JobStatus, VoicedSynthesizer};
use error::PipelineError;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use text::{Chunker, FixedClassifier, LanguageClassifier, LanguageTag, PatternClassifier};

const STDIN_OUTPUT_NAME: &str = "audio-final.wav";
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "narrate")]
#[command(about = "Convert long text into a single WAV file using remote text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Text file to read (reads stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Output file path (default: <input-name>.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pause between synthesis requests, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Maximum characters per synthesis request
    #[arg(long)]
    max_length: Option<usize>,

    /// Timeout for a single synthesis request, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Force a voice language instead of detecting it per chunk (en, fr)
    #[arg(short, long)]
    language: Option<LanguageTag>,

    /// Also write each chunk's raw audio into this directory
    #[arg(long)]
    keep_chunks: Option<PathBuf>,

    /// Show progress details
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the voice used for a language
    SetVoice {
        /// Language (en, fr)
        language: LanguageTag,
        /// Voice identifier
        voice_id: String,
    },
    /// Set the synthesis model
    SetModel {
        /// Model identifier
        model_id: String,
    },
    /// Set the pause between requests
    SetDelay {
        /// Milliseconds
        delay_ms: u64,
    },
    /// Set the maximum characters per request
    SetMaxLength {
        /// Characters (at least 1)
        max_length: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let mut config = NarrateConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let (text, output_path) = read_input(&args)?;

    if let Some(dir) = &args.keep_chunks {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let provider = speech_client::get_provider(&config.provider)
        .context("Failed to set up the speech provider")?;
    let classifier: Box<dyn LanguageClassifier> = match args.language {
        Some(tag) => Box::new(FixedClassifier(tag)),
        None => Box::new(PatternClassifier),
    };
    let synth = VoicedSynthesizer::new(
        provider,
        classifier,
        config.voices.clone(),
        config.model_id.as_str(),
    );
    log::info!("Using {} with model {}", synth.provider_name(), config.model_id);

    let chunker = Chunker::new(config.max_chunk_length);
    let dispatcher = Dispatcher::new(synth, DispatchSettings::from_config(&config));

    let abort = AbortHandle::new();
    let on_signal = abort.clone();
    tokio::spawn(async move {
        let mut received = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            received += 1;
            match interrupt_action(received) {
                Interrupt::Stop => {
                    eprintln!("\nStopping after the current request (Ctrl-C again to quit now)...");
                    on_signal.abort();
                }
                Interrupt::Exit => {
                    eprintln!("\nInterrupted");
                    std::process::exit(EXIT_INTERRUPTED);
                }
            }
        }
    });

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let keep_dir = args.keep_chunks.as_deref();
    let result = pipeline::narrate(&text, &chunker, &dispatcher, &abort, |event| {
        report_progress(&pb, keep_dir, event)
    })
    .await;
    pb.finish_and_clear();

    let narration = match result {
        Ok(narration) => narration,
        Err(err) => {
            print_failure(&err, keep_dir);
            std::process::exit(1);
        }
    };

    narration
        .file
        .write_to(&output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    eprintln!(
        "Output: {} ({} chunks, {:.1}s at {} Hz)",
        output_path.display(),
        narration.jobs.len(),
        narration.audio.buffer.duration().as_secs_f64(),
        narration.sample_rate()
    );
    log::debug!("{} samples, {} bytes", narration.sample_count(), narration.file.byte_len());

    Ok(())
}

/// Default level warn; --verbose and --debug raise it, RUST_LOG overrides.
fn init_logging(args: &Args) {
    let level = if args.debug {
        log::LevelFilter::Debug
    } else if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn apply_overrides(config: &mut NarrateConfig, args: &Args) {
    if let Some(delay_ms) = args.delay_ms {
        config.delay_ms = delay_ms;
    }
    if let Some(max_length) = args.max_length {
        config.max_chunk_length = max_length;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.request_timeout_secs = timeout_secs;
        config.provider.timeout_secs = timeout_secs;
    }
}

/// Read the text and decide where the WAV goes.
fn read_input(args: &Args) -> Result<(String, PathBuf)> {
    match args.input.as_deref() {
        Some(path) if path != Path::new("-") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let output = args.output.clone().unwrap_or_else(|| default_output(path));
            Ok((text, output))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read text from stdin")?;
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(STDIN_OUTPUT_NAME));
            Ok((text, output))
        }
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    input.with_file_name(format!("{}.wav", stem.to_string_lossy()))
}

/// Response to the n-th Ctrl-C of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Stop,
    Exit,
}

fn interrupt_action(received: usize) -> Interrupt {
    if received <= 1 {
        Interrupt::Stop
    } else {
        Interrupt::Exit
    }
}

fn chunk_file_name(index: usize) -> String {
    format!("chunk_{:04}.mp3", index)
}

fn report_progress(pb: &ProgressBar, keep_dir: Option<&Path>, event: &JobEvent) {
    if let JobEvent::Status { index, status, .. } = event {
        log::debug!("Chunk {} {}", index, status.as_str());
    }
    match event {
        JobEvent::Status {
            status: JobStatus::Pending,
            ..
        } => pb.inc_length(1),
        JobEvent::Status {
            index,
            status: JobStatus::Processing,
            text,
            ..
        } => {
            pb.set_message(format!("chunk {}: {}", index + 1, preview(text)));
        }
        JobEvent::Status {
            index,
            status: JobStatus::Completed,
            audio,
            ..
        } => {
            pb.inc(1);
            if let (Some(dir), Some(audio)) = (keep_dir, audio) {
                let path = dir.join(chunk_file_name(*index));
                if let Err(e) = std::fs::write(&path, audio) {
                    log::warn!("Could not save {}: {}", path.display(), e);
                }
            }
        }
        JobEvent::Status {
            status: JobStatus::Failed,
            ..
        } => {}
        JobEvent::Waiting { index, delay } => {
            pb.set_message(format!(
                "waiting {:.1}s before chunk {}",
                delay.as_secs_f64(),
                index + 1
            ));
        }
    }
}

/// First few words of a chunk for the progress line.
fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 40;
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head.trim_end())
}

fn print_failure(err: &PipelineError, keep_dir: Option<&Path>) {
    eprintln!("Error ({}): {}", err.kind(), err);
    if let Some(link) = err.remediation() {
        eprintln!("{}", link);
    }
    if let Some(hint) = saved_chunks_hint(err, keep_dir) {
        eprintln!("{}", hint);
    }
}

/// Where the audio of chunks finished before the failing one can be found.
fn saved_chunks_hint(err: &PipelineError, keep_dir: Option<&Path>) -> Option<String> {
    let dir = keep_dir?;
    match err.chunk_index()? {
        0 => None,
        index => Some(format!(
            "Audio for chunks 1-{} was saved in {}",
            index,
            dir.display()
        )),
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = NarrateConfig::load()?;
            println!("Configuration file: {:?}", NarrateConfig::config_path()?);
            println!();
            println!("max_chunk_length = {}", config.max_chunk_length);
            println!("delay_ms = {}", config.delay_ms);
            println!("request_timeout_secs = {}", config.request_timeout_secs);
            println!("model_id = \"{}\"", config.model_id);
            println!("voices.english = \"{}\"", config.voices.english);
            println!("voices.french = \"{}\"", config.voices.french);
            println!("provider.base_url = \"{}\"", config.provider.base_url);
            println!("provider.require_api_key = {}", config.provider.require_api_key);
            if config.provider.api_key.is_some() {
                println!("provider.api_key = (set)");
            } else {
                println!(
                    "provider.api_key = (none, using ${} if set)",
                    speech_client::providers::API_KEY_ENV_VAR
                );
            }
        }
        ConfigAction::SetVoice { language, voice_id } => {
            let mut config = NarrateConfig::load()?;
            config.voices.set_voice(*language, voice_id.clone());
            config.validate()?;
            config.save()?;
            println!("Voice for {} set to: {}", language, voice_id);
        }
        ConfigAction::SetModel { model_id } => {
            let mut config = NarrateConfig::load()?;
            config.model_id = model_id.clone();
            config.validate()?;
            config.save()?;
            println!("Model set to: {}", config.model_id);
        }
        ConfigAction::SetDelay { delay_ms } => {
            let mut config = NarrateConfig::load()?;
            config.delay_ms = *delay_ms;
            config.save()?;
            println!("Delay between requests set to: {} ms", config.delay_ms);
        }
        ConfigAction::SetMaxLength { max_length } => {
            let mut config = NarrateConfig::load()?;
            config.max_chunk_length = *max_length;
            config.validate()?;
            config.save()?;
            println!("Maximum chunk length set to: {}", config.max_chunk_length);
        }
    }
    Ok(())
}
