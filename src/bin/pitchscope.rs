use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use pitchscope_core::dsp::analyzer::Analyzer;
use pitchscope_core::dsp::coeffs::Quality;
use pitchscope_core::dsp::tuner::{freq_to_midi_cents, YinDetector};
use pitchscope_core::dsp::wav::{load_audio, write_wav_mono};
use pitchscope_core::{AnalysisConfig, PitchscopeError};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Resample an audio file and print its reassigned spectrum peaks and pitch")]
struct Args {
    /// Input audio (.wav or .mp3)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Path to an analysis config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Analysis sample rate in Hz (overrides config)
    #[arg(long)]
    target_rate: Option<f64>,

    /// Anti-aliasing quality: fast, median or best (overrides config)
    #[arg(long, value_parser = parse_quality)]
    quality: Option<Quality>,

    /// Remove spectral images when upsampling (overrides config)
    #[arg(long, default_value_t = false)]
    image_rejection: bool,

    /// Write the resampled mono signal to a WAV file
    #[arg(long)]
    resampled_out: Option<PathBuf>,

    /// Also print the loudest reassigned frequency of each frame
    #[arg(long, default_value_t = false)]
    peaks: bool,
}

fn parse_quality(name: &str) -> Result<Quality, String> {
    Quality::parse(name).ok_or_else(|| format!("unknown quality '{name}' (fast, median, best)"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("pitchscope=info,pitchscope_core=info"))
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

    if let Err(err) = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
    {
        eprintln!("[pitchscope] failed to initialise tracing subscriber: {err}");
    }
}

fn load_config(args: &Args) -> Result<AnalysisConfig, PitchscopeError> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(pitchscope_core::error::AudioError::from)?;
            AnalysisConfig::from_json(&text)?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(rate) = args.target_rate {
        config.target_rate = rate;
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if args.image_rejection {
        config.image_rejection = true;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), PitchscopeError> {
    let config = load_config(&args)?;
    let audio = load_audio(&args.input)?;
    info!(
        input = %args.input.display(),
        sample_rate = audio.sample_rate,
        seconds = audio.samples.len() as f64 / audio.sample_rate,
        "decoded input"
    );

    let target_rate = config.target_rate;
    let mut yin = YinDetector::new(target_rate, config.fft_size);
    let mut analyzer = Analyzer::new(config)?;
    let resampled = analyzer.resample(&audio.samples, audio.sample_rate)?;

    if let Some(path) = &args.resampled_out {
        write_wav_mono(path, &resampled, target_rate.round() as u32)?;
        info!(path = %path.display(), samples = resampled.len(), "wrote resampled wav");
    }

    let analysis = analyzer.analyse(&resampled, target_rate, Some(&mut yin))?;
    let voiced = analysis.columns.iter().filter(|c| c.pitch.is_some()).count();
    info!(frames = analysis.columns.len(), voiced, "analysis complete");

    for column in &analysis.columns {
        let pitch = match column.pitch {
            Some(freq) => {
                let (note, cents) = freq_to_midi_cents(freq, 440.0);
                format!("{freq:8.2} Hz  midi {note:3} {cents:+5.1}c")
            }
            None => "       -".to_string(),
        };
        if args.peaks {
            let peak = column
                .peak_frequency(analysis.sample_rate)
                .map(|f| format!("{f:8.2} Hz"))
                .unwrap_or_else(|| "       -   ".to_string());
            println!("{:8.3}s  peak {peak}  pitch {pitch}", column.time);
        } else {
            println!("{:8.3}s  pitch {pitch}", column.time);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
