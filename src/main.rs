//! Waaaa headless runner
//!
//! Drives the core at the fixed tick rate, fed by the microphone (with the
//! `capture` feature) or by a synthetic tone on its own producer thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use clap::Parser;

use waaaa::audio::{LogSink, RingWriter, ToneSource, ring};
use waaaa::consts::TICK_RATE;
use waaaa::level::{BuiltinLevels, LevelDir, LevelSource};
use waaaa::settings::ResponseCurve;
use waaaa::{Session, Settings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "waaaa")]
#[command(about = "Audio-reactive spectrum terrain with a bouncing ball", long_about = None)]
struct Args {
    /// Settings JSON (defaults when absent)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Directory with <name>.lvl files (built-in levels otherwise)
    #[arg(long, value_name = "DIR")]
    levels: Option<PathBuf>,

    /// Stop after this many ticks (runs until killed otherwise)
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Seed for the physics RNG
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Use the music response curve instead of the microphone one
    #[arg(long)]
    music: bool,

    /// Feed a synthetic tone at this frequency instead of capturing
    #[arg(long, value_name = "HZ")]
    tone: Option<f32>,

    /// Print one JSON frame per tick to stdout
    #[arg(long)]
    dump: bool,
}

const DEFAULT_TONE_HZ: f32 = 440.0;

/// Whatever is feeding the ring; dropped at shutdown
enum Input {
    #[cfg(feature = "capture")]
    Live(waaaa::audio::capture::Capture),
    Tone(JoinHandle<()>),
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> waaaa::Result<()> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let levels: Box<dyn LevelSource> = match &args.levels {
        Some(dir) => Box::new(LevelDir::new(dir)),
        None => Box::new(BuiltinLevels),
    };

    // One second of audio
    let (writer, reader) = ring::channel(settings.analyzer.sample_rate);
    let mut session = Session::new(settings.clone(), reader, levels, Box::new(LogSink), args.seed)?;
    if args.music {
        session.set_response(ResponseCurve::Music);
    }
    log::info!(
        "Response curve: {}",
        session.settings().analyzer.response.as_str()
    );

    let running = Arc::new(AtomicBool::new(true));
    let input = start_input(&args, writer, &settings, &running, &mut session);

    let tick_period = Duration::from_secs(1) / TICK_RATE;
    let mut next = Instant::now();
    let mut count = 0u64;

    while args.ticks.is_none_or(|limit| count < limit) {
        for event in session.tick() {
            log::debug!("{:?}", event);
        }

        if args.dump {
            match serde_json::to_string(&session.frame()) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Failed to serialize frame: {}", e),
            }
        }
        count += 1;

        next += tick_period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            // Fell behind, don't try to catch up
            next = now;
        }
    }

    running.store(false, Ordering::Relaxed);
    match input {
        #[cfg(feature = "capture")]
        Input::Live(capture) => drop(capture),
        Input::Tone(handle) => {
            if handle.join().is_err() {
                log::warn!("Tone thread panicked");
            }
        }
    }

    let scores = session.scores();
    log::info!(
        "Stopped after {} ticks in {} mode, score {}:{}",
        count,
        session.mode().as_str(),
        scores.left,
        scores.right
    );
    Ok(())
}

/// Pick and start the producer side
#[cfg(feature = "capture")]
fn start_input(
    args: &Args,
    writer: RingWriter,
    settings: &Settings,
    running: &Arc<AtomicBool>,
    session: &mut Session,
) -> Input {
    use waaaa::audio::capture::Capture;

    if let Some(freq) = args.tone {
        return Input::Tone(spawn_tone(writer, freq, settings.analyzer.sample_rate, running));
    }

    match Capture::start(writer.clone(), settings.analyzer.sample_rate as u32) {
        Ok(capture) => Input::Live(capture),
        Err(e) => {
            log::warn!("No live input ({}), running passive with a synthetic tone", e);
            session.set_input_available(false);
            Input::Tone(spawn_tone(
                writer,
                DEFAULT_TONE_HZ,
                settings.analyzer.sample_rate,
                running,
            ))
        }
    }
}

/// Pick and start the producer side
#[cfg(not(feature = "capture"))]
fn start_input(
    args: &Args,
    writer: RingWriter,
    settings: &Settings,
    running: &Arc<AtomicBool>,
    _session: &mut Session,
) -> Input {
    let freq = args.tone.unwrap_or(DEFAULT_TONE_HZ);
    Input::Tone(spawn_tone(writer, freq, settings.analyzer.sample_rate, running))
}

fn spawn_tone(
    writer: RingWriter,
    freq: f32,
    sample_rate: usize,
    running: &Arc<AtomicBool>,
) -> JoinHandle<()> {
    log::info!("Synthetic tone at {}Hz", freq);
    let running = Arc::clone(running);

    thread::spawn(move || {
        let mut tone = ToneSource::new(freq, sample_rate as u32).with_swell(8.0);
        let frames = sample_rate / TICK_RATE as usize;
        let period = Duration::from_secs(1) / TICK_RATE;

        while running.load(Ordering::Relaxed) {
            writer.push_fragment(&tone.next_fragment(frames), 2);
            thread::sleep(period);
        }
    })
}
