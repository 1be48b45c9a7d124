use sheetplay::playback::{AudioCommand, AudioSink, PlaybackScheduler, Playhead, PlayheadStore};
use sheetplay::{Config, MusicSheet, VelocityMapper};
use std::env;
use std::fs;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

const USAGE: &str = "Usage: sheetplay <input.txt> [--tempo BPM] [--loop] [--config FILE] [--json] [--play]";

struct CliOptions {
    input: String,
    tempo: Option<u32>,
    loop_enabled: bool,
    config: Option<String>,
    json: bool,
    play: bool,
}

impl CliOptions {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().skip(1).collect();
        let mut input = None;
        let mut tempo = None;
        let mut loop_enabled = false;
        let mut config = None;
        let mut json = false;
        let mut play = false;

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--tempo" => {
                    let value = iter.next().ok_or("--tempo requires a value")?;
                    let bpm: u32 = value
                        .parse()
                        .map_err(|_| format!("Invalid tempo '{}'", value))?;
                    if bpm == 0 {
                        return Err("Tempo must be positive".to_string());
                    }
                    tempo = Some(bpm);
                }
                "--config" => {
                    config = Some(iter.next().ok_or("--config requires a path")?);
                }
                "--loop" => loop_enabled = true,
                "--json" => json = true,
                "--play" => play = true,
                "--help" | "-h" => {
                    println!("{}", USAGE);
                    process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(format!("Unknown option: {}", other));
                }
                other => {
                    if input.replace(other.to_string()).is_some() {
                        return Err("Only one input file may be given".to_string());
                    }
                }
            }
        }

        Ok(Self {
            input: input.ok_or("Missing input file")?,
            tempo,
            loop_enabled,
            config,
            json,
            play,
        })
    }
}

/// Prints note commands as they are emitted.
struct ConsoleSink {
    started: Instant,
}

impl AudioSink for ConsoleSink {
    fn send(&mut self, at_ms: u64, command: AudioCommand) {
        let wall_ms = self.started.elapsed().as_millis() as u64;
        match command {
            AudioCommand::NoteOn { pitch, velocity } => {
                println!("{:>7} ms  on  {:<4} (midi {}, velocity {})", at_ms, pitch, pitch.midi(), velocity)
            }
            AudioCommand::NoteOff { pitch } => println!("{:>7} ms  off {:<4}", at_ms, pitch),
        }
        tracing::trace!(at_ms, wall_ms, "audio command");
    }
}

/// Prints a line whenever playback turns the page.
#[derive(Default)]
struct PageTracker {
    page: usize,
}

impl PlayheadStore for PageTracker {
    fn store(&mut self, playhead: Playhead) {
        if playhead.page != self.page {
            println!("-- page {} --", playhead.page + 1);
            self.page = playhead.page;
        }
    }
}

fn print_summary(sheet: &MusicSheet) {
    println!("{} - {}", sheet.title, sheet.artist);
    println!(
        "{} BPM, {} time, {:.1} s, {} page(s)",
        sheet.tempo,
        sheet.time_signature,
        sheet.total_duration,
        sheet.total_pages()
    );
    if !sheet.tags.is_empty() {
        let tags: Vec<&str> = sheet.tags.iter().map(String::as_str).collect();
        println!("tags: {}", tags.join(", "));
    }
    for skipped in &sheet.skipped {
        eprintln!(
            "warning: skipped '{}' at line {}, column {}",
            skipped.text, skipped.line, skipped.column
        );
    }
    for page in &sheet.pages {
        println!();
        println!("[page {}]", page.number);
        for measure in &page.measures {
            let notes: Vec<&str> = measure.notes.iter().map(|n| n.text.as_str()).collect();
            println!("  {:>3}: {}", measure.number, notes.join(" "));
        }
    }
}

fn play(sheet: &MusicSheet, config: &Config, loop_enabled: bool) {
    let started = Instant::now();
    let mut scheduler = PlaybackScheduler::for_sheet(
        sheet,
        config.layout,
        loop_enabled,
        VelocityMapper::new(config.velocity),
        ConsoleSink { started },
        PageTracker::default(),
    );

    scheduler.start(0);
    while let Some(tick) = scheduler.pending_tick() {
        let due = Duration::from_millis(tick.due_ms);
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            thread::sleep(wait);
        }
        let now = started.elapsed().as_millis() as u64;
        if !scheduler.fire(tick.token, now.max(tick.due_ms)) {
            tracing::debug!(due_ms = tick.due_ms, "tick superseded before it fired");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let options = match CliOptions::parse() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let mut config = match &options.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    config.playback.loop_enabled |= options.loop_enabled;

    let source = match fs::read_to_string(&options.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", options.input, e);
            process::exit(1);
        }
    };

    let mut sheet = match MusicSheet::build(options.input.clone(), source, &config) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    // --tempo wins over both the config file and the sheet's frontmatter
    if let Some(tempo) = options.tempo {
        sheet.tempo = tempo;
        sheet.total_duration = sheetplay::estimate_duration(&sheet.measures(), tempo);
    }

    if options.json {
        match serde_json::to_string_pretty(&sheet) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing sheet: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_summary(&sheet);
    }

    if options.play {
        println!();
        play(&sheet, &config, config.playback.loop_enabled);
    }
}
