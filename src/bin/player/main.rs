use adlib::{AdlibDriver, Mixer, SongInfo, catalog::Catalog};
use clap::Parser;
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

const VOLUME_STEP: u8 = 8;

#[derive(Parser)]
struct Cli {
    /// Music catalog to play from, for example gm/gm_tt.cat
    catalog: PathBuf,
    /// Catalog entry to start with
    #[arg(short, long, default_value_t = 0)]
    song: usize,
    /// Mixer rate to ask the audio device for
    #[arg(short, long, default_value_t = 44100)]
    rate: u32,
    /// Music volume, 0 to 127
    #[arg(short, long, default_value_t = 127)]
    volume: u8,
}

pub fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let names: Vec<String> = Catalog::open(&args.catalog)
        .map_err(|e| e.to_string())?
        .entries()
        .iter()
        .map(|entry| entry.name.clone())
        .collect();
    if names.is_empty() {
        return Err(format!("no songs in {}", args.catalog.display()));
    }

    let mut driver = adlib::new(args.rate).map_err(|e| e.to_string())?;
    driver.start().map_err(|e| e.to_string())?;
    driver.set_volume(args.volume);

    enable_raw_mode().map_err(|e| e.to_string())?;
    print!("Press 'q' to quit, 'n'/'p' for the next/previous song, 's' to stop, '+'/'-' for the volume\r\n");
    let result = run(&mut driver, &args.catalog, &names, args.song.min(names.len() - 1));
    disable_raw_mode().map_err(|e| e.to_string())?;
    result
}

fn run<M: Mixer>(
    driver: &mut AdlibDriver<M>,
    catalog: &Path,
    names: &[String],
    first: usize,
) -> Result<(), String> {
    let mut current = first;
    // false after 's', keeps the finished song from advancing
    let mut auto_advance = play(driver, catalog, names, current);
    loop {
        if !event::poll(Duration::from_millis(100)).map_err(|e| e.to_string())? {
            if auto_advance && !driver.is_song_playing() {
                current = (current + 1) % names.len();
                auto_advance = play(driver, catalog, names, current);
            }
            continue;
        }

        let evt = event::read().map_err(|e| e.to_string())?;
        if let Event::Key(key) = evt {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('n') => {
                        current = (current + 1) % names.len();
                        auto_advance = play(driver, catalog, names, current);
                    }
                    KeyCode::Char('p') => {
                        current = (current + names.len() - 1) % names.len();
                        auto_advance = play(driver, catalog, names, current);
                    }
                    KeyCode::Char('s') => {
                        driver.stop_song();
                        auto_advance = false;
                        print!("stopped\r\n");
                    }
                    KeyCode::Char('+') => {
                        driver.set_volume(driver.volume().saturating_add(VOLUME_STEP));
                        print!("volume {}\r\n", driver.volume());
                    }
                    KeyCode::Char('-') => {
                        driver.set_volume(driver.volume().saturating_sub(VOLUME_STEP));
                        print!("volume {}\r\n", driver.volume());
                    }
                    _ => { /* ignore */ }
                }
            }
        }
    }
    driver.stop().map_err(|e| e.to_string())
}

// Returns whether the song plays.
fn play<M: Mixer>(
    driver: &mut AdlibDriver<M>,
    catalog: &Path,
    names: &[String],
    index: usize,
) -> bool {
    let info = SongInfo {
        filename: catalog.to_path_buf(),
        cat_index: index,
    };
    match driver.play_song(&info) {
        Ok(()) => {
            print!("{index:3} {}\r\n", names[index]);
            true
        }
        Err(e) => {
            print!("{index:3} {} cannot be played: {e}\r\n", names[index]);
            false
        }
    }
}
