use adlib::{Chip, Player, catalog::Catalog};
use byteorder::{LittleEndian, WriteBytesExt};
use clap::Parser;
use std::io::{self, BufWriter, Write};

const RENDER_FRAMES: usize = 1024;

#[derive(Parser)]
struct Cli {
    /// Music catalog to read, for example gm/gm_tt.cat
    catalog: std::path::PathBuf,
    /// Entry to extract. Without it the entries are listed.
    entry: Option<usize>,
    /// List the catalog entries
    #[arg(short, long)]
    list: bool,
    /// Render the song to raw signed 16 bit little endian stereo PCM
    /// instead of writing the song data
    #[arg(long)]
    pcm: bool,
    /// Sample rate of the rendered PCM
    #[arg(short, long, default_value_t = 44100, value_parser = clap::value_parser!(u32).range(1..))]
    rate: u32,
    /// Stop rendering after this many seconds, songs may loop forever
    #[arg(long, default_value_t = 600)]
    max_seconds: u32,
}

pub fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    let mut catalog = Catalog::open(&args.catalog).map_err(|e| e.to_string())?;

    let entry = match args.entry {
        Some(entry) if !args.list => entry,
        _ => {
            for (i, entry) in catalog.entries().iter().enumerate() {
                println!("{i:3} {:<16} {:>6} bytes", entry.name, entry.length);
            }
            return Ok(());
        }
    };

    let data = catalog.read_data(entry).map_err(|e| e.to_string())?;
    let mut out = BufWriter::new(io::stdout().lock());
    if args.pcm {
        render_pcm(data, args.rate, args.max_seconds, &mut out)?;
    } else {
        out.write_all(&data).map_err(|e| e.to_string())?;
    }
    out.flush().map_err(|e| e.to_string())?;

    Ok(())
}

fn render_pcm(data: Vec<u8>, rate: u32, max_seconds: u32, out: &mut impl Write) -> Result<(), String> {
    let mut player = Player::new(Chip::new(rate), rate);
    player.load_song(data).map_err(|e| e.to_string())?;

    let max_frames = rate as u64 * max_seconds as u64;
    let mut frames = 0;
    let mut buffer = vec![0i16; RENDER_FRAMES * 2];
    while player.is_playing() && frames < max_frames {
        buffer.fill(0);
        player.render(&mut buffer);
        for &sample in &buffer {
            out.write_i16::<LittleEndian>(sample)
                .map_err(|e| e.to_string())?;
        }
        frames += RENDER_FRAMES as u64;
    }
    log::info!("rendered {frames} frames, song status {:?}", player.status());
    Ok(())
}
