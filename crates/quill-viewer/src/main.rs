mod app;
mod font;
mod frame;
mod offscreen;
mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use quill_engine::logging::{init_logging, LoggingConfig};

const FONT_SIZE_PX: f32 = 24.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mode = parse_args().context("usage: quill-viewer [--offscreen <out.png>]")?;

    let bytes = font::load_system_font()?;
    let font = font::AtlasFont::build(&bytes, FONT_SIZE_PX)?;

    match mode {
        Mode::Windowed => app::run(font),
        Mode::Offscreen(path) => offscreen::render_to_png(&font, &path),
    }
}

enum Mode {
    Windowed,
    Offscreen(PathBuf),
}

fn parse_args() -> Result<Mode> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(Mode::Windowed),
        Some("--offscreen") => {
            let path = args.next().context("--offscreen requires an output path")?;
            Ok(Mode::Offscreen(PathBuf::from(path)))
        }
        Some(other) => anyhow::bail!("unknown argument: {other}"),
    }
}
