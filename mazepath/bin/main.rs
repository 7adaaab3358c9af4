use std::{path::PathBuf, thread, time::Duration};

use anyhow::{bail, Context};
use log::info;
use mazepath::{
    parse_img, ChangeLog, Command, Controller, GridVariant, Point, SessionConfig, SessionState,
};
use serde::Deserialize;

/// Session settings plus the knobs that only matter to this driver
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    #[serde(flatten)]
    session: SessionConfig,
    /// Pause between ticks, 0 runs headless
    tick_millis: u64,
    /// Thresholded image to take the walls of an open grid from
    wall_image: Option<PathBuf>,
}

fn load_config(path: &str) -> Result<DemoConfig, anyhow::Error> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("could not read config {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path))
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => DemoConfig::default(),
    };

    let mut session = match &config.wall_image {
        Some(path) => {
            let img = image::open(path)
                .with_context(|| format!("could not open image {}", path.display()))?;
            Controller::with_grid(config.session.clone(), parse_img(&img)?)
        }
        None => Controller::new(config.session.clone())?,
    };
    let mut observer = ChangeLog::default();

    if session.grid().variant() == GridVariant::Open {
        // opposite corners, unless the grid came with its own endpoints
        if session.start().is_none() {
            session.handle(Command::PlaceStart(Point::new(0, 0)), &mut observer)?;
        }
        if session.end().is_none() {
            let corner = Point::new(session.grid().rows() - 1, session.grid().columns() - 1);
            session.handle(Command::PlaceEnd(corner), &mut observer)?;
        }
    }

    let mut ticks = 0;
    loop {
        let command = match session.state() {
            SessionState::Idle | SessionState::Ready => Command::Start,
            SessionState::Countdown { .. } | SessionState::Searching => Command::Advance,
            _ => break,
        };

        let before = session.state().clone();
        session.handle(command, &mut observer)?;
        if command == Command::Start && *session.state() == before {
            bail!("session did not leave {:?}", before);
        }

        ticks += 1;
        if config.tick_millis > 0 && command == Command::Advance {
            // clear the terminal and redraw
            print!("\x1B[2J\x1B[H{}", session.grid());
            thread::sleep(Duration::from_millis(config.tick_millis));
        }
    }

    println!("{}", session.grid());
    if let Some(finder) = session.finder() {
        println!("{}", finder.get_visited());
    }
    info!(
        "done after {} ticks and {} cell changes",
        ticks,
        observer.changes.len()
    );
    println!("{}", serde_json::to_string_pretty(session.state())?);

    Ok(())
}
