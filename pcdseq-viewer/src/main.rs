//! Point cloud sequence viewer
//!
//! Opens a 3D window on the first frame of a sequence, plus an image window
//! when an image source is given, and steps through the frames with the
//! arrow keys.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Args;
use log::error;
use pcdseq_io::FrameCatalog;
use pcdseq_visualization::{SequenceController, SequenceWindows};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let catalog = FrameCatalog::discover(&args.source, &args.extension)?;
    if catalog.is_empty() {
        anyhow::bail!("Point cloud doesn't exist in given path.");
    }

    let config = args.sequence_config();
    let with_image = config.image_root.is_some();
    let mut controller = SequenceController::new(catalog, config)?;

    let mut windows = SequenceWindows::new(args.window_config(), args.render_config(), with_image)
        .context("cannot open the viewer windows")?;

    controller
        .start(&mut windows.targets())
        .context("cannot show the first frame")?;

    if let Some(camera) = &args.camera {
        controller.load_camera_pose(camera, &mut windows.targets());
    }

    windows.run(controller)?;
    Ok(())
}
