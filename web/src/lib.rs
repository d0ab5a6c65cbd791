use clap::Parser;
use minegrid_core::{DEFAULT_COLUMNS, DEFAULT_ROWS, GridConfig};
use wasm_bindgen::prelude::*;

mod board;
mod canvas;
mod pointer;
mod preview;

pub use board::{GridCanvas, GridCanvasProps};
pub use canvas::{CanvasSurface, CanvasSymbol, backing_size, classic_overlays};
pub use pointer::{MouseButtons, phase_for, to_core_event};
pub use preview::echo_action;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Number of rows on the preview board
    #[arg(short, long, default_value_t = DEFAULT_ROWS)]
    rows: usize,

    /// Number of columns on the preview board
    #[arg(short, long, default_value_t = DEFAULT_COLUMNS)]
    columns: usize,

    /// Fixed grid line width instead of the automatic one
    #[arg(long)]
    line_width: Option<f64>,
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let args = Args::try_parse_from(location_hash.split(['#', '&'])).expect("Could not parse args");
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).expect("Error initializing logger");
    }
    log::debug!("args: {args:?}");

    let config = GridConfig {
        rows: args.rows,
        columns: args.columns,
        line_width: args.line_width,
        ..GridConfig::default()
    };

    let root = document()
        .get_element_by_id("minegrid")
        .expect("Could not find id=\"minegrid\" element");

    log::debug!("App started");
    yew::Renderer::<preview::Preview>::with_root_and_props(root, preview::PreviewProps { config })
        .render();
}
