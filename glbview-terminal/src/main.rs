/// glbview terminal - preview a glTF/GLB/STL model as ASCII
///
/// Usage: glbview-terminal [PATH]   (default: assets/model.glb)
///
/// Controls:
///   - Left drag: orbit, right drag: pan, wheel: zoom
///   - + / -: zoom in / out, r: reset camera
///   - a: toggle auto-rotate, [ / ]: auto-rotate speed
///   - q / Esc: quit
///
/// Logs go to stderr; redirect it (`2>glbview.log`) to keep the picture clean.
use glbview_core::{boot, ViewerConfig};
use glbview_terminal::{TerminalApp, TerminalHost};
use std::io;
use std::process::ExitCode;

const DEFAULT_ASSET_PATH: &str = "assets/model.glb";

fn main() -> io::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let asset_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ASSET_PATH.to_string());
    let config = ViewerConfig {
        asset_path,
        ..ViewerConfig::default()
    };

    let mut host = TerminalHost;
    let viewer = match boot(&mut host, config) {
        Ok(Some(viewer)) => viewer,
        Ok(None) => return Ok(ExitCode::FAILURE),
        Err(e) => {
            log::error!("Failed to start viewer: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let asset_path = viewer.config().asset_path.clone();
    let mut app = TerminalApp::new(viewer);
    app.load(&asset_path);
    app.run()?;

    Ok(ExitCode::SUCCESS)
}
