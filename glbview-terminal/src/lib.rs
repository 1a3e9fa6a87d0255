/// Terminal host for the model viewer
///
/// Runs the same viewer session as the browser build, rasterized to ASCII
/// and driven by keyboard and mouse through crossterm.
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
    tty::IsTty,
};
use glbview_core::{
    load_model, DragMode, Host, Model, Surface, Viewer, ViewerError, ViewerResult,
};
use log::{debug, info};
use std::io::{self, stdout, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::{AsciiRenderer, CELL_ASPECT};

/// Rows reserved above the picture for the status line
const STATUS_ROWS: u16 = 1;

/// Speed change per `[` / `]` key press
const SPEED_STEP: f32 = 0.5;

/// Surface size in pixels for a terminal of `cols` x `rows` cells
pub fn surface_size(cols: u16, rows: u16) -> (u32, u32) {
    let picture_rows = rows.saturating_sub(STATUS_ROWS);
    (cols as u32, picture_rows as u32 * CELL_ASPECT)
}

/// Pixel position of the centre of a terminal cell
pub fn cell_to_pixel(column: u16, row: u16) -> (f32, f32) {
    let row = row.saturating_sub(STATUS_ROWS) as f32;
    (column as f32 + 0.5, (row + 0.5) * CELL_ASPECT as f32)
}

pub struct TerminalHost;

impl Host for TerminalHost {
    type Backend = AsciiRenderer;

    fn render_backend_available(&self) -> bool {
        stdout().is_tty() && terminal::size().is_ok()
    }

    fn show_diagnostic(&mut self, _container_id: &str, message: &str) {
        eprintln!("{}", message);
    }

    fn viewport(&self) -> (u32, u32) {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        surface_size(cols, rows)
    }

    fn create_backend(&mut self, surface: &Surface) -> ViewerResult<AsciiRenderer> {
        Ok(AsciiRenderer::new(surface.width, surface.height))
    }
}

/// Read and decode the asset off the main thread
pub fn spawn_loader(path: String) -> Receiver<ViewerResult<Model>> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let result = std::fs::read(&path)
            .map_err(|e| ViewerError::Fetch(format!("{}: {}", path, e)))
            .and_then(|bytes| load_model(&bytes));
        // The app may already have quit
        let _ = sender.send(result);
    });
    receiver
}

pub struct TerminalApp {
    viewer: Viewer<AsciiRenderer>,
    asset: Option<Receiver<ViewerResult<Model>>>,
    started: Instant,
    running: bool,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(viewer: Viewer<AsciiRenderer>) -> Self {
        Self {
            viewer,
            asset: None,
            started: Instant::now(),
            running: true,
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn viewer(&self) -> &Viewer<AsciiRenderer> {
        &self.viewer
    }

    pub fn load(&mut self, path: &str) {
        info!("Loading {}", path);
        self.asset = Some(spawn_loader(path.to_string()));
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30);

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.poll_asset();
            self.viewer.frame(self.now_ms());
            self.draw()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    /// Hand a finished decode to the session, once
    pub fn poll_asset(&mut self) {
        let Some(receiver) = self.asset.as_ref() else {
            return;
        };
        match receiver.try_recv() {
            Ok(result) => {
                self.asset = None;
                self.viewer.on_asset_loaded(result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.asset = None;
                self.viewer
                    .on_asset_loaded(Err(ViewerError::Fetch("loader thread exited".to_string())));
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        let now = self.now_ms();
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(cols, rows) => {
                let (width, height) = surface_size(cols, rows);
                self.viewer.on_resize(width, height);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: f64) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('r') => self.viewer.reset_camera(now),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.viewer.zoom_in(now);
            }
            KeyCode::Char('-') => {
                self.viewer.zoom_out(now);
            }
            KeyCode::Char('a') => {
                let enabled = self.viewer.toggle_auto_rotate();
                debug!("Auto-rotate {}", if enabled { "on" } else { "off" });
            }
            KeyCode::Char('[') => {
                let speed = self.viewer.rig().auto_rotate_speed - SPEED_STEP;
                self.viewer.set_auto_rotate_speed(speed.max(0.0));
            }
            KeyCode::Char(']') => {
                let speed = self.viewer.rig().auto_rotate_speed + SPEED_STEP;
                self.viewer.set_auto_rotate_speed(speed);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: f64) {
        let (x, y) = cell_to_pixel(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollDown => {
                self.viewer.on_wheel(1.0, now);
            }
            MouseEventKind::ScrollUp => {
                self.viewer.on_wheel(-1.0, now);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.viewer.pointer_down(DragMode::Rotate, x, y)
            }
            MouseEventKind::Down(MouseButton::Right) => {
                self.viewer.pointer_down(DragMode::Pan, x, y)
            }
            MouseEventKind::Drag(_) => self.viewer.pointer_move(x, y),
            MouseEventKind::Up(_) => self.viewer.pointer_up(),
            _ => {}
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, STATUS_ROWS))?;
        self.viewer.backend().draw(&mut stdout)?;

        let status = if self.viewer.scene().root.is_some() {
            "model"
        } else {
            "loading"
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "glbview | {} | FPS: {:.1} | auto-rotate: {} ({:.1}) | r=reset +/-=zoom a=auto [ ]=speed q=quit",
                status,
                self.fps,
                if self.viewer.auto_rotate() { "on" } else { "off" },
                self.viewer.rig().auto_rotate_speed,
            )),
            ResetColor
        )?;

        stdout.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use glbview_core::ViewerConfig;

    fn app() -> TerminalApp {
        let (width, height) = surface_size(80, 25);
        let backend = AsciiRenderer::new(width, height);
        TerminalApp::new(Viewer::new(ViewerConfig::default(), backend, width, height))
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_surface_size_reserves_status_row() {
        assert_eq!(surface_size(80, 25), (80, 48));
        assert_eq!(surface_size(10, 0), (10, 0));
    }

    #[test]
    fn test_cell_to_pixel() {
        assert_eq!(cell_to_pixel(3, 1), (3.5, 1.0));
        assert_eq!(cell_to_pixel(0, 0), (0.5, 1.0));
    }

    #[test]
    fn test_zoom_keys() {
        let mut app = app();
        app.handle_event(key('-'));
        let target = app.viewer().camera_transition_target().unwrap();
        assert!((target.z - 5.5).abs() < 1e-4);

        app.handle_event(key('r'));
        let target = app.viewer().camera_transition_target().unwrap();
        assert!((target.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_collapsed_terminal_keeps_rendering() {
        let mut app = app();
        app.handle_event(Event::Resize(0, 0));
        app.viewer.frame(0.0);
        app.handle_event(Event::Resize(80, 25));
        app.viewer.frame(16.0);
        assert_eq!(app.viewer().frames(), 2);
        assert_eq!(app.viewer().surface().width, 80);
    }

    #[test]
    fn test_speed_keys() {
        let mut app = app();
        app.handle_event(key(']'));
        assert!((app.viewer().rig().auto_rotate_speed - 2.5).abs() < 1e-6);
        for _ in 0..10 {
            app.handle_event(key('['));
        }
        assert_eq!(app.viewer().rig().auto_rotate_speed, 0.0);
    }

    #[test]
    fn test_autorotate_and_quit_keys() {
        let mut app = app();
        app.handle_event(key('a'));
        assert!(app.viewer().auto_rotate());
        app.handle_event(key('q'));
        assert!(!app.running);
    }

    #[test]
    fn test_missing_asset_is_reported_and_session_continues() {
        let mut app = app();
        app.load("/nonexistent/glbview/model.glb");
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.asset.is_some() && Instant::now() < deadline {
            app.poll_asset();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(app.asset.is_none());
        assert!(app.viewer().scene().root.is_none());

        for i in 0..10 {
            app.viewer.frame(i as f64 * 16.0);
        }
        assert_eq!(app.viewer().frames(), 10);
    }
}
