/// ASCII rasterizer used as the terminal render backend
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use glbview_core::{Camera, RenderBackend, Scene, Surface, Triangle};
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide, so the surface
/// is measured in half-cell pixels vertically
pub const CELL_ASPECT: u32 = 2;

pub struct AsciiRenderer {
    /// Surface size in pixels
    width: u32,
    height: u32,
    /// Grid size in cells
    cols: usize,
    rows: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut renderer = Self {
            width: 0,
            height: 0,
            cols: 0,
            rows: 0,
            depth_buffer: Vec::new(),
            char_buffer: Vec::new(),
        };
        renderer.set_size(width, height);
        renderer
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<char> {
        (col < self.cols && row < self.rows).then(|| self.char_buffer[row * self.cols + col])
    }

    pub fn filled_cells(&self) -> usize {
        self.char_buffer.iter().filter(|&&c| c != ' ').count()
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        camera: &Camera,
        tone: f32,
    ) {
        let mut screen = [(0.0f32, 0.0f32, 0.0f32); 3];
        for (slot, vertex) in screen.iter_mut().zip(triangle.vertices.iter()) {
            match camera.project_to_screen(&vertex.position, model, self.width, self.height) {
                Some((x, y, z)) => *slot = (x, y / CELL_ASPECT as f32, z),
                None => return,
            }
        }

        // Headlight shading: surfaces turned toward the camera are brightest
        let world_normal = (normal_matrix * triangle.shading_normal())
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros);
        let center = model.transform_point(&triangle.vertices[0].position);
        let to_camera = (camera.position - center)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros);
        let brightness = (world_normal.dot(&to_camera).abs() * tone).clamp(0.0, 1.0);

        let index = ((brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize).max(1);
        let character = LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)];

        self.rasterize_triangle(&screen, character);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let [v0, v1, v2] = *coords;

        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.cols as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.rows as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.cols + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.char_buffer.chunks(self.cols.max(1)) {
            for &c in row {
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    _ => Color::Cyan,
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderBackend for AsciiRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.cols = width as usize;
        self.rows = (height / CELL_ASPECT) as usize;
        let size = self.cols * self.rows;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
    }

    fn render(&mut self, _surface: &Surface, scene: &Scene, camera: &Camera) {
        self.clear();
        let Some(root) = scene.root.as_ref() else {
            return;
        };

        let model = root.matrix();
        let normal_matrix = model
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or_else(Matrix3::identity);
        let [r, g, b] = scene.ambient.radiance();

        for mesh in &root.model.meshes {
            let [mr, mg, mb, _] = mesh.base_color;
            // Luma of the lit base color scales the ramp
            let tone = (0.2126 * mr * r + 0.7152 * mg * g + 0.0722 * mb * b).clamp(0.2, 1.0);
            for triangle in &mesh.triangles {
                self.render_triangle(triangle, &model, &normal_matrix, camera, tone);
            }
        }
    }
}

/// Barycentric coordinates of a point in a 2D triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
