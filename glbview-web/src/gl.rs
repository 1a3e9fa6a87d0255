/// WebGL2 render backend: flat ambient shading of the attached model
use glbview_core::{Camera, RenderBackend, Scene, Surface, ViewerError, ViewerResult};
use log::{debug, error};
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
uniform mat4 u_view_projection;
uniform mat4 u_model;
void main() {
    gl_Position = u_view_projection * u_model * vec4(a_position, 1.0);
}
"#;

// Linear base color lit by the ambient term, encoded to sRGB for display
const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
uniform vec4 u_base_color;
uniform vec3 u_ambient;
out vec4 frag_color;
void main() {
    vec3 linear = clamp(u_base_color.rgb * u_ambient, 0.0, 1.0);
    frag_color = vec4(pow(linear, vec3(1.0 / 2.2)), u_base_color.a);
}
"#;

struct GpuMesh {
    vao: WebGlVertexArrayObject,
    // Held so the buffer outlives the VAO that references it
    _buffer: WebGlBuffer,
    vertex_count: i32,
    base_color: [f32; 4],
}

struct Uniforms {
    view_projection: Option<WebGlUniformLocation>,
    model: Option<WebGlUniformLocation>,
    base_color: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
}

pub struct WebGlRenderer {
    canvas: HtmlCanvasElement,
    gl: Gl,
    program: WebGlProgram,
    uniforms: Uniforms,
    meshes: Option<Vec<GpuMesh>>,
}

impl WebGlRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> ViewerResult<Self> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| ViewerError::Backend(format!("{:?}", e)))?
            .ok_or_else(|| ViewerError::CapabilityUnavailable("no webgl2 context".to_string()))?
            .dyn_into::<Gl>()
            .map_err(|_| ViewerError::Backend("context is not WebGL2".to_string()))?;

        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;

        let uniforms = Uniforms {
            view_projection: gl.get_uniform_location(&program, "u_view_projection"),
            model: gl.get_uniform_location(&program, "u_model"),
            base_color: gl.get_uniform_location(&program, "u_base_color"),
            ambient: gl.get_uniform_location(&program, "u_ambient"),
        };

        gl.enable(Gl::DEPTH_TEST);

        Ok(Self {
            canvas,
            gl,
            program,
            uniforms,
            meshes: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Upload the model the first time it shows up in the scene
    fn ensure_uploaded(&mut self, scene: &Scene) {
        if self.meshes.is_some() {
            return;
        }
        let Some(root) = scene.root.as_ref() else {
            return;
        };

        let mut uploaded = Vec::with_capacity(root.model.meshes.len());
        for mesh in &root.model.meshes {
            let positions: Vec<f32> = mesh
                .triangles
                .iter()
                .flat_map(|t| t.vertices.iter())
                .flat_map(|v| [v.position.x, v.position.y, v.position.z])
                .collect();

            match upload_positions(&self.gl, &positions) {
                Ok((vao, buffer)) => uploaded.push(GpuMesh {
                    vao,
                    _buffer: buffer,
                    vertex_count: (positions.len() / 3) as i32,
                    base_color: mesh.base_color,
                }),
                Err(e) => error!("Skipping mesh upload: {}", e),
            }
        }
        debug!("Uploaded {} meshes", uploaded.len());
        self.meshes = Some(uploaded);
    }
}

impl RenderBackend for WebGlRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", width));
        let _ = style.set_property("height", &format!("{}px", height));
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn render(&mut self, surface: &Surface, scene: &Scene, camera: &Camera) {
        let bg = surface.background;
        self.gl.clear_color(bg.r, bg.g, bg.b, 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        self.ensure_uploaded(scene);
        let (Some(root), Some(meshes)) = (scene.root.as_ref(), self.meshes.as_ref()) else {
            return;
        };

        let gl = &self.gl;
        gl.use_program(Some(&self.program));
        gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.view_projection.as_ref(),
            false,
            camera.view_projection().as_slice(),
        );
        gl.uniform_matrix4fv_with_f32_array(self.uniforms.model.as_ref(), false, root.matrix().as_slice());
        gl.uniform3fv_with_f32_array(self.uniforms.ambient.as_ref(), &scene.ambient.radiance());

        for mesh in meshes {
            gl.bind_vertex_array(Some(&mesh.vao));
            gl.uniform4fv_with_f32_array(self.uniforms.base_color.as_ref(), &mesh.base_color);
            gl.draw_arrays(Gl::TRIANGLES, 0, mesh.vertex_count);
        }
        gl.bind_vertex_array(None);
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> ViewerResult<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| ViewerError::Backend("unable to create shader".to_string()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        Err(ViewerError::Backend(
            gl.get_shader_info_log(&shader)
                .unwrap_or_else(|| "unknown shader compile error".to_string()),
        ))
    }
}

fn link_program(gl: &Gl, vertex: &WebGlShader, fragment: &WebGlShader) -> ViewerResult<WebGlProgram> {
    let program = gl
        .create_program()
        .ok_or_else(|| ViewerError::Backend("unable to create program".to_string()))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        Err(ViewerError::Backend(
            gl.get_program_info_log(&program)
                .unwrap_or_else(|| "unknown program link error".to_string()),
        ))
    }
}

fn upload_positions(gl: &Gl, positions: &[f32]) -> ViewerResult<(WebGlVertexArrayObject, WebGlBuffer)> {
    let vao = gl
        .create_vertex_array()
        .ok_or_else(|| ViewerError::Backend("unable to create vertex array".to_string()))?;
    let buffer = gl
        .create_buffer()
        .ok_or_else(|| ViewerError::Backend("unable to create buffer".to_string()))?;

    gl.bind_vertex_array(Some(&vao));
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
    let array = js_sys::Float32Array::from(positions);
    gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);
    gl.vertex_attrib_pointer_with_i32(0, 3, Gl::FLOAT, false, 0, 0);
    gl.enable_vertex_attrib_array(0);
    gl.bind_vertex_array(None);

    Ok((vao, buffer))
}
