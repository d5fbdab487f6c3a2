//! Shader programs built from a single two-stage source file
//!
//! The file holds both stages. A line containing `#shader vertex` starts the
//! vertex stage and a line containing `#shader fragment` starts the fragment
//! stage. Anything before the first marker is ignored.

use glam::Mat4;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::fs;
use std::path::{Path, PathBuf};
use std::ptr;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader {path:?} has no {stage} stage")]
    MissingStage { path: PathBuf, stage: ShaderStage },
    #[error("{stage} stage source contains a NUL byte")]
    InteriorNul { stage: ShaderStage },
    #[error("{stage} stage failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link: {log}")]
    Link { log: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn gl_type(self) -> u32 {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Vertex and fragment sources split out of a shader file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgramSource {
    pub fn parse(source: &str, path: &Path) -> Result<Self, ShaderError> {
        let mut vertex: Option<String> = None;
        let mut fragment: Option<String> = None;
        let mut current: Option<ShaderStage> = None;

        for line in source.lines() {
            if line.contains("#shader") {
                if line.contains("vertex") {
                    current = Some(ShaderStage::Vertex);
                    vertex.get_or_insert_with(String::new);
                } else if line.contains("fragment") {
                    current = Some(ShaderStage::Fragment);
                    fragment.get_or_insert_with(String::new);
                }
                continue;
            }

            let target = match current {
                Some(ShaderStage::Vertex) => vertex.as_mut(),
                Some(ShaderStage::Fragment) => fragment.as_mut(),
                None => None,
            };
            if let Some(target) = target {
                target.push_str(line);
                target.push('\n');
            }
        }

        let missing = |stage| ShaderError::MissingStage { path: path.to_path_buf(), stage };
        Ok(Self {
            vertex: vertex.ok_or_else(|| missing(ShaderStage::Vertex))?,
            fragment: fragment.ok_or_else(|| missing(ShaderStage::Fragment))?,
        })
    }
}

/// Uniform name to location map; `-1` marks names the program lacks
#[derive(Debug, Default)]
pub struct UniformCache {
    locations: HashMap<String, i32>,
}

impl UniformCache {
    /// Cached location of `name`, calling `lookup` on first use only
    pub fn location(&mut self, name: &str, lookup: impl FnOnce(&CStr) -> i32) -> i32 {
        if let Some(&location) = self.locations.get(name) {
            return location;
        }

        let location = match CString::new(name) {
            Ok(c_name) => lookup(&c_name),
            Err(_) => -1,
        };
        if location == -1 {
            warn!("Uniform '{}' not found in shader program", name);
        }
        self.locations.insert(name.to_string(), location);
        location
    }
}

/// Linked GL program
pub struct Shader {
    id: u32,
    path: PathBuf,
    uniforms: UniformCache,
}

impl Shader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|source| ShaderError::Io { path: path.to_path_buf(), source })?;
        let source = ShaderProgramSource::parse(&source, path)?;

        let id = unsafe { Self::create_program(&source)? };
        debug!("Linked shader program {} from {:?}", id, path);

        Ok(Self {
            id,
            path: path.to_path_buf(),
            uniforms: UniformCache::default(),
        })
    }

    unsafe fn create_program(source: &ShaderProgramSource) -> Result<u32, ShaderError> {
        let vs = Self::compile_shader(ShaderStage::Vertex, &source.vertex)?;
        let fs = match Self::compile_shader(ShaderStage::Fragment, &source.fragment) {
            Ok(fs) => fs,
            Err(e) => {
                gl::DeleteShader(vs);
                return Err(e);
            }
        };

        let program = gl::CreateProgram();
        gl::AttachShader(program, vs);
        gl::AttachShader(program, fs);
        gl::LinkProgram(program);

        gl::DeleteShader(vs);
        gl::DeleteShader(fs);

        let mut success = 0;
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
        if success == 0 {
            let log = Self::program_info_log(program);
            gl::DeleteProgram(program);
            error!("Shader program link failed: {}", log);
            return Err(ShaderError::Link { log });
        }

        gl::ValidateProgram(program);
        Ok(program)
    }

    unsafe fn compile_shader(stage: ShaderStage, source: &str) -> Result<u32, ShaderError> {
        let c_str = CString::new(source).map_err(|_| ShaderError::InteriorNul { stage })?;
        let shader = gl::CreateShader(stage.gl_type());
        gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
        gl::CompileShader(shader);

        let mut success = 0;
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
        if success == 0 {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buffer = vec![0u8; len.max(0) as usize];
            gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buffer.as_mut_ptr() as *mut _);
            let log = String::from_utf8_lossy(&buffer).trim_end_matches('\0').to_string();
            gl::DeleteShader(shader);
            error!("Failed to compile {} shader: {}", stage, log);
            return Err(ShaderError::Compile { stage, log });
        }

        Ok(shader)
    }

    unsafe fn program_info_log(program: u32) -> String {
        let mut len = 0;
        gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        let mut buffer = vec![0u8; len.max(0) as usize];
        gl::GetProgramInfoLog(program, len, ptr::null_mut(), buffer.as_mut_ptr() as *mut _);
        String::from_utf8_lossy(&buffer).trim_end_matches('\0').to_string()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bind(&self) {
        unsafe { gl::UseProgram(self.id) };
    }

    pub fn unbind(&self) {
        unsafe { gl::UseProgram(0) };
    }

    pub fn set_uniform_1i(&mut self, name: &str, value: i32) {
        let location = self.uniform_location(name);
        unsafe { gl::Uniform1i(location, value) };
    }

    pub fn set_uniform_mat4f(&mut self, name: &str, matrix: &Mat4) {
        let location = self.uniform_location(name);
        let columns = matrix.to_cols_array();
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, columns.as_ptr()) };
    }

    fn uniform_location(&mut self, name: &str) -> i32 {
        let program = self.id;
        self.uniforms
            .location(name, |c_name| unsafe { gl::GetUniformLocation(program, c_name.as_ptr()) })
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        debug!("Deleting shader program {}", self.id);
        unsafe { gl::DeleteProgram(self.id) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "\
#shader vertex
#version 330 core
layout(location = 0) in vec4 position;
void main() { gl_Position = position; }

#shader fragment
#version 330 core
out vec4 color;
void main() { color = vec4(1.0); }
";

    #[test]
    fn test_parse_splits_stages() {
        let source = ShaderProgramSource::parse(BASIC, Path::new("basic.shader")).unwrap();

        assert!(source.vertex.starts_with("#version 330 core\n"));
        assert!(source.vertex.contains("gl_Position"));
        assert!(!source.vertex.contains("#shader"));
        assert!(!source.vertex.contains("color = vec4"));

        assert!(source.fragment.starts_with("#version 330 core\n"));
        assert!(source.fragment.contains("out vec4 color;"));
        assert!(!source.fragment.contains("gl_Position"));
    }

    #[test]
    fn test_parse_ignores_preamble() {
        let text = format!("// comment before any stage\n{}", BASIC);
        let source = ShaderProgramSource::parse(&text, Path::new("basic.shader")).unwrap();
        assert!(!source.vertex.contains("comment"));
        assert!(!source.fragment.contains("comment"));
    }

    #[test]
    fn test_parse_accepts_fragment_first() {
        let text = "#shader fragment\nF\n#shader vertex\nV\n";
        let source = ShaderProgramSource::parse(text, Path::new("x.shader")).unwrap();
        assert_eq!(source.vertex, "V\n");
        assert_eq!(source.fragment, "F\n");
    }

    #[test]
    fn test_parse_missing_fragment_stage() {
        let err = ShaderProgramSource::parse("#shader vertex\nvoid main() {}\n", Path::new("v.shader"))
            .unwrap_err();
        assert!(matches!(
            err,
            ShaderError::MissingStage { stage: ShaderStage::Fragment, .. }
        ));
    }

    #[test]
    fn test_parse_empty_file() {
        let err = ShaderProgramSource::parse("", Path::new("empty.shader")).unwrap_err();
        assert!(matches!(err, ShaderError::MissingStage { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn test_bundled_shader_declares_uniforms() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("res/shaders/basic.shader");
        let text = fs::read_to_string(&path).unwrap();
        let source = ShaderProgramSource::parse(&text, &path).unwrap();

        assert!(source.vertex.contains("uniform mat4 uMVP;"));
        assert!(source.fragment.contains("uniform sampler2D uTexture;"));
    }

    #[test]
    fn test_uniform_lookup_is_cached() {
        let mut cache = UniformCache::default();
        let mut lookups = 0;

        for _ in 0..3 {
            let location = cache.location("uMVP", |name| {
                assert_eq!(name.to_str().unwrap(), "uMVP");
                lookups += 1;
                4
            });
            assert_eq!(location, 4);
        }
        assert_eq!(lookups, 1);
    }

    #[test]
    fn test_absent_uniform_resolves_to_minus_one_once() {
        let mut cache = UniformCache::default();
        let mut lookups = 0;

        assert_eq!(cache.location("uMissing", |_| { lookups += 1; -1 }), -1);
        assert_eq!(cache.location("uMissing", |_| { lookups += 1; -1 }), -1);
        assert_eq!(lookups, 1);
    }

    #[test]
    fn test_uniform_name_with_nul_is_absent() {
        let mut cache = UniformCache::default();
        let location = cache.location("bad\0name", |_| panic!("must not query GL"));
        assert_eq!(location, -1);
    }
}
