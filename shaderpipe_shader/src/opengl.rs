//! [`ShaderContext`] on top of real OpenGL.
//!
//! These are thin wrappers around raw `gl` calls. All the unsafety lives here: once a context is
//! current on this thread and the function pointers are loaded, each call below is a plain
//! driver call with integer arguments, so the wrappers themselves can be safe.

use std::ffi::{c_void, CStr};
use std::marker::PhantomData;

use gl;
use gl::types::*;

use crate::context::{ProgramId, ShaderContext, ShaderId};
use crate::source::ShaderStageKind;

/// The OpenGL context that's current on this thread.
///
/// A context is only ever current on one thread at a time, so this is neither `Send` nor `Sync`.
/// Holding one is the proof that `gl` has been loaded and that it's safe to make GL calls.
pub struct GlContext {
    _not_send: PhantomData<*const ()>,
}

impl GlContext {
    /// Loads the GL function pointers through `loader` (usually the windowing library's
    /// `get_proc_address`). Returns `None` if the shader and program entry points didn't load.
    ///
    /// # Safety
    ///
    /// A GL context must be current on the calling thread, and must stay current for as long as
    /// the returned value or anything built with it is alive.
    pub unsafe fn load_with<F>(loader: F) -> Option<Self>
        where F: FnMut(&'static str) -> *const c_void
    {
        gl::load_with(loader);

        if gl::CreateShader::is_loaded() && gl::CreateProgram::is_loaded() {
            Some(Self { _not_send: PhantomData })
        } else {
            None
        }
    }

    /// The `GL_VERSION` string, e.g. `"3.3.0 NVIDIA 440.100"`.
    pub fn version(&self) -> Option<String> {
        get_string(gl::VERSION)
    }

    /// The `GL_SHADING_LANGUAGE_VERSION` string.
    pub fn shading_language_version(&self) -> Option<String> {
        get_string(gl::SHADING_LANGUAGE_VERSION)
    }
}

fn stage_enum(stage: ShaderStageKind) -> Option<GLenum> {
    match stage {
        ShaderStageKind::Vertex => Some(gl::VERTEX_SHADER),
        ShaderStageKind::Fragment => Some(gl::FRAGMENT_SHADER),
        ShaderStageKind::Geometry => Some(gl::GEOMETRY_SHADER),
        ShaderStageKind::Unknown => None,
    }
}

fn get_string(name: GLenum) -> Option<String> {
    let ptr = unsafe { gl::GetString(name) };
    if ptr.is_null() {
        return None;
    }

    let s = unsafe { CStr::from_ptr(ptr as *const _) };
    Some(s.to_string_lossy().into_owned())
}

/// Makes a buffer of `len` spaces for GL to write a log into.
fn create_ws_buffer_with_len(len: usize) -> Vec<u8> {
    vec![b' '; len]
}

/// Reads an info log that's `len` bytes long (including the NUL) using one of the
/// `glGet*InfoLog` functions.
fn read_info_log<F>(len: GLint, fetch: F) -> String
    where F: FnOnce(GLsizei, *mut GLsizei, *mut GLchar)
{
    if len <= 0 {
        return String::new();
    }

    let mut buf = create_ws_buffer_with_len(len as usize);
    let mut written: GLsizei = 0;
    fetch(len, &mut written, buf.as_mut_ptr() as *mut GLchar);
    buf.truncate(written.max(0) as usize);

    String::from_utf8_lossy(&buf).trim_end().to_owned()
}

impl ShaderContext for GlContext {
    fn create_shader(&self, stage: ShaderStageKind) -> ShaderId {
        match stage_enum(stage) {
            Some(kind) => unsafe { gl::CreateShader(kind) },
            None => 0,
        }
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        // Passing the length means the source doesn't need to be NUL-terminated
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe {
            gl::ShaderSource(shader, 1, &ptr, &len);
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        unsafe { gl::CompileShader(shader) }
    }

    fn compile_status(&self, shader: ShaderId) -> bool {
        let mut success = 0;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success) };
        success != 0
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let mut len = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };

        read_info_log(len, |size, written, buf| unsafe {
            gl::GetShaderInfoLog(shader, size, written, buf)
        })
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> ProgramId {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: ProgramId) {
        unsafe { gl::LinkProgram(program) }
    }

    fn link_status(&self, program: ProgramId) -> bool {
        let mut success = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut success) };
        success != 0
    }

    fn validate_program(&self, program: ProgramId) {
        unsafe { gl::ValidateProgram(program) }
    }

    fn validate_status(&self, program: ProgramId) -> bool {
        let mut success = 0;
        unsafe { gl::GetProgramiv(program, gl::VALIDATE_STATUS, &mut success) };
        success != 0
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let mut len = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };

        read_info_log(len, |size, written, buf| unsafe {
            gl::GetProgramInfoLog(program, size, written, buf)
        })
    }

    fn use_program(&self, program: ProgramId) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program) }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stage_enums() {
        assert_eq!(stage_enum(ShaderStageKind::Vertex), Some(gl::VERTEX_SHADER));
        assert_eq!(stage_enum(ShaderStageKind::Fragment), Some(gl::FRAGMENT_SHADER));
        assert_eq!(stage_enum(ShaderStageKind::Geometry), Some(gl::GEOMETRY_SHADER));
        assert_eq!(stage_enum(ShaderStageKind::Unknown), None);
    }

    #[test]
    fn info_log_is_trimmed_to_what_was_written() {
        let log = read_info_log(32, |size, written, buf| unsafe {
            assert_eq!(size, 32);
            let msg = b"0:1: error\n\0";
            std::ptr::copy_nonoverlapping(msg.as_ptr() as *const GLchar, buf, msg.len());
            *written = (msg.len() - 1) as GLsizei;
        });

        assert_eq!(log, "0:1: error");
    }

    #[test]
    fn empty_info_log_skips_the_driver() {
        let log = read_info_log(0, |_, _, _| panic!("should not be called"));
        assert_eq!(log, "");
    }
}
