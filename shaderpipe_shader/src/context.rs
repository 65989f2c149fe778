//! The GPU operations the program builder needs, behind a trait.
//!
//! OpenGL keeps its "current context" in thread-local driver state, so any function can reach
//! out and create shaders as long as some context happens to be current. That's convenient but
//! it hides the dependency. Here the builder takes a `&impl ShaderContext` instead, which makes
//! the precondition visible in the signature and lets the tests swap in a fake driver.
//!
//! The methods map one-to-one onto the GL entry points of the same name. Object names are plain
//! integers, with `0` meaning "no object", exactly as GL hands them out.

use crate::source::ShaderStageKind;

/// Name of a shader object. `0` is never a valid shader.
pub type ShaderId = u32;

/// Name of a program object. `0` is never a valid program.
pub type ProgramId = u32;

pub trait ShaderContext {
    /// Creates an empty shader object for `stage`, or returns `0` if the driver can't.
    /// `stage` is never [`ShaderStageKind::Unknown`].
    fn create_shader(&self, stage: ShaderStageKind) -> ShaderId;
    fn shader_source(&self, shader: ShaderId, source: &str);
    fn compile_shader(&self, shader: ShaderId);
    fn compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&self, shader: ShaderId);

    /// Creates an empty program object, or returns `0` if the driver can't.
    fn create_program(&self) -> ProgramId;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&self, program: ProgramId, shader: ShaderId);
    fn link_program(&self, program: ProgramId);
    fn link_status(&self, program: ProgramId) -> bool;

    /// Asks the driver whether the program can run given the current pipeline state.
    fn validate_program(&self, program: ProgramId);
    fn validate_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn use_program(&self, program: ProgramId);
    fn delete_program(&self, program: ProgramId);
}
