//! Loading and building GLSL shader programs.
//!
//! A shader file here is one plain text file holding several pipeline stages, each introduced by
//! a tag line such as `#shader vertex`. The [`source`] module splits such a file into per-stage
//! buffers, and the [`program`] module compiles those buffers and links them into a program
//! object, returning a structured [`ShaderError`] instead of printing and carrying on.
//!
//! Nothing in here creates a GL context. Whoever owns the window (or offscreen surface) makes a
//! context current and hands the builder a [`ShaderContext`], which for real hardware is a
//! [`GlContext`].

#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;

pub mod context;
pub mod error;
pub mod opengl;
pub mod program;
pub mod source;

#[cfg(test)]
mod fake;

pub use context::{ProgramId, ShaderContext, ShaderId};
pub use error::ShaderError;
pub use opengl::GlContext;
pub use program::{BuildState, CompiledStage, ProgramBuilder, ShaderProgram};
pub use source::{ShaderSourceDocument, ShaderStageKind};
