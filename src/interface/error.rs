use shader::ShaderError;
use thiserror::Error;

/// Why a command failed.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("could not create an OpenGL context: {0}")]
    Creation(#[from] glutin::CreationError),

    #[error("could not make the OpenGL context current: {0}")]
    Context(#[from] glutin::ContextError),

    #[error("the OpenGL shader functions did not load")]
    Loading,

    #[error("{0}")]
    Config(String),
}
