use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::source::ShaderStageKind;

/// Everything that can go wrong between reading a shader file and getting a usable program.
///
/// None of these are fatal. The caller can fix the source and call the builder again, or fall
/// back to some default program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not read shader file {}: {source}", .path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot compile a stage of kind {0}")]
    UnsupportedStage(ShaderStageKind),

    #[error("the driver failed to create a {0} object")]
    ObjectCreation(&'static str),

    #[error("failed to compile {stage} shader:\n{log}")]
    StageCompileFailed { stage: ShaderStageKind, log: String },

    #[error("program has no {0} stage")]
    MissingStage(ShaderStageKind),

    #[error("failed to link program:\n{log}")]
    LinkFailed { log: String },

    #[error("program failed validation:\n{log}")]
    ValidateFailed { log: String },
}

impl ShaderError {
    /// The stage a failure belongs to, when it belongs to one in particular.
    pub fn stage(&self) -> Option<ShaderStageKind> {
        match self {
            ShaderError::UnsupportedStage(stage)
            | ShaderError::StageCompileFailed { stage, .. }
            | ShaderError::MissingStage(stage) => Some(*stage),
            _ => None,
        }
    }

    /// The driver's diagnostic log, for the errors that come with one.
    pub fn log(&self) -> Option<&str> {
        match self {
            ShaderError::StageCompileFailed { log, .. }
            | ShaderError::LinkFailed { log }
            | ShaderError::ValidateFailed { log } => Some(log),
            _ => None,
        }
    }
}
