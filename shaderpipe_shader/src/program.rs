//! Compiling stages and linking them into programs.
//!
//! GL objects here are owned Rust values. A [`CompiledStage`] deletes its shader object when
//! dropped and a [`ShaderProgram`] deletes its program object, so none of the early returns in
//! [`ProgramBuilder`] can leak either one.
//!
//! A build goes `Start -> StagesCompiling -> Linking` and ends in either `Ready` or `Failed`.
//! The first stage that fails to compile ends the build; nothing gets linked around a missing
//! stage. A failed build is never retried, the caller has to fix the source and build again.

use std::cell::Cell;
use std::fmt;
use std::mem;

use crate::context::{ProgramId, ShaderContext, ShaderId};
use crate::error::ShaderError;
use crate::source::{ShaderSourceDocument, ShaderStageKind};

/// Stages every drawable program needs.
const REQUIRED_STAGES: [ShaderStageKind; 2] = [ShaderStageKind::Vertex, ShaderStageKind::Fragment];

/// Stages that are only compiled when the document has source for them.
const OPTIONAL_STAGES: [ShaderStageKind; 1] = [ShaderStageKind::Geometry];

/// A shader object that compiled successfully and hasn't been linked yet.
///
/// Stages are single-use. Linking consumes them, and once they're detached from the program the
/// shader object is deleted.
pub struct CompiledStage<'c, C: ShaderContext> {
    ctx: &'c C,
    id: ShaderId,
    stage: ShaderStageKind,
}

impl<'c, C: ShaderContext> CompiledStage<'c, C> {
    pub fn id(&self) -> ShaderId { self.id }

    pub fn stage(&self) -> ShaderStageKind { self.stage }
}

impl<'c, C: ShaderContext> fmt::Debug for CompiledStage<'c, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledStage ( {} shader #{} )", self.stage, self.id)
    }
}

impl<'c, C: ShaderContext> Drop for CompiledStage<'c, C> {
    fn drop(&mut self) {
        trace!("deleting {} shader #{}", self.stage, self.id);
        self.ctx.delete_shader(self.id);
    }
}

/// A linked program, ready to draw with.
///
/// The program object is deleted when this is dropped, unless the caller takes the raw handle
/// with [`ShaderProgram::into_raw`].
pub struct ShaderProgram<'c, C: ShaderContext> {
    ctx: &'c C,
    id: ProgramId,
}

impl<'c, C: ShaderContext> ShaderProgram<'c, C> {
    pub fn id(&self) -> ProgramId { self.id }

    /// Makes this the program used for subsequent draw calls.
    pub fn set_used(&self) {
        self.ctx.use_program(self.id);
    }

    /// Gives up ownership of the program object. Deleting it is now the caller's job.
    pub fn into_raw(self) -> ProgramId {
        let id = self.id;
        mem::forget(self);
        id
    }
}

impl<'c, C: ShaderContext> fmt::Debug for ShaderProgram<'c, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShaderProgram ( #{} )", self.id)
    }
}

impl<'c, C: ShaderContext> Drop for ShaderProgram<'c, C> {
    fn drop(&mut self) {
        trace!("deleting program #{}", self.id);
        self.ctx.delete_program(self.id);
    }
}

/// Where the most recent build got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Start,
    StagesCompiling,
    Linking,
    Ready,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildState::Start => "start",
            BuildState::StagesCompiling => "compiling stages",
            BuildState::Linking => "linking",
            BuildState::Ready => "ready",
            BuildState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Turns stage sources into a linked program against one GL context.
pub struct ProgramBuilder<'c, C: ShaderContext> {
    ctx: &'c C,
    validate: bool,
    state: Cell<BuildState>,
}

impl<'c, C: ShaderContext> ProgramBuilder<'c, C> {
    pub fn new(ctx: &'c C) -> Self {
        Self {
            ctx,
            validate: true,
            state: Cell::new(BuildState::Start),
        }
    }

    /// Whether to run `glValidateProgram` after linking. On by default.
    ///
    /// Validation checks the program against the *current* pipeline state, so on a core profile
    /// with no vertex array bound it can fail a perfectly good program.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state.get()
    }

    fn enter(&self, state: BuildState) {
        debug!("program build: {} -> {}", self.state.get(), state);
        self.state.set(state);
    }

    /// Records how a build step ended.
    fn settle<T>(&self, result: Result<T, ShaderError>) -> Result<T, ShaderError> {
        self.enter(if result.is_ok() { BuildState::Ready } else { BuildState::Failed });
        result
    }

    /// Compiles one stage.
    ///
    /// Empty source is handed to the driver like anything else, which will then refuse to
    /// compile it. On failure the shader object is deleted before returning.
    pub fn compile_stage(&self, stage: ShaderStageKind, source: &str)
        -> Result<CompiledStage<'c, C>, ShaderError>
    {
        if stage == ShaderStageKind::Unknown {
            error!("cannot compile source with no stage tag");
            return Err(ShaderError::UnsupportedStage(stage));
        }

        let id = self.ctx.create_shader(stage);
        if id == 0 {
            error!("driver could not create a {} shader", stage);
            return Err(ShaderError::ObjectCreation("shader"));
        }

        // From here on, dropping `compiled` deletes the shader object
        let compiled = CompiledStage { ctx: self.ctx, id, stage };

        self.ctx.shader_source(id, source);
        self.ctx.compile_shader(id);

        if !self.ctx.compile_status(id) {
            let log = self.ctx.shader_info_log(id);
            error!("Failed to compile {} shader!\n{}", stage, log);
            return Err(ShaderError::StageCompileFailed { stage, log });
        }

        debug!("compiled {} shader #{}", stage, id);
        Ok(compiled)
    }

    /// Links compiled stages into a program.
    ///
    /// There has to be at least a vertex and a fragment stage. Whatever happens, every stage is
    /// detached and deleted by the time this returns, and a program that fails to link (or to
    /// validate, when validation is on) is deleted too.
    pub fn link(&self, stages: Vec<CompiledStage<'c, C>>) -> Result<ShaderProgram<'c, C>, ShaderError> {
        self.enter(BuildState::Linking);
        let result = self.link_stages(stages);
        self.settle(result)
    }

    fn link_stages(&self, stages: Vec<CompiledStage<'c, C>>) -> Result<ShaderProgram<'c, C>, ShaderError> {
        for required in REQUIRED_STAGES.iter() {
            if !stages.iter().any(|s| s.stage == *required) {
                error!("cannot link a program without a {} shader", required);
                return Err(ShaderError::MissingStage(*required));
            }
        }

        let id = self.ctx.create_program();
        if id == 0 {
            error!("driver could not create a program");
            return Err(ShaderError::ObjectCreation("program"));
        }

        let program = ShaderProgram { ctx: self.ctx, id };

        for stage in &stages {
            self.ctx.attach_shader(id, stage.id);
        }

        self.ctx.link_program(id);

        for stage in &stages {
            self.ctx.detach_shader(id, stage.id);
        }
        drop(stages);

        if !self.ctx.link_status(id) {
            let log = self.ctx.program_info_log(id);
            error!("Failed to link program #{}!\n{}", id, log);
            return Err(ShaderError::LinkFailed { log });
        }

        if self.validate {
            self.ctx.validate_program(id);

            if !self.ctx.validate_status(id) {
                let log = self.ctx.program_info_log(id);
                error!("Program #{} failed validation!\n{}", id, log);
                return Err(ShaderError::ValidateFailed { log });
            }
        }

        debug!("linked program #{}", id);
        Ok(program)
    }

    /// Compiles and links every stage in `document`.
    ///
    /// Vertex and fragment are always compiled, even if empty. Geometry is only compiled if the
    /// document has source for it.
    pub fn build(&self, document: &ShaderSourceDocument) -> Result<ShaderProgram<'c, C>, ShaderError> {
        self.enter(BuildState::Start);
        self.enter(BuildState::StagesCompiling);

        let optional = OPTIONAL_STAGES.iter().filter(|stage| !document.is_empty(**stage));

        let mut stages = Vec::with_capacity(REQUIRED_STAGES.len() + OPTIONAL_STAGES.len());
        for stage in REQUIRED_STAGES.iter().chain(optional) {
            match self.compile_stage(*stage, document.source(*stage)) {
                Ok(compiled) => stages.push(compiled),
                Err(e) => return self.settle(Err(e)),
            }
        }

        self.link(stages)
    }

    /// Builds a vertex + fragment program straight from two source strings.
    pub fn build_from_sources(&self, vertex: &str, fragment: &str)
        -> Result<ShaderProgram<'c, C>, ShaderError>
    {
        let mut document = ShaderSourceDocument::new();
        for line in vertex.lines() {
            document.push_line(ShaderStageKind::Vertex, line);
        }
        for line in fragment.lines() {
            document.push_line(ShaderStageKind::Fragment, line);
        }

        self.build(&document)
    }
}
