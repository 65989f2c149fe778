//! A pretend GL driver for the tests.
//!
//! It "compiles" a shader by checking that the source isn't blank and that every statement line
//! ends the way GLSL statements do, which is enough to catch a missing semicolon. Linking needs
//! a vertex and a fragment stage attached, and it can be told to fail linking or validation.
//! Every object it hands out is tracked, so tests can check that nothing was leaked.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use crate::context::{ProgramId, ShaderContext, ShaderId};
use crate::source::ShaderStageKind;

#[derive(Debug)]
struct FakeShader {
    stage: ShaderStageKind,
    source: String,
    compiled: Option<Result<(), String>>,
    deleted: bool,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: BTreeSet<ShaderId>,
    linked: Option<Result<(), String>>,
    validated: Option<bool>,
}

#[derive(Debug, Default)]
pub struct FakeContext {
    next_id: Cell<u32>,
    shaders: RefCell<BTreeMap<ShaderId, FakeShader>>,
    programs: RefCell<BTreeMap<ProgramId, FakeProgram>>,
    in_use: Cell<ProgramId>,
    pub fail_link: Cell<bool>,
    pub fail_validation: Cell<bool>,
    pub fail_object_creation: Cell<bool>,
}

fn check_source(stage: ShaderStageKind, source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err(format!("0:1: error: empty {} shader", stage));
    }

    for (n, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        if !line.ends_with(|c| c == ';' || c == '{' || c == '}' || c == ')') {
            return Err(format!("0:{}: error: syntax error, expected ';'", n + 1));
        }
    }

    Ok(())
}

impl FakeContext {
    pub fn new() -> Self {
        let ctx = Self::default();
        ctx.next_id.set(1);
        ctx
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Shaders that have been created and not deleted yet.
    pub fn live_shaders(&self) -> usize {
        self.shaders.borrow().values().filter(|s| !s.deleted).count()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.borrow().len()
    }

    pub fn attached_to(&self, program: ProgramId) -> usize {
        self.programs.borrow().get(&program).map_or(0, |p| p.attached.len())
    }

    pub fn program_in_use(&self) -> ProgramId {
        self.in_use.get()
    }
}

impl ShaderContext for FakeContext {
    fn create_shader(&self, stage: ShaderStageKind) -> ShaderId {
        if self.fail_object_creation.get() || stage == ShaderStageKind::Unknown {
            return 0;
        }

        let id = self.next_id();
        self.shaders.borrow_mut().insert(id, FakeShader {
            stage,
            source: String::new(),
            compiled: None,
            deleted: false,
        });
        id
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
            s.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        if let Some(s) = self.shaders.borrow_mut().get_mut(&shader) {
            s.compiled = Some(check_source(s.stage, &s.source));
        }
    }

    fn compile_status(&self, shader: ShaderId) -> bool {
        self.shaders.borrow().get(&shader)
            .map_or(false, |s| matches!(s.compiled, Some(Ok(()))))
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        match self.shaders.borrow().get(&shader).and_then(|s| s.compiled.clone()) {
            Some(Err(log)) => log,
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut shaders = self.shaders.borrow_mut();
        let still_attached = self.programs.borrow().values().any(|p| p.attached.contains(&shader));

        // GL defers deleting an attached shader until it's detached
        if let Some(s) = shaders.get_mut(&shader) {
            s.deleted = true;
        }
        if !still_attached {
            shaders.remove(&shader);
        }
    }

    fn create_program(&self) -> ProgramId {
        if self.fail_object_creation.get() {
            return 0;
        }

        let id = self.next_id();
        self.programs.borrow_mut().insert(id, FakeProgram::default());
        id
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.insert(shader);
        }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.remove(&shader);
        }

        let mut shaders = self.shaders.borrow_mut();
        if shaders.get(&shader).map_or(false, |s| s.deleted) {
            shaders.remove(&shader);
        }
    }

    fn link_program(&self, program: ProgramId) {
        let shaders = self.shaders.borrow();
        let mut programs = self.programs.borrow_mut();
        let p = match programs.get_mut(&program) {
            Some(p) => p,
            None => return,
        };

        let stages: Vec<_> = p.attached.iter()
            .filter_map(|id| shaders.get(id))
            .filter(|s| matches!(s.compiled, Some(Ok(()))))
            .map(|s| s.stage)
            .collect();

        p.linked = Some(
            if self.fail_link.get() {
                Err("error: fragment input v_color not written by vertex shader".to_owned())
            } else if !stages.contains(&ShaderStageKind::Vertex) {
                Err("error: no vertex shader attached".to_owned())
            } else if !stages.contains(&ShaderStageKind::Fragment) {
                Err("error: no fragment shader attached".to_owned())
            } else {
                Ok(())
            }
        );
    }

    fn link_status(&self, program: ProgramId) -> bool {
        self.programs.borrow().get(&program)
            .map_or(false, |p| matches!(p.linked, Some(Ok(()))))
    }

    fn validate_program(&self, program: ProgramId) {
        let fail = self.fail_validation.get();
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.validated = Some(!fail && matches!(p.linked, Some(Ok(()))));
        }
    }

    fn validate_status(&self, program: ProgramId) -> bool {
        self.programs.borrow().get(&program).and_then(|p| p.validated).unwrap_or(false)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let programs = self.programs.borrow();
        let p = match programs.get(&program) {
            Some(p) => p,
            None => return String::new(),
        };

        match (&p.linked, p.validated) {
            (Some(Err(log)), _) => log.clone(),
            (_, Some(false)) => "validation failed: no vertex array object bound".to_owned(),
            _ => String::new(),
        }
    }

    fn use_program(&self, program: ProgramId) {
        self.in_use.set(program);
    }

    fn delete_program(&self, program: ProgramId) {
        let removed = self.programs.borrow_mut().remove(&program);

        // Deleting a program detaches whatever is still attached to it
        if let Some(p) = removed {
            let mut shaders = self.shaders.borrow_mut();
            for id in p.attached {
                if shaders.get(&id).map_or(false, |s| s.deleted) {
                    shaders.remove(&id);
                }
            }
        }

        if self.in_use.get() == program {
            self.in_use.set(0);
        }
    }
}
