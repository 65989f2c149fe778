//! Getting hold of an OpenGL context without opening a window.
//!
//! The shader builder only needs *a* current context to talk to the driver, so for checking
//! shader files a 1x1 headless context is plenty. `glutin` still wants an event loop to build
//! one, so that gets kept alive alongside it.

use glutin::dpi::PhysicalSize;
use glutin::event_loop::EventLoop;
use glutin::{Api, Context, ContextBuilder, GlRequest, PossiblyCurrent};

use shader::GlContext;

use crate::interface::config::CheckConfig;
use crate::interface::error::CliError;

pub struct OffscreenGl {
    context: Context<PossiblyCurrent>,
    _events: EventLoop<()>,
}

impl OffscreenGl {
    /// Creates a headless context with the requested version and profile and makes it current
    /// on this thread.
    pub fn create(config: &CheckConfig) -> Result<Self, CliError> {
        let events = EventLoop::new();

        let context = ContextBuilder::new()
            .with_gl(GlRequest::Specific(Api::OpenGl, config.version))
            .with_gl_profile(config.profile)
            .build_headless(&events, PhysicalSize::new(1, 1))?;

        let context = unsafe { context.make_current() }
            .map_err(|(_, e)| e)?;

        debug!("created headless OpenGL {}.{} {:?} context", config.version.0, config.version.1, config.profile);

        Ok(Self { context, _events: events })
    }

    /// Loads the GL function pointers for this context.
    pub fn load(&self) -> Result<GlContext, CliError> {
        // Safe because `self.context` was made current in `create` and nothing else here ever
        // makes another context current
        let gl = unsafe { GlContext::load_with(|s| self.context.get_proc_address(s) as *const _) };

        gl.ok_or(CliError::Loading)
    }
}
