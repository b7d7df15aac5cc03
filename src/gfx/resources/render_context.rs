//! Render context
//!
//! Owns the GPU seam and the two shared caches. Everything that allocates or
//! draws takes a `&mut RenderContext`; fields are public so callers can borrow
//! the GPU and a cache at the same time.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gl_utils::Gpu;

use super::shader_program::ShaderCache;
use super::texture_resource::TextureRegistry;

pub struct RenderContext {
    pub gpu: Rc<dyn Gpu>,
    pub shaders: ShaderCache,
    pub textures: TextureRegistry,
}

impl RenderContext {
    pub fn new(gpu: Rc<dyn Gpu>) -> Self {
        Self {
            gpu,
            shaders: ShaderCache::new(),
            textures: TextureRegistry::new(),
        }
    }

    pub fn gpu(&self) -> &dyn Gpu {
        self.gpu.as_ref()
    }

    /// Promotes a pending GL error into [`Error::Gl`].
    pub fn check_error(&self) -> Result<()> {
        match self.gpu.get_error() {
            0 => Ok(()),
            code => Err(Error::Gl(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl_utils::recording::RecordingGpu;

    #[test]
    fn test_check_error_reports_pending_code_once() {
        let gpu = Rc::new(RecordingGpu::new());
        let ctx = RenderContext::new(gpu.clone());

        assert!(ctx.check_error().is_ok());
        gpu.raise_error(0x0502);
        assert!(matches!(ctx.check_error(), Err(Error::Gl(0x0502))));
        assert!(ctx.check_error().is_ok());
    }
}
