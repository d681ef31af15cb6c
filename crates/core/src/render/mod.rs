//! Rendering backend abstraction and the off-screen render context.

pub mod software;

use crate::{scene::Scene, view::HeightDerivation, Result, SceneError};

pub use software::SoftwareEngine;

/// Rendered image, tightly packed RGB8, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SceneError::msg(format!(
                "frame of {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }
}

/// Rendering collaborator. A target must be created before `draw` is called.
pub trait RenderEngine: HeightDerivation {
    fn create_target(&mut self, width: u32, height: u32) -> Result<()>;

    /// Must tolerate being called when no target exists.
    fn release_target(&mut self);

    /// Renders the scene into the current target and reads it back.
    fn draw(&mut self, scene: &Scene) -> Result<Frame>;
}

/// Scoped off-screen render target. Dropping the context releases the
/// target, whatever path the pipeline leaves by.
pub struct RenderContext<'e> {
    engine: &'e mut dyn RenderEngine,
    width: u32,
    height: u32,
}

impl<'e> RenderContext<'e> {
    pub fn acquire(engine: &'e mut dyn RenderEngine, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SceneError::RenderContext(format!(
                "target size {width}x{height} is empty"
            )));
        }
        engine.create_target(width, height)?;
        tracing::debug!(width, height, "render context acquired");
        Ok(Self {
            engine,
            width,
            height,
        })
    }

    /// Single render pass over the assembled scene.
    pub fn render(&mut self, scene: &Scene) -> Result<Frame> {
        tracing::info!(width = self.width, height = self.height, "rendering scene");
        let frame = self.engine.draw(scene)?;
        if (frame.width, frame.height) != (self.width, self.height) {
            return Err(SceneError::msg(format!(
                "engine returned a {}x{} frame for a {}x{} target",
                frame.width, frame.height, self.width, self.height
            )));
        }
        Ok(frame)
    }
}

impl HeightDerivation for RenderContext<'_> {
    fn derive_height(&mut self, scene: &Scene) -> Result<f32> {
        self.engine.derive_height(scene)
    }
}

impl Drop for RenderContext<'_> {
    fn drop(&mut self) {
        self.engine.release_target();
        tracing::debug!("render context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        created: usize,
        released: usize,
        fail_create: bool,
        fail_draw: bool,
    }

    impl HeightDerivation for Counting {
        fn derive_height(&mut self, _scene: &Scene) -> Result<f32> {
            Ok(42.0)
        }
    }

    impl RenderEngine for Counting {
        fn create_target(&mut self, _width: u32, _height: u32) -> Result<()> {
            if self.fail_create {
                return Err(SceneError::RenderContext("no display".into()));
            }
            self.created += 1;
            Ok(())
        }

        fn release_target(&mut self) {
            self.released += 1;
        }

        fn draw(&mut self, _scene: &Scene) -> Result<Frame> {
            if self.fail_draw {
                return Err(SceneError::msg("draw failed"));
            }
            Frame::new(2, 1, vec![0; 6])
        }
    }

    #[test]
    fn context_releases_on_drop() {
        let mut engine = Counting::default();
        {
            let mut ctx = RenderContext::acquire(&mut engine, 2, 1).unwrap();
            let frame = ctx.render(&Scene::default()).unwrap();
            assert_eq!(frame.pixel(1, 0), [0, 0, 0]);
        }
        assert_eq!((engine.created, engine.released), (1, 1));
    }

    #[test]
    fn context_releases_when_render_fails() {
        let mut engine = Counting {
            fail_draw: true,
            ..Counting::default()
        };
        {
            let mut ctx = RenderContext::acquire(&mut engine, 2, 1).unwrap();
            assert!(ctx.render(&Scene::default()).is_err());
        }
        assert_eq!(engine.released, 1);
    }

    #[test]
    fn failed_creation_yields_no_context() {
        let mut engine = Counting {
            fail_create: true,
            ..Counting::default()
        };
        let err = RenderContext::acquire(&mut engine, 2, 1).err().unwrap();
        assert!(matches!(err, SceneError::RenderContext(_)));
        assert_eq!(engine.released, 0);
    }

    #[test]
    fn empty_target_is_rejected_before_reaching_the_engine() {
        let mut engine = Counting::default();
        assert!(RenderContext::acquire(&mut engine, 0, 10).is_err());
        assert_eq!(engine.created, 0);
    }

    #[test]
    fn mismatched_frame_size_is_an_error() {
        let mut engine = Counting::default();
        let mut ctx = RenderContext::acquire(&mut engine, 4, 4).unwrap();
        assert!(ctx.render(&Scene::default()).is_err());
    }

    #[test]
    fn frame_rejects_wrong_buffer_length() {
        assert!(Frame::new(2, 2, vec![0; 11]).is_err());
    }
}
