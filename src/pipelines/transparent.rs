use crate::context::{BlendFactor, Capability, GraphicsContext};

/**
 * Switches alpha blending on or off for the next draw.
 *
 * Transparent materials blend with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`. Draw
 * order is the scene order, no back-to-front sorting happens.
 */
pub fn switch_blending<C: GraphicsContext + ?Sized>(ctx: &mut C, transparent: bool) {
    if transparent {
        ctx.enable(Capability::Blend);
        ctx.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    } else {
        ctx.disable(Capability::Blend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::headless::{Command, HeadlessContext};

    #[test]
    fn transparent_enables_alpha_blending() {
        let mut ctx = HeadlessContext::new();
        switch_blending(&mut ctx, true);
        assert_eq!(
            ctx.commands(),
            &[
                Command::Enable(Capability::Blend),
                Command::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha)
            ]
        );
    }

    #[test]
    fn opaque_disables_blending() {
        let mut ctx = HeadlessContext::new();
        switch_blending(&mut ctx, false);
        assert_eq!(ctx.commands(), &[Command::Disable(Capability::Blend)]);
    }
}
