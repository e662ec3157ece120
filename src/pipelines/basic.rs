use crate::context::{Capability, DepthFunc, GraphicsContext};

/// Opaque geometry state: depth testing with less-or-equal so that coplanar
/// redraws still pass.
pub fn enable_depth_test<C: GraphicsContext + ?Sized>(ctx: &mut C) {
    ctx.enable(Capability::DepthTest);
    ctx.depth_func(DepthFunc::LessEqual);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::headless::{Command, HeadlessContext};

    #[test]
    fn depth_test_uses_less_equal() {
        let mut ctx = HeadlessContext::new();
        enable_depth_test(&mut ctx);
        assert_eq!(
            ctx.commands(),
            &[
                Command::Enable(Capability::DepthTest),
                Command::DepthFunc(DepthFunc::LessEqual)
            ]
        );
    }
}
