use crate::{
    context::{Capability, GraphicsContext, Winding},
    data_structures::material::Side,
};

/// Configure face culling for a material side.
///
/// `Double` draws both faces. `Front` treats counter-clockwise triangles as
/// front faces and `Back` clockwise ones; in both cases the other winding is
/// culled.
pub fn switch_culling<C: GraphicsContext + ?Sized>(ctx: &mut C, side: Side) {
    match side {
        Side::Double => ctx.disable(Capability::CullFace),
        Side::Front => {
            ctx.enable(Capability::CullFace);
            ctx.front_face(Winding::CounterClockwise);
        }
        Side::Back => {
            ctx.enable(Capability::CullFace);
            ctx.front_face(Winding::Clockwise);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::headless::{Command, HeadlessContext};

    fn commands_for(side: Side) -> Vec<Command> {
        let mut ctx = HeadlessContext::new();
        switch_culling(&mut ctx, side);
        ctx.take_commands()
    }

    #[test]
    fn double_sided_disables_culling() {
        assert_eq!(
            commands_for(Side::Double),
            vec![Command::Disable(Capability::CullFace)]
        );
    }

    #[test]
    fn single_sided_selects_winding() {
        assert_eq!(
            commands_for(Side::Front),
            vec![
                Command::Enable(Capability::CullFace),
                Command::FrontFace(Winding::CounterClockwise)
            ]
        );
        assert_eq!(
            commands_for(Side::Back),
            vec![
                Command::Enable(Capability::CullFace),
                Command::FrontFace(Winding::Clockwise)
            ]
        );
    }
}
