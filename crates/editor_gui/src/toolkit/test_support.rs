//! Shared fixtures for toolkit tests

use std::sync::Arc;

use crate::config::IconRange;
use crate::font::{AtlasBuilder, FontAtlas, FontVariant, SyntheticGlyphs};
use crate::foundation::math::Vec2;
use crate::input::{InputSnapshot, MouseButton};

use super::context::Context;

/// Atlas with one 16 px box-glyph font: 8 px advance, 16 px lines
pub(crate) fn synthetic_atlas() -> Arc<FontAtlas> {
    let mut builder = AtlasBuilder::new(256);
    builder.add_face("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), 16.0, &[IconRange::new(0x20, 0x7e)]);
    Arc::new(builder.build().expect("synthetic atlas fits"))
}

pub(crate) fn context() -> Context {
    Context::new(synthetic_atlas(), 5.0)
}

/// 1280x720 snapshot without a mouse
pub(crate) fn frame() -> InputSnapshot {
    InputSnapshot::default()
}

pub(crate) fn run_frame<F: FnMut(&mut Context)>(ctx: &mut Context, snapshot: InputSnapshot, draw: &mut F) {
    ctx.new_frame(&snapshot);
    draw(ctx);
    ctx.end_frame();
}

/// Hover `pos`, press there, optionally drag to `drag_to`, then release
pub(crate) fn click_frames<F: FnMut(&mut Context)>(ctx: &mut Context, pos: Vec2, drag_to: Option<Vec2>, draw: &mut F) {
    let at = |p: Vec2| frame().with_mouse(p.x, p.y);
    run_frame(ctx, at(pos), draw);
    run_frame(ctx, at(pos).with_button(MouseButton::Left, true), draw);
    let end = drag_to.unwrap_or(pos);
    if drag_to.is_some() {
        run_frame(ctx, at(end).with_button(MouseButton::Left, true), draw);
    }
    run_frame(ctx, at(end), draw);
}
