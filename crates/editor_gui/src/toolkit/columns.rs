//! Column sets: proportional horizontal regions within a window

use crate::foundation::math::{Rect, Vec2};

use super::context::Context;
use super::id::WidgetId;
use super::style::ColorRole;

/// An open column set
#[derive(Debug, Clone)]
pub(crate) struct ColumnsState {
    pub(crate) id: WidgetId,
    pub(crate) count: usize,
    /// Normalized boundaries, `count + 1` entries from 0 to 1
    pub(crate) offsets: Vec<f32>,
    pub(crate) bordered: bool,
    pub(crate) current: usize,
    pub(crate) host_min_x: f32,
    pub(crate) host_max_x: f32,
    pub(crate) start_y: f32,
    pub(crate) row_start_y: f32,
    pub(crate) row_bottom: f32,
    saved_base_x: f32,
    saved_indent: f32,
    saved_work_max_x: f32,
}

/// Boundaries for `weights`, split equally when they do not sum to a positive value
pub(crate) fn normalized_offsets(weights: &[f32]) -> Vec<f32> {
    let weights: Vec<f32> = weights.iter().map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 }).collect();
    let total: f32 = weights.iter().sum();
    let count = weights.len();
    let mut offsets = Vec::with_capacity(count + 1);
    offsets.push(0.0);
    let mut acc = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        acc += if total > 0.0 { weight / total } else { 1.0 / count as f32 };
        offsets.push(if i + 1 == count { 1.0 } else { acc });
    }
    offsets
}

impl ColumnsState {
    fn bounds(&self, index: usize, half_spacing: f32) -> (f32, f32) {
        let width = self.host_max_x - self.host_min_x;
        let mut min_x = self.host_min_x + self.offsets[index] * width;
        let mut max_x = self.host_min_x + self.offsets[index + 1] * width;
        if index > 0 {
            min_x += half_spacing;
        }
        if index + 1 < self.count {
            max_x -= half_spacing;
        }
        (min_x, max_x.max(min_x))
    }
}

impl Context {
    /// Split the available width into columns proportional to `weights`
    ///
    /// # Panics
    /// If `weights` is empty.
    pub fn begin_columns(&mut self, id: &str, weights: &[f32], bordered: bool) {
        assert!(!weights.is_empty(), "begin_columns('{}') needs at least one column", id);
        let id = self.get_id(id);
        let window = self.current_window_mut();
        let dc = &window.dc;
        let state = ColumnsState {
            id,
            count: weights.len(),
            offsets: normalized_offsets(weights),
            bordered,
            current: 0,
            host_min_x: dc.line_start_x(),
            host_max_x: dc.work_max_x,
            start_y: dc.pos.y,
            row_start_y: dc.pos.y,
            row_bottom: dc.pos.y,
            saved_base_x: dc.base_x,
            saved_indent: dc.indent,
            saved_work_max_x: dc.work_max_x,
        };
        window.columns.push(state);
        self.enter_column();
    }

    fn column_state(&self, caller: &str) -> &ColumnsState {
        match self.current_window().columns.last() {
            Some(state) => state,
            None => panic!("{} called outside columns", caller),
        }
    }

    fn column_state_mut(&mut self, caller: &str) -> &mut ColumnsState {
        match self.current_window_mut().columns.last_mut() {
            Some(state) => state,
            None => panic!("{} called outside columns", caller),
        }
    }

    fn enter_column(&mut self) {
        let half_spacing = self.style.item_spacing.x * 0.5;
        let window = self.current_window_mut();
        let Some(state) = window.columns.last() else {
            return;
        };
        let (min_x, max_x) = state.bounds(state.current, half_spacing);
        let y = state.row_start_y;
        let clip = window.draw_list.clip_rect();
        let column_clip = Rect::new(Vec2::new(min_x, clip.min.y), Vec2::new(max_x, clip.max.y));
        window.draw_list.push_clip_rect(column_clip, true);

        let dc = &mut window.dc;
        dc.base_x = min_x;
        dc.indent = 0.0;
        dc.work_max_x = max_x;
        dc.pos = Vec2::new(min_x, y);
        dc.prev_line_end = dc.pos;
        dc.curr_line_height = 0.0;
    }

    fn leave_column(&mut self) {
        let spacing = self.style.item_spacing.y;
        let window = self.current_window_mut();
        window.draw_list.pop_clip_rect();
        let bottom = window.dc.pos.y - spacing;
        if let Some(state) = window.columns.last_mut() {
            state.row_bottom = state.row_bottom.max(bottom).max(state.row_start_y);
        }
    }

    /// Move to the next column, wrapping to a new row after the last one
    ///
    /// # Panics
    /// Outside a column set.
    pub fn next_column(&mut self) {
        self.column_state("next_column");
        self.leave_column();
        let spacing = self.style.item_spacing.y;
        let state = self.column_state_mut("next_column");
        state.current += 1;
        if state.current == state.count {
            state.current = 0;
            state.row_start_y = state.row_bottom + spacing;
            state.row_bottom = state.row_start_y;
        }
        self.enter_column();
    }

    /// Close the innermost column set; the cursor continues below its tallest column
    ///
    /// # Panics
    /// Outside a column set.
    pub fn end_columns(&mut self) {
        self.column_state("end_columns");
        self.leave_column();
        let separator = self.color(ColorRole::Separator);
        let spacing = self.style.item_spacing.y;
        let window = self.current_window_mut();
        let Some(state) = window.columns.pop() else {
            return;
        };

        if state.bordered {
            let width = state.host_max_x - state.host_min_x;
            for offset in &state.offsets[1..state.count] {
                let x = (state.host_min_x + offset * width).round();
                window.draw_list.add_line(Vec2::new(x, state.start_y), Vec2::new(x, state.row_bottom), separator, 1.0);
            }
        }

        let dc = &mut window.dc;
        dc.base_x = state.saved_base_x;
        dc.indent = state.saved_indent;
        dc.work_max_x = state.saved_work_max_x;
        dc.max.x = dc.max.x.max(state.host_max_x);
        dc.max.y = dc.max.y.max(state.row_bottom);
        dc.pos = Vec2::new(dc.line_start_x(), state.row_bottom + spacing);
        dc.prev_line_end = Vec2::new(state.host_max_x, state.row_start_y);
        dc.prev_line_height = state.row_bottom - state.row_start_y;
        dc.curr_line_height = 0.0;
    }

    /// Columns in the innermost set, 1 outside any set
    pub fn columns_count(&self) -> usize {
        self.current_window().columns.last().map_or(1, |s| s.count)
    }

    /// Index of the current column, 0 outside any set
    pub fn column_index(&self) -> usize {
        self.current_window().columns.last().map_or(0, |s| s.current)
    }

    /// Screen-space x range of column `index`
    ///
    /// # Panics
    /// Outside a column set, or if `index` is out of range.
    pub fn column_bounds(&self, index: usize) -> (f32, f32) {
        let state = self.column_state("column_bounds");
        assert!(index < state.count, "column {} out of range for {} columns", index, state.count);
        state.bounds(index, self.style.item_spacing.x * 0.5)
    }

    /// Usable width of column `index`
    pub fn column_width(&self, index: usize) -> f32 {
        let (min_x, max_x) = self.column_bounds(index);
        max_x - min_x
    }

    /// Id of the innermost column set
    pub fn columns_id(&self) -> Option<WidgetId> {
        self.current_window().columns.last().map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputSnapshot;
    use crate::toolkit::test_support::context;
    use approx::assert_relative_eq;

    #[test]
    fn test_offsets_normalize_weights() {
        let offsets = normalized_offsets(&[2.0, 3.0]);
        assert_relative_eq!(offsets[1], 0.4);
        assert_eq!(offsets[2], 1.0);
    }

    #[test]
    fn test_zero_weights_split_equally() {
        let offsets = normalized_offsets(&[0.0, 0.0, 0.0, 0.0]);
        assert_relative_eq!(offsets[1], 0.25);
        assert_relative_eq!(offsets[2], 0.5);
        assert_eq!(offsets[4], 1.0);
    }

    #[test]
    fn test_column_bounds_follow_weights() {
        let mut ctx = context();
        ctx.new_frame(&InputSnapshot::new(Vec2::new(216.0, 300.0)));
        ctx.begin_columns("props", &[0.4, 0.6], false);
        let first = ctx.column_bounds(0);
        let second = ctx.column_bounds(1);
        ctx.end_columns();
        ctx.end_frame();

        // host spans 8..208; the split at 88 is inset by half the item spacing
        assert_relative_eq!(first.0, 8.0);
        assert_relative_eq!(first.1, 84.0);
        assert_relative_eq!(second.0, 92.0);
        assert_relative_eq!(second.1, 208.0);
    }

    #[test]
    fn test_next_column_wraps_rows() {
        let mut ctx = context();
        ctx.new_frame(&InputSnapshot::default());
        ctx.begin_columns("grid", &[1.0, 1.0], false);
        let top = ctx.cursor_screen_pos().y;
        ctx.dummy(Vec2::new(10.0, 30.0));
        ctx.next_column();
        assert_eq!(ctx.column_index(), 1);
        assert_eq!(ctx.cursor_screen_pos().y, top);
        ctx.dummy(Vec2::new(10.0, 10.0));
        ctx.next_column();

        assert_eq!(ctx.column_index(), 0);
        assert_eq!(ctx.cursor_screen_pos().y, top + 30.0 + ctx.style().item_spacing.y);
        ctx.end_columns();
        ctx.end_frame();
    }

    #[test]
    fn test_end_columns_continues_below_tallest() {
        let mut ctx = context();
        ctx.new_frame(&InputSnapshot::default());
        let start = ctx.cursor_screen_pos();
        ctx.begin_columns("pair", &[1.0, 1.0], true);
        ctx.dummy(Vec2::new(10.0, 12.0));
        ctx.next_column();
        ctx.dummy(Vec2::new(10.0, 40.0));
        ctx.end_columns();
        let after = ctx.cursor_screen_pos();
        assert_eq!(ctx.columns_count(), 1);
        ctx.end_frame();

        assert_eq!(after.x, start.x);
        assert_eq!(after.y, start.y + 40.0 + ctx.style().item_spacing.y);
    }

    #[test]
    fn test_bordered_columns_draw_separators() {
        let mut ctx = context();
        ctx.new_frame(&InputSnapshot::default());
        ctx.begin_columns("pair", &[1.0, 1.0, 1.0], true);
        ctx.dummy(Vec2::new(10.0, 12.0));
        ctx.end_columns();
        let data = ctx.end_frame();

        // two separators, one quad each
        assert_eq!(data.draw_lists[0].indices().len(), 12);
    }

    #[test]
    #[should_panic(expected = "next_column called outside columns")]
    fn test_next_column_outside_columns_panics() {
        let mut ctx = context();
        ctx.new_frame(&InputSnapshot::default());
        ctx.next_column();
    }

    #[test]
    #[should_panic(expected = "columns in window '##Root' were never ended")]
    fn test_open_columns_at_frame_end_panics() {
        let mut ctx = context();
        ctx.new_frame(&InputSnapshot::default());
        ctx.begin_columns("open", &[1.0], false);
        ctx.end_frame();
    }
}
