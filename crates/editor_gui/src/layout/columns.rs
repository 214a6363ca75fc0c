//! Declared columns with cross-frame geometry caching
//!
//! A column set is declared incrementally: `begin_columns(w0)`, then one
//! `split_columns(w)` per extra column, then `end_columns()`. The first time
//! a set is seen its weights are only recorded and its contents flow as a
//! single column; from the next frame on the cached, normalized weights open
//! a real multi-column container up front.
//!
//! ```text
//! Unseen --begin--> Recording --end--> Committed --begin--> Replaying --end--> Committed
//! ```
//!
//! A replayed set that declares a different column count than its cache
//! entry keeps running: surplus columns wrap onto a new row, and the
//! declared shape replaces the cached one for the next frame.

use std::collections::HashMap;
use std::panic::Location;

use crate::toolkit::WidgetId;

use super::LayoutContext;

/// Cache key for a column set
///
/// `site` chains the declaring source location through every enclosing set,
/// so the same helper called from two places caches two layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    /// Nesting depth, 1 for a top-level set
    pub depth: usize,
    /// Declaration-site hash
    pub site: u64,
}

/// Committed geometry of a column set
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    /// Number of columns
    pub count: usize,
    /// Per-column weights; they sum to 1 unless every declared weight was 0
    pub weights: Vec<f32>,
}

#[derive(Debug)]
enum Phase {
    Recording,
    Replaying { count: usize },
}

#[derive(Debug)]
struct Declared {
    weights: Vec<f32>,
    total: f32,
}

impl Declared {
    fn new(first_weight: f32) -> Self {
        Self { weights: vec![first_weight], total: first_weight }
    }

    fn push(&mut self, weight: f32) {
        self.weights.push(weight);
        self.total += weight;
    }

    fn into_layout(self) -> ColumnLayout {
        let mut weights = self.weights;
        if self.total != 0.0 {
            for weight in &mut weights {
                *weight /= self.total;
            }
        }
        ColumnLayout { count: weights.len(), weights }
    }
}

#[derive(Debug)]
pub(crate) struct ColumnFrame {
    key: ColumnKey,
    phase: Phase,
    declared: Declared,
}

/// Column layouts committed so far
#[derive(Debug, Default)]
pub struct ColumnCache {
    layouts: HashMap<ColumnKey, ColumnLayout>,
    commits: u64,
}

impl ColumnCache {
    /// Layout committed for `key`
    pub fn layout(&self, key: &ColumnKey) -> Option<&ColumnLayout> {
        self.layouts.get(key)
    }

    /// Every layout committed at nesting depth `depth`
    pub fn layouts_at_depth(&self, depth: usize) -> Vec<&ColumnLayout> {
        self.layouts.iter().filter(|(key, _)| key.depth == depth).map(|(_, layout)| layout).collect()
    }

    /// Number of cached layouts
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Whether nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// How many recording passes have committed
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Forget every layout; each set records again on its next declaration
    pub fn clear(&mut self) {
        self.layouts.clear();
    }

    fn commit(&mut self, key: ColumnKey, layout: ColumnLayout) {
        log::trace!("Committed {} column(s) at depth {}: {:?}", layout.count, key.depth, layout.weights);
        self.layouts.insert(key, layout);
        self.commits += 1;
    }
}

impl LayoutContext {
    /// Open a column set whose first column has weight `first_weight`
    ///
    /// The set is identified by the calling source location.
    #[track_caller]
    pub fn begin_columns(&mut self, first_weight: f32, bordered: bool) {
        let caller = Location::caller();
        let site = self
            .parent_site()
            .child_str(caller.file())
            .child_int(u64::from(caller.line()) << 32 | u64::from(caller.column()));
        self.open_columns(site, first_weight, bordered);
    }

    /// Open a column set identified by `key` instead of the call site
    ///
    /// For sets declared in a loop, or from one helper with differing shapes.
    pub fn begin_columns_keyed(&mut self, key: &str, first_weight: f32, bordered: bool) {
        let site = self.parent_site().child_str(key);
        self.open_columns(site, first_weight, bordered);
    }

    fn parent_site(&self) -> WidgetId {
        self.column_frames.last().map_or(WidgetId::ROOT, |frame| WidgetId(frame.key.site))
    }

    fn open_columns(&mut self, site: WidgetId, first_weight: f32, bordered: bool) {
        let key = ColumnKey { depth: self.column_frames.len() + 1, site: site.0 };
        let phase = match self.column_cache.layout(&key) {
            Some(layout) => {
                let count = layout.count;
                let weights = layout.weights.clone();
                self.ctx.begin_columns(&format!("##columns{:016x}", key.site), &weights, bordered);
                Phase::Replaying { count }
            }
            None => Phase::Recording,
        };
        self.column_frames.push(ColumnFrame { key, phase, declared: Declared::new(first_weight) });
    }

    /// Start the next column, with weight `weight` when the set is recording
    ///
    /// Past the cached column count the container wraps to a new row.
    ///
    /// # Panics
    /// Outside a column set.
    pub fn split_columns(&mut self, weight: f32) {
        let Some(frame) = self.column_frames.last_mut() else {
            panic!("split_columns called without begin_columns");
        };
        frame.declared.push(weight);
        if let Phase::Replaying { count } = frame.phase {
            if frame.declared.weights.len() == count + 1 {
                log::warn!(
                    "Column set at depth {} declares more than its {} cached column(s); wrapping",
                    frame.key.depth,
                    count
                );
            }
            self.ctx.next_column();
        }
    }

    /// Close the innermost column set, committing its layout if it was recording
    ///
    /// A replayed set whose declared count differs from the cache commits
    /// the declared shape, so the next frame lays it out afresh.
    ///
    /// # Panics
    /// Outside a column set.
    pub fn end_columns(&mut self) {
        let Some(frame) = self.column_frames.pop() else {
            panic!("end_columns called without begin_columns");
        };
        match frame.phase {
            Phase::Recording => self.column_cache.commit(frame.key, frame.declared.into_layout()),
            Phase::Replaying { count } => {
                self.ctx.end_columns();
                let declared = frame.declared.weights.len();
                if declared != count {
                    log::warn!(
                        "Column count changed at depth {}: {} cached, {} declared; re-recording",
                        frame.key.depth,
                        count,
                        declared
                    );
                    self.column_cache.commit(frame.key, frame.declared.into_layout());
                }
            }
        }
    }

    /// Run `body` once per column of a set weighted by `weights`
    ///
    /// # Panics
    /// If `weights` is empty.
    #[track_caller]
    pub fn columns(&mut self, weights: &[f32], bordered: bool, mut body: impl FnMut(&mut Self, usize)) {
        let Some((&first, rest)) = weights.split_first() else {
            panic!("columns needs at least one weight");
        };
        self.begin_columns(first, bordered);
        body(self, 0);
        for (index, &weight) in rest.iter().enumerate() {
            self.split_columns(weight);
            body(self, index + 1);
        }
        self.end_columns();
    }

    /// Current column nesting depth
    pub fn column_depth(&self) -> usize {
        self.column_frames.len()
    }

    /// Layouts committed so far
    pub fn column_cache(&self) -> &ColumnCache {
        &self.column_cache
    }

    /// Forget cached layouts; every set records again on its next declaration
    pub fn reset_column_cache(&mut self) {
        self.column_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::layout;
    use crate::toolkit::test_support::frame;
    use approx::assert_relative_eq;

    /// Column bounds when the set opened a real container
    fn label_and_field(ui: &mut LayoutContext, name: &mut String) -> Option<((f32, f32), (f32, f32))> {
        ui.begin_columns(2.0, false);
        let bounds = (ui.toolkit().columns_count() == 2).then(|| (ui.toolkit().column_bounds(0), ui.toolkit().column_bounds(1)));
        ui.label("Name");
        ui.split_columns(3.0);
        ui.toolkit_mut().input_text("##name", name);
        ui.end_columns();
        bounds
    }

    #[test]
    fn test_weights_are_normalized_and_replayed() {
        let mut ui = layout();
        let mut name = String::from("cube");

        ui.begin_frame(&frame());
        assert!(label_and_field(&mut ui, &mut name).is_none());
        ui.end_frame();

        let layouts = ui.column_cache().layouts_at_depth(1);
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].count, 2);
        assert_relative_eq!(layouts[0].weights[0], 0.4);
        assert_relative_eq!(layouts[0].weights[1], 0.6);

        ui.begin_frame(&frame());
        let replayed = label_and_field(&mut ui, &mut name);
        ui.end_frame();
        let ((host_min, first_max), (_, host_max)) = replayed.expect("second frame opens a container");
        let half_spacing = ui.toolkit().style().item_spacing.x * 0.5;
        let split = first_max + half_spacing;
        assert_relative_eq!((split - host_min) / (host_max - host_min), 0.4, epsilon = 1e-5);
        assert_eq!(ui.column_cache().commits(), 1);
    }

    #[test]
    fn test_replay_is_stable_for_many_frames() {
        let mut ui = layout();
        let mut name = String::new();
        let mut bounds = Vec::new();
        for _ in 0..100 {
            ui.begin_frame(&frame());
            ui.begin_columns(1.0, true);
            if ui.toolkit().columns_count() == 2 {
                bounds.push(ui.toolkit().column_bounds(1));
            }
            ui.split_columns(1.0);
            ui.toolkit_mut().input_text("##v", &mut name);
            ui.end_columns();
            ui.end_frame();
        }
        assert_eq!(ui.column_cache().commits(), 1);
        assert_eq!(ui.column_cache().len(), 1);
        // the first frame records without a container
        assert_eq!(bounds.len(), 99);
        assert!(bounds.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_zero_total_skips_normalization() {
        let mut ui = layout();
        ui.begin_frame(&frame());
        ui.begin_columns(0.0, false);
        ui.split_columns(0.0);
        ui.end_columns();
        ui.end_frame();

        let layouts = ui.column_cache().layouts_at_depth(1);
        assert_eq!(layouts[0].weights, vec![0.0, 0.0]);
    }

    #[test]
    fn test_call_sites_cache_separately() {
        let mut ui = layout();
        ui.begin_frame(&frame());
        ui.columns(&[1.0, 1.0], false, |_, _| {});
        ui.columns(&[1.0, 1.0, 2.0], false, |_, _| {});
        ui.end_frame();
        assert_eq!(ui.column_cache().len(), 2);
    }

    #[test]
    fn test_nested_sets_record_at_their_depth() {
        let mut ui = layout();
        let mut seen = Vec::new();
        for _ in 0..2 {
            ui.begin_frame(&frame());
            ui.columns(&[2.0, 3.0], false, |ui, col| {
                if col == 1 {
                    ui.columns(&[1.0, 1.0, 1.0], false, |ui, _| seen.push(ui.column_depth()));
                }
            });
            ui.end_frame();
        }
        assert_eq!(seen, vec![2; 6]);
        assert_eq!(ui.column_cache().layouts_at_depth(2)[0].count, 3);
        assert_eq!(ui.column_cache().commits(), 2);
    }

    fn declare_grid(ui: &mut LayoutContext, splits: usize) -> usize {
        ui.begin_frame(&frame());
        ui.begin_columns_keyed("grid", 1.0, false);
        let opened = ui.toolkit().columns_count();
        for _ in 0..splits {
            ui.split_columns(1.0);
        }
        ui.end_columns();
        ui.end_frame();
        opened
    }

    fn grid_count(ui: &LayoutContext) -> usize {
        ui.column_cache().layouts_at_depth(1)[0].count
    }

    #[test]
    fn test_shrinking_a_cached_set_recommits() {
        let mut ui = layout();
        declare_grid(&mut ui, 2);
        assert_eq!(grid_count(&ui), 3);

        assert_eq!(declare_grid(&mut ui, 1), 3);
        assert_eq!(grid_count(&ui), 2);
        assert_relative_eq!(ui.column_cache().layouts_at_depth(1)[0].weights[0], 0.5);

        assert_eq!(declare_grid(&mut ui, 1), 2);
        assert_eq!(ui.column_cache().commits(), 2);
    }

    #[test]
    fn test_growing_a_cached_set_wraps_and_recommits() {
        let mut ui = layout();
        declare_grid(&mut ui, 1);
        assert_eq!(grid_count(&ui), 2);

        assert_eq!(declare_grid(&mut ui, 2), 2);
        assert_eq!(grid_count(&ui), 3);
        assert_eq!(declare_grid(&mut ui, 2), 3);
        assert_eq!(ui.column_cache().commits(), 2);
    }

    fn generic_row<const N: usize>(ui: &mut LayoutContext, values: &mut [f32; N]) -> bool {
        ui.vector_field("v", values)
    }

    #[test]
    fn test_one_site_with_two_vector_widths_keeps_running() {
        let mut ui = layout();
        let mut pair = [1.0, 2.0];
        let mut triple = [1.0, 2.0, 3.0];
        for frame_index in 0..4 {
            ui.begin_frame(&frame());
            if frame_index % 2 == 0 {
                generic_row(&mut ui, &mut pair);
            } else {
                generic_row(&mut ui, &mut triple);
            }
            ui.end_frame();
        }
        assert_eq!(pair, [1.0, 2.0]);
        assert_eq!(triple, [1.0, 2.0, 3.0]);
        let axis_rows = ui.column_cache().layouts_at_depth(2);
        assert_eq!(axis_rows.len(), 1);
        assert_eq!(axis_rows[0].count, 3);
    }

    #[test]
    #[should_panic(expected = "split_columns called without begin_columns")]
    fn test_split_without_begin_panics() {
        let mut ui = layout();
        ui.begin_frame(&frame());
        ui.split_columns(1.0);
    }

    #[test]
    #[should_panic(expected = "end_columns called without begin_columns")]
    fn test_end_without_begin_panics() {
        let mut ui = layout();
        ui.begin_frame(&frame());
        ui.end_columns();
    }
}
