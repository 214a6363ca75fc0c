//! # Immediate-Mode Toolkit
//!
//! Widgets are functions called every frame; nothing about them is retained
//! except what the interaction needs (the active widget, the focused text
//! field, header open flags and window placement). Each frame produces a
//! [`DrawData`] the renderer consumes.
//!
//! ```text
//! new_frame(input) -> begin_window / widgets / end_window ... -> end_frame() -> &DrawData
//! ```

mod columns;
mod context;
mod popup;
mod widgets;

pub mod draw;
pub mod id;
pub mod io;
pub mod settings;
pub mod style;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{Context, LastItem};
pub use draw::{DrawCallback, DrawCmd, DrawData, DrawList, DrawVert};
pub use id::{display_label, IdStack, WidgetId};
pub use io::Io;
pub use settings::{parse_ini, write_ini, IniSection, Settings, WindowSettings};
pub use style::{pack_color, rgba, scale_alpha, unpack_color, ColorRole, Style};
pub use widgets::DragParams;
pub use window::{Window, WindowFlags};
