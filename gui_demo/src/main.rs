//! Headless property-panel demo
//!
//! Drives a few frames of an inspector-style panel through the headless
//! device and logs what the renderer submitted. A mouse drag across the
//! position field is scripted into the input so the values visibly change.
//!
//! Usage: `gui_demo [config.toml|config.ron] [frames]`

use editor_gui::foundation::logging;
use editor_gui::foundation::time::FrameTimer;
use editor_gui::prelude::*;
use nalgebra::UnitQuaternion;

const DISPLAY: (u32, u32) = (1280, 720);
const DEFAULT_FRAMES: u32 = 8;

/// Demo failures
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Gui(#[from] GuiError),

    #[error(transparent)]
    Config(#[from] editor_gui::config::ConfigError),

    #[error("Invalid frame count '{0}'")]
    FrameCount(String),
}

/// State edited by the panel
struct Inspector {
    name: String,
    visible: bool,
    position: [f32; 3],
    rotation: UnitQuaternion<f32>,
    scale: f32,
    tint: [f32; 4],
    layer: usize,
    lod_bias: i32,
}

impl Default for Inspector {
    fn default() -> Self {
        Self {
            name: "Teapot".to_string(),
            visible: true,
            position: [0.0, 1.0, -4.0],
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
            tint: [1.0, 0.8, 0.6, 1.0],
            layer: 0,
            lod_bias: 0,
        }
    }
}

impl Inspector {
    fn draw(&mut self, ui: &mut LayoutContext) -> bool {
        let mut changed = false;
        ui.with_font(FontStyle::BOLD, |ui| ui.label("Inspector"));
        ui.separator();

        ui.header("Transform", true, |ui| {
            changed |= ui.vector_field("Position", &mut self.position);
            changed |= ui.quaternion_field("Rotation", &mut self.rotation);
            changed |= ui.float_field("Scale", &mut self.scale);
        });

        ui.header("Rendering", true, |ui| {
            changed |= ui.checkbox_field("Visible", &mut self.visible);
            changed |= ui.color_field("Tint", &mut self.tint);
            changed |= ui.combo_field("Layer", &mut self.layer, &["Opaque", "Transparent", "Overlay"]);
            ui.with_disabled(!self.visible, |ui| {
                ui.indent(12.0);
                changed |= ui.int_field("LOD bias", &mut self.lod_bias);
            });
        });

        ui.space(8.0);
        changed |= ui.text_field("Name", &mut self.name);
        ui.with_alignment(Align::Back, |ui| {
            if ui.button("Reset") {
                *self = Self::default();
                changed = true;
            }
        });
        changed
    }
}

/// Scripted input: hover, then drag the position X tag to the right
fn scripted_input(frame: u32, delta_time: f32) -> InputSnapshot {
    let (width, height) = DISPLAY;
    let mut input = InputSnapshot::new(Vec2::new(width as f32, height as f32));
    input.delta_time = delta_time;
    let x = 530.0 + 6.0 * frame.saturating_sub(2) as f32;
    let y = 72.0;
    input = input.with_mouse(x, y);
    if (3..6).contains(&frame) {
        input = input.with_button(MouseButton::Left, true);
    }
    input
}

fn run() -> Result<(), DemoError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GuiConfig::load_or_default(path)?,
        None => GuiConfig::headless(),
    };
    let frames = match args.next() {
        Some(raw) => raw.parse().map_err(|_| DemoError::FrameCount(raw))?,
        None => DEFAULT_FRAMES,
    };
    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting GUI demo for {} frames", frames);

    let mut device = HeadlessDevice::new();
    let loader = EmbeddedResources::with_builtin_shaders();
    let mut gui = Gui::new(&mut device, &loader, &config)?;
    let mut inspector = Inspector::default();
    let mut timer = FrameTimer::new();
    let target = FrameBuffer::main(DISPLAY.0, DISPLAY.1);

    let launches: i32 = gui.get_storage_data("demo.launches", 0);
    gui.set_storage_data("demo.launches", launches + 1);

    for frame in 0..frames {
        let input = scripted_input(frame, timer.tick());
        let ui = gui.begin_frame(&input);
        if inspector.draw(ui) {
            log::info!("Frame {}: position {:?}", frame, inspector.position);
        }
        gui.end_frame();

        let stats = gui.render(&mut device, &target)?;
        log::info!(
            "Frame {}: {} draws, {} vertices, {} indices, {} culled",
            frame,
            stats.draw_calls,
            stats.vertices,
            stats.indices,
            stats.culled_commands
        );
    }

    gui.set_storage_data("demo.last_name", inspector.name.clone());
    gui.save_settings();
    let ui = gui.begin_frame(&scripted_input(frames, timer.tick()));
    ui.label("Saving");
    gui.end_frame();
    gui.render(&mut device, &target)?;

    gui.shutdown(&mut device)?;
    log::info!("Demo finished after {} submissions, {} resources still live", device.submissions().len(), device.live_resources());
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        log::error!("GUI demo failed: {}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
