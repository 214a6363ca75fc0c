//! Full frames through the `Gui` bridge on the headless device

use editor_gui::prelude::*;
use editor_gui::render::{GpuCommand, ScissorRect, TextureDesc, TextureFormat};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn new_gui(device: &mut HeadlessDevice, config: &GuiConfig) -> Gui {
    Gui::new(device, &EmbeddedResources::with_builtin_shaders(), config).unwrap()
}

fn input() -> InputSnapshot {
    InputSnapshot::new(Vec2::new(WIDTH as f32, HEIGHT as f32))
}

fn panel(ui: &mut LayoutContext, values: &mut ([f32; 3], f32, bool)) {
    ui.label("Transform");
    ui.vector_field("Position", &mut values.0);
    ui.float_field("Scale", &mut values.1);
    ui.checkbox_field("Visible", &mut values.2);
    ui.button("Apply");
}

fn draws(commands: &[GpuCommand]) -> usize {
    commands.iter().filter(|c| matches!(c, GpuCommand::DrawIndexed { .. })).count()
}

#[test]
fn test_panel_frames_submit_identical_geometry() {
    let mut device = HeadlessDevice::new();
    let mut gui = new_gui(&mut device, &GuiConfig::headless());
    let mut values = ([1.0, 2.0, 3.0], 1.0, true);
    let target = FrameBuffer::main(WIDTH, HEIGHT);

    let mut totals = Vec::new();
    for _ in 0..5 {
        let ui = gui.begin_frame(&input());
        panel(ui, &mut values);
        gui.end_frame();
        let stats = gui.render(&mut device, &target).unwrap();
        totals.push((stats.vertices, stats.indices));
    }

    assert_eq!(device.submissions().len(), 5);
    assert!(totals[1].0 > 0);
    // first frame records column layouts, the rest replay them
    assert!(totals[1..].iter().all(|t| *t == totals[1]));
}

#[test]
fn test_scissors_stay_inside_framebuffer() {
    let mut device = HeadlessDevice::new();
    let mut gui = new_gui(&mut device, &GuiConfig::headless());
    let mut values = ([0.0; 3], 1.0, false);
    let target = FrameBuffer::main(WIDTH, HEIGHT);

    for _ in 0..2 {
        let ui = gui.begin_frame(&input());
        panel(ui, &mut values);
        gui.end_frame();
        gui.render(&mut device, &target).unwrap();
    }

    let submission = device.last_submission().unwrap();
    let commands = submission.commands.commands();
    assert!(draws(commands) > 0);
    for command in commands {
        if let GpuCommand::SetScissor(ScissorRect { x, y, width, height }) = *command {
            assert!(width > 0 && height > 0);
            assert!(x + width <= WIDTH && y + height <= HEIGHT);
        }
    }
}

#[test]
fn test_user_texture_binds_its_own_set() {
    let mut device = HeadlessDevice::new();
    let mut gui = new_gui(&mut device, &GuiConfig::headless());
    let desc = TextureDesc { label: "preview".into(), width: 4, height: 4, format: TextureFormat::Rgba8Unorm };
    let texture = device.create_texture(&desc, &[128; 64]).unwrap();
    let id = gui.get_or_bind_texture(&mut device, texture).unwrap();

    let ui = gui.begin_frame(&input());
    ui.image(id, Vec2::new(64.0, 64.0));
    gui.end_frame();
    gui.render(&mut device, &FrameBuffer::main(WIDTH, HEIGHT)).unwrap();

    let set = gui.textures().resolve(id).unwrap();
    assert_eq!(device.texture_of_set(set), Some(texture));
    let submission = device.last_submission().unwrap();
    assert!(submission
        .commands
        .commands()
        .iter()
        .any(|c| matches!(c, GpuCommand::SetResourceSet { slot: 1, set: bound } if *bound == set)));

    assert!(gui.unbind_texture(&mut device, texture).unwrap());
    assert!(device.destroyed_resource_sets().contains(&set));
}

#[test]
fn test_zero_sized_target_submits_nothing() {
    let mut device = HeadlessDevice::new();
    let mut gui = new_gui(&mut device, &GuiConfig::headless());

    let ui = gui.begin_frame(&input());
    ui.label("hidden");
    gui.end_frame();
    let stats = gui.render(&mut device, &FrameBuffer::main(0, 0)).unwrap();

    assert_eq!(stats.draw_calls, 0);
    assert!(device.submissions().is_empty());
}

#[test]
fn test_settings_file_round_trips_storage() {
    let dir = std::env::temp_dir().join(format!("editor_gui_settings_{}", std::process::id()));
    let path = dir.join("editor_gui.ini");
    let config = GuiConfig::headless().with_settings_path(path.to_string_lossy().to_string());

    {
        let mut device = HeadlessDevice::new();
        let mut gui = new_gui(&mut device, &config);
        gui.set_storage_data("inspector.width", 280.0f32);
        gui.set_storage_data("inspector.tab", "Lighting".to_string());
        gui.begin_frame(&input());
        gui.end_frame();
        gui.render(&mut device, &FrameBuffer::main(WIDTH, HEIGHT)).unwrap();
        gui.shutdown(&mut device).unwrap();
    }

    let mut device = HeadlessDevice::new();
    let gui = new_gui(&mut device, &config);
    approx::assert_relative_eq!(gui.get_storage_data("inspector.width", 0.0f32), 280.0);
    assert_eq!(gui.get_storage_data("inspector.tab", String::new()), "Lighting");

    let _ = std::fs::remove_dir_all(&dir);
}
