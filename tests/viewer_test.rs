use std::{cell::RefCell, path::PathBuf, rc::Rc};

use flow_viewer::{
    LoadError, Viewer, ViewerConfig, ViewerEvent, ViewerState,
    data_structures::scene::{Face, Mesh, Vertex},
    resources::texture::TextureOrigin,
};

use crate::common::test_utils::{
    RecordingBackend, StubImporter, quad_mesh, scene_of, textured_scene, triangle_mesh,
};

mod common;

fn importer() -> StubImporter {
    StubImporter::default()
        .with("tri.obj", scene_of(vec![triangle_mesh("tri")]))
        .with(
            "pair.obj",
            scene_of(vec![triangle_mesh("a"), quad_mesh("b")]),
        )
        .with("red.glb", textured_scene(4, 4))
        .with("blue.glb", textured_scene(8, 2))
        .with(
            "lines.obj",
            scene_of(vec![Mesh::new(
                "lines",
                vec![Vertex::new([0.0; 3]), Vertex::new([1.0; 3])],
                vec![Face::from(vec![0, 1])],
            )]),
        )
}

fn viewer() -> Viewer<RecordingBackend, StubImporter> {
    Viewer::with_importer(
        RecordingBackend::default(),
        importer(),
        ViewerConfig::default(),
        800,
        600,
    )
}

fn record_events(
    viewer: &mut Viewer<RecordingBackend, StubImporter>,
) -> Rc<RefCell<Vec<ViewerEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    viewer.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

#[test]
fn should_only_clear_when_empty() {
    let mut viewer = viewer();
    assert_eq!(viewer.state(), ViewerState::Empty);

    viewer.draw().unwrap();

    let draw = viewer.backend().last_draw();
    assert_eq!(draw.index_count, None);
    assert_eq!(draw.clear_colour, ViewerConfig::default().clear_colour);
    assert_eq!(viewer.backend().live_buffers(), 0);
}

#[test]
fn should_draw_a_loaded_model() {
    let mut viewer = viewer();
    viewer.load("pair.obj").unwrap();
    assert_eq!(viewer.state(), ViewerState::Ready);

    viewer.draw().unwrap();

    let draw = viewer.backend().last_draw();
    assert_eq!(draw.index_count, Some(9));
    assert_eq!(draw.vertex_len, Some(7));
    assert_eq!(draw.texture_size, None);
    assert_eq!(draw.has_texture_flag, 0);

    let stats = viewer.stats().unwrap();
    assert_eq!(stats.name, "pair.obj");
    assert_eq!((stats.vertex_count, stats.triangle_count), (7, 3));
    assert!(!stats.has_texture());
}

#[test]
fn should_reset_the_camera_on_load() {
    let mut viewer = viewer();
    viewer.load("tri.obj").unwrap();

    // triangle spans 1 unit on x and y
    let camera = viewer.camera();
    assert!((camera.radius() - 0.6).abs() < 1e-6);
    assert!((camera.distance - 1.5).abs() < 1e-6);
    assert_eq!(camera.yaw.0, 45.0);
    assert_eq!(camera.pitch.0, 10.0);
}

#[test]
fn should_keep_everything_when_import_fails() {
    let mut viewer = viewer();
    viewer.load("red.glb").unwrap();
    viewer.on_orbit(12.0, -7.0);
    viewer.on_zoom(1.0);
    viewer.on_pan(5.0, 5.0);
    let camera = *viewer.camera();
    let stats = viewer.stats().cloned();
    let (buffers, textures) = (viewer.backend().live_buffers(), viewer.backend().live_textures());

    let err = viewer.load("corrupt.obj").unwrap_err();

    assert!(matches!(err, LoadError::Import(_)));
    assert_eq!(viewer.state(), ViewerState::Ready);
    assert_eq!(*viewer.camera(), camera);
    assert_eq!(viewer.stats().cloned(), stats);
    assert_eq!(viewer.backend().live_buffers(), buffers);
    assert_eq!(viewer.backend().live_textures(), textures);
    assert!(viewer.has_texture());
}

#[test]
fn should_stay_empty_when_the_first_load_fails() {
    let mut viewer = viewer();
    assert!(viewer.load("corrupt.obj").is_err());
    assert_eq!(viewer.state(), ViewerState::Empty);
    assert!(viewer.stats().is_none());
}

#[test]
fn should_reject_scenes_without_triangles() {
    let mut viewer = viewer();
    viewer.load("tri.obj").unwrap();

    let err = viewer.load("lines.obj").unwrap_err();

    assert!(
        matches!(err, LoadError::EmptyGeometry { ref path } if path == &PathBuf::from("lines.obj"))
    );
    assert_eq!(viewer.stats().unwrap().name, "tri.obj");
    assert_eq!(viewer.backend().live_buffers(), 2);
}

#[test]
fn should_hold_at_most_one_texture() {
    let mut viewer = viewer();
    for path in ["red.glb", "blue.glb", "red.glb", "tri.obj", "blue.glb"] {
        viewer.load(path).unwrap();
        assert!(viewer.backend().live_textures() <= 1);
    }
    assert_eq!(viewer.backend().peak_textures(), 1);
    assert_eq!(viewer.backend().textures_created, 4);
    assert_eq!(viewer.backend().live_buffers(), 2);

    viewer.draw().unwrap();
    let draw = viewer.backend().last_draw();
    assert_eq!(draw.texture_size, Some((8, 2)));
    assert_eq!(draw.has_texture_flag, 1);
}

#[test]
fn should_release_the_texture_when_an_untextured_model_replaces_it() {
    let mut viewer = viewer();
    viewer.load("red.glb").unwrap();
    assert_eq!(viewer.backend().live_textures(), 1);

    viewer.load("tri.obj").unwrap();

    assert_eq!(viewer.backend().live_textures(), 0);
    assert!(!viewer.has_texture());
}

#[test]
fn should_keep_the_previous_model_when_upload_fails() {
    let mut viewer = viewer();
    viewer.load("red.glb").unwrap();

    viewer.backend_mut().fail_index_buffers = true;
    let err = viewer.load("pair.obj").unwrap_err();

    assert!(matches!(err, LoadError::GpuUpload { .. }));
    assert_eq!(viewer.stats().unwrap().name, "red.glb");
    // the vertex buffer created before the failure was released again
    assert_eq!(viewer.backend().live_buffers(), 2);
    assert_eq!(viewer.backend().live_textures(), 1);

    viewer.backend_mut().fail_index_buffers = false;
    viewer.backend_mut().fail_vertex_buffers = true;
    assert!(viewer.load("pair.obj").is_err());
    assert_eq!(viewer.backend().live_buffers(), 2);

    viewer.draw().unwrap();
    assert_eq!(viewer.backend().last_draw().index_count, Some(3));
}

#[test]
fn should_draw_untextured_when_texture_upload_fails() {
    let mut viewer = viewer();
    viewer.backend_mut().fail_textures = true;

    viewer.load("red.glb").unwrap();

    assert_eq!(viewer.state(), ViewerState::Ready);
    assert!(!viewer.has_texture());
    assert_eq!(viewer.stats().unwrap().texture_size, None);
    viewer.draw().unwrap();
    assert_eq!(viewer.backend().last_draw().has_texture_flag, 0);
}

#[test]
fn should_keep_the_previous_model_when_the_texture_cannot_fit() {
    let mut viewer = viewer();
    viewer.load("red.glb").unwrap();
    viewer.backend_mut().max_texture_side = Some(4);

    let err = viewer.load("blue.glb").unwrap_err();

    assert!(matches!(err, LoadError::GpuUpload { .. }));
    assert_eq!(viewer.state(), ViewerState::Ready);
    assert_eq!(viewer.stats().unwrap().texture_size, Some((4, 4)));
    assert_eq!(viewer.backend().live_buffers(), 2);
    assert_eq!(viewer.backend().live_textures(), 1);
    assert_eq!(viewer.backend().textures_created, 1);
    assert!(viewer.has_texture());
}

#[test]
fn should_report_texture_origin() {
    let mut viewer = viewer();
    viewer.load("blue.glb").unwrap();
    let stats = viewer.stats().unwrap();
    assert_eq!(stats.texture_size, Some((8, 2)));
    assert_eq!(stats.texture_origin, Some(TextureOrigin::Embedded(0)));
}

#[test]
fn should_notify_listeners() {
    let mut viewer = viewer();
    let events = record_events(&mut viewer);

    viewer.load("tri.obj").unwrap();
    let _ = viewer.load("missing.obj");

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        ViewerEvent::ModelLoaded {
            name: "tri.obj".to_string(),
            path: PathBuf::from("tri.obj"),
        }
    );
    match &events[1] {
        ViewerEvent::LoadFailed { path, message } => {
            assert_eq!(path, &PathBuf::from("missing.obj"));
            assert!(message.contains("corrupt file"), "{message}");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn should_clamp_zoom_through_the_viewer() {
    let mut viewer = viewer();
    viewer.load("tri.obj").unwrap();
    let (min, _) = viewer.camera().distance_limits();

    for _ in 0..50 {
        viewer.on_zoom(120.0);
    }

    assert_eq!(viewer.camera().distance, min);
}

#[test]
fn should_ignore_camera_input_when_empty() {
    let mut viewer = viewer();
    let before = *viewer.camera();
    viewer.take_redraw_request();

    viewer.on_orbit(50.0, 50.0);
    viewer.on_pan(10.0, 10.0);
    viewer.on_zoom(1.0);
    viewer.on_reset();
    viewer.on_frame();

    assert_eq!(*viewer.camera(), before);
    assert!(!viewer.take_redraw_request());
}

#[test]
fn should_request_redraws_on_input() {
    let mut viewer = viewer();
    viewer.load("tri.obj").unwrap();
    assert!(viewer.take_redraw_request());
    assert!(!viewer.take_redraw_request());

    viewer.on_orbit(1.0, 0.0);
    assert!(viewer.take_redraw_request());

    viewer.on_zoom(0.0);
    assert!(!viewer.take_redraw_request());
}

#[test]
fn should_restore_the_view_on_reset() {
    let mut viewer = viewer();
    viewer.load("pair.obj").unwrap();
    let fresh = *viewer.camera();

    viewer.on_orbit(40.0, 40.0);
    viewer.on_pan(20.0, -20.0);
    viewer.on_zoom(-1.0);
    viewer.on_reset();

    assert_eq!(*viewer.camera(), fresh);

    viewer.on_orbit(40.0, 0.0);
    viewer.on_frame();
    assert!((viewer.camera().distance - viewer.camera().radius() * 2.0).abs() < 1e-6);
    assert_ne!(viewer.camera().yaw, fresh.yaw);
}

#[test]
fn should_track_the_viewport() {
    let mut viewer = viewer();
    viewer.on_resize(1000, 500);
    assert_eq!(viewer.projection().aspect(), 2.0);
    assert_eq!(viewer.backend().size, (1000, 500));

    viewer.on_resize(1000, 0);
    assert_eq!(viewer.projection().aspect(), 1000.0);
    assert_eq!(viewer.backend().size, (1000, 500));
}
