//! Integration test for the render session lifecycle and frame delivery.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use plume::compositor::{linear_to_srgb8, FrameBufferCompositor};
use plume::session::testing::{
    CollectingTileSink, EngineScript, MemoryMember, MemoryMesh, MemoryPointCloud, MemoryScene,
    RecordingEngine,
};
use plume::session::{SessionState, Transform};
use plume::{FrameTile, LinearPixel, RenderOutcome, RenderSession, RenderSettings, SceneLock};

fn temp_settings_path() -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("plume_settings_{id}.toml"))
}

fn busy_scene() -> MemoryScene {
    let mut scene = MemoryScene::with_camera()
        .cloud(MemoryPointCloud::line("smoke", 64))
        .cloud(MemoryPointCloud::new("empty", 0))
        .cloud(MemoryPointCloud::line("sparks", 16));
    scene.groups.push(plume::session::testing::MemoryGroup {
        name: "Occlusion".to_string(),
        members: vec![
            MemoryMember::Mesh(MemoryMesh::quad("floor"), Transform::IDENTITY),
            MemoryMember::Mesh(MemoryMesh::quad("wall"), Transform::translation(0.0, 0.0, -2.0)),
        ],
    });
    scene
}

fn occluded_settings() -> RenderSettings {
    RenderSettings::from_toml_str(
        r#"
        [image]
        width = 8
        height = 4

        [scene]
        use_occlusion_meshes = true
        lock_timeout_ms = 100
        "#,
    )
    .unwrap()
}

#[test]
fn test_scene_with_only_an_empty_cloud_registers_nothing() {
    let scene = SceneLock::new(MemoryScene::with_camera().cloud(MemoryPointCloud::new("e", 0)));
    let mut session = RenderSession::new(RecordingEngine::new());
    session.init();

    let outcome = session.process(
        &scene,
        &RenderSettings::default(),
        1,
        &mut CollectingTileSink::new(),
    );

    assert_eq!(outcome, RenderOutcome::Ok);
    assert!(session.engine().sources.is_empty());
    assert_eq!(session.last_teardown().unwrap().streams_released, 0);
}

#[test]
fn test_cancel_mid_render_aborts_and_frees_everything() {
    let scene = SceneLock::new(busy_scene());
    let mut session = RenderSession::new(RecordingEngine::new());
    session.init();
    let handle = session.abort_handle();
    session.engine_mut().script.abort_after = Some((10, handle));

    let outcome = session.process(&scene, &occluded_settings(), 1, &mut CollectingTileSink::new());

    assert_eq!(outcome, RenderOutcome::Abort);
    let engine = session.engine();
    assert_eq!(engine.pulled_count(), 10);
    assert_eq!(engine.resets, 1);
    assert_eq!(engine.mesh_refs.len(), 2);
    assert!(engine.mesh_refs.iter().all(|m| m.upgrade().is_none()));

    let report = session.last_teardown().unwrap();
    assert_eq!(report.streams_released, 2);
    assert_eq!(report.meshes_released, 2);
    assert_eq!(session.state(), SessionState::TornDown);
}

#[test]
fn test_engine_failure_releases_resources_exactly_once() {
    let scene = SceneLock::new(busy_scene());
    let mut session = RenderSession::new(RecordingEngine::scripted(EngineScript {
        fail_with: Some("license server unreachable".to_string()),
        ..EngineScript::default()
    }));
    session.init();

    let outcome = session.process(&scene, &occluded_settings(), 1, &mut CollectingTileSink::new());

    assert_eq!(outcome, RenderOutcome::Fail);
    let engine = session.engine();
    assert_eq!(engine.renders, 1);
    assert_eq!(engine.resets, 1);
    for mesh in &engine.mesh_refs {
        assert_eq!(mesh.strong_count(), 0);
    }
    assert!(session.history().contains(&SessionState::Failed));
    assert_eq!(
        session
            .history()
            .iter()
            .filter(|s| **s == SessionState::TornDown)
            .count(),
        1
    );
}

#[test]
fn test_external_abort_while_rendering() {
    let scene = Arc::new(SceneLock::new(busy_scene()));
    let mut session = RenderSession::new(RecordingEngine::scripted(EngineScript {
        wait_for_cancel: Some(Duration::from_secs(10)),
        ..EngineScript::default()
    }));
    session.init();
    let handle = session.abort_handle();

    let watcher_scene = Arc::clone(&scene);
    let aborter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        // the engine is rendering, so the scene must be free
        let unlocked = watcher_scene.acquire(Duration::from_millis(500)).is_ok();
        handle.abort();
        unlocked
    });

    let outcome = session.process(&*scene, &occluded_settings(), 1, &mut CollectingTileSink::new());
    let unlocked_during_render = aborter.join().unwrap();

    assert!(unlocked_during_render);
    assert_eq!(outcome, RenderOutcome::Abort);
    assert_eq!(session.engine().resets, 1);
}

#[test]
fn test_sessions_run_back_to_back() {
    let scene = SceneLock::new(busy_scene());
    let mut session = RenderSession::new(RecordingEngine::new());
    session.init();

    for frame in 1..=3 {
        let outcome =
            session.process(&scene, &occluded_settings(), frame, &mut CollectingTileSink::new());
        assert_eq!(outcome, RenderOutcome::Ok);
    }
    session.cleanup();
    session.term();

    let engine = session.engine();
    assert_eq!(engine.resets, 3);
    assert_eq!(engine.configured, 3);
    assert!(engine.meshes.is_empty());
    assert_eq!(
        session.process(&scene, &occluded_settings(), 4, &mut CollectingTileSink::new()),
        RenderOutcome::Fail
    );
}

#[test]
fn test_crop_tile_reads_through_source_image() {
    // 4x3 image whose red channel encodes the pixel index
    let (width, height) = (4u32, 3u32);
    #[allow(clippy::cast_precision_loss)]
    let pixels: Vec<LinearPixel> = (0..width * height)
        .map(|i| LinearPixel::new(i as f32 / 12.0, 0.0, 1.0, 1.0))
        .collect();
    let tile = FrameTile::new(2, 2, 1, 1);
    let mut compositor = FrameBufferCompositor::new(tile);
    let mut sink = CollectingTileSink::new();

    compositor.begin_frame(width, height, &mut sink);
    compositor
        .on_full_image(width, height, &pixels, &mut sink)
        .unwrap();

    let fragment = sink.last().unwrap();
    assert_eq!((fragment.width, fragment.height), (2, 2));
    for row in 0..2u32 {
        for col in 0..2u32 {
            let source = &pixels[((1 + row) * width + 1 + col) as usize];
            let at = ((row * 2 + col) * 4) as usize;
            assert_eq!(fragment.rgba[at], linear_to_srgb8(source.r));
            assert_eq!(fragment.rgba[at + 1], 0);
            assert_eq!(fragment.rgba[at + 2], 255);
            assert_eq!(fragment.rgba[at + 3], 255);
        }
    }
}

#[test]
fn test_full_tile_reproduces_final_frame() {
    let scene = SceneLock::new(MemoryScene::with_camera());
    let mut session = RenderSession::new(RecordingEngine::scripted(EngineScript {
        partial_frames: 1,
        ..EngineScript::default()
    }));
    let mut sink = CollectingTileSink::new();

    let outcome = session.process(&scene, &occluded_settings(), 1, &mut sink);

    assert_eq!(outcome, RenderOutcome::Ok);
    assert_eq!(sink.frames_begun, vec![(8, 4)]);
    assert_eq!(sink.fragments.len(), 2);
    let last = sink.last().unwrap();
    assert_eq!(last.rgba.len(), 8 * 4 * 4);
    assert!(last.rgba.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn test_settings_file_round_trip() {
    let path = temp_settings_path();
    std::fs::write(
        &path,
        r#"
        render_type = "pass"

        [image]
        width = 320
        height = 240

        [sampling]
        method = "voxel"
        voxel_size = 0.25

        [shader]
        model = "henyey_greenstein"
        "#,
    )
    .unwrap();

    let settings = plume::load_settings(&path).unwrap();
    assert_eq!(settings.image.width, 320);
    assert_eq!(settings.sampling.method, plume::session::RenderingMethod::Voxel);
    assert!(matches!(
        settings.shader,
        plume::session::ShaderSettings::HenyeyGreenstein(_)
    ));

    std::fs::write(&path, "[image]\nwidth = 0\n").unwrap();
    assert!(plume::load_settings(&path).is_err());

    std::fs::remove_file(&path).ok();
}
