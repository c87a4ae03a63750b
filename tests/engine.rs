use st_engine::bus::BodyDesc;
use st_engine::bus::Payload;
use st_engine::engine::Engine;
use st_engine::engine::EngineConfig;
use st_engine::subsystem::AssetKey;
use st_engine::subsystem::AssetKind;
use st_engine::subsystem::Lifecycle;
use st_engine::subsystem::LogLevel;
use st_engine::subsystem::LogLine;
use std::fs;
use tempfile::TempDir;

fn engine(root: &TempDir) -> Engine {
  let mut config: EngineConfig = EngineConfig::new();

  config.worker_threads = 3;
  config.display_width = 800;
  config.display_height = 600;
  config.asset_root = root.path().to_path_buf();

  Engine::new(config).unwrap()
}

fn console(engine: &Engine) -> Vec<LogLine> {
  engine
    .console()
    .with(|console| console.history().cloned().collect())
}

#[test]
fn startup_reports_resolution() {
  let root: TempDir = TempDir::new().unwrap();
  let mut engine: Engine = engine(&root);

  engine.sync().unwrap();

  assert_eq!(
    console(&engine),
    [LogLine {
      level: LogLevel::Info,
      text: "Current screen resolution is 800x600".to_owned(),
    }],
  );
}

#[test]
fn script_drives_subsystems() {
  let root: TempDir = TempDir::new().unwrap();
  let mut engine: Engine = engine(&root);

  fs::write(root.path().join("boom.wav"), b"RIFF").unwrap();
  fs::write(root.path().join("hero.png"), b"PNG").unwrap();
  fs::write(root.path().join("level.list"), "boom.wav\nhero.png\n").unwrap();

  engine.bus().post(Payload::RunScript(
    "# level setup\n\
     loadAsset level.list\n\
     setGravity 3\n\
     setFloor 100\n\
     spawnBody 0 0 2 0\n\
     setFullscreen true\n\
     setBrightness 0.25\n"
      .to_owned(),
  ));

  // scripting posts, then assets publish a snapshot, then consumers apply it
  engine.sync().unwrap();
  engine.sync().unwrap();
  engine.sync().unwrap();

  engine.assets().with(|assets| {
    assert_eq!(assets.ref_count("boom.wav"), 1);
    assert!(assets.snapshot().contains_kind(AssetKey::of("hero.png"), AssetKind::Texture));
  });

  engine.physics().with(|physics| {
    assert_eq!(physics.state().gravity, 3);
    assert_eq!(physics.state().floor, 100);
    assert_eq!(physics.state().bodies.len(), 1);
    assert!(physics.state().steps >= 1);
  });

  engine.display().with(|display| {
    assert!(display.state().fullscreen);
    assert_eq!(display.state().brightness, 0.25);
  });

  engine.bus().post(Payload::RunScript(
    "playSound boom.wav 90 0\ndrawTexture hero.png 5 6 1".to_owned(),
  ));

  engine.sync().unwrap();
  engine.sync().unwrap();

  engine.audio().with(|audio| {
    assert_eq!(audio.state().played, 1);
    assert_eq!(audio.state().skipped, 0);
  });

  engine.renderer().with(|renderer| {
    assert_eq!(renderer.state().skipped, 0);
  });

  assert!(
    console(&engine)
      .iter()
      .any(|line| line.level == LogLevel::Success && line.text == "Brightness set to: 0.25")
  );
}

#[test]
fn physics_before_renderer_each_frame() {
  let root: TempDir = TempDir::new().unwrap();
  let mut engine: Engine = engine(&root);

  engine.bus().post(Payload::SpawnBody(BodyDesc {
    velocity_x: 1,
    ..BodyDesc::default()
  }));

  assert_eq!(engine.run(Some(5)).unwrap(), 5);

  engine.physics().with(|physics| assert_eq!(physics.state().steps, 5));
  engine.renderer().with(|renderer| assert_eq!(renderer.state().frames, 5));
}

#[test]
fn bad_script_and_missing_file_are_reported() {
  let root: TempDir = TempDir::new().unwrap();
  let mut engine: Engine = engine(&root);

  engine.bus().post(Payload::RunScript("setGravity 1\nteleport home".to_owned()));
  engine.bus().post(Payload::LoadAsset("ghost.ogg".to_owned()));

  engine.sync().unwrap();
  engine.sync().unwrap();

  let errors: Vec<String> = console(&engine)
    .into_iter()
    .filter(|line| line.level == LogLevel::Error)
    .map(|line| line.text)
    .collect();

  assert!(errors.contains(&"File ghost.ogg not found".to_owned()));
  assert!(errors.contains(&"Cannot run script: line 2: unknown command `teleport`".to_owned()));

  engine.physics().with(|physics| assert_eq!(physics.state().gravity, 0));
  assert!(engine.is_running());
}

#[test]
fn end_game_stops_run() {
  let root: TempDir = TempDir::new().unwrap();
  let mut engine: Engine = engine(&root);

  engine.bus().post(Payload::RunScript("setGravity 2\nendGame".to_owned()));

  let frames: u64 = engine.run(None).unwrap();

  assert!(frames >= 1);
  assert!(!engine.is_running());

  engine.close();

  assert_eq!(engine.audio().state(), Lifecycle::Closed);
  assert_eq!(engine.pool().live(), 0);
}
