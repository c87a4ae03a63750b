use std::env;
use std::fs;
use std::process::ExitCode;
use tracing::error;
use tracing::info;

use st_engine::bus::Payload;
use st_engine::engine::Engine;
use st_engine::engine::EngineConfig;
use st_engine::engine::init_tracing;

fn main() -> ExitCode {
  let config: EngineConfig = EngineConfig::new();

  if let Err(error) = init_tracing(&config) {
    eprintln!("failed to set tracing subscriber:");
    eprintln!("    {}", error.error());
  }

  let mut engine: Engine = match Engine::new(config) {
    Ok(engine) => engine,
    Err(error) => {
      error!(target: "st_engine", error = error.error(), "failed to start engine");
      return ExitCode::FAILURE;
    }
  };

  if let Some(path) = env::args().nth(1) {
    match fs::read_to_string(&path) {
      Ok(source) => engine.bus().post(Payload::RunScript(source)),
      Err(_) => engine.bus().post(Payload::LogError(format!("File {path} not found"))),
    }
  }

  let result: Result<u64, _> = engine.run(None);

  engine.close();

  match result {
    Ok(frames) => {
      info!(target: "st_engine", frames, "engine stopped");
      ExitCode::SUCCESS
    }
    Err(error) => {
      error!(target: "st_engine", %error, "engine failed");
      ExitCode::FAILURE
    }
  }
}
