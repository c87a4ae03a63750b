use hashbrown::HashMap;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use triomphe::Arc;

use crate::bus::Message;
use crate::bus::MessageBus;
use crate::bus::MsgType;
use crate::bus::Payload;
use crate::consts::ASSET_LIST_EXTENSION;
use crate::subsystem::Subsystem;

// -----------------------------------------------------------------------------
// Asset Key
// -----------------------------------------------------------------------------

/// Identifier of a loaded asset, derived from its file name.
///
/// Keys are the 64-bit FNV-1a hash of the file name, so a script can refer
/// to `"explosion.wav"` without knowing where the file lives.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct AssetKey(u64);

impl AssetKey {
  const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
  const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

  /// Returns the key of the asset named `name`.
  pub const fn of(name: &str) -> Self {
    let bytes: &[u8] = name.as_bytes();
    let mut hash: u64 = Self::FNV_OFFSET;
    let mut index: usize = 0;

    while index < bytes.len() {
      hash ^= bytes[index] as u64;
      hash = hash.wrapping_mul(Self::FNV_PRIME);
      index += 1;
    }

    Self(hash)
  }

  /// Returns the key of the asset stored at `path`.
  pub fn of_path(path: &str) -> Self {
    Self::of(file_name(path))
  }

  #[inline]
  pub const fn from_raw(raw: u64) -> Self {
    Self(raw)
  }

  #[inline]
  pub const fn into_raw(self) -> u64 {
    self.0
  }
}

impl Debug for AssetKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for AssetKey {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "#Asset<{:016x}>", self.0)
  }
}

// -----------------------------------------------------------------------------
// Asset Kind
// -----------------------------------------------------------------------------

/// Category of an asset, chosen by file extension.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AssetKind {
  Texture,
  Sound,
  Music,
  Font,
  Data,
}

impl AssetKind {
  pub fn from_path(path: &str) -> Self {
    let extension: Option<String> = Path::new(path)
      .extension()
      .and_then(OsStr::to_str)
      .map(str::to_ascii_lowercase);

    match extension.as_deref() {
      Some("png" | "bmp" | "jpg" | "jpeg" | "tga") => Self::Texture,
      Some("wav") => Self::Sound,
      Some("ogg" | "mp3" | "flac" | "mod") => Self::Music,
      Some("ttf" | "otf") => Self::Font,
      _ => Self::Data,
    }
  }
}

// -----------------------------------------------------------------------------
// Asset
// -----------------------------------------------------------------------------

/// A loaded asset.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
  name: String,
  kind: AssetKind,
  bytes: Arc<Vec<u8>>,
}

impl Asset {
  /// Returns the path the asset was loaded from.
  #[inline]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[inline]
  pub const fn kind(&self) -> AssetKind {
    self.kind
  }

  #[inline]
  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }
}

impl Debug for Asset {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Asset")
      .field("name", &self.name)
      .field("kind", &self.kind)
      .field("bytes", &self.bytes.len())
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Asset Snapshot
// -----------------------------------------------------------------------------

/// Immutable view of the loaded assets, published on every change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetSnapshot {
  entries: HashMap<AssetKey, Asset>,
}

impl AssetSnapshot {
  #[inline]
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn get(&self, key: AssetKey) -> Option<&Asset> {
    self.entries.get(&key)
  }

  #[inline]
  pub fn contains(&self, key: AssetKey) -> bool {
    self.entries.contains_key(&key)
  }

  /// Returns `true` if `key` is loaded and of the given `kind`.
  #[inline]
  pub fn contains_kind(&self, key: AssetKey, kind: AssetKind) -> bool {
    self.get(key).is_some_and(|asset| asset.kind == kind)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (AssetKey, &Asset)> + '_ {
    self.entries.iter().map(|(key, asset)| (*key, asset))
  }
}

// -----------------------------------------------------------------------------
// Assets
// -----------------------------------------------------------------------------

/// Reference-counted asset store rooted at a directory.
///
/// `LoadAsset` of a `.list` file loads every line of the file; blank lines
/// and lines starting with `#` are skipped. Every change is published once
/// per frame as an [`AssetSnapshot`].
///
/// Paths are relative to the root and may not leave it. Two files sharing a
/// file name share an [`AssetKey`], so only one of them can be loaded at a
/// time.
#[derive(Debug)]
pub struct Assets {
  root: PathBuf,
  counts: HashMap<String, usize>,
  snapshot: AssetSnapshot,
  dirty: bool,
}

impl Assets {
  pub fn new<P>(root: P) -> Self
  where
    P: Into<PathBuf>,
  {
    Self {
      root: root.into(),
      counts: HashMap::new(),
      snapshot: AssetSnapshot::new(),
      dirty: false,
    }
  }

  #[inline]
  pub fn root(&self) -> &Path {
    &self.root
  }

  #[inline]
  pub const fn snapshot(&self) -> &AssetSnapshot {
    &self.snapshot
  }

  /// Returns how many times `path` is currently loaded.
  #[inline]
  pub fn ref_count(&self, path: &str) -> usize {
    self.counts.get(path).copied().unwrap_or(0)
  }

  fn load(&mut self, path: &str, bus: &MessageBus) {
    if is_list(path) {
      if let Some(list) = self.read_list(path, bus) {
        for entry in list.iter() {
          self.load_one(entry, bus);
        }
      }
    } else {
      self.load_one(path, bus);
    }
  }

  fn unload(&mut self, path: &str, bus: &MessageBus) {
    if is_list(path) {
      if let Some(list) = self.read_list(path, bus) {
        for entry in list.iter() {
          self.unload_one(entry, bus);
        }
      }
    } else {
      self.unload_one(path, bus);
    }
  }

  fn load_one(&mut self, path: &str, bus: &MessageBus) {
    if let Some(count) = self.counts.get_mut(path) {
      *count += 1;
      return;
    }

    if !is_relative(path) {
      bus.post(Payload::LogError(format!("Asset path {path} is outside the asset root")));
      return;
    }

    let key: AssetKey = AssetKey::of_path(path);

    if let Some(other) = self.snapshot.get(key) {
      let text: String = format!("Asset {path} conflicts with loaded asset {}", other.name);
      bus.post(Payload::LogError(text));
      return;
    }

    let Ok(bytes) = fs::read(self.root.join(path)) else {
      bus.post(Payload::LogError(format!("File {path} not found")));
      return;
    };

    debug!(target: "st_engine", path, bytes = bytes.len(), "load asset");

    let asset: Asset = Asset {
      name: path.to_owned(),
      kind: AssetKind::from_path(path),
      bytes: Arc::new(bytes),
    };

    self.snapshot.entries.insert(key, asset);
    self.counts.insert(path.to_owned(), 1);
    self.dirty = true;
  }

  fn unload_one(&mut self, path: &str, bus: &MessageBus) {
    match self.counts.get_mut(path) {
      Some(count) if *count > 1 => {
        *count -= 1;
      }
      Some(_) => {
        debug!(target: "st_engine", path, "unload asset");

        self.counts.remove(path);
        self.snapshot.entries.remove(&AssetKey::of_path(path));
        self.dirty = true;
      }
      None => {
        bus.post(Payload::LogWarning(format!("Asset {path} is not loaded")));
      }
    }
  }

  fn read_list(&self, path: &str, bus: &MessageBus) -> Option<Vec<String>> {
    if !is_relative(path) {
      bus.post(Payload::LogError(format!("Asset path {path} is outside the asset root")));
      return None;
    }

    let Ok(source) = fs::read_to_string(self.root.join(path)) else {
      bus.post(Payload::LogError(format!("File {path} not found")));
      return None;
    };

    let entries: Vec<String> = source
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty() && !line.starts_with('#'))
      .map(str::to_owned)
      .collect();

    Some(entries)
  }
}

impl Subsystem for Assets {
  const NAME: &'static str = "assets";

  const SUBSCRIPTIONS: &'static [MsgType] = &[MsgType::LoadAsset, MsgType::UnloadAsset];

  fn on_init(&mut self, bus: &MessageBus) {
    bus.post(Payload::Assets(Arc::new(self.snapshot.clone())));
  }

  fn on_message(&mut self, message: &Message, bus: &MessageBus) {
    match message.data() {
      Payload::LoadAsset(path) => self.load(path, bus),
      Payload::UnloadAsset(path) => self.unload(path, bus),
      _ => {}
    }
  }

  fn on_frame(&mut self, bus: &MessageBus) {
    if self.dirty {
      self.dirty = false;
      bus.post(Payload::Assets(Arc::new(self.snapshot.clone())));
    }
  }
}

fn is_list(path: &str) -> bool {
  Path::new(path).extension() == Some(OsStr::new(ASSET_LIST_EXTENSION))
}

fn is_relative(path: &str) -> bool {
  Path::new(path)
    .components()
    .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn file_name(path: &str) -> &str {
  Path::new(path)
    .file_name()
    .and_then(OsStr::to_str)
    .unwrap_or(path)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::fs;
  use tempfile::TempDir;

  use super::*;
  use crate::bus::BusBuilder;
  use crate::bus::MsgPool;
  use crate::bus::Subscriber;

  fn setup() -> (Arc<MessageBus>, Subscriber) {
    let pool: MsgPool = MsgPool::with_capacity(64, 64);
    let log: Subscriber = Subscriber::new();
    let mut setup: BusBuilder = MessageBus::builder(pool);

    setup.subscribe(MsgType::LogError, &log);
    setup.subscribe(MsgType::LogWarning, &log);
    setup.subscribe(MsgType::Assets, &log);

    (setup.build(), log)
  }

  fn drain(log: &mut Subscriber) -> Vec<Payload> {
    log.drain().map(|message| message.data().clone()).collect()
  }

  #[test]
  fn test_key_fnv1a() {
    assert_eq!(AssetKey::of("").into_raw(), 0xcbf2_9ce4_8422_2325);
    assert_eq!(AssetKey::of("a").into_raw(), 0xaf63_dc4c_8601_ec8c);
    assert_eq!(AssetKey::of_path("sfx/boom.wav"), AssetKey::of("boom.wav"));
  }

  #[test]
  fn test_kind_from_path() {
    assert_eq!(AssetKind::from_path("hero.PNG"), AssetKind::Texture);
    assert_eq!(AssetKind::from_path("boom.wav"), AssetKind::Sound);
    assert_eq!(AssetKind::from_path("theme.ogg"), AssetKind::Music);
    assert_eq!(AssetKind::from_path("mono.ttf"), AssetKind::Font);
    assert_eq!(AssetKind::from_path("level.dat"), AssetKind::Data);
  }

  #[test]
  fn test_load_refcount() {
    let root: TempDir = TempDir::new().unwrap();
    let (bus, mut log) = setup();
    let mut assets: Assets = Assets::new(root.path());

    fs::write(root.path().join("boom.wav"), b"RIFF").unwrap();

    assets.load("boom.wav", &bus);
    assets.load("boom.wav", &bus);

    assert_eq!(assets.ref_count("boom.wav"), 2);
    assert!(assets.snapshot().contains_kind(AssetKey::of("boom.wav"), AssetKind::Sound));
    assert_eq!(assets.snapshot().get(AssetKey::of("boom.wav")).unwrap().bytes(), b"RIFF");

    assets.on_frame(&bus);
    assets.on_frame(&bus);

    let published: Vec<Payload> = drain(&mut log);

    assert_eq!(published.len(), 1);
    assert!(matches!(&published[0], Payload::Assets(snapshot) if snapshot.len() == 1));

    assets.unload("boom.wav", &bus);
    assert!(assets.snapshot().contains(AssetKey::of("boom.wav")));

    assets.unload("boom.wav", &bus);
    assert!(assets.snapshot().is_empty());
    assert_eq!(assets.ref_count("boom.wav"), 0);

    assets.unload("boom.wav", &bus);
    assert_eq!(
      drain(&mut log),
      [Payload::LogWarning("Asset boom.wav is not loaded".to_owned())],
    );
  }

  #[test]
  fn test_load_missing() {
    let root: TempDir = TempDir::new().unwrap();
    let (bus, mut log) = setup();
    let mut assets: Assets = Assets::new(root.path());

    assets.load("ghost.png", &bus);
    assets.on_frame(&bus);

    assert!(assets.snapshot().is_empty());
    assert_eq!(
      drain(&mut log),
      [Payload::LogError("File ghost.png not found".to_owned())],
    );
  }

  #[test]
  fn test_load_list() {
    let root: TempDir = TempDir::new().unwrap();
    let (bus, _log) = setup();
    let mut assets: Assets = Assets::new(root.path());

    fs::write(root.path().join("a.png"), b"a").unwrap();
    fs::write(root.path().join("b.ogg"), b"b").unwrap();
    fs::write(root.path().join("level.list"), "# level one\na.png\n\n  b.ogg  \n").unwrap();

    assets.load("level.list", &bus);

    assert_eq!(assets.snapshot().len(), 2);
    assert!(assets.snapshot().contains_kind(AssetKey::of("b.ogg"), AssetKind::Music));

    assets.unload("level.list", &bus);

    assert!(assets.snapshot().is_empty());
  }

  #[test]
  fn test_same_file_name_conflicts() {
    let root: TempDir = TempDir::new().unwrap();
    let (bus, mut log) = setup();
    let mut assets: Assets = Assets::new(root.path());

    fs::create_dir(root.path().join("a")).unwrap();
    fs::create_dir(root.path().join("b")).unwrap();
    fs::write(root.path().join("a/x.png"), b"first").unwrap();
    fs::write(root.path().join("b/x.png"), b"second").unwrap();

    assets.load("a/x.png", &bus);
    assets.load("b/x.png", &bus);

    assert_eq!(assets.ref_count("a/x.png"), 1);
    assert_eq!(assets.ref_count("b/x.png"), 0);
    assert_eq!(assets.snapshot().get(AssetKey::of("x.png")).unwrap().name(), "a/x.png");

    assets.unload("b/x.png", &bus);

    assert_eq!(assets.snapshot().get(AssetKey::of("x.png")).unwrap().bytes(), b"first");
    assert_eq!(
      drain(&mut log),
      [
        Payload::LogError("Asset b/x.png conflicts with loaded asset a/x.png".to_owned()),
        Payload::LogWarning("Asset b/x.png is not loaded".to_owned()),
      ],
    );

    assets.unload("a/x.png", &bus);
    assets.load("b/x.png", &bus);

    assert_eq!(assets.snapshot().get(AssetKey::of("x.png")).unwrap().bytes(), b"second");
  }

  #[test]
  fn test_paths_outside_root_rejected() {
    let parent: TempDir = TempDir::new().unwrap();
    let root: PathBuf = parent.path().join("assets");
    let (bus, mut log) = setup();

    fs::create_dir(&root).unwrap();
    fs::write(parent.path().join("secret.dat"), b"nope").unwrap();
    fs::write(parent.path().join("outer.list"), "secret.dat\n").unwrap();

    let mut assets: Assets = Assets::new(&root);
    let absolute: String = parent.path().join("secret.dat").display().to_string();

    assets.load("../secret.dat", &bus);
    assets.load("../outer.list", &bus);
    assets.load(&absolute, &bus);

    assert!(assets.snapshot().is_empty());
    assert_eq!(
      drain(&mut log),
      [
        Payload::LogError("Asset path ../secret.dat is outside the asset root".to_owned()),
        Payload::LogError("Asset path ../outer.list is outside the asset root".to_owned()),
        Payload::LogError(format!("Asset path {absolute} is outside the asset root")),
      ],
    );
  }
}
