use log::warn;

/// Default arena growth step: 1 MiB.
pub const DEFAULT_BLOCK_INCREMENT: usize = 1024 * 1024;

/// Environment variable read by the process-wide engine.
pub const BLOCK_INCREMENT_ENV: &str = "TRACKALLOC_BLOCK_INCREMENT";

/// Tuning for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  /// Minimum size of every arena requested from the system allocator.
  pub block_increment: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      block_increment: DEFAULT_BLOCK_INCREMENT,
    }
  }
}

impl Config {
  /// Sets the growth step. Zero is bumped to one byte.
  pub fn with_block_increment(
    mut self,
    bytes: usize,
  ) -> Self {
    self.block_increment = bytes.max(1);
    self
  }

  /// Reads [`BLOCK_INCREMENT_ENV`], falling back to the defaults.
  pub fn from_env() -> Self {
    let value = std::env::var(BLOCK_INCREMENT_ENV).ok();
    Self::from_value(value.as_deref())
  }

  fn from_value(value: Option<&str>) -> Self {
    let Some(raw) = value else {
      return Self::default();
    };

    match raw.trim().parse::<usize>() {
      Ok(bytes) if bytes > 0 => Self::default().with_block_increment(bytes),
      _ => {
        warn!(
          "ignoring {}={:?}: expected a positive byte count",
          BLOCK_INCREMENT_ENV, raw
        );
        Self::default()
      }
    }
  }
}
