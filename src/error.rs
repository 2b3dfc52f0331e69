use thiserror::Error;

/// Failures surfaced by the allocator engine.
///
/// Freeing a pointer the engine does not track is deliberately *not* an
/// error: it is a silent no-op.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// The system allocator could not back a new arena.
  #[error("out of memory: no arena could be obtained for {requested} bytes")]
  OutOfMemory {
    /// Bytes the caller asked for.
    requested: usize,
  },

  /// A tracked pointer has no used block starting at it. The block table is
  /// corrupt.
  #[error("invalid free of {ptr:#x}: tracked, but no used block starts there")]
  InvalidFree {
    /// The address passed to `deallocate`.
    ptr: usize,
  },

  /// The engine has already been torn down.
  #[error("allocator has been torn down")]
  Terminated,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    let oom = AllocError::OutOfMemory { requested: 42 };
    assert_eq!(
      oom.to_string(),
      "out of memory: no arena could be obtained for 42 bytes"
    );

    let invalid = AllocError::InvalidFree { ptr: 0x1000 };
    assert!(invalid.to_string().contains("0x1000"));
  }
}
