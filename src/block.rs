use std::{mem, ptr::NonNull};

/// Excess bytes a free block may carry past a request before it gets split.
///
/// One block's worth of bookkeeping: splitting off anything smaller would
/// cost more in metadata than it gives back.
pub const SPLIT_THRESHOLD: usize = mem::size_of::<Block>();

/// A contiguous sub-range of exactly one arena.
///
/// ```text
///   ┌──────────────────────────────────────────────┐
///   │ start ──►  size bytes  (used / free)         │
///   └──────────────────────────────────────────────┘
///                                            end() ▲
/// ```
///
/// `start` points into memory owned by the arena; a block never owns memory
/// of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub start: NonNull<u8>,
  pub size: usize,
  pub used: bool,
}

impl Block {
  pub fn new(
    start: NonNull<u8>,
    size: usize,
    used: bool,
  ) -> Self {
    Self { start, size, used }
  }

  pub fn free(
    start: NonNull<u8>,
    size: usize,
  ) -> Self {
    Self::new(start, size, false)
  }

  pub fn addr(&self) -> usize {
    self.start.as_ptr() as usize
  }

  /// First address past the block.
  pub fn end(&self) -> usize {
    self.addr() + self.size
  }

  pub fn is_free(&self) -> bool {
    !self.used
  }

  /// `true` when `next` starts exactly where `self` ends.
  pub fn precedes(
    &self,
    next: &Block,
  ) -> bool {
    self.end() == next.addr()
  }

  /// Whether handing this block out for `requested` bytes would waste more
  /// than [`SPLIT_THRESHOLD`].
  pub fn is_oversized_for(
    &self,
    requested: usize,
  ) -> bool {
    self.size > requested + SPLIT_THRESHOLD
  }
}
