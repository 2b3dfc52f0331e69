use std::ptr::NonNull;

use libc::{c_void, free, malloc};
use log::{debug, trace};

use crate::{block::Block, error::AllocError};

/// One region obtained from the system allocator, partitioned into blocks.
///
/// ```text
///   base                                                   base + size
///   ▼                                                               ▼
///   ┌──────────┬──────────────┬──────┬───────────────────────────────┐
///   │ used 64  │   used 400   │ free │            free ...           │
///   └──────────┴──────────────┴──────┴───────────────────────────────┘
///   blocks[0]     blocks[1]   blocks[2]
/// ```
///
/// The block table is kept in address order and always covers the whole
/// region: `blocks[i].end() == blocks[i + 1].addr()`.
#[derive(Debug)]
pub struct Arena {
  base: NonNull<u8>,
  size: usize,
  blocks: Vec<Block>,
}

impl Arena {
  /// Obtains `size` bytes with `malloc(3)` and covers them with a single free
  /// block.
  pub(crate) fn new(size: usize) -> Result<Self, AllocError> {
    // SAFETY: `malloc` has no preconditions; a null result is handled below.
    let address = unsafe { malloc(size) } as *mut u8;

    let base = NonNull::new(address).ok_or(AllocError::OutOfMemory { requested: size })?;

    debug!("new arena of {} bytes at {:?}", size, base);

    Ok(Self {
      base,
      size,
      blocks: vec![Block::free(base, size)],
    })
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  pub fn contains(
    &self,
    address: usize,
  ) -> bool {
    let base = self.base.as_ptr() as usize;
    (base..base + self.size).contains(&address)
  }

  /// First-fit: index of the first free block of at least `size` bytes.
  pub fn find_free(
    &self,
    size: usize,
  ) -> Option<usize> {
    self
      .blocks
      .iter()
      .position(|block| block.is_free() && block.size >= size)
  }

  /// Shrinks the free block at `index` to exactly `size` bytes when it is
  /// oversized, inserting the remainder as a new free block right after it.
  ///
  /// Returns whether a split happened.
  pub fn split_if_oversized(
    &mut self,
    index: usize,
    size: usize,
  ) -> bool {
    let block = self.blocks[index];

    debug_assert!(block.is_free());
    debug_assert!(block.size >= size);

    if !block.is_oversized_for(size) {
      return false;
    }

    // SAFETY: `size < block.size`, so the remainder starts inside the block
    // and therefore inside this arena.
    let rest = unsafe { block.start.add(size) };

    self.blocks[index].size = size;
    self
      .blocks
      .insert(index + 1, Block::free(rest, block.size - size));

    trace!(
      "split {:?}: {} used + {} free",
      block.start,
      size,
      block.size - size
    );

    true
  }

  /// Marks the block at `index` used and returns its start address.
  pub fn mark_used(
    &mut self,
    index: usize,
  ) -> NonNull<u8> {
    let block = &mut self.blocks[index];
    block.used = true;
    block.start
  }

  /// Marks the used block starting at `address` free, returning its size.
  ///
  /// `None` when no used block starts at `address`.
  pub fn release(
    &mut self,
    address: usize,
  ) -> Option<usize> {
    let block = self
      .blocks
      .iter_mut()
      .find(|block| block.used && block.addr() == address)?;

    block.used = false;
    Some(block.size)
  }

  /// Merges every run of contiguous free blocks into one block, in a single
  /// pass. Returns the number of blocks removed.
  pub fn merge_adjacent_free(&mut self) -> usize {
    let mut merged = 0;
    let mut i = 0;

    while i + 1 < self.blocks.len() {
      let current = self.blocks[i];
      let next = self.blocks[i + 1];

      if current.is_free() && next.is_free() && current.precedes(&next) {
        self.blocks[i].size += next.size;
        self.blocks.remove(i + 1);
        merged += 1;
      } else {
        i += 1;
      }
    }

    if merged > 0 {
      trace!("merged {} free blocks in arena {:?}", merged, self.base);
    }

    merged
  }

  /// Bytes held by used blocks.
  pub fn reserved(&self) -> usize {
    self
      .blocks
      .iter()
      .filter(|block| block.used)
      .map(|block| block.size)
      .sum()
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    debug!("releasing arena of {} bytes at {:?}", self.size, self.base);

    // SAFETY: `base` came from `malloc` in `Arena::new` and is freed once.
    unsafe { free(self.base.as_ptr() as *mut c_void) };
  }
}
