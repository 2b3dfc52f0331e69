use std::{cmp, ptr::NonNull};

use log::{debug, trace, warn};

use crate::{
  arena::Arena,
  config::Config,
  error::AllocError,
  hook::AllocHook,
  report::Report,
  tracker::{AllocationRecord, AllocationTracker, Origin},
};

/// Lifecycle of an [`Engine`].
///
/// ```text
///   Uninitialized ──first allocate──► Active ──shutdown──► ShuttingDown ──► Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
  Uninitialized,
  Active,
  /// Leaks are being reported; arenas are still mapped.
  ShuttingDown,
  Terminated,
}

/// The allocator: arenas, their block tables and the allocation tracker.
///
/// Allocation is first-fit across arenas in creation order. When nothing
/// fits, one new arena of `max(size, block_increment)` bytes is created and
/// the search is retried once.
///
/// `total_bytes` counts *requested* sizes. A block handed out whole (excess
/// within the split threshold) reserves more than that; see
/// [`Engine::reserved_bytes`] for the block-level figure.
#[derive(Debug)]
pub struct Engine {
  config: Config,
  state: EngineState,
  arenas: Vec<Arena>,
  tracker: AllocationTracker,
  total_allocated: usize,
}

// SAFETY: the raw pointers held by an engine only ever point into arenas the
// engine owns exclusively, so moving the whole engine to another thread moves
// that memory with it.
unsafe impl Send for Engine {}

impl Default for Engine {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      state: EngineState::Uninitialized,
      arenas: Vec::new(),
      tracker: AllocationTracker::new(),
      total_allocated: 0,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn state(&self) -> EngineState {
    self.state
  }

  pub fn arenas(&self) -> &[Arena] {
    &self.arenas
  }

  pub fn arena_count(&self) -> usize {
    self.arenas.len()
  }

  pub fn arena_sizes(&self) -> Vec<usize> {
    self.arenas.iter().map(Arena::size).collect()
  }

  /// Sum of requested sizes of live allocations.
  pub fn total_bytes(&self) -> usize {
    self.total_allocated
  }

  /// Sum of the sizes of used blocks.
  pub fn reserved_bytes(&self) -> usize {
    self.arenas.iter().map(Arena::reserved).sum()
  }

  /// Non-destructive snapshot of every live allocation.
  pub fn report(&self) -> Report {
    Report {
      records: self.tracker.iter().cloned().collect(),
      total: self.total_allocated,
    }
  }

  fn activate(&mut self) -> Result<(), AllocError> {
    self.grow_arena(self.config.block_increment)?;
    self.state = EngineState::Active;

    debug!(
      "engine active, block increment {} bytes",
      self.config.block_increment
    );

    Ok(())
  }

  fn grow_arena(
    &mut self,
    min_size: usize,
  ) -> Result<usize, AllocError> {
    let size = cmp::max(min_size, self.config.block_increment);
    self.arenas.push(Arena::new(size)?);
    Ok(self.arenas.len() - 1)
  }

  /// First-fit across all arenas: `(arena, block)` indices.
  fn find_free(
    &self,
    size: usize,
  ) -> Option<(usize, usize)> {
    self
      .arenas
      .iter()
      .enumerate()
      .find_map(|(arena, table)| table.find_free(size).map(|block| (arena, block)))
  }

  /// Hands out a block of at least `size` bytes and records `origin` for it.
  ///
  /// A zero-byte request still reserves one byte so every live allocation
  /// has its own address; the record keeps the requested size of zero.
  pub fn allocate(
    &mut self,
    size: usize,
    origin: Origin,
  ) -> Result<NonNull<u8>, AllocError> {
    match self.state {
      EngineState::Uninitialized => self.activate()?,
      EngineState::Active => {}
      EngineState::ShuttingDown | EngineState::Terminated => return Err(AllocError::Terminated),
    }

    let needed = size.max(1);

    let (arena, block) = match self.find_free(needed) {
      Some(found) => found,
      None => {
        self.grow_arena(needed).map_err(|_| AllocError::OutOfMemory { requested: size })?;
        self
          .find_free(needed)
          .ok_or(AllocError::OutOfMemory { requested: size })?
      }
    };

    let table = &mut self.arenas[arena];
    table.split_if_oversized(block, needed);
    let ptr = table.mark_used(block);

    trace!("allocate({}) -> {:?} for {}", size, ptr, origin);

    if let Some(previous) = self.tracker.record(AllocationRecord::new(ptr, size, origin)) {
      self.total_allocated -= previous.size;
    }
    self.total_allocated += size;

    Ok(ptr)
  }

  /// Returns the block at `ptr` to its arena and coalesces free neighbours.
  ///
  /// Pointers the tracker does not know (foreign, null, or already freed)
  /// are ignored.
  pub fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    let address = ptr as usize;

    let Some(record) = self.tracker.lookup(address) else {
      trace!("deallocate({:?}): not tracked, ignoring", ptr);
      return Ok(());
    };
    let size = record.size;

    let invalid = AllocError::InvalidFree { ptr: address };
    let arena = self
      .arenas
      .iter_mut()
      .find(|arena| arena.contains(address))
      .ok_or(invalid)?;
    arena.release(address).ok_or(invalid)?;

    self.tracker.remove(address);
    self.total_allocated -= size;
    arena.merge_adjacent_free();

    trace!("deallocate({:?}): {} bytes", ptr, size);

    Ok(())
  }

  /// Tears the engine down: reports what is still live, then returns every
  /// arena to the system allocator.
  ///
  /// The leaks are collected before any arena is released, while their
  /// addresses still mean something. Calling this again returns an empty
  /// report.
  pub fn shutdown(&mut self) -> Report {
    if self.state == EngineState::Terminated {
      return Report::default();
    }

    self.state = EngineState::ShuttingDown;

    let leaks = self.report();
    for record in leaks.iter() {
      warn!("leak: {record}");
    }
    if !leaks.is_empty() {
      warn!(
        "{} allocations ({} bytes) still live at teardown",
        leaks.len(),
        leaks.total
      );
    }

    self.tracker.clear();
    self.total_allocated = 0;
    self.arenas.clear();
    self.state = EngineState::Terminated;

    debug!("engine terminated");

    leaks
  }
}

impl AllocHook for Engine {
  fn allocate(
    &mut self,
    size: usize,
    origin: Origin,
  ) -> Result<NonNull<u8>, AllocError> {
    Engine::allocate(self, size, origin)
  }

  fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    Engine::deallocate(self, ptr)
  }
}

impl Drop for Engine {
  fn drop(&mut self) {
    self.shutdown();
  }
}
