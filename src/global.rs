//! The process-wide engine.
//!
//! Built on first use from [`Config::from_env`], guarded by one mutex taken
//! around every operation, and torn down by a `libc::atexit` hook that prints
//! the leak report to stderr before the arenas go back to the system.

use std::{
  io::{self, Write},
  ptr::NonNull,
  sync::{Mutex, MutexGuard, PoisonError, TryLockError},
};

use log::{error, warn};
use once_cell::sync::Lazy;

use crate::{
  config::Config,
  engine::Engine,
  error::AllocError,
  hook::AllocHook,
  report::Report,
  tracker::Origin,
};

static ENGINE: Lazy<Mutex<Engine>> = Lazy::new(|| {
  // SAFETY: `teardown` takes no arguments and does not unwind.
  if unsafe { libc::atexit(teardown) } != 0 {
    warn!("could not register the exit hook; leaks will not be reported");
  }

  Mutex::new(Engine::new(Config::from_env()))
});

fn engine() -> MutexGuard<'static, Engine> {
  ENGINE.lock().unwrap_or_else(PoisonError::into_inner)
}

extern "C" fn teardown() {
  let mut engine = match ENGINE.try_lock() {
    Ok(guard) => guard,
    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
    Err(TryLockError::WouldBlock) => {
      error!("engine still locked at exit; skipping leak report");
      return;
    }
  };

  if let Some(message) = leak_message(&engine.shutdown()) {
    let _ = io::stderr().write_all(message.as_bytes());
  }
}

/// What the exit hook prints: `None` when nothing leaked.
fn leak_message(leaks: &Report) -> Option<String> {
  if leaks.is_empty() {
    return None;
  }
  Some(format!("Memory leaks detected:\n{leaks}"))
}

pub fn allocate(
  size: usize,
  origin: Origin,
) -> Result<NonNull<u8>, AllocError> {
  engine().allocate(size, origin)
}

/// [`allocate`], attributed to the caller's file and line.
#[track_caller]
pub fn alloc_here(size: usize) -> Result<NonNull<u8>, AllocError> {
  allocate(size, Origin::caller())
}

pub fn deallocate(ptr: *mut u8) -> Result<(), AllocError> {
  engine().deallocate(ptr)
}

pub fn report() -> Report {
  engine().report()
}

pub fn total_bytes() -> usize {
  engine().total_bytes()
}

/// Handle on the process-wide engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

impl AllocHook for Global {
  fn allocate(
    &mut self,
    size: usize,
    origin: Origin,
  ) -> Result<NonNull<u8>, AllocError> {
    allocate(size, origin)
  }

  fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    deallocate(ptr)
  }
}
