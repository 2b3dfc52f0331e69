use std::{mem, ptr};

use trackalloc::{AllocError, global};

/// Mirrors a small program routed through the tracking allocator: two
/// allocations are shown, freed and shown again. One more allocation is
/// left live on purpose so the exit hook has a leak to report.
fn main() -> Result<(), AllocError> {
  if std::env::var_os("RUST_LOG").is_none() {
    // SAFETY: single-threaded at this point.
    unsafe { std::env::set_var("RUST_LOG", "info") };
  }
  pretty_env_logger::init();

  // 100 integers. Blocks are only byte-aligned.
  let numbers = global::alloc_here(100 * mem::size_of::<i32>())?.cast::<i32>();
  for i in 0..100 {
    unsafe { numbers.add(i).write_unaligned(i as i32) };
  }

  // A 32-byte text object.
  let greeting = "Hello, Memory Allocator!";
  let text = global::alloc_here(32)?;
  unsafe { ptr::copy_nonoverlapping(greeting.as_ptr(), text.as_ptr(), greeting.len()) };

  print!("{}", global::report());

  global::deallocate(numbers.as_ptr().cast())?;
  global::deallocate(text.as_ptr())?;

  print!("{}", global::report());

  // Never freed: shows up under "Memory leaks detected" on exit.
  let _leaked = global::alloc_here(16)?;

  Ok(())
}
