use std::{mem, ptr::NonNull};

use rand::{Rng, SeedableRng, rngs::StdRng};
use trackalloc::{AllocError, Config, Engine, Origin};

fn init_logger() {
  let _ = pretty_env_logger::try_init();
}

fn engine(increment: usize) -> Engine {
  init_logger();
  Engine::new(Config::default().with_block_increment(increment))
}

fn origin(line: u32) -> Origin {
  Origin::new("scenarios.rs", line)
}

fn assert_fully_coalesced(engine: &Engine) {
  for arena in engine.arenas() {
    for pair in arena.blocks().windows(2) {
      assert!(
        !(pair[0].is_free() && pair[1].is_free()),
        "adjacent free blocks left unmerged: {:?}",
        pair
      );
      assert!(pair[0].precedes(&pair[1]));
    }
  }
}

#[test]
fn test_ints_and_text() {
  init_logger();
  let mut engine = Engine::new(Config::default());

  let ints = engine.allocate(100 * mem::size_of::<i32>(), origin(1)).unwrap();
  let text = engine.allocate(32, origin(2)).unwrap();

  let report = engine.report();
  assert_eq!(report.len(), 2);
  assert_eq!(report.total, 432);
  assert_eq!(report.iter().map(|r| r.size).sum::<usize>(), 432);

  engine.deallocate(ints.as_ptr()).unwrap();
  engine.deallocate(text.as_ptr()).unwrap();

  assert!(engine.report().is_empty());
  assert_eq!(engine.total_bytes(), 0);
}

#[test]
fn test_report_is_idempotent() {
  let mut engine = engine(4096);

  engine.allocate(10, origin(1)).unwrap();
  engine.allocate(20, origin(2)).unwrap();

  let first = engine.report();
  let second = engine.report();

  assert_eq!(first, second);
  assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_round_trip_restores_total() {
  let mut engine = engine(4096);
  engine.allocate(100, origin(1)).unwrap();
  let before = engine.total_bytes();

  let ptr = engine.allocate(77, origin(2)).unwrap();
  assert_eq!(engine.total_bytes(), before + 77);

  engine.deallocate(ptr.as_ptr()).unwrap();

  assert_eq!(engine.total_bytes(), before);
  assert!(engine.report().iter().all(|r| r.ptr != ptr));
}

#[test]
fn test_total_tracks_live_requests() {
  let mut engine = engine(512);
  let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

  // Seeded mix of sizes, some larger than an arena.
  let mut rng = StdRng::seed_from_u64(17);
  for step in 0..200 {
    if !live.is_empty() && rng.gen_bool(1.0 / 3.0) {
      let (ptr, _) = live.swap_remove(rng.gen_range(0..live.len()));
      engine.deallocate(ptr.as_ptr()).unwrap();
      assert_fully_coalesced(&engine);
    } else {
      let size = rng.gen_range(0..700);
      let ptr = engine.allocate(size, origin(step)).unwrap();
      live.push((ptr, size));
    }

    let expected: usize = live.iter().map(|(_, size)| size).sum();
    assert_eq!(engine.total_bytes(), expected);
    assert_eq!(engine.report().len(), live.len());
  }

  for (ptr, _) in live {
    engine.deallocate(ptr.as_ptr()).unwrap();
  }
  assert_eq!(engine.total_bytes(), 0);
  assert_fully_coalesced(&engine);
  for arena in engine.arenas() {
    assert_eq!(arena.blocks().len(), 1);
  }
}

#[test]
fn test_growth_creates_one_arena() {
  let mut engine = engine(1024);

  engine.allocate(16, origin(1)).unwrap();
  assert_eq!(engine.arena_sizes(), vec![1024]);

  // Larger than the increment: the new arena is sized to the request.
  engine.allocate(4096, origin(2)).unwrap();
  assert_eq!(engine.arena_sizes(), vec![1024, 4096]);

  // Too big for what is left of either arena: one increment-sized arena.
  engine.allocate(1010, origin(3)).unwrap();
  assert_eq!(engine.arena_sizes(), vec![1024, 4096, 1024]);

  // Small requests go back to the first arena.
  let small = engine.allocate(8, origin(4)).unwrap();
  assert!(engine.arenas()[0].contains(small.as_ptr() as usize));
  assert_eq!(engine.arena_count(), 3);
}

#[test]
fn test_leaks_reported_at_teardown() {
  let mut engine = engine(1024);

  let leaked = engine.allocate(40, Origin::new("leaky.rs", 12)).unwrap();
  let freed = engine.allocate(8, origin(2)).unwrap();
  engine.deallocate(freed.as_ptr()).unwrap();

  let leaks = engine.shutdown();

  assert_eq!(leaks.len(), 1);
  let record = &leaks.records[0];
  assert_eq!(record.ptr, leaked);
  assert_eq!(record.size, 40);
  assert_eq!(record.origin.file, "leaky.rs");
  assert_eq!(record.origin.line, 12);
  assert!(leaks.to_string().contains("40 bytes allocated at leaky.rs:12"));
}

#[test]
fn test_freed_neighbours_serve_larger_request() {
  let mut engine = engine(1024);

  let a = engine.allocate(64, origin(1)).unwrap();
  let b = engine.allocate(64, origin(2)).unwrap();
  assert_eq!(b.as_ptr() as usize, a.as_ptr() as usize + 64);

  // Fill the rest of the arena so only the freed pair can serve 128 bytes.
  let rest = 1024 - 128;
  let filler = engine.allocate(rest, origin(3)).unwrap();
  assert_eq!(engine.arena_count(), 1);

  engine.deallocate(a.as_ptr()).unwrap();
  engine.deallocate(b.as_ptr()).unwrap();

  let free: Vec<usize> = engine.arenas()[0]
    .blocks()
    .iter()
    .filter(|block| block.is_free())
    .map(|block| block.size)
    .collect();
  assert_eq!(free, vec![128]);

  let c = engine.allocate(128, origin(4)).unwrap();
  assert_eq!(c, a);
  assert_eq!(engine.arena_count(), 1);

  engine.deallocate(filler.as_ptr()).unwrap();
}

#[test]
fn test_unknown_and_double_free_are_ignored() {
  let mut engine = engine(1024);

  let ptr = engine.allocate(32, origin(1)).unwrap();
  let mut foreign = 0u64;

  engine.deallocate(&mut foreign as *mut u64 as *mut u8).unwrap();
  engine.deallocate(std::ptr::null_mut()).unwrap();
  // Interior pointer of a live block.
  engine.deallocate(unsafe { ptr.as_ptr().add(1) }).unwrap();
  assert_eq!(engine.total_bytes(), 32);

  engine.deallocate(ptr.as_ptr()).unwrap();
  engine.deallocate(ptr.as_ptr()).unwrap();
  assert_eq!(engine.total_bytes(), 0);
}

#[test]
fn test_memory_is_usable() {
  let mut engine = engine(1024);

  let first = engine.allocate(16, origin(1)).unwrap();
  let second = engine.allocate(16, origin(2)).unwrap();

  unsafe {
    first.as_ptr().write_bytes(0xAB, 16);
    second.as_ptr().write_bytes(0xCD, 16);

    assert!((0..16).all(|i| *first.as_ptr().add(i) == 0xAB));
    assert!((0..16).all(|i| *second.as_ptr().add(i) == 0xCD));
  }
}

#[test]
fn test_after_teardown() {
  let mut engine = engine(1024);
  engine.allocate(1, origin(1)).unwrap();
  engine.shutdown();

  assert_eq!(engine.allocate(1, origin(2)), Err(AllocError::Terminated));
  assert!(engine.report().is_empty());
}
