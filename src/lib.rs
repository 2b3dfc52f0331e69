//! # trackalloc - A Leak-Tracking Arena Allocator
//!
//! This crate provides a user-space allocator that serves every request from
//! arenas it obtains from the system allocator (`malloc(3)`), and remembers
//! *where* each live allocation came from so that leaks can be reported when
//! the process exits.
//!
//! ## Overview
//!
//! ```text
//!   Engine
//!   ├── arenas ──────────────────────────────────────────────────────────┐
//!   │    ┌──────────────────────────── arena 0 (1 MiB) ───────────────┐  │
//!   │    │ ┌───────┬──────────┬──────┬──────────────────────────────┐ │  │
//!   │    │ │ used  │   used   │ free │             free             │ │  │
//!   │    │ └───────┴──────────┴──────┴──────────────────────────────┘ │  │
//!   │    └────────────────────────────────────────────────────────────┘  │
//!   │    ┌──────── arena 1 ────────┐                                     │
//!   │    │ ┌──────────┬──────────┐ │                                     │
//!   │    │ │   used   │   free   │ │                                     │
//!   │    │ └──────────┴──────────┘ │                                     │
//!   │    └─────────────────────────┘                                     │
//!   └── tracker: ptr ──► { size, file, line } ◄──────────────────────────┘
//! ```
//!
//! - **allocate**: first-fit over every block of every arena. The chosen
//!   block is split when it is larger than the request by more than one
//!   block's worth of bookkeeping. When nothing fits, a new arena of
//!   `max(size, block_increment)` bytes is created and the search runs once
//!   more.
//! - **deallocate**: the block is marked free and contiguous free blocks of
//!   its arena are merged. Unknown pointers are ignored.
//! - **shutdown**: everything still tracked is reported as a leak, *then*
//!   the arenas are released.
//!
//! ## Crate Structure
//!
//! ```text
//!   trackalloc
//!   ├── block    - Block (start, size, used)
//!   ├── arena    - Arena: block table, first-fit, split, coalesce
//!   ├── tracker  - AllocationTracker, AllocationRecord, Origin
//!   ├── report   - Report snapshot and its text rendering
//!   ├── engine   - Engine state machine
//!   ├── config   - Config (block increment)
//!   ├── error    - AllocError
//!   ├── hook     - AllocHook, the allocate/deallocate capability
//!   └── global   - the process-wide engine and its exit hook
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use trackalloc::{Config, Engine, Origin};
//!
//! let mut engine = Engine::new(Config::default());
//!
//! let ptr = engine.allocate(400, Origin::new("main.rs", 4)).unwrap();
//! assert_eq!(engine.total_bytes(), 400);
//! print!("{}", engine.report());
//!
//! engine.deallocate(ptr.as_ptr()).unwrap();
//! assert!(engine.report().is_empty());
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded core**: [`Engine`] takes `&mut self`; the process-wide
//!   instance in [`global`] puts one lock around the whole engine.
//! - **Byte alignment only**: blocks start wherever the previous one ended.
//! - **Arenas only grow**: nothing is returned to the system before teardown.
//! - **Permissive free**: freeing an unknown or already freed pointer is a
//!   silent no-op, so double frees go unnoticed.

mod arena;
mod block;
mod config;
mod engine;
mod error;
pub mod global;
mod hook;
mod report;
mod tracker;

pub use arena::Arena;
pub use block::{Block, SPLIT_THRESHOLD};
pub use config::{BLOCK_INCREMENT_ENV, Config, DEFAULT_BLOCK_INCREMENT};
pub use engine::{Engine, EngineState};
pub use error::AllocError;
pub use hook::AllocHook;
pub use report::Report;
pub use tracker::{AllocationRecord, AllocationTracker, Origin};
