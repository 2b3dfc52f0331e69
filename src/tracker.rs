use std::{borrow::Cow, collections::BTreeMap, fmt, panic::Location, ptr::NonNull};

use log::warn;

/// Call site an allocation is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
  pub file: Cow<'static, str>,
  pub line: u32,
}

impl Origin {
  pub fn new(
    file: impl Into<Cow<'static, str>>,
    line: u32,
  ) -> Self {
    Self {
      file: file.into(),
      line,
    }
  }

  /// The location of whoever called the `#[track_caller]` chain ending here.
  #[track_caller]
  pub fn caller() -> Self {
    let location = Location::caller();
    Self::new(location.file(), location.line())
  }
}

impl fmt::Display for Origin {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}:{}", self.file, self.line)
  }
}

/// Metadata for one live allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
  /// Start of the block handed out.
  pub ptr: NonNull<u8>,
  /// Size the caller asked for, not the size of the block.
  pub size: usize,
  pub origin: Origin,
}

impl AllocationRecord {
  pub fn new(
    ptr: NonNull<u8>,
    size: usize,
    origin: Origin,
  ) -> Self {
    Self { ptr, size, origin }
  }

  pub fn addr(&self) -> usize {
    self.ptr.as_ptr() as usize
  }
}

impl fmt::Display for AllocationRecord {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{:p} - {} bytes allocated at {}",
      self.ptr, self.size, self.origin
    )
  }
}

/// Live allocations keyed by address, iterated in address order.
#[derive(Debug, Default)]
pub struct AllocationTracker {
  records: BTreeMap<usize, AllocationRecord>,
}

impl AllocationTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `record`, replacing and returning any record already held for
  /// the same address.
  pub fn record(
    &mut self,
    record: AllocationRecord,
  ) -> Option<AllocationRecord> {
    let previous = self.records.insert(record.addr(), record);

    if let Some(previous) = &previous {
      warn!(
        "overwrote live record {:p} ({} bytes from {})",
        previous.ptr, previous.size, previous.origin
      );
    }

    previous
  }

  pub fn lookup(
    &self,
    address: usize,
  ) -> Option<&AllocationRecord> {
    self.records.get(&address)
  }

  pub fn remove(
    &mut self,
    address: usize,
  ) -> Option<AllocationRecord> {
    self.records.remove(&address)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &AllocationRecord> {
    self.records.values()
  }

  pub fn clear(&mut self) {
    self.records.clear();
  }
}
