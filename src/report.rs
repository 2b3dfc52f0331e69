use std::fmt;

use crate::tracker::AllocationRecord;

/// Snapshot of the live allocations, in address order.
///
/// Rendered with `Display`:
///
/// ```text
/// Current allocations (2):
///   0x7f3a1c000010 - 400 bytes allocated at demos/leak_report.rs:12
///   0x7f3a1c0001a0 - 32 bytes allocated at demos/leak_report.rs:18
/// Total allocated: 432 bytes
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
  pub records: Vec<AllocationRecord>,
  /// Sum of requested sizes.
  pub total: usize,
}

impl Report {
  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &AllocationRecord> {
    self.records.iter()
  }
}

impl fmt::Display for Report {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Current allocations ({}):", self.records.len())?;
    for record in &self.records {
      writeln!(f, "  {record}")?;
    }
    writeln!(f, "Total allocated: {} bytes", self.total)
  }
}
