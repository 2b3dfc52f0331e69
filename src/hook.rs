use std::ptr::NonNull;

use crate::{error::AllocError, tracker::Origin};

/// The two entry points anything that allocates through this crate depends
/// on.
///
/// Implemented by [`Engine`](crate::Engine) for an explicitly owned instance
/// and by [`Global`](crate::global::Global) for the process-wide one, so code
/// written against `AllocHook` runs against either.
pub trait AllocHook {
  fn allocate(
    &mut self,
    size: usize,
    origin: Origin,
  ) -> Result<NonNull<u8>, AllocError>;

  fn deallocate(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), AllocError>;
}
