//! Fallback for architectures without a trampoline. Marshalling still works, calling does not.

use super::{InvokeError, NativeReturn};
use crate::MarshalledCall;

/// # Safety
/// Never calls anything; unsafe only to match the other backends.
pub unsafe fn invoke(_call: &MarshalledCall<'_>) -> Result<NativeReturn, InvokeError> {
    Err(InvokeError::UnsupportedArchitecture)
}
