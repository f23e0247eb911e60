//! The native call seam.
//!
//! [`invoke`] is the one place that touches machine registers and the stack. The contract every
//! architecture backend implements:
//!
//! - integer arguments in [`MarshalledCall::integer_registers`] order land in the parameter
//!   registers (`rdi, rsi, rdx, rcx, r8, r9` on x86-64),
//! - float arguments land in the vector parameter registers (`xmm0..xmm7`) at double precision,
//! - [`MarshalledCall::overflow_slots`] are pushed front to back, so the first stack argument ends
//!   up at the lowest address, directly above the return address,
//! - the stack pointer is 16-byte aligned at the call instruction; the even overflow slot count
//!   keeps the alignment the language guarantees on entry to inline assembly,
//! - the integer return register (`rax`) and the first vector return register (`xmm0`) are
//!   captured, and exactly the pushed words are dropped afterwards.
//!
//! The callee can do anything. Nothing about memory, locks or interrupts is preserved beyond what
//! the calling convention promises.

use cfg_if::cfg_if;

use crate::MarshalledCall;

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        mod x86_64;
        use self::x86_64 as arch_impl;
    } else {
        mod unsupported;
        use self::unsupported as arch_impl;
    }
}

/// Errors reported by the trampoline before any call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// The target address is zero.
    #[error("calls to null are not allowed")]
    NullTarget,
    /// The call has float arguments but the build has no SSE.
    #[error("floating-point arguments need SSE registers, which this build does not use")]
    FloatRegistersUnavailable,
    /// This architecture has no trampoline.
    #[error("native calls are not supported on this architecture")]
    UnsupportedArchitecture,
}

/// The registers captured after the callee returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeReturn {
    /// The integer return register.
    pub integer: u64,
    /// The raw bits of the floating-point return register. Zero on builds without SSE.
    pub float: u64,
}

impl NativeReturn {
    /// The floating-point return register interpreted as a double.
    pub fn as_f64(&self) -> f64 {
        f64::from_bits(self.float)
    }
}

/// Calls [`MarshalledCall::target`] with the marshalled arguments.
///
/// # Safety
/// The target must be the address of a function using the native C calling convention that
/// accepts the marshalled arguments. The callee may read and write arbitrary memory; the caller
/// must make sure nothing else runs on this stack until the call returns (mask interrupts where
/// they could interleave).
pub unsafe fn invoke(call: &MarshalledCall<'_>) -> Result<NativeReturn, InvokeError> {
    if call.target() == 0 {
        return Err(InvokeError::NullTarget);
    }
    // SAFETY: Forwarded from the caller.
    unsafe { arch_impl::invoke(call) }
}
