//! kcall - Kernel Call Engine
//!
//! Calls a function by address with arguments that are only known at runtime.
//! The operator supplies each argument as text plus a printf-style format qualifier,
//! [`value`] turns that into a [`TypedValue`], [`marshal`] lays a list of them out the
//! way the System V x86-64 calling convention expects, and [`invoke`] performs the call.
//!
//! Only [`invoke`] knows about registers. Everything else is plain data and can be tested
//! on any host.
#![cfg_attr(not(test), no_std)]
#![warn(missing_debug_implementations)]
#![forbid(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod invoke;
pub mod marshal;
pub mod value;

pub use invoke::{InvokeError, NativeReturn, invoke};
pub use marshal::{ArgumentList, MarshalError, MarshalledCall};
pub use value::{Format, INLINE_TEXT_CAPACITY, RegisterClass, TypedValue, ValueError};

/// The maximum number of arguments a single call may carry.
pub const MAX_CALL_ARGS: usize = 250;

#[cfg(all(test, unix))]
mod test_setup {
    use ctor::ctor;

    #[ctor]
    static INIT: () = {
        env_logger::builder().is_test(true).init();
    };
}
