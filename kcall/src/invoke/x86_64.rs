//! System V x86-64 trampoline.

use core::arch::asm;

use log::trace;

use super::{InvokeError, NativeReturn};
use crate::{
    MarshalledCall,
    marshal::{FLOAT_REGISTERS, INTEGER_REGISTERS},
};

fn registers<const N: usize>(values: &[u64]) -> [u64; N] {
    let mut out = [0u64; N];
    out[..values.len()].copy_from_slice(values);
    out
}

/// # Safety
/// See [`super::invoke`].
#[cfg(target_feature = "sse2")]
pub unsafe fn invoke(call: &MarshalledCall<'_>) -> Result<NativeReturn, InvokeError> {
    let int = registers::<INTEGER_REGISTERS>(call.integer_registers());
    let float = registers::<FLOAT_REGISTERS>(call.float_registers());
    let slots = call.overflow_slots();

    trace!(
        "invoking {:#x} with {} stack slots",
        call.target(),
        slots.len()
    );

    let integer: u64;
    let xmm0: f64;
    // SAFETY: The caller guarantees the target is callable with these arguments. Overflow slots
    // are pushed from r10 while r11 counts them down, below the current stack pointer, and popped
    // again through r12, which the callee must preserve. The slot count is even and the stack is
    // aligned on entry, so the call site is aligned as the ABI requires. `al` carries the number of vector registers for variadic
    // callees.
    unsafe {
        asm!(
            "2:",
            "test r11, r11",
            "jz 3f",
            "push qword ptr [r10]",
            "add r10, 8",
            "dec r11",
            "jmp 2b",
            "3:",
            "call {target}",
            "lea rsp, [rsp + r12 * 8]",
            target = in(reg) call.target(),
            inout("r10") slots.as_ptr() => _,
            inout("r11") slots.len() => _,
            in("r12") slots.len(),
            in("rdi") int[0],
            in("rsi") int[1],
            in("rdx") int[2],
            in("rcx") int[3],
            in("r8") int[4],
            in("r9") int[5],
            inout("xmm0") f64::from_bits(float[0]) => xmm0,
            in("xmm1") f64::from_bits(float[1]),
            in("xmm2") f64::from_bits(float[2]),
            in("xmm3") f64::from_bits(float[3]),
            in("xmm4") f64::from_bits(float[4]),
            in("xmm5") f64::from_bits(float[5]),
            in("xmm6") f64::from_bits(float[6]),
            in("xmm7") f64::from_bits(float[7]),
            inout("rax") call.float_registers().len() as u64 => integer,
            clobber_abi("sysv64"),
        );
    }

    Ok(NativeReturn {
        integer,
        float: xmm0.to_bits(),
    })
}

/// # Safety
/// See [`super::invoke`].
#[cfg(not(target_feature = "sse2"))]
pub unsafe fn invoke(call: &MarshalledCall<'_>) -> Result<NativeReturn, InvokeError> {
    if !call.float_registers().is_empty() {
        return Err(InvokeError::FloatRegistersUnavailable);
    }
    let int = registers::<INTEGER_REGISTERS>(call.integer_registers());
    let slots = call.overflow_slots();

    trace!(
        "invoking {:#x} with {} stack slots",
        call.target(),
        slots.len()
    );

    let integer: u64;
    // SAFETY: Same as the SSE variant, without vector registers. `al` is zero because no vector
    // registers are used.
    unsafe {
        asm!(
            "2:",
            "test r11, r11",
            "jz 3f",
            "push qword ptr [r10]",
            "add r10, 8",
            "dec r11",
            "jmp 2b",
            "3:",
            "call {target}",
            "lea rsp, [rsp + r12 * 8]",
            target = in(reg) call.target(),
            inout("r10") slots.as_ptr() => _,
            inout("r11") slots.len() => _,
            in("r12") slots.len(),
            in("rdi") int[0],
            in("rsi") int[1],
            in("rdx") int[2],
            in("rcx") int[3],
            in("r8") int[4],
            in("r9") int[5],
            inout("rax") 0u64 => integer,
            clobber_abi("sysv64"),
        );
    }

    Ok(NativeReturn { integer, float: 0 })
}

#[cfg(test)]
mod tests {
    use crate::{MarshalledCall, TypedValue, invoke};

    extern "sysv64" fn answer() -> u64 {
        42
    }

    extern "sysv64" fn weighted7(a: u64, b: u64, c: u64, d: u64, e: u64, f: u64, g: u64) -> u64 {
        a + 2 * b + 3 * c + 4 * d + 5 * e + 6 * f + 7 * g
    }

    #[allow(clippy::too_many_arguments)]
    extern "sysv64" fn weighted10(
        a: u64,
        b: u64,
        c: u64,
        d: u64,
        e: u64,
        f: u64,
        g: u64,
        h: u64,
        i: u64,
        j: u64,
    ) -> u64 {
        a + 2 * b + 3 * c + 4 * d + 5 * e + 6 * f + 7 * g + 8 * h + 9 * i + 10 * j
    }

    extern "sysv64" fn negate(a: i32) -> i64 {
        -i64::from(a)
    }

    extern "sysv64" fn c_strlen(s: *const core::ffi::c_char) -> usize {
        // SAFETY: The tests only pass NUL terminated strings.
        unsafe { core::ffi::CStr::from_ptr(s) }.to_bytes().len()
    }

    #[allow(clippy::too_many_arguments)]
    extern "sysv64" fn weighted_doubles(
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        e: f64,
        f: f64,
        g: f64,
        h: f64,
        i: f64,
    ) -> f64 {
        a + 2.0 * b + 3.0 * c + 4.0 * d + 5.0 * e + 6.0 * f + 7.0 * g + 8.0 * h + 9.0 * i
    }

    #[allow(clippy::too_many_arguments)]
    extern "sysv64" fn mixed(
        i1: u64,
        f1: f64,
        i2: u64,
        f2: f64,
        i3: u64,
        f3: f64,
        i4: u64,
        f4: f64,
        i5: u64,
        f5: f64,
        i6: u64,
        f6: f64,
        i7: u64,
        f7: f64,
        f8: f64,
        f9: f64,
        i8: u64,
    ) -> u64 {
        let ints = i1 + 2 * i2 + 3 * i3 + 4 * i4 + 5 * i5 + 6 * i6 + 7 * i7 + 8 * i8;
        let floats = f1 + 2.0 * f2 + 3.0 * f3 + 4.0 * f4 + 5.0 * f5 + 6.0 * f6 + 7.0 * f7
            + 8.0 * f8
            + 9.0 * f9;
        ints * 1000 + floats as u64
    }

    fn call_with(target: usize, args: &[TypedValue]) -> super::NativeReturn {
        let call = MarshalledCall::new(target, args).unwrap();
        // SAFETY: Every target in this module matches the arguments the tests build.
        unsafe { invoke(&call) }.unwrap()
    }

    #[test]
    fn no_argument_call_returns_native_result() {
        assert_eq!(call_with(answer as usize, &[]).integer, 42);
    }

    #[test]
    fn seven_integers_keep_order() {
        let args: Vec<_> = (1..=7).map(TypedValue::integer).collect();
        let expected = weighted7(1, 2, 3, 4, 5, 6, 7);
        assert_eq!(call_with(weighted7 as usize, &args).integer, expected);
    }

    #[test]
    fn even_overflow_needs_no_pad() {
        let args: Vec<_> = (1..=10).map(TypedValue::integer).collect();
        let expected = weighted10(1, 2, 3, 4, 5, 6, 7, 8, 9, 10);
        assert_eq!(call_with(weighted10 as usize, &args).integer, expected);
    }

    #[test]
    fn repeated_overflow_calls_restore_the_stack() {
        let args: Vec<_> = (1..=10).map(TypedValue::integer).collect();
        let expected = weighted10(1, 2, 3, 4, 5, 6, 7, 8, 9, 10);
        let marker = [0xa5u8; 64];
        for _ in 0..256 {
            assert_eq!(call_with(weighted10 as usize, &args).integer, expected);
        }
        assert_eq!(core::hint::black_box(marker), [0xa5u8; 64]);
    }

    #[test]
    fn sign_extended_int() {
        let args = [TypedValue::parse(crate::Format::Int32, "-5").unwrap()];
        assert_eq!(call_with(negate as usize, &args).integer as i64, 5);
    }

    #[test]
    fn string_argument() {
        let args = [TypedValue::text("monitor")];
        assert_eq!(call_with(c_strlen as usize, &args).integer, 7);
    }

    #[test]
    fn ninth_double_goes_on_the_stack() {
        let args: Vec<_> = (1..=9).map(|n| TypedValue::double(n as f64)).collect();
        let ret = call_with(weighted_doubles as usize, &args);
        let expected = weighted_doubles(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(ret.as_f64(), expected);
    }

    #[test]
    fn interleaved_classes() {
        let args = [
            TypedValue::integer(1),
            TypedValue::double(1.0),
            TypedValue::integer(2),
            TypedValue::double(2.0),
            TypedValue::integer(3),
            TypedValue::double(3.0),
            TypedValue::integer(4),
            TypedValue::double(4.0),
            TypedValue::integer(5),
            TypedValue::double(5.0),
            TypedValue::integer(6),
            TypedValue::double(6.0),
            TypedValue::integer(7),
            TypedValue::single(7.0),
            TypedValue::double(8.0),
            TypedValue::double(9.0),
            TypedValue::integer(8),
        ];
        let expected = mixed(
            1, 1.0, 2, 2.0, 3, 3.0, 4, 4.0, 5, 5.0, 6, 6.0, 7, 7.0, 8.0, 9.0, 8,
        );
        assert_eq!(call_with(mixed as usize, &args).integer, expected);
    }

    #[test]
    fn null_target_is_rejected() {
        let call = MarshalledCall::new(0, &[]).unwrap();
        // SAFETY: Null targets are rejected before any call is made.
        let err = unsafe { invoke(&call) }.unwrap_err();
        assert_eq!(err, crate::InvokeError::NullTarget);
    }
}
