//! Argument classification and placement for the System V x86-64 calling convention.
//!
//! Integer-class arguments fill `rdi, rsi, rdx, rcx, r8, r9`, floating-point arguments fill
//! `xmm0..xmm7`. Whatever does not fit goes on the stack in declaration order, which the
//! trampoline produces by pushing [`MarshalledCall::overflow_slots`] front to back.

use core::marker::PhantomData;

use alloc::vec::Vec;
use arrayvec::ArrayVec;
use log::trace;

use crate::{
    MAX_CALL_ARGS,
    value::{RegisterClass, TypedValue},
};

/// Number of integer parameter registers.
pub const INTEGER_REGISTERS: usize = 6;
/// Number of floating-point parameter registers.
pub const FLOAT_REGISTERS: usize = 8;

/// Errors produced while building an argument list or a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
    /// More than [`MAX_CALL_ARGS`] values.
    #[error("too many arguments (max {max})")]
    TooManyArguments {
        /// The limit that was exceeded.
        max: usize,
    },
}

/// An argument list with a hard capacity of [`MAX_CALL_ARGS`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArgumentList {
    values: Vec<TypedValue>,
}

impl ArgumentList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Creates an empty list with room for `count` values.
    ///
    /// Fails up front if `count` exceeds [`MAX_CALL_ARGS`].
    pub fn with_capacity(count: usize) -> Result<Self, MarshalError> {
        check_count(count)?;
        Ok(Self {
            values: Vec::with_capacity(count),
        })
    }

    /// Appends a value.
    pub fn push(&mut self, value: TypedValue) -> Result<(), MarshalError> {
        check_count(self.values.len() + 1)?;
        self.values.push(value);
        Ok(())
    }

    /// The values in declaration order.
    pub fn as_slice(&self) -> &[TypedValue] {
        &self.values
    }

    /// The number of values in the list.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the list holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn check_count(count: usize) -> Result<(), MarshalError> {
    if count > MAX_CALL_ARGS {
        return Err(MarshalError::TooManyArguments { max: MAX_CALL_ARGS });
    }
    Ok(())
}

/// A call target together with its arguments laid out for the trampoline.
///
/// The call borrows the arguments it was built from: string payloads point into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalledCall<'a> {
    target: usize,
    integer_registers: ArrayVec<u64, INTEGER_REGISTERS>,
    float_registers: ArrayVec<u64, FLOAT_REGISTERS>,
    overflow_slots: Vec<u64>,
    _args: PhantomData<&'a [TypedValue]>,
}

impl<'a> MarshalledCall<'a> {
    /// Classifies `args` and places each one in a register or an overflow slot.
    ///
    /// Within each class, arguments keep their declaration order. The overflow slots are stored
    /// in reverse declaration order so that pushing them front to back leaves the first stack
    /// argument on top, and a zero slot is added in front if their count is odd to keep the stack
    /// 16-byte aligned at the call.
    pub fn new(target: usize, args: &'a [TypedValue]) -> Result<Self, MarshalError> {
        check_count(args.len())?;

        let mut integer_registers = ArrayVec::new();
        let mut float_registers = ArrayVec::new();
        let mut overflow_slots = Vec::new();

        for arg in args {
            let payload = arg.payload();
            let placed = match arg.class() {
                RegisterClass::Integer => integer_registers.try_push(payload),
                RegisterClass::FloatingPoint => float_registers.try_push(payload),
            };
            if placed.is_err() {
                overflow_slots.push(payload);
            }
        }

        overflow_slots.reverse();
        if overflow_slots.len() % 2 != 0 {
            overflow_slots.insert(0, 0);
        }

        trace!(
            "marshalled call to {:#x}: {} integer, {} float, {} overflow slots",
            target,
            integer_registers.len(),
            float_registers.len(),
            overflow_slots.len()
        );

        Ok(Self {
            target,
            integer_registers,
            float_registers,
            overflow_slots,
            _args: PhantomData,
        })
    }

    /// The address that will be called.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Payloads for `rdi, rsi, rdx, rcx, r8, r9`, in that order.
    pub fn integer_registers(&self) -> &[u64] {
        &self.integer_registers
    }

    /// Payloads for `xmm0..xmm7`, in that order.
    pub fn float_registers(&self) -> &[u64] {
        &self.float_registers
    }

    /// Stack slots in push order, including the alignment pad if there is one.
    pub fn overflow_slots(&self) -> &[u64] {
        &self.overflow_slots
    }

    /// The number of words the trampoline pushes. Always even.
    pub fn overflow_slot_count(&self) -> usize {
        self.overflow_slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: impl IntoIterator<Item = u64>) -> Vec<TypedValue> {
        values.into_iter().map(TypedValue::integer).collect()
    }

    #[test]
    fn empty_call_has_no_registers_or_overflow() {
        let call = MarshalledCall::new(0x1000, &[]).unwrap();
        assert_eq!(call.target(), 0x1000);
        assert!(call.integer_registers().is_empty());
        assert!(call.float_registers().is_empty());
        assert_eq!(call.overflow_slot_count(), 0);
    }

    #[test]
    fn six_integers_fit_in_registers() {
        let args = ints(1..=6);
        let call = MarshalledCall::new(0, &args).unwrap();
        assert_eq!(call.integer_registers(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(call.overflow_slot_count(), 0);
    }

    #[test]
    fn seventh_integer_is_padded_to_two_slots() {
        let args = ints(1..=7);
        let call = MarshalledCall::new(0, &args).unwrap();
        assert_eq!(call.integer_registers(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(call.overflow_slots(), &[0, 7]);
        assert_eq!(call.overflow_slot_count(), 2);
    }

    #[test]
    fn overflow_is_reversed() {
        let args = ints(1..=10);
        let call = MarshalledCall::new(0, &args).unwrap();
        assert_eq!(call.overflow_slots(), &[10, 9, 8, 7]);
    }

    #[test]
    fn floats_and_integers_use_separate_files() {
        let args = [
            TypedValue::double(1.0),
            TypedValue::integer(10),
            TypedValue::single(2.0),
            TypedValue::integer(20),
        ];
        let call = MarshalledCall::new(0, &args).unwrap();
        assert_eq!(call.integer_registers(), &[10, 20]);
        assert_eq!(
            call.float_registers(),
            &[1.0f64.to_bits(), 2.0f64.to_bits()]
        );
        assert_eq!(call.overflow_slot_count(), 0);
    }

    #[test]
    fn interleaved_overflow_keeps_declaration_order() {
        // 7 integers and 9 floats: the 7th integer precedes the 9th float on the stack.
        let mut args = Vec::new();
        for i in 0..9u64 {
            if i < 7 {
                args.push(TypedValue::integer(i + 1));
            }
            args.push(TypedValue::double(i as f64 + 0.5));
        }
        let call = MarshalledCall::new(0, &args).unwrap();
        assert_eq!(call.integer_registers().len(), 6);
        assert_eq!(call.float_registers().len(), 8);
        assert_eq!(call.overflow_slots(), &[8.5f64.to_bits(), 7]);
    }

    #[test]
    fn counts_follow_register_capacity() {
        for i in 0..12usize {
            for f in 0..12usize {
                let mut args = Vec::new();
                args.extend((0..i).map(|n| TypedValue::integer(n as u64)));
                args.extend((0..f).map(|n| TypedValue::double(n as f64)));
                let call = MarshalledCall::new(0, &args).unwrap();

                let raw = i.saturating_sub(INTEGER_REGISTERS) + f.saturating_sub(FLOAT_REGISTERS);
                assert_eq!(call.integer_registers().len(), i.min(INTEGER_REGISTERS));
                assert_eq!(call.float_registers().len(), f.min(FLOAT_REGISTERS));
                assert_eq!(call.overflow_slot_count(), raw + raw % 2);
            }
        }
    }

    #[test]
    fn string_payload_points_into_borrowed_args() {
        let args = [TypedValue::text("abc")];
        let call = MarshalledCall::new(0, &args).unwrap();
        assert_eq!(call.integer_registers(), &[args[0].payload()]);
    }

    #[test]
    fn argument_list_enforces_capacity() {
        let mut list = ArgumentList::new();
        for n in 0..MAX_CALL_ARGS {
            list.push(TypedValue::integer(n as u64)).unwrap();
        }
        assert_eq!(list.len(), MAX_CALL_ARGS);
        assert_eq!(
            list.push(TypedValue::integer(0)),
            Err(MarshalError::TooManyArguments { max: MAX_CALL_ARGS })
        );
        assert!(ArgumentList::with_capacity(MAX_CALL_ARGS + 1).is_err());
        assert!(MarshalledCall::new(0, list.as_slice()).is_ok());
    }
}
