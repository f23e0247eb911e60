//! Frame pointer stack walking.
//!
//! With frame pointers enabled every function starts with `push rbp; mov rbp, rsp`, so `rbp`
//! points at a [`StackFrame`]: the caller's `rbp` followed by the return address. Following the
//! saved `rbp` values walks the stack from the innermost frame outwards.

use core::fmt::Write;

use ksym::SymbolTable;
use log::trace;

use crate::arch;

/// A stack frame in the x86_64 architecture.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct StackFrame {
    /// The caller's frame pointer.
    pub rbp: *const StackFrame,
    /// The return address into the caller.
    pub rip: *const (),
}

/// One step of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Address of the [`StackFrame`] record.
    pub frame_pointer: usize,
    /// The return address saved in it.
    pub return_address: usize,
}

/// An iterator over the frames of a stack, most recent first.
///
/// The walk ends at a null frame pointer, at a misaligned one, once it reaches the stack base, or
/// when a saved frame pointer does not lead further up the stack (which also catches frames that
/// point at themselves).
#[derive(Debug, Clone)]
pub struct Backtrace {
    next: usize,
    stack_base: usize,
}

impl Backtrace {
    /// Starts a walk at the frame of the caller.
    ///
    /// Relies on everything between here and the outermost frame being compiled with frame
    /// pointers. Bound the walk with [`Backtrace::with_stack_base`] if some of it is not.
    #[inline(always)]
    pub fn current() -> Self {
        Self {
            next: arch::frame_pointer(),
            stack_base: usize::MAX,
        }
    }

    /// Starts a walk at `fp`.
    ///
    /// # Safety
    /// `fp` must be 0 or point to a readable [`StackFrame`], and so must every saved frame pointer
    /// reachable from it until the walk ends.
    pub unsafe fn from_frame_pointer(fp: usize) -> Self {
        Self {
            next: fp,
            stack_base: usize::MAX,
        }
    }

    /// Stops the walk at frames at or above `base`.
    pub fn with_stack_base(mut self, base: usize) -> Self {
        self.stack_base = base;
        self
    }
}

impl Iterator for Backtrace {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let fp = self.next;
        if fp == 0 || fp >= self.stack_base || fp % align_of::<StackFrame>() != 0 {
            self.next = 0;
            return None;
        }

        // SAFETY: `fp` is non-null and aligned, and the constructor's contract says it points to a
        // readable frame record.
        let frame = unsafe { (fp as *const StackFrame).read() };
        let caller = frame.rbp as usize;
        trace!("frame {:#x}: rip {:p} caller {:#x}", fp, frame.rip, caller);

        // The stack grows down, so callers always live at higher addresses.
        self.next = if caller > fp { caller } else { 0 };

        Some(Frame {
            frame_pointer: fp,
            return_address: frame.rip as usize,
        })
    }
}

/// Prints `frames` with the source location of each return address. Returns the number of frames
/// printed.
///
/// ```text
/// Stack backtrace:
///   rbp 00007ffc1d5e2a40  rip 000055d0c41b2f1e
///     src/monitor.rs:0: kmon::monitor::Monitor::execute+222
/// ```
pub fn print_backtrace<W: Write + ?Sized>(
    out: &mut W,
    symbols: &dyn SymbolTable,
    frames: impl IntoIterator<Item = Frame>,
) -> usize {
    cprintln!(out, "Stack backtrace:");
    let mut count = 0;
    for frame in frames {
        let info = symbols.debug_info(frame.return_address);
        cprintln!(
            out,
            "  rbp {:016x}  rip {:016x}",
            frame.frame_pointer,
            frame.return_address
        );
        cprintln!(out, "    {}+{}", info, info.offset(frame.return_address));
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use core::ptr;
    use ksym::SymbolMap;

    /// Links `frames` into a chain, each one calling the next, the last one outermost.
    fn chain(frames: &mut [StackFrame], rips: &[usize]) -> usize {
        let base = frames.as_mut_ptr();
        for i in 0..frames.len() {
            frames[i].rip = rips[i] as *const ();
            frames[i].rbp = if i + 1 < frames.len() {
                // SAFETY: i + 1 is in bounds.
                unsafe { base.add(i + 1) }
            } else {
                ptr::null()
            };
        }
        base as usize
    }

    fn empty_frames<const N: usize>() -> [StackFrame; N] {
        [StackFrame {
            rbp: ptr::null(),
            rip: ptr::null(),
        }; N]
    }

    #[test]
    fn walks_synthetic_chain() {
        let mut frames = empty_frames::<4>();
        let fp = chain(&mut frames, &[0x10, 0x20, 0x30, 0x40]);

        // SAFETY: the chain lives in `frames` and ends in a null pointer.
        let walked: Vec<_> = unsafe { Backtrace::from_frame_pointer(fp) }.collect();
        assert_eq!(walked.len(), 4);
        let rips: Vec<_> = walked.iter().map(|f| f.return_address).collect();
        assert_eq!(rips, [0x10, 0x20, 0x30, 0x40]);
        assert_eq!(walked[0].frame_pointer, fp);
        assert_eq!(walked[1].frame_pointer, fp + size_of::<StackFrame>());
    }

    #[test]
    fn null_frame_pointer_is_empty() {
        // SAFETY: 0 is always accepted.
        assert_eq!(unsafe { Backtrace::from_frame_pointer(0) }.count(), 0);
    }

    #[test]
    fn stops_on_self_reference() {
        let mut frames = empty_frames::<3>();
        let fp = chain(&mut frames, &[1, 2, 3]);
        frames[1].rbp = &frames[1];

        // SAFETY: every pointer in the chain points into `frames`.
        let walked: Vec<_> = unsafe { Backtrace::from_frame_pointer(fp) }.collect();
        assert_eq!(walked.len(), 2);
    }

    #[test]
    fn stops_at_stack_base() {
        let mut frames = empty_frames::<4>();
        let fp = chain(&mut frames, &[1, 2, 3, 4]);
        let base = &frames[2] as *const StackFrame as usize;

        // SAFETY: the chain lives in `frames`.
        let walked = unsafe { Backtrace::from_frame_pointer(fp) }.with_stack_base(base);
        assert_eq!(walked.count(), 2);
    }

    #[test]
    fn prints_symbols_and_unknowns() {
        let mut frames = empty_frames::<2>();
        let fp = chain(&mut frames, &[0x1010, 0x9000]);
        let mut symbols = SymbolMap::new();
        symbols.insert_with_location("monitor", 0x1000, 0x100, "kern/monitor.rs", 7);

        let mut out = String::new();
        // SAFETY: the chain lives in `frames`.
        let count = print_backtrace(&mut out, &symbols, unsafe {
            Backtrace::from_frame_pointer(fp)
        });
        assert_eq!(count, 2);

        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "Stack backtrace:");
        assert_eq!(
            lines[1],
            format!("  rbp {:016x}  rip 0000000000001010", fp)
        );
        assert_eq!(lines[2], "    kern/monitor.rs:7: monitor+16");
        assert_eq!(lines[4], "    <unknown>:0: <unknown>+0");
    }

    #[inline(never)]
    fn walk_from_here(base: usize) -> Vec<Frame> {
        Backtrace::current().with_stack_base(base).collect()
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn walks_live_stack() {
        let anchor = 0u8;
        let base = &anchor as *const u8 as usize;
        let walked = walk_from_here(base);
        assert!(!walked.is_empty());
        assert!(walked.iter().all(|f| f.frame_pointer < base));
        assert!(walked.windows(2).all(|w| w[0].frame_pointer < w[1].frame_pointer));
    }
}
