//! The few machine specifics the monitor needs outside the call trampoline.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        /// Returns the frame pointer of the calling function.
        #[inline(always)]
        pub fn frame_pointer() -> usize {
            let rbp: usize;
            // SAFETY: Copies rbp into a register. No memory is touched.
            unsafe {
                core::arch::asm!("mov {}, rbp", out(reg) rbp, options(nomem, nostack, preserves_flags));
            }
            rbp
        }
    } else {
        /// Frame pointer chains are only walked on x86-64. Returns 0, which ends every walk.
        #[inline(always)]
        pub fn frame_pointer() -> usize {
            0
        }
    }
}

/// Runs `f` with maskable interrupts disabled, restoring the previous state afterwards.
///
/// Only the `kernel` feature actually masks interrupts; elsewhere `f` simply runs.
#[inline]
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(all(feature = "kernel", target_arch = "x86_64"))]
    {
        x86_64::instructions::interrupts::without_interrupts(f)
    }
    #[cfg(not(all(feature = "kernel", target_arch = "x86_64")))]
    {
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_interrupts_returns_value() {
        assert_eq!(without_interrupts(|| 6 * 7), 42);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn frame_pointer_points_into_the_stack() {
        let local = 0u64;
        let fp = frame_pointer();
        let here = &local as *const u64 as usize;
        assert_ne!(fp, 0);
        assert_eq!(fp % 8, 0);
        // The frame base sits above this function's locals.
        assert!(fp > here);
        assert!(fp - here < 0x10000);
    }
}
