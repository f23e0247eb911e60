//! [`Diagnostics`] answered by the host operating system.

use std::{
    fmt::Write,
    fs,
    time::{Duration, Instant},
};

use kmon::{Console, Diagnostics};
use log::debug;

/// Timers run on the monotonic clock. Memory commands read `/proc/self` where it exists.
#[derive(Debug, Default)]
pub struct HostDiagnostics {
    timer: Option<(String, Instant)>,
}

/// Timer names `timer_start` and `timer_freq` accept.
pub const TIMERS: &[&str] = &["monotonic", "tsc"];

fn print_proc(out: &mut dyn Console, path: &str, filter: impl Fn(&str) -> bool) {
    match fs::read_to_string(path) {
        Ok(text) => {
            for line in text.lines().filter(|l| filter(l)) {
                let _ = writeln!(out, "{}", line);
            }
        }
        Err(e) => {
            let _ = writeln!(out, "cannot read {}: {}", path, e);
        }
    }
}

impl Diagnostics for HostDiagnostics {
    fn dump_memory_lists(&mut self, out: &mut dyn Console) {
        print_proc(out, "/proc/self/status", |l| l.starts_with("Vm"));
    }

    fn dump_virtual_tree(&mut self, out: &mut dyn Console) {
        print_proc(out, "/proc/self/maps", |_| true);
    }

    fn timer_start(&mut self, out: &mut dyn Console, timer: &str) {
        if !TIMERS.contains(&timer) {
            let _ = writeln!(out, "unknown timer '{}'", timer);
            return;
        }
        debug!("starting timer {}", timer);
        self.timer = Some((timer.to_string(), Instant::now()));
    }

    fn timer_stop(&mut self, out: &mut dyn Console) {
        match self.timer.take() {
            Some((name, start)) => {
                let elapsed = start.elapsed();
                let _ = writeln!(out, "{}: {:.3} ms", name, elapsed.as_secs_f64() * 1000.0);
            }
            None => {
                let _ = writeln!(out, "no timer running");
            }
        }
    }

    fn timer_frequency(&mut self, out: &mut dyn Console, timer: &str) {
        match timer {
            "monotonic" => {
                let _ = writeln!(out, "monotonic: 1000000000 Hz");
            }
            "tsc" => match tsc_frequency(Duration::from_millis(100)) {
                Some(hz) => {
                    let _ = writeln!(out, "tsc: {} Hz", hz);
                }
                None => {
                    let _ = writeln!(out, "tsc not available on this machine");
                }
            },
            _ => {
                let _ = writeln!(out, "unknown timer '{}'", timer);
            }
        }
    }
}

/// Counts time stamp counter ticks over `window`.
fn tsc_frequency(window: Duration) -> Option<u64> {
    #[cfg(target_arch = "x86_64")]
    {
        let start = Instant::now();
        // SAFETY: rdtsc has no side effects and every x86-64 processor has it.
        let first = unsafe { core::arch::x86_64::_rdtsc() };
        std::thread::sleep(window);
        // SAFETY: As above.
        let last = unsafe { core::arch::x86_64::_rdtsc() };
        let secs = start.elapsed().as_secs_f64();
        Some((last.wrapping_sub(first) as f64 / secs) as u64)
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = window;
        None
    }
}
