//! Commands that forward to kernel subsystems.

use crate::{
    command::{Command, CommandRegistry, Status},
    commands::usage,
    console::Console,
    monitor::Monitor,
};

/// Number of CMOS registers `dumpcmos` reads.
pub const CMOS_REGISTERS: u8 = 128;

fn unavailable(out: &mut dyn Console, what: &str) {
    cprintln!(out, "{} not available on this kernel", what);
}

/// The kernel subsystems diagnostic commands forward to.
///
/// Every method has a default that reports the facility as unavailable, so a kernel only
/// implements what it has. Methods print their results to `out`.
pub trait Diagnostics {
    /// Prints the physical memory lists.
    fn dump_memory_lists(&mut self, out: &mut dyn Console) {
        unavailable(out, "memory lists");
    }

    /// Prints the active page tables.
    fn dump_page_tables(&mut self, out: &mut dyn Console) {
        unavailable(out, "page tables");
    }

    /// Prints the virtual address space tree.
    fn dump_virtual_tree(&mut self, out: &mut dyn Console) {
        unavailable(out, "virtual address space tree");
    }

    /// Starts measuring time with `timer`.
    fn timer_start(&mut self, out: &mut dyn Console, timer: &str) {
        let _ = timer;
        unavailable(out, "timers");
    }

    /// Stops the running measurement and prints the elapsed time.
    fn timer_stop(&mut self, out: &mut dyn Console) {
        unavailable(out, "timers");
    }

    /// Measures and prints the frequency of `timer`.
    fn timer_frequency(&mut self, out: &mut dyn Console, timer: &str) {
        let _ = timer;
        unavailable(out, "timers");
    }

    /// Reads CMOS register `reg`. `None` if there is no CMOS.
    fn read_cmos(&mut self, reg: u8) -> Option<u8> {
        let _ = reg;
        None
    }
}

/// A kernel without any of the [`Diagnostics`] facilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {}

/// Registers `memory`, `pagetable`, `virt`, `timer_start`, `timer_stop`, `timer_freq` and
/// `dumpcmos`.
pub fn register(registry: &mut CommandRegistry) {
    registry
        .register(Command::new("memory", "Display the memory lists", memory))
        .register(Command::new("pagetable", "Display the page tables", pagetable))
        .register(Command::new(
            "virt",
            "Display the virtual address space tree",
            virt,
        ))
        .register(Command::new(
            "timer_start",
            "Start a timer: timer_start <timer>",
            timer_start,
        ))
        .register(Command::new(
            "timer_stop",
            "Stop the timer and print the elapsed time",
            timer_stop,
        ))
        .register(Command::new(
            "timer_freq",
            "Measure a timer's frequency: timer_freq <timer>",
            timer_freq,
        ))
        .register(Command::new(
            "dumpcmos",
            "Print the CMOS registers",
            dumpcmos,
        ));
}

fn memory(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    diagnostics.dump_memory_lists(out);
    Status::Continue
}

fn pagetable(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    diagnostics.dump_page_tables(out);
    Status::Continue
}

fn virt(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    diagnostics.dump_virtual_tree(out);
    Status::Continue
}

fn timer_start(m: &mut Monitor<'_>, args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    let [_, timer] = args else {
        return usage(out, "timer_start <timer>");
    };
    diagnostics.timer_start(out, timer);
    Status::Continue
}

fn timer_stop(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    diagnostics.timer_stop(out);
    Status::Continue
}

fn timer_freq(m: &mut Monitor<'_>, args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    let [_, timer] = args else {
        return usage(out, "timer_freq <timer>");
    };
    diagnostics.timer_frequency(out, timer);
    Status::Continue
}

fn dumpcmos(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let (diagnostics, out) = m.diagnostics();
    if diagnostics.read_cmos(0).is_none() {
        unavailable(out, "CMOS");
        return Status::Failed;
    }

    cprint!(out, "   ");
    for column in 0..16 {
        cprint!(out, " {:02x}", column);
    }
    cprintln!(out);

    for row in (0..CMOS_REGISTERS).step_by(16) {
        cprint!(out, "{:02x}:", row);
        for reg in row..row + 16 {
            match diagnostics.read_cmos(reg) {
                Some(value) => cprint!(out, " {:02x}", value),
                None => cprint!(out, " ??"),
            }
        }
        cprintln!(out);
    }
    Status::Continue
}
