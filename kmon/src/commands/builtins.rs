//! Commands that only need the console and the symbol table.

use crate::{
    command::{Command, CommandRegistry, Status},
    monitor::Monitor,
    session,
    unwind::{Backtrace, print_backtrace},
};

/// Linker symbols `kerninfo` looks for, in address order.
pub const SPECIAL_SYMBOLS: [&str; 5] = ["_head64", "entry", "etext", "edata", "end"];

/// Printed by `printsomething` when it has nobody to greet.
pub const NO_GREETING: &str = "I will not say the day is done nor bid the stars farewell!";

/// Registers `help`, `kerninfo`, `backtrace`, `call`, `echo`, `printsomething` and `exit`, in that
/// order.
pub fn register(registry: &mut CommandRegistry) {
    registry
        .register(Command::new("help", "Display this list of commands", help))
        .register(Command::new(
            "kerninfo",
            "Display information about the kernel",
            kerninfo,
        ))
        .register(Command::new(
            "backtrace",
            "Print a backtrace of the current stack",
            backtrace,
        ))
        .register(Command::new(
            "call",
            "Call a kernel function: call [<name> [<format> <value>]...] (up to 7 inline)",
            call,
        ))
        .register(Command::new("echo", "Print the arguments", echo))
        .register(Command::new("printsomething", "Print something", printsomething))
        .register(Command::new("exit", "Leave the monitor", exit));
}

fn help(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let registry = m.registry();
    let out = m.console();
    for command in registry.iter() {
        cprintln!(out, "{} - {}", command.name, command.description);
    }
    Status::Continue
}

fn kerninfo(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let symbols = m.symbols();
    let kernel_base = m.config().kernel_base;
    let out = m.console();

    cprintln!(out, "Special kernel symbols:");
    for name in SPECIAL_SYMBOLS {
        let Some(addr) = symbols.resolve_name(name) else {
            continue;
        };
        match kernel_base {
            Some(base) => cprintln!(
                out,
                "  {:<7} {:16x} (virt)  {:16x} (phys)",
                name,
                addr,
                addr.wrapping_sub(base)
            ),
            None => cprintln!(out, "  {:<7} {:16x} (virt)", name, addr),
        }
    }

    if let (Some(entry), Some(end)) = (symbols.resolve_name("entry"), symbols.resolve_name("end")) {
        cprintln!(
            out,
            "Kernel executable memory footprint: {}KB",
            end.saturating_sub(entry).div_ceil(1024)
        );
    }
    Status::Continue
}

fn backtrace(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let mut frames = Backtrace::current();
    if let Some(base) = m.config().stack_base {
        frames = frames.with_stack_base(base);
    }
    let symbols = m.symbols();
    print_backtrace(m.console(), symbols, frames);
    Status::Continue
}

fn call(m: &mut Monitor<'_>, args: &[&str]) -> Status {
    let request = if args.len() > 1 {
        session::parse_call(m.symbols(), args)
    } else {
        session::prompt_call(m)
    };

    match request.and_then(|request| session::perform(m, &request)) {
        Ok(result) => {
            session::report(m, &result);
            Status::Continue
        }
        Err(err) => {
            m.report_error(&err);
            Status::Failed
        }
    }
}

fn echo(m: &mut Monitor<'_>, args: &[&str]) -> Status {
    let out = m.console();
    for (i, word) in args.iter().skip(1).enumerate() {
        if i > 0 {
            cprint!(out, " ");
        }
        cprint!(out, "{}", word);
    }
    cprintln!(out);
    Status::Continue
}

fn printsomething(m: &mut Monitor<'_>, args: &[&str]) -> Status {
    let out = m.console();
    if args.len() <= 1 {
        cprintln!(out, "{}", NO_GREETING);
    }
    for name in args.iter().skip(1) {
        cprintln!(out, "Hello {}!", name);
    }
    Status::Continue
}

fn exit(_m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    Status::Exit
}
