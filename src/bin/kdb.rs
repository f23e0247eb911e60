//! Kernel monitor on the terminal, debugging its own process.

use std::{fmt::Write, path::Path, process::ExitCode};

use kdb::{HostDiagnostics, IoConsole, demo, env, symbols};
use kmon::{Command, Console, Monitor, MonitorError, Status, default_registry};
use log::{error, info};

fn demos(m: &mut Monitor<'_>, _args: &[&str]) -> Status {
    let out = m.console();
    for ((name, args), addr) in demo::FUNCTIONS.iter().zip(demo::addresses()) {
        let _ = writeln!(out, "{:#018x} {}({})", addr, name, args);
    }
    Status::Continue
}

fn run(console: &mut dyn Console) -> Result<(), MonitorError> {
    let image = match symbols::own_image() {
        Ok(image) => image,
        Err(e) => {
            error!("{}", e);
            Vec::new()
        }
    };
    let table = symbols::table(&image);
    if let Err(e) = &table {
        error!("{}; names will not resolve", e);
    }
    let empty = ksym::SymbolMap::new();
    let symbols: &dyn ksym::SymbolTable = match &table {
        Ok(table) => table,
        Err(_) => &empty,
    };

    let mut registry = default_registry();
    registry.register(Command::new(
        "demos",
        "List the functions compiled in for trying out call",
        demos,
    ));

    // Backtraces stop here; nothing above main has frame pointers.
    let stack_base = 0u8;
    let config = env::monitor_config().with_stack_base(&stack_base as *const u8 as usize);

    let mut diagnostics = HostDiagnostics::default();
    Monitor::new(console, symbols, &mut diagnostics, &registry, config).run()
}

fn main() -> ExitCode {
    env_logger::init();

    let result = match env::tty_path() {
        Some(path) => match IoConsole::open(Path::new(&path)) {
            Ok(mut console) => {
                info!("monitor on {}", path);
                run(&mut console)
            }
            Err(e) => {
                error!("cannot open {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => run(&mut IoConsole::stdio()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("monitor stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
