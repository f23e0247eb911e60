/// Writes to a console. Console output is best effort; write errors are dropped.
macro_rules! cprint {
    ($out:expr, $($arg:tt)*) => {{
        let _ = ::core::fmt::Write::write_fmt(&mut *$out, format_args!($($arg)*));
    }};
}

/// Writes to a console, appending a newline.
macro_rules! cprintln {
    ($out:expr) => (cprint!($out, "\n"));
    ($out:expr, $fmt:expr) => (cprint!($out, concat!($fmt, "\n")));
    ($out:expr, $fmt:expr, $($arg:tt)*) => (cprint!($out, concat!($fmt, "\n"), $($arg)*));
}
