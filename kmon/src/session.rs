//! Calling kernel functions by name.
//!
//! A call is assembled from operator input: a function name, then a format qualifier and a value
//! for each argument. [`prompt_call`] asks for each piece in turn; [`parse_call`] takes them from
//! the command line (`call add %d 2 %d 3`). Either way the result is a [`CallRequest`] that
//! [`perform`] marshals and invokes.
//!
//! A command line is capped at [`MAX_ARGS`](crate::config::MAX_ARGS) tokens, so the one-line form
//! takes at most seven arguments. Longer calls have to be prompted for.
//!
//! Nothing checks that the arguments fit the function. Calling with the wrong arguments does
//! whatever the function does with them.

use alloc::{format, string::ToString};

use kcall::{ArgumentList, Format, MarshalledCall, NativeReturn, TypedValue, invoke};
use ksym::SymbolTable;
use log::{debug, info};

use crate::{
    arch,
    config::WHITESPACE,
    error::MonitorError,
    monitor::Monitor,
    readline::LineBuffer,
};

/// Marks the start of whatever the callee prints.
pub const BEGIN_OUTPUT: &str = "--- begin output ---";
/// Marks the end of whatever the callee prints.
pub const END_OUTPUT: &str = "--- end output ---";

/// A resolved function and its parsed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// Address of the function.
    pub target: usize,
    /// The arguments in declaration order.
    pub arguments: ArgumentList,
}

/// Looks `name` up, failing with [`MonitorError::SymbolNotFound`].
pub fn resolve(symbols: &dyn SymbolTable, name: &str) -> Result<usize, MonitorError> {
    let target = symbols
        .resolve_name(name)
        .ok_or_else(|| MonitorError::SymbolNotFound(name.to_string()))?;
    debug!("{} resolved to {:#x}", name, target);
    Ok(target)
}

fn first_token(line: &str) -> &str {
    line.split(WHITESPACE)
        .find(|t| !t.is_empty())
        .unwrap_or("")
}

fn parse_count(text: &str) -> Result<usize, MonitorError> {
    let text = text.trim();
    kcall::value::parse_unsigned(text)
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| MonitorError::InvalidCount(text.to_string()))
}

/// Builds a request by prompting for the function name, the argument count and then the format
/// and value of every argument.
///
/// The function is resolved before any argument is asked for. A `%s` value is the whole line as
/// typed; other values have surrounding blanks removed.
pub fn prompt_call(monitor: &mut Monitor<'_>) -> Result<CallRequest, MonitorError> {
    let mut line = LineBuffer::new();

    let name = first_token(monitor.read_line("function name: ", &mut line)?);
    let target = resolve(monitor.symbols(), name)?;

    let count = parse_count(monitor.read_line("argument count: ", &mut line)?)?;
    let mut arguments = ArgumentList::with_capacity(count)?;

    for i in 1..=count {
        let qualifier = first_token(monitor.read_line(&format!("arg {} format: ", i), &mut line)?);
        let format = Format::parse(qualifier);
        let text = monitor.read_line(&format!("arg {} value: ", i), &mut line)?;
        arguments.push(TypedValue::parse(format, text)?)?;
    }

    Ok(CallRequest { target, arguments })
}

/// Builds a request from `call <name> [<format> <value>]...` tokens, `args[0]` being the command
/// name.
pub fn parse_call(symbols: &dyn SymbolTable, args: &[&str]) -> Result<CallRequest, MonitorError> {
    let name = args.get(1).copied().unwrap_or("");
    let target = resolve(symbols, name)?;

    let pairs = &args[args.len().min(2)..];
    let mut arguments = ArgumentList::with_capacity(pairs.len().div_ceil(2))?;
    for (i, pair) in pairs.chunks(2).enumerate() {
        let [qualifier, text] = pair else {
            return Err(MonitorError::MissingValue { index: i + 1 });
        };
        arguments.push(TypedValue::parse(Format::parse(qualifier), text)?)?;
    }

    Ok(CallRequest { target, arguments })
}

/// Marshals and makes the call, framing the callee's output with [`BEGIN_OUTPUT`] and
/// [`END_OUTPUT`]. Interrupts are masked for the duration of the call.
pub fn perform(
    monitor: &mut Monitor<'_>,
    request: &CallRequest,
) -> Result<NativeReturn, MonitorError> {
    let call = MarshalledCall::new(request.target, request.arguments.as_slice())?;
    info!(
        "calling {:#x} with {} arguments ({} on the stack)",
        call.target(),
        request.arguments.len(),
        call.overflow_slot_count()
    );

    cprintln!(monitor.console(), "{}", BEGIN_OUTPUT);
    // SAFETY: The operator asked for this call and vouches for the target and its arguments. The
    // call runs with interrupts masked so nothing else touches this stack meanwhile.
    let result = arch::without_interrupts(|| unsafe { invoke(&call) });
    cprintln!(monitor.console(), "{}", END_OUTPUT);

    Ok(result?)
}

/// Prints the value a call returned.
pub fn report(monitor: &mut Monitor<'_>, result: &NativeReturn) {
    cprintln!(
        monitor.console(),
        "returned {:#018x} ({})",
        result.integer,
        result.integer as i64
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksym::SymbolMap;

    fn symbols() -> SymbolMap<'static> {
        let mut map = SymbolMap::new();
        map.insert("add", 0x1000, 0x10);
        map
    }

    #[test]
    fn first_token_skips_blanks() {
        assert_eq!(first_token("  %ld  extra"), "%ld");
        assert_eq!(first_token(" \t "), "");
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count(" 3 "), Ok(3));
        assert_eq!(parse_count("0x10"), Ok(16));
        assert_eq!(
            parse_count("three"),
            Err(MonitorError::InvalidCount("three".to_string()))
        );
        assert_eq!(
            parse_count("-1"),
            Err(MonitorError::InvalidCount("-1".to_string()))
        );
    }

    #[test]
    fn parses_command_line_calls() {
        let request = parse_call(&symbols(), &["call", "add", "%d", "-2", "lf", "1.5"]).unwrap();
        assert_eq!(request.target, 0x1000);
        let args = request.arguments.as_slice();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].payload(), (-2i64) as u64);
        assert_eq!(args[1].payload(), 1.5f64.to_bits());
    }

    #[test]
    fn command_line_errors() {
        let symbols = symbols();
        assert_eq!(
            parse_call(&symbols, &["call", "sub"]),
            Err(MonitorError::SymbolNotFound("sub".to_string()))
        );
        assert_eq!(
            parse_call(&symbols, &["call"]),
            Err(MonitorError::SymbolNotFound(String::new()))
        );
        assert_eq!(
            parse_call(&symbols, &["call", "add", "%d", "1", "%d"]),
            Err(MonitorError::MissingValue { index: 2 })
        );
        assert!(matches!(
            parse_call(&symbols, &["call", "add", "%d", "x"]),
            Err(MonitorError::Value(_))
        ));
    }

    #[test]
    fn unknown_qualifier_passes_zero() {
        let request = parse_call(&symbols(), &["call", "add", "%q", "99"]).unwrap();
        assert_eq!(request.arguments.as_slice()[0].payload(), 0);
    }
}
