//! Runner settings taken from the environment.

use std::env::VarError;

use kmon::MonitorConfig;
use log::warn;

/// Environment variable replacing the `K> ` prompt.
pub const PROMPT_ENV_FLAG: &str = "KDB_PROMPT";
/// Environment variable suppressing the welcome banner. If set to any value, no banner is printed.
pub const QUIET_ENV_FLAG: &str = "KDB_QUIET";
/// Environment variable forcing echo on ("1", "true", "yes", "on") or off ("0", "false", "no",
/// "off"). Unset means the console decides.
pub const ECHO_ENV_FLAG: &str = "KDB_ECHO";
/// Environment variable naming a terminal device to run the monitor on instead of stdio.
pub const TTY_ENV_FLAG: &str = "KDB_TTY";

fn read_env(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(val) => Some(val),
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(_)) => {
            warn!("Environment variable {} is not valid unicode, ignoring it", key);
            None
        }
    }
}

fn env_present(key: &str) -> bool {
    // Don't care about the value, just if it's set
    match std::env::var(key) {
        Ok(_) | Err(VarError::NotUnicode(_)) => true,
        Err(VarError::NotPresent) => false,
    }
}

/// Parses a yes/no flag value.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builds the monitor settings from the environment.
pub fn monitor_config() -> MonitorConfig {
    let mut config = MonitorConfig::default().with_banner(!env_present(QUIET_ENV_FLAG));
    if let Some(prompt) = read_env(PROMPT_ENV_FLAG) {
        config = config.with_prompt(prompt);
    }
    if let Some(echo) = read_env(ECHO_ENV_FLAG) {
        match parse_flag(&echo) {
            Some(echo) => config = config.with_echo(echo),
            None => warn!("Unrecognized value for {}: {}", ECHO_ENV_FLAG, echo),
        }
    }
    config
}

/// The terminal device to use, if one was requested.
pub fn tty_path() -> Option<String> {
    read_env(TTY_ENV_FLAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }
}
