//! Monitor limits and per-instance settings.

use alloc::borrow::Cow;

pub use kcall::{INLINE_TEXT_CAPACITY, MAX_CALL_ARGS};

/// The default command prompt.
pub const PROMPT: &str = "K> ";
/// Size of the line buffer. A line holds at most `MAX_LINE - 1` characters.
pub const MAX_LINE: usize = 1024;
/// The most tokens one command line may split into, command name included.
pub const MAX_ARGS: usize = 16;
/// Characters that separate tokens.
pub const WHITESPACE: &[char] = &['\t', '\r', '\n', ' '];

/// First line of the banner.
pub const WELCOME: &str = "Welcome to the kernel monitor!";
/// Second line of the banner.
pub const HINT: &str = "Type 'help' for a list of commands.";

/// Settings for one [`Monitor`](crate::Monitor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Printed before every command line.
    pub prompt: Cow<'static, str>,
    /// Print the welcome banner when the monitor starts.
    pub banner: bool,
    /// Echo typed characters back. `None` follows [`Console::is_interactive`].
    ///
    /// [`Console::is_interactive`]: crate::Console::is_interactive
    pub echo: Option<bool>,
    /// Highest address of the stack the monitor runs on. Backtraces stop there.
    pub stack_base: Option<usize>,
    /// Virtual address the kernel's physical address 0 is mapped at. `kerninfo` prints physical
    /// addresses when this is set.
    pub kernel_base: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            prompt: Cow::Borrowed(PROMPT),
            banner: true,
            echo: None,
            stack_base: None,
            kernel_base: None,
        }
    }
}

impl MonitorConfig {
    /// Replaces the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<Cow<'static, str>>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Turns the banner on or off.
    pub fn with_banner(mut self, banner: bool) -> Self {
        self.banner = banner;
        self
    }

    /// Forces echo on or off.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Bounds backtraces to the stack ending at `base`.
    pub fn with_stack_base(mut self, base: usize) -> Self {
        self.stack_base = Some(base);
        self
    }

    /// Sets the virtual base the kernel image is mapped at.
    pub fn with_kernel_base(mut self, base: usize) -> Self {
        self.kernel_base = Some(base);
        self
    }
}
