//! Named command vectors

use std::borrow::Cow;
use std::fmt;

/// A named, ordered argument vector for one external program.
///
/// The first element of `argv` is the program; built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: &'static str,
    argv: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(name: &'static str, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name,
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// Short role name used in logs and errors (e.g. `window-manager`)
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Program to execute; empty for an empty vector
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-quoted command line, for logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<Cow<'_, str>> = self
            .argv
            .iter()
            .map(|arg| shell_escape::escape(Cow::Borrowed(arg.as_str())))
            .collect();
        write!(f, "{}", quoted.join(" "))
    }
}
