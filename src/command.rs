use std::{fmt, process::Command};

use nix::unistd::geteuid;
use tracing::debug;

use crate::MacswapError;

/// What an external program left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        CommandOutput {
            status: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        CommandOutput {
            status: Some(status),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// A program invocation, kept as argv so nothing is shell-interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Wraps the invocation in `sudo`.
    pub fn elevated(self) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Invocation {
            program: "sudo".to_owned(),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external programs to completion. Every call blocks.
pub trait CommandRunner {
    /// Fails only when the program cannot be started; a non-zero exit is
    /// reported through [`CommandOutput::success`].
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, MacswapError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, MacswapError> {
        (**self).run(invocation)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, MacswapError> {
        (**self).run(invocation)
    }
}

/// Whether mutation commands get wrapped in `sudo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    Sudo,
    Never,
}

impl Escalation {
    /// `sudo` unless the effective user is already root.
    pub fn detect() -> Self {
        if geteuid().is_root() {
            Escalation::Never
        } else {
            Escalation::Sudo
        }
    }

    pub fn wrap(self, invocation: Invocation) -> Invocation {
        match self {
            Escalation::Sudo => invocation.elevated(),
            Escalation::Never => invocation,
        }
    }
}

impl Default for Escalation {
    fn default() -> Self {
        Escalation::detect()
    }
}

/// Runs a mutation, turning a non-zero exit into
/// [`MacswapError::ApplyCommandFailure`].
pub(crate) fn run_checked<R: CommandRunner>(
    runner: &R,
    invocation: &Invocation,
) -> Result<(), MacswapError> {
    let output = runner.run(invocation)?;
    if output.success {
        return Ok(());
    }
    let status = match output.status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_owned(),
    };
    let stderr = output.stderr.trim();
    let reason = if stderr.is_empty() {
        status
    } else {
        format!("{status}: {stderr}")
    };
    Err(MacswapError::ApplyCommandFailure {
        command: invocation.to_string(),
        reason,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, MacswapError> {
        debug!(command = %invocation, "running");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|source| MacswapError::CommandSpawn {
                command: invocation.to_string(),
                source,
            })?;

        let output = CommandOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %invocation, status = ?output.status, "finished");
        Ok(output)
    }
}
