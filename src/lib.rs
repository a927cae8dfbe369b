mod bsd;
pub mod cli;
pub mod command;
mod linux;
mod mac;
pub mod orchestrator;
mod readout;

use std::io;

use thiserror::Error;

pub use bsd::BsdBackend;
pub use command::{CommandOutput, CommandRunner, Escalation, Invocation, SystemRunner};
pub use linux::LinuxBackend;
pub use mac::MacAddress;
pub use orchestrator::{ChangeOrchestrator, ChangeResult, Config, Intent, Outcome};
pub use readout::AddressKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    /// FreeBSD, OpenBSD, NetBSD and DragonFly.
    OtherBsd,
}

impl Platform {
    pub fn detect() -> Result<Platform, MacswapError> {
        Platform::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Platform, MacswapError> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Ok(Platform::OtherBsd),
            other => Err(MacswapError::UnsupportedPlatform(other.to_owned())),
        }
    }
}

#[derive(Error, Debug)]
pub enum MacswapError {
    #[error("operating system `{0}` is not supported, it must be Linux or a BSD (including macOS)")]
    UnsupportedPlatform(String),
    #[error("no interface given, use --interface <name>")]
    MissingInterfaceArgument,
    #[error("interface \"{0}\" does not exist")]
    InterfaceNotFound(String),
    #[error("no MAC address given, use --mac <address>, --random, --permanent or --get-current-mac")]
    MissingMacArgument,
    #[error("invalid MAC address \"{0}\", expected six colon-separated hex pairs like aa:bb:cc:dd:ee:ff")]
    InvalidMacFormat(String),
    #[error("could not read the {kind} MAC address of \"{interface}\"")]
    UnreadableAddress {
        interface: String,
        kind: AddressKind,
    },
    #[error("`{command}` failed ({reason})")]
    ApplyCommandFailure { command: String, reason: String },
    #[error("MAC address has not been changed to {requested} (interface reports {observed})")]
    VerificationMismatch {
        interface: String,
        requested: MacAddress,
        observed: MacAddress,
    },
    #[error("could not run `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl MacswapError {
    /// Errors raised before any attempt to touch the interface.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MacswapError::UnsupportedPlatform(_)
                | MacswapError::MissingInterfaceArgument
                | MacswapError::InterfaceNotFound(_)
                | MacswapError::MissingMacArgument
                | MacswapError::InvalidMacFormat(_)
        )
    }
}

/// Reads and writes hardware addresses the way one platform family does.
pub trait Backend {
    /// True iff a plain query of the interface succeeds.
    fn exists(&self, interface: &str) -> Result<bool, MacswapError>;

    fn current_address(&self, interface: &str) -> Result<MacAddress, MacswapError>;

    /// The factory-assigned address. Read-only.
    fn permanent_address(&self, interface: &str) -> Result<MacAddress, MacswapError>;

    /// Sets the address, stopping at the first command that fails.
    /// Nothing already done is rolled back.
    fn apply(&self, interface: &str, address: MacAddress) -> Result<(), MacswapError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn exists(&self, interface: &str) -> Result<bool, MacswapError> {
        (**self).exists(interface)
    }

    fn current_address(&self, interface: &str) -> Result<MacAddress, MacswapError> {
        (**self).current_address(interface)
    }

    fn permanent_address(&self, interface: &str) -> Result<MacAddress, MacswapError> {
        (**self).permanent_address(interface)
    }

    fn apply(&self, interface: &str, address: MacAddress) -> Result<(), MacswapError> {
        (**self).apply(interface, address)
    }
}

/// Picks the backend for `platform` once, at startup.
pub fn backend_for<R>(platform: Platform, runner: R, escalation: Escalation) -> Box<dyn Backend>
where
    R: CommandRunner + 'static,
{
    match platform {
        Platform::Linux => Box::new(LinuxBackend::new(runner, escalation)),
        Platform::MacOs => Box::new(BsdBackend::macos(runner, escalation)),
        Platform::OtherBsd => Box::new(BsdBackend::new(runner, escalation)),
    }
}
