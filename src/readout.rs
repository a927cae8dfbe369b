//! Reading hardware addresses out of `ifconfig`-style command output.
//!
//! Both platform families query an interface with `ifconfig <name>`; a
//! failing query means the interface does not exist, a successful one with no
//! MAC-shaped token in it means the address cannot be read. Permanent-address
//! commands are the exception, see [`permanent_query`].

use std::fmt;

use tracing::debug;

use crate::{CommandOutput, CommandRunner, Invocation, MacAddress, MacswapError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Current,
    Permanent,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Current => f.write_str("current"),
            AddressKind::Permanent => f.write_str("permanent"),
        }
    }
}

/// Runs a read-only query against `interface`, mapping a failed query to
/// [`MacswapError::InterfaceNotFound`].
pub(crate) fn query<R: CommandRunner>(
    runner: &R,
    interface: &str,
    invocation: Invocation,
) -> Result<CommandOutput, MacswapError> {
    let output = runner.run(&invocation)?;
    if !output.success {
        debug!(%interface, command = %invocation, stderr = %output.stderr.trim(), "query failed");
        return Err(MacswapError::InterfaceNotFound(interface.to_owned()));
    }
    Ok(output)
}

/// Runs a command that reports the factory address of `interface`.
///
/// Such commands fail for interfaces that exist but have no permanent
/// address (or a driver that will not tell), so a failure is only
/// [`MacswapError::InterfaceNotFound`] when `ifconfig` agrees.
pub(crate) fn permanent_query<R: CommandRunner>(
    runner: &R,
    interface: &str,
    invocation: Invocation,
) -> Result<CommandOutput, MacswapError> {
    let output = runner.run(&invocation)?;
    if output.success {
        return Ok(output);
    }
    debug!(%interface, command = %invocation, stderr = %output.stderr.trim(), "permanent address query failed");
    if !exists(runner, interface)? {
        return Err(MacswapError::InterfaceNotFound(interface.to_owned()));
    }
    Err(MacswapError::UnreadableAddress {
        interface: interface.to_owned(),
        kind: AddressKind::Permanent,
    })
}

pub(crate) fn ifconfig(interface: &str) -> Invocation {
    Invocation::new("ifconfig", [interface])
}

pub(crate) fn exists<R: CommandRunner>(runner: &R, interface: &str) -> Result<bool, MacswapError> {
    match query(runner, interface, ifconfig(interface)) {
        Ok(_) => Ok(true),
        Err(MacswapError::InterfaceNotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

pub(crate) fn current_address<R: CommandRunner>(
    runner: &R,
    interface: &str,
) -> Result<MacAddress, MacswapError> {
    let output = query(runner, interface, ifconfig(interface))?;
    scrape(&output.stdout, interface, AddressKind::Current)
}

/// First MAC-shaped token in `text`.
///
/// An all-zero permanent address is what drivers report when there is no
/// burned-in address, so it counts as unreadable.
pub(crate) fn scrape(
    text: &str,
    interface: &str,
    kind: AddressKind,
) -> Result<MacAddress, MacswapError> {
    let unreadable = || MacswapError::UnreadableAddress {
        interface: interface.to_owned(),
        kind,
    };
    let address = MacAddress::extract_from(text).ok_or_else(unreadable)?;
    if kind == AddressKind::Permanent && address.is_nil() {
        return Err(unreadable());
    }
    debug!(%interface, %kind, %address, "read address");
    Ok(address)
}
