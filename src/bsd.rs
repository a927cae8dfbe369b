use tracing::info;

use crate::{
    command::run_checked,
    readout::{self, AddressKind},
    Backend, CommandRunner, Escalation, Invocation, MacAddress, MacswapError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermanentSource {
    /// `networksetup -getmacaddress <if>` (macOS).
    NetworkSetup,
    /// The `hwaddr` line of `ifconfig <if>`, printed only while the active
    /// address differs from the factory one.
    IfconfigHwaddr,
}

/// BSD-style backend: the link-level address is set in one `ifconfig` call
/// and the interface may stay up.
#[derive(Debug)]
pub struct BsdBackend<R> {
    runner: R,
    escalation: Escalation,
    permanent: PermanentSource,
}

impl<R: CommandRunner> BsdBackend<R> {
    pub fn new(runner: R, escalation: Escalation) -> Self {
        BsdBackend {
            runner,
            escalation,
            permanent: PermanentSource::IfconfigHwaddr,
        }
    }

    pub fn macos(runner: R, escalation: Escalation) -> Self {
        BsdBackend {
            permanent: PermanentSource::NetworkSetup,
            ..BsdBackend::new(runner, escalation)
        }
    }
}

impl<R: CommandRunner> Backend for BsdBackend<R> {
    fn exists(&self, interface: &str) -> Result<bool, MacswapError> {
        readout::exists(&self.runner, interface)
    }

    fn current_address(&self, interface: &str) -> Result<MacAddress, MacswapError> {
        readout::current_address(&self.runner, interface)
    }

    fn permanent_address(&self, interface: &str) -> Result<MacAddress, MacswapError> {
        match self.permanent {
            PermanentSource::NetworkSetup => {
                let output = readout::permanent_query(
                    &self.runner,
                    interface,
                    Invocation::new("networksetup", ["-getmacaddress", interface]),
                )?;
                readout::scrape(&output.stdout, interface, AddressKind::Permanent)
            }
            PermanentSource::IfconfigHwaddr => {
                let output = readout::query(&self.runner, interface, readout::ifconfig(interface))?;
                let text = output
                    .stdout
                    .lines()
                    .find(|line| line.trim_start().starts_with("hwaddr "))
                    .unwrap_or(output.stdout.as_str());
                readout::scrape(text, interface, AddressKind::Permanent)
            }
        }
    }

    fn apply(&self, interface: &str, address: MacAddress) -> Result<(), MacswapError> {
        let invocation = self.escalation.wrap(Invocation::new(
            "ifconfig",
            [interface.to_owned(), "ether".into(), address.to_string()],
        ));
        run_checked(&self.runner, &invocation)?;
        info!(%interface, %address, "applied address");
        Ok(())
    }
}
