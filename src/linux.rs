use tracing::info;

use crate::{
    command::run_checked,
    readout::{self, AddressKind},
    Backend, CommandRunner, Escalation, Invocation, MacAddress, MacswapError,
};

/// Linux-style backend: `ifconfig` for the active address, `ethtool -P` for
/// the permanent one, and a down / set / up cycle to change it.
#[derive(Debug)]
pub struct LinuxBackend<R> {
    runner: R,
    escalation: Escalation,
}

impl<R: CommandRunner> LinuxBackend<R> {
    pub fn new(runner: R, escalation: Escalation) -> Self {
        LinuxBackend { runner, escalation }
    }

    fn change_interface_active(&self, interface: &str, active: bool) -> Result<(), MacswapError> {
        let state = if active { "up" } else { "down" };
        let invocation = self
            .escalation
            .wrap(Invocation::new("ifconfig", [interface, state]));
        run_checked(&self.runner, &invocation)
    }
}

impl<R: CommandRunner> Backend for LinuxBackend<R> {
    fn exists(&self, interface: &str) -> Result<bool, MacswapError> {
        readout::exists(&self.runner, interface)
    }

    fn current_address(&self, interface: &str) -> Result<MacAddress, MacswapError> {
        readout::current_address(&self.runner, interface)
    }

    fn permanent_address(&self, interface: &str) -> Result<MacAddress, MacswapError> {
        let output = readout::permanent_query(
            &self.runner,
            interface,
            Invocation::new("ethtool", ["-P", interface]),
        )?;
        readout::scrape(&output.stdout, interface, AddressKind::Permanent)
    }

    // The interface is unreachable between the down and up steps. If setting
    // the address fails the interface is left down.
    fn apply(&self, interface: &str, address: MacAddress) -> Result<(), MacswapError> {
        self.change_interface_active(interface, false)?;

        let set = self.escalation.wrap(Invocation::new(
            "ifconfig",
            [interface.to_owned(), "hw".into(), "ether".into(), address.to_string()],
        ));
        run_checked(&self.runner, &set)?;

        self.change_interface_active(interface, true)?;
        info!(%interface, %address, "applied address");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command::fake::ScriptedRunner, CommandOutput};

    fn mac(text: &str) -> MacAddress {
        text.parse().unwrap()
    }

    #[test]
    fn apply_runs_down_set_up_in_order() {
        let runner = ScriptedRunner::new()
            .on("ifconfig eth0 down", CommandOutput::ok(""))
            .on("ifconfig eth0 hw ether 11:22:33:44:55:66", CommandOutput::ok(""))
            .on("ifconfig eth0 up", CommandOutput::ok(""));
        let backend = LinuxBackend::new(&runner, Escalation::Never);

        backend.apply("eth0", mac("11:22:33:44:55:66")).unwrap();
        assert!(runner.is_exhausted());
    }

    #[test]
    fn apply_uses_sudo_when_escalating() {
        let runner = ScriptedRunner::new()
            .on("sudo ifconfig wlan0 down", CommandOutput::ok(""))
            .on("sudo ifconfig wlan0 hw ether aa:bb:cc:dd:ee:ff", CommandOutput::ok(""))
            .on("sudo ifconfig wlan0 up", CommandOutput::ok(""));
        let backend = LinuxBackend::new(&runner, Escalation::Sudo);

        backend.apply("wlan0", mac("AA:BB:CC:DD:EE:FF")).unwrap();
        assert!(runner.is_exhausted());
    }

    #[test]
    fn failed_down_aborts_remaining_steps() {
        let runner = ScriptedRunner::new().on(
            "ifconfig eth0 down",
            CommandOutput::failed(255, "SIOCSIFFLAGS: Operation not permitted"),
        );
        let backend = LinuxBackend::new(&runner, Escalation::Never);

        let err = backend.apply("eth0", mac("11:22:33:44:55:66")).unwrap_err();
        assert!(matches!(
            err,
            MacswapError::ApplyCommandFailure { ref command, .. } if command == "ifconfig eth0 down"
        ));
        assert_eq!(runner.calls(), ["ifconfig eth0 down"]);
    }

    #[test]
    fn failed_set_skips_bringing_interface_up() {
        let runner = ScriptedRunner::new()
            .on("ifconfig eth0 down", CommandOutput::ok(""))
            .on(
                "ifconfig eth0 hw ether 01:00:00:00:00:00",
                CommandOutput::failed(1, "SIOCSIFHWADDR: Cannot assign requested address"),
            );
        let backend = LinuxBackend::new(&runner, Escalation::Never);

        let err = backend.apply("eth0", mac("01:00:00:00:00:00")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`ifconfig eth0 hw ether 01:00:00:00:00:00` failed \
             (exit status 1: SIOCSIFHWADDR: Cannot assign requested address)"
        );
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn permanent_address_from_ethtool() {
        let runner = ScriptedRunner::new().on(
            "ethtool -P eth0",
            CommandOutput::ok("Permanent address: 00:1a:2b:3c:4d:5e\n"),
        );
        let backend = LinuxBackend::new(&runner, Escalation::Never);

        assert_eq!(
            backend.permanent_address("eth0").unwrap(),
            mac("00:1a:2b:3c:4d:5e")
        );
    }

    #[test]
    fn permanent_address_of_missing_interface() {
        let runner = ScriptedRunner::new()
            .on(
                "ethtool -P ghost0",
                CommandOutput::failed(1, "Cannot get permanent hardware address: No such device"),
            )
            .on("ifconfig ghost0", CommandOutput::failed(1, "Device not found"));
        let backend = LinuxBackend::new(&runner, Escalation::Never);

        assert!(matches!(
            backend.permanent_address("ghost0"),
            Err(MacswapError::InterfaceNotFound(_))
        ));
    }

    #[test]
    fn unsupported_ethtool_on_existing_interface_is_unreadable() {
        let runner = ScriptedRunner::new()
            .on(
                "ethtool -P wg0",
                CommandOutput::failed(76, "Cannot get permanent hardware address: Operation not supported"),
            )
            .on("ifconfig wg0", CommandOutput::ok("wg0: flags=209<UP,POINTOPOINT,RUNNING,NOARP>  mtu 1420\n"));
        let backend = LinuxBackend::new(&runner, Escalation::Never);

        let err = backend.permanent_address("wg0").unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "could not read the permanent MAC address of \"wg0\"");
        assert!(runner.is_exhausted());
    }
}
