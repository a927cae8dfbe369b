use clap::{ArgGroup, Parser};

use crate::{
    orchestrator::{Config, Intent, RandomPolicy},
    Escalation, MacAddress, MacswapError,
};

/// Simple MAC address changer for Linux and BSD-derived systems (including macOS).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("action").args(["mac", "random", "get_current_mac", "permanent"])))]
pub struct Args {
    /// Interface to change the MAC address of
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Set a custom MAC address
    #[arg(short, long, value_name = "ADDRESS")]
    pub mac: Option<String>,

    /// Generate and set a random MAC address
    #[arg(short, long)]
    pub random: bool,

    /// Print the current MAC address and exit
    #[arg(short, long, visible_alias = "gcm")]
    pub get_current_mac: bool,

    /// Reset the MAC address to the permanent (burned-in) one
    #[arg(short, long)]
    pub permanent: bool,

    /// With --random, generate a locally-administered unicast address
    #[arg(short, long, conflicts_with_all = ["mac", "permanent", "get_current_mac"])]
    pub local: bool,

    /// Never prefix commands that change the interface with sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Don't print the banner
    #[arg(long)]
    pub no_banner: bool,

    /// Log every command that is run
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    fn intent(&self) -> Result<Intent, MacswapError> {
        if self.get_current_mac {
            return Ok(Intent::ShowCurrent);
        }
        if self.random {
            return Ok(Intent::SetRandom);
        }
        if self.permanent {
            return Ok(Intent::RestoreToPermanent);
        }
        match self.mac.as_deref() {
            Some("") | None => Err(MacswapError::MissingMacArgument),
            Some(text) => MacAddress::parse(text).map(Intent::SetCustom),
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = MacswapError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let interface = match args.interface.as_deref() {
            Some(interface) if !interface.is_empty() => interface.to_owned(),
            _ => return Err(MacswapError::MissingInterfaceArgument),
        };
        let intent = args.intent()?;
        Ok(Config {
            interface,
            intent,
            escalation: if args.no_sudo {
                Escalation::Never
            } else {
                Escalation::detect()
            },
            random: if args.local {
                RandomPolicy::LocallyAdministered
            } else {
                RandomPolicy::Uniform
            },
        })
    }
}
