use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use macswap_lib::{
    backend_for, cli::Args, ChangeOrchestrator, Config, MacswapError, Outcome, Platform,
    SystemRunner,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const BANNER: &str = r"
\\             //
 \\\' ,      / //
  \\\//,   _/ //,
   \_-//' /  //<,
     \ ///  <//`
    /  >>  \\\`__/_
   /,)-^>> _\` \\\
   (/   \\ //\\
       // _//\\\\
      ((` ((
";

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let result = run(args);
    if let Err(err) = &result {
        match err.downcast_ref::<MacswapError>() {
            Some(err) if err.is_validation() => {
                eprintln!("{}", format!("[!] {err}").bright_yellow())
            }
            _ => eprintln!("{}", format!("[-] {err:#}").bright_red()),
        }
    }
    ExitCode::from(exit_status(&result))
}

/// Validation errors exit 2 like argument-parser errors, anything else that
/// went wrong exits 1. A change that did not stick was still carried out, so
/// it exits 0.
fn exit_status(result: &Result<Outcome>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) => match err.downcast_ref::<MacswapError>() {
            Some(err) if err.is_validation() => 2,
            _ => 1,
        },
    }
}

fn init_logging(debug: bool) {
    let filter = if debug { "macswap_lib=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("MACSWAP_LOG").unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(args: Args) -> Result<Outcome> {
    let platform = Platform::detect()?;
    let show_banner = !args.no_banner;
    let config = Config::try_from(args)?;

    let backend = backend_for(platform, SystemRunner, config.escalation);
    let orchestrator = ChangeOrchestrator::new(backend);
    let validated = orchestrator.validate(&config)?;

    if show_banner {
        println!("{BANNER}");
    }
    println!("{}", format!("current MAC = {}", validated.current()).bold());

    let outcome = validated.execute()?;
    match &outcome {
        Outcome::Current { .. } => {}
        Outcome::Changed(result) => match result.verification_error() {
            None => println!(
                "{}",
                format!("[+] MAC address has been changed to {}", result.requested).bright_green()
            ),
            // Reported, but the process still exits with success.
            Some(mismatch) => println!("{}", format!("[-] {mismatch}").bright_red()),
        },
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Context};
    use macswap_lib::{ChangeResult, MacAddress};

    use super::*;

    fn mac(text: &str) -> MacAddress {
        text.parse().unwrap()
    }

    fn changed(observed: &str) -> Result<Outcome> {
        let requested = mac("11:22:33:44:55:66");
        let observed = mac(observed);
        Ok(Outcome::Changed(ChangeResult {
            interface: "eth0".into(),
            previous: mac("aa:bb:cc:dd:ee:ff"),
            requested,
            observed,
            succeeded: observed == requested,
        }))
    }

    #[test]
    fn successful_runs_exit_zero() {
        let current = Ok(Outcome::Current {
            interface: "eth0".into(),
            address: mac("aa:bb:cc:dd:ee:ff"),
        });
        assert_eq!(exit_status(&current), 0);
        assert_eq!(exit_status(&changed("11:22:33:44:55:66")), 0);
    }

    #[test]
    fn verification_mismatch_exits_zero() {
        let mismatch = changed("aa:bb:cc:dd:ee:ff");
        assert!(matches!(&mismatch, Ok(Outcome::Changed(result)) if !result.succeeded));
        assert_eq!(exit_status(&mismatch), 0);
    }

    #[test]
    fn validation_errors_exit_two() {
        let errors = [
            MacswapError::UnsupportedPlatform("windows".into()),
            MacswapError::MissingInterfaceArgument,
            MacswapError::InterfaceNotFound("ghost0".into()),
            MacswapError::MissingMacArgument,
            MacswapError::InvalidMacFormat("not-a-mac".into()),
        ];
        for err in errors {
            let result: Result<Outcome> = Err(err.into());
            assert_eq!(exit_status(&result), 2, "{result:?}");
        }
    }

    #[test]
    fn other_errors_exit_one() {
        let apply: Result<Outcome> = Err(MacswapError::ApplyCommandFailure {
            command: "ifconfig eth0 down".into(),
            reason: "exit status 255".into(),
        }
        .into());
        assert_eq!(exit_status(&apply), 1);

        let unreadable: Result<Outcome> = Err(MacswapError::UnreadableAddress {
            interface: "eth0".into(),
            kind: macswap_lib::AddressKind::Permanent,
        }
        .into());
        assert_eq!(exit_status(&unreadable), 1);

        assert_eq!(exit_status(&Err(anyhow!("something else"))), 1);
    }

    #[test]
    fn context_does_not_hide_validation_errors() {
        let result: Result<Outcome> =
            Err(MacswapError::InterfaceNotFound("ghost0".into())).context("validating eth0");
        assert_eq!(exit_status(&result), 2);
    }
}
