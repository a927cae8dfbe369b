//! Drives one invocation: validate the interface, work out the target
//! address for the chosen [`Intent`], apply it and read it back.
//!
//! Every step blocks until the OS command behind it returns. Nothing guards
//! the interface against another process changing it at the same time.

use tracing::info;

use crate::{Backend, Escalation, MacAddress, MacswapError};

/// What the user asked for. Exactly one per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ShowCurrent,
    SetCustom(MacAddress),
    SetRandom,
    RestoreToPermanent,
}

/// How [`Intent::SetRandom`] draws its address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RandomPolicy {
    /// Six uniformly random octets.
    #[default]
    Uniform,
    /// Unicast with the locally-administered bit set.
    LocallyAdministered,
}

impl RandomPolicy {
    pub fn generate(self) -> MacAddress {
        match self {
            RandomPolicy::Uniform => MacAddress::random(),
            RandomPolicy::LocallyAdministered => MacAddress::random_local(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub interface: String,
    pub intent: Intent,
    pub escalation: Escalation,
    pub random: RandomPolicy,
}

impl Config {
    pub fn new(interface: impl Into<String>, intent: Intent) -> Self {
        Config {
            interface: interface.into(),
            intent,
            escalation: Escalation::default(),
            random: RandomPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeResult {
    pub interface: String,
    /// Address before anything was applied.
    pub previous: MacAddress,
    pub requested: MacAddress,
    /// Address the interface reported after the change.
    pub observed: MacAddress,
    pub succeeded: bool,
}

impl ChangeResult {
    /// The mismatch as an error, for callers that want to render it as one.
    pub fn verification_error(&self) -> Option<MacswapError> {
        (!self.succeeded).then(|| MacswapError::VerificationMismatch {
            interface: self.interface.clone(),
            requested: self.requested,
            observed: self.observed,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Current { interface: String, address: MacAddress },
    Changed(ChangeResult),
}

pub struct ChangeOrchestrator<B> {
    backend: B,
}

impl<B: Backend> ChangeOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        ChangeOrchestrator { backend }
    }

    /// Rejects a missing interface and reads its current address. Nothing
    /// has been changed when this returns.
    pub fn validate<'a>(&'a self, config: &'a Config) -> Result<Validated<'a, B>, MacswapError> {
        let interface = config.interface.as_str();
        if !self.backend.exists(interface)? {
            return Err(MacswapError::InterfaceNotFound(interface.to_owned()));
        }
        let current = self.backend.current_address(interface)?;
        info!(%interface, %current, intent = ?config.intent, "validated");
        Ok(Validated {
            orchestrator: self,
            config,
            current,
        })
    }

    pub fn run(&self, config: &Config) -> Result<Outcome, MacswapError> {
        self.validate(config)?.execute()
    }
}

/// An existing interface whose current address has been read.
pub struct Validated<'a, B> {
    orchestrator: &'a ChangeOrchestrator<B>,
    config: &'a Config,
    current: MacAddress,
}

impl<B: Backend> Validated<'_, B> {
    pub fn current(&self) -> MacAddress {
        self.current
    }

    /// Applies the intent and verifies it. A mismatch after applying is not
    /// an error here, it is reported through [`ChangeResult::succeeded`].
    pub fn execute(self) -> Result<Outcome, MacswapError> {
        let backend = &self.orchestrator.backend;
        let interface = self.config.interface.as_str();

        let target = match self.config.intent {
            Intent::ShowCurrent => {
                return Ok(Outcome::Current {
                    interface: interface.to_owned(),
                    address: self.current,
                })
            }
            Intent::SetCustom(address) => address,
            Intent::SetRandom => self.config.random.generate(),
            Intent::RestoreToPermanent => backend.permanent_address(interface)?,
        };

        backend.apply(interface, target)?;
        let observed = backend.current_address(interface)?;

        let result = ChangeResult {
            interface: interface.to_owned(),
            previous: self.current,
            requested: target,
            observed,
            succeeded: observed == target,
        };
        if result.succeeded {
            info!(%interface, address = %target, "verified");
        } else {
            info!(%interface, requested = %target, %observed, "address did not change");
        }
        Ok(Outcome::Changed(result))
    }
}
