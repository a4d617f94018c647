//! A complete in-process deployment for protocol tests.

#![allow(dead_code)]

use std::sync::Arc;
use warden_common::{Clock, Duration, ManualClock, Timestamp};
use warden_credentials::{Address, Secp256k1Signer};
use warden_identity::{BearerToken, IdentityAssertion, ProviderProfile, StaticIdentityProvider};
use warden_ledger::MemoryLedger;
use warden_policy::PolicyDescriptor;
use warden_protocol::{
    CapacityConfig, CapacityIssuer, Connection, KeyRegistrar, MemoryNetwork, SessionBroker,
    SigningExecutor, WrappedKeyManager,
};

pub type Error = Box<dyn std::error::Error>;
pub type Network = MemoryNetwork<StaticIdentityProvider>;

/// 01:00 UTC, so same-day grants stay live for the whole test.
pub const T: u64 = 19_675 * 86_400 + 3_600;

pub const OCTOCAT: u64 = 12345;
pub const OCTOCAT_TOKEN: &str = "gho_octocat";
pub const HUBOT: u64 = 42;
pub const HUBOT_TOKEN: &str = "gho_hubot";

pub struct Harness {
    pub clock: ManualClock,
    pub ledger: MemoryLedger,
    pub provider: StaticIdentityProvider,
    pub network: Network,
    pub policy: PolicyDescriptor,
}

impl Harness {
    pub async fn new() -> Result<Self, Error> {
        let clock = ManualClock::new(Timestamp::from_unix(T));
        let ledger = MemoryLedger::new(Address::new([0xda; 20]), Arc::new(clock.clone()));

        let provider = StaticIdentityProvider::default();
        for (id, login, token) in [(OCTOCAT, "octocat", OCTOCAT_TOKEN), (HUBOT, "hubot", HUBOT_TOKEN)] {
            provider
                .insert(
                    &BearerToken::new(token),
                    ProviderProfile {
                        id,
                        login: login.into(),
                        name: None,
                    },
                )
                .await;
        }

        let network = MemoryNetwork::new(
            ledger.clone(),
            provider.clone(),
            Secp256k1Signer::generate()?,
        );

        Ok(Self {
            clock,
            ledger,
            provider,
            network,
            policy: PolicyDescriptor::github_identity(),
        })
    }

    pub fn advance(&self, seconds: u64) {
        self.clock.advance(Duration::from_secs(seconds));
    }

    pub fn registrar(&self) -> KeyRegistrar<MemoryLedger> {
        KeyRegistrar::new(Connection::ready(self.ledger.clone()), self.policy.clone())
    }

    pub fn issuer(&self, config: CapacityConfig) -> CapacityIssuer<MemoryLedger, Network> {
        CapacityIssuer::new(
            Connection::ready(self.ledger.clone()),
            Connection::ready(self.network.clone()),
            config,
            *self.ledger.account(),
        )
    }

    pub fn broker(&self) -> SessionBroker<Network> {
        SessionBroker::new(
            Connection::ready(self.network.clone()),
            self.policy.clone(),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn executor(&self) -> SigningExecutor<Network> {
        SigningExecutor::new(Connection::ready(self.network.clone()))
    }

    pub fn wrapped(&self) -> WrappedKeyManager<Network> {
        WrappedKeyManager::new(Connection::ready(self.network.clone()))
    }

    /// An assertion for `subject_id` holding `token`, made now.
    pub fn assert_identity(&self, subject_id: u64, token: &str) -> IdentityAssertion {
        IdentityAssertion::github(
            subject_id,
            None,
            self.clock.now(),
            BearerToken::new(token),
        )
    }
}
