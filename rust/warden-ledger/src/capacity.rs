use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use warden_common::{Duration, Timestamp};
use warden_credentials::Address;

const SECONDS_PER_DAY: u64 = 86_400;

/// Ledger identifier of a capacity grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(u64);

impl GrantId {
    /// Wrap a raw grant number.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw grant number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GrantId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Rate parameters for minting a capacity grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityParams {
    /// Requests allowed per 1000 seconds.
    pub requests_per_kilosecond: u32,
    /// Number of UTC midnights until the grant expires.
    pub days_until_expiration: u32,
}

impl Default for CapacityParams {
    fn default() -> Self {
        Self {
            requests_per_kilosecond: 10,
            days_until_expiration: 1,
        }
    }
}

impl CapacityParams {
    /// When a grant minted at `now` with these parameters expires: the UTC
    /// midnight `days_until_expiration` days after `now`.
    pub fn expiry_from(&self, now: Timestamp) -> Timestamp {
        let today = now.to_unix() - now.to_unix() % SECONDS_PER_DAY;
        Timestamp::from_unix(today)
            + Duration::from_secs(u64::from(self.days_until_expiration) * SECONDS_PER_DAY)
    }
}

/// A capacity grant as recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    /// The grant's id.
    pub grant_id: GrantId,
    /// The account that minted it and may delegate it.
    pub owner: Address,
    /// Requests allowed per 1000 seconds.
    pub requests_per_kilosecond: u32,
    /// When the grant stops being honoured.
    pub expires_at: Timestamp,
}

impl GrantRecord {
    /// Whether the grant is still live at `now`.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}
