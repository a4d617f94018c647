use clap::{Args, Parser, Subcommand};
use warden_credentials::Address;
use warden_identity::{AUTH_METHOD_NAMESPACE, GITHUB_API_URL};
use warden_ledger::GrantId;
use warden_protocol::{
    CAPACITY_GRANT_ENV_VAR, GITHUB_API_URL_ENV_VAR, NETWORK_ENV_VAR, RELAY_URL_ENV_VAR,
    STRICT_SCOPE_ENV_VAR,
};

/// Network name used when none is configured.
pub const DEFAULT_NETWORK: &str = "memory";

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "warden")]
#[command(bin_name = "warden")]
#[command(about = "Identity-gated signing with programmable key pairs", long_about = None)]
pub struct WardenCli {
    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// The available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange an OAuth authorization code and print the identity it proves
    Login(LoginArgs),

    /// Print the auth method a GitHub user is bound to key pairs with
    MethodId {
        /// Numeric GitHub user id
        #[arg(long)]
        subject_id: u64,

        /// Auth method namespace
        #[arg(long, default_value = AUTH_METHOD_NAMESPACE)]
        namespace: String,
    },

    /// Print the policy descriptor with its id and wire encoding
    Policy {
        /// Auth method namespace the policy checks bindings under
        #[arg(long, default_value = AUTH_METHOD_NAMESPACE)]
        namespace: String,
    },

    /// Check a signature result against the address expected to produce it
    Verify {
        /// Expected signer address
        #[arg(long)]
        address: Address,

        /// Signature result as JSON (`dataSigned`, `r`, `s`, `recoveryId`)
        #[arg(long)]
        result: String,
    },

    /// Run the whole protocol against an in-process network
    Simulate(SimulateArgs),
}

/// Arguments of `warden login`.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Authorization code from the OAuth redirect
    #[arg(long)]
    pub code: String,

    /// Token exchange relay
    #[arg(long, env = RELAY_URL_ENV_VAR)]
    pub relay_url: Option<String>,

    /// GitHub API root
    #[arg(long, env = GITHUB_API_URL_ENV_VAR, default_value = GITHUB_API_URL)]
    pub github_api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments of `warden simulate`.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Name of the signing network the run is labelled with
    #[arg(long, env = NETWORK_ENV_VAR, default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Capacity grant issued out of band; nothing is minted when set
    #[arg(long, env = CAPACITY_GRANT_ENV_VAR)]
    pub grant_id: Option<GrantId>,

    /// GitHub user id the key pair is minted for
    #[arg(long, default_value_t = 12345)]
    pub subject_id: u64,

    /// GitHub user id that signs in (defaults to the owner)
    #[arg(long)]
    pub signer_id: Option<u64>,

    /// Message to sign
    #[arg(long, default_value = "hello world")]
    pub message: String,

    /// Seconds between signing in and requesting the session
    #[arg(long, default_value_t = 0)]
    pub delay_secs: u64,

    /// Sessions each capacity delegation covers
    #[arg(long, default_value_t = 1)]
    pub uses: u32,

    /// Scope the session to the minted key pair only
    #[arg(long, env = STRICT_SCOPE_ENV_VAR)]
    pub strict_scope: bool,

    /// Memo attached to the wrapped key generated under the session
    #[arg(long, default_value = "simulated wrapped key")]
    pub memo: String,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.into(),
            grant_id: None,
            subject_id: 12345,
            signer_id: None,
            message: "hello world".into(),
            delay_secs: 0,
            uses: 1,
            strict_scope: false,
            memo: "simulated wrapped key".into(),
        }
    }
}
