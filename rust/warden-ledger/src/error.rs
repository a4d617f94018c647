use thiserror::Error;

/// Failures of ledger reads and writes.
///
/// A failed write leaves no partial state behind; the attempt is over.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The paying account cannot cover the transaction value.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Current account balance
        balance: u128,
        /// Value the transaction tried to send
        required: u128,
    },

    /// The ledger executed and rolled back the transaction.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// A finalized mint transaction carried no minted-key event.
    #[error("mint event not found in transaction {transaction}")]
    MintEventNotFound {
        /// Hash of the finalized transaction
        transaction: String,
    },

    /// A minted-key event did not match the expected wire layout.
    #[error("malformed mint event: {0}")]
    EventDecode(String),

    /// The token id names no key pair.
    #[error("unknown token {0}")]
    UnknownToken(String),

    /// The binding set would leave the key pair unusable.
    #[error("invalid auth method bindings: {0}")]
    InvalidBindings(String),

    /// The ledger could not be reached.
    #[error("ledger transport failure: {0}")]
    Transport(String),
}

impl LedgerError {
    /// Whether the failure was in reaching the ledger rather than in what it
    /// decided.
    pub fn is_transport(&self) -> bool {
        matches!(self, LedgerError::Transport(_))
    }
}
