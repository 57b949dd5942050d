//! Token metadata consumed by the match engine.
//!
//! The engine never manages token CRUD — that belongs to the collection
//! administration flow. It only reads the lifecycle phase (which selects
//! the matching strategy) and the network tag used to route cross-network
//! settlement legs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TokenId;

/// Lifecycle phase of a token. Selects the matching strategy for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPhase {
    /// Units exist only as distribution-ledger rows.
    LedgerBacked,
    /// Units are a network base currency; trades are cross-network swaps.
    BaseSwap,
    /// Units are issued natively on a chain; delivery is an on-chain
    /// transfer composed by the settlement pipeline.
    ChainIssued,
}

impl std::fmt::Display for TokenPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LedgerBacked => write!(f, "LEDGER_BACKED"),
            Self::BaseSwap => write!(f, "BASE_SWAP"),
            Self::ChainIssued => write!(f, "CHAIN_ISSUED"),
        }
    }
}

/// A fungible marketplace token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub symbol: String,
    pub phase: TokenPhase,
    /// Network tag for the token-side settlement leg (base-swap and
    /// chain-issued phases).
    pub network: String,
    pub created_at: DateTime<Utc>,
}

impl Token {
    #[must_use]
    pub fn new(symbol: impl Into<String>, phase: TokenPhase, network: impl Into<String>) -> Self {
        Self {
            id: TokenId::new(),
            symbol: symbol.into(),
            phase,
            network: network.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(format!("{}", TokenPhase::LedgerBacked), "LEDGER_BACKED");
        assert_eq!(format!("{}", TokenPhase::BaseSwap), "BASE_SWAP");
        assert_eq!(format!("{}", TokenPhase::ChainIssued), "CHAIN_ISSUED");
    }

    #[test]
    fn token_serde_roundtrip() {
        let token = Token::new("GLD", TokenPhase::ChainIssued, "basechain");
        let json = serde_json::to_string(&token).unwrap();
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(token.id, back.id);
        assert_eq!(back.phase, TokenPhase::ChainIssued);
        assert_eq!(back.network, "basechain");
    }
}
