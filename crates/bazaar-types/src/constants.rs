//! System-wide constants for the TokenBazaar engine.

/// Basis-point denominator for royalty rates and shares.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default crossing-query page size. Pages are deliberately small — tens,
/// not thousands — so one matching page fits a single transaction.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Default rerun-driver pass budget per triggering order.
pub const DEFAULT_MAX_PASSES: u32 = 64;

/// Default dust threshold in settlement-currency minor units. Transfers
/// below this are folded back or force-expired rather than paid out.
pub const DEFAULT_DUST_THRESHOLD_MINOR: u64 = 100;

/// Default auction floor increment in minor units.
pub const DEFAULT_MIN_BID_INCREMENT_MINOR: u64 = 500;

/// Default optimistic-transaction retry budget.
pub const DEFAULT_TX_RETRY_LIMIT: u32 = 8;

/// Route tag for payments settled on the marketplace's own ledger.
pub const LEDGER_NETWORK: &str = "ledger";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TokenBazaar";
