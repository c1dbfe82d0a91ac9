//! Session constants. Durations are in milliseconds.

/// Maximum number of snapshots kept in a scan history.
pub const HISTORY_CAPACITY: usize = 10;

/// Simulated round-trip time of a balance inquiry.
pub const BALANCE_LATENCY_MS: u64 = 1_500;

/// Period between automatic balance scans.
pub const AUTO_SCAN_INTERVAL_MS: u64 = 10_000;

/// Prefix of every mock private key.
pub const PRIVATE_KEY_PREFIX: &str = "0x";

/// Number of hex characters after [`PRIVATE_KEY_PREFIX`].
pub const PRIVATE_KEY_HEX_LEN: usize = 64;

/// Characters of the private key shown before the ellipsis in previews.
pub const PRIVATE_KEY_PREVIEW_CHARS: usize = 20;

/// Decimal places of a snapshot delta.
pub const DELTA_DECIMALS: usize = 8;

/// Delta recorded for the first snapshot of a wallet.
pub const INITIAL_DELTA: &str = "0.00";

/// Balance shown between `generate` and the first completed scan.
pub const PLACEHOLDER_BALANCE: &str = "0.00";

/// Upper bound on catalog `decimal_places`.
pub const MAX_DECIMAL_PLACES: usize = 18;

/// Placeholder substituted with the wallet address in explorer templates.
pub const EXPLORER_ADDRESS_PLACEHOLDER: &str = "{address}";

/// Code of the catalog row used for unrecognized currencies.
pub const DEFAULT_CURRENCY_CODE: &str = "DEFAULT";

/// Period between simulated market ticks on the dashboard.
pub const MARKET_TICK_MS: u64 = 3_000;

/// Number of price points kept by the market feed.
pub const MARKET_WINDOW: usize = 20;
