//! Ledger protocol constants.
//!
//! These constants define the token amount scale, vault query paging and
//! transaction time-window parameters.

/// Number of fractional digits carried by every token quantity.
pub const TOKEN_SCALE: u32 = 2;

/// Maximum number of unspent records returned by a single vault query.
///
/// Selection and balance only see the first page; holders with more
/// records than this see a truncated balance.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// How long a composed transaction stays valid for notarisation (1 day).
pub const DEFAULT_TIME_WINDOW_SECS: u64 = 24 * 60 * 60;

/// State type name used to filter vault queries to fungible tokens.
pub const TOKEN_STATE_TYPE: &str = "token.fungible.Token";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_window_is_one_day() {
        assert_eq!(DEFAULT_TIME_WINDOW_SECS, 86_400);
    }

    #[test]
    fn token_scale_is_cents() {
        assert_eq!(10u64.pow(TOKEN_SCALE), 100);
    }
}
