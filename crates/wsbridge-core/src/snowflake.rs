//! Snowflake id helpers.

/// Discord epoch (2015-01-01T00:00:00.000Z), in milliseconds.
pub const DISCORD_EPOCH: u64 = 1420070400000;

/// Creation time (unix milliseconds) encoded in a snowflake id.
///
/// Returns `None` when `id` is not a decimal u64.
pub fn timestamp_ms(id: &str) -> Option<u64> {
    let raw: u64 = id.parse().ok()?;
    Some((raw >> 22) + DISCORD_EPOCH)
}
