// crates/kamiyo-core/src/time.rs

use chrono::Utc;

/// Current wall-clock time in unix seconds, saturated to the `u32` range
/// used by credential validity windows.
pub fn unix_now() -> u32 {
    let secs = Utc::now().timestamp().max(0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_now_is_after_2024() {
        // 2024-01-01T00:00:00Z
        assert!(unix_now() > 1_704_067_200);
    }
}
