/// Online build tuning (spec.md §4.H, §6's `batch` configuration surface).
/// Mirrors the teacher's `*Config` structs: a plain data struct with a
/// `Default` impl carrying the spec's stated defaults, built with `..
/// Default::default()` at call sites rather than a dedicated builder.
#[derive(Clone, Copy, Debug)]
pub struct BuildOptions {
    /// Records read per batch transaction.
    pub batch_size: usize,
    /// Soft cap on bytes read per batch (spec.md §6: `max_bytes (<= 10e6)`).
    pub max_bytes: usize,
    /// Soft cap on wall-clock time per batch, in milliseconds (spec.md §6:
    /// `max_time (<= 5s)`).
    pub max_time_ms: u64,
    /// Delay between batches, throttling the build's write rate.
    pub throttle_delay_ms: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { batch_size: 1000, max_bytes: 10_000_000, max_time_ms: 5_000, throttle_delay_ms: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_caps() {
        let opts = BuildOptions::default();
        assert_eq!(opts.batch_size, 1000);
        assert!(opts.max_bytes <= 10_000_000);
        assert!(opts.max_time_ms <= 5_000);
    }

    #[test]
    fn caller_can_override_individual_fields() {
        let opts = BuildOptions { throttle_delay_ms: 50, ..BuildOptions::default() };
        assert_eq!(opts.throttle_delay_ms, 50);
        assert_eq!(opts.batch_size, 1000);
    }
}
