//! Tick catch-up arithmetic.
//!
//! Every periodic channel answers the same question on each poll: how many
//! whole intervals have elapsed since the ledger entry, and where should the
//! entry move so that the remainder carries into the next poll?
//!
//! ```text
//! ticks      = floor((now - last) / interval)
//! advance_to = last + ticks * interval
//! ```
//!
//! Advancing by whole intervals (rather than to `now`) is what makes one
//! poll after five hours equivalent to ten polls spread across them.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use vivarium_ledger::ChannelLedger;
use vivarium_types::Channel;

/// The outcome of comparing a ledger entry against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUp {
    /// No entry yet; the caller should record `now` and apply nothing.
    Baseline,
    /// Less than one interval has elapsed (or time ran backwards).
    Waiting,
    /// At least one whole interval has elapsed.
    Due {
        /// Whole intervals elapsed.
        ticks: u32,
        /// The new ledger entry, `last + ticks * interval`.
        advance_to: DateTime<Utc>,
    },
}

/// Compare `last` against `now` for a channel with the given `interval`.
///
/// A non-positive interval never fires.
pub fn assess(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> CatchUp {
    let Some(last) = last else {
        return CatchUp::Baseline;
    };
    let interval_ms = interval.num_milliseconds();
    if interval_ms <= 0 {
        return CatchUp::Waiting;
    }
    let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
    let whole = elapsed_ms.checked_div(interval_ms).unwrap_or(0);
    if whole <= 0 {
        return CatchUp::Waiting;
    }
    let ticks = u32::try_from(whole).unwrap_or(u32::MAX);
    let advance_to = interval_ms
        .checked_mul(i64::from(ticks))
        .map(Duration::milliseconds)
        .and_then(|span| last.checked_add_signed(span))
        .unwrap_or(now);
    CatchUp::Due { ticks, advance_to }
}

/// Run the catch-up step for `channel` against `ledger`.
///
/// Records a baseline when the entry is missing and advances it by whole
/// intervals when due. Returns the number of ticks to apply, or `None` if
/// nothing is due.
pub fn run(
    ledger: &mut ChannelLedger,
    channel: Channel,
    now: DateTime<Utc>,
    interval: Duration,
) -> Option<u32> {
    match assess(ledger.get(channel), now, interval) {
        CatchUp::Baseline => {
            ledger.set(channel, Some(now));
            debug!(channel = %channel, at = %now, "Ledger baseline recorded");
            None
        }
        CatchUp::Waiting => None,
        CatchUp::Due { ticks, advance_to } => {
            if let Err(err) = ledger.advance(channel, advance_to) {
                warn!(channel = %channel, error = %err, "Ledger rejected advance; rebaselining");
                ledger.set(channel, Some(now));
                return None;
            }
            debug!(channel = %channel, ticks, next = %advance_to, "Channel due");
            Some(ticks)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn missing_entry_is_a_baseline() {
        assert_eq!(assess(None, t0(), Duration::minutes(60)), CatchUp::Baseline);
    }

    #[test]
    fn partial_interval_waits() {
        let now = t0() + Duration::minutes(59);
        assert_eq!(
            assess(Some(t0()), now, Duration::minutes(60)),
            CatchUp::Waiting
        );
    }

    #[test]
    fn remainder_carries_forward() {
        let now = t0() + Duration::minutes(185);
        assert_eq!(
            assess(Some(t0()), now, Duration::minutes(60)),
            CatchUp::Due {
                ticks: 3,
                advance_to: t0() + Duration::minutes(180),
            }
        );
    }

    #[test]
    fn backwards_time_is_a_no_op() {
        let now = t0() - Duration::hours(3);
        assert_eq!(
            assess(Some(t0()), now, Duration::minutes(60)),
            CatchUp::Waiting
        );
    }

    #[test]
    fn zero_interval_never_fires() {
        let now = t0() + Duration::hours(3);
        assert_eq!(assess(Some(t0()), now, Duration::zero()), CatchUp::Waiting);
    }

    #[test]
    fn run_baselines_then_advances() {
        let mut ledger = ChannelLedger::new();
        assert_eq!(
            run(&mut ledger, Channel::HungerDecay, t0(), Duration::minutes(60)),
            None
        );
        assert_eq!(ledger.get(Channel::HungerDecay), Some(t0()));

        let later = t0() + Duration::minutes(125);
        assert_eq!(
            run(&mut ledger, Channel::HungerDecay, later, Duration::minutes(60)),
            Some(2)
        );
        assert_eq!(
            ledger.get(Channel::HungerDecay),
            Some(t0() + Duration::minutes(120))
        );
    }

    #[test]
    fn split_polls_match_one_long_poll() {
        let interval = Duration::minutes(20);
        let mut once = ChannelLedger::new();
        once.set(Channel::LowAffection, Some(t0()));
        let total_once = run(&mut once, Channel::LowAffection, t0() + Duration::minutes(300), interval)
            .unwrap_or(0);

        let mut many = ChannelLedger::new();
        many.set(Channel::LowAffection, Some(t0()));
        let mut total_many = 0;
        for step in 1..=10 {
            let now = t0() + Duration::minutes(30 * step);
            total_many += run(&mut many, Channel::LowAffection, now, interval).unwrap_or(0);
        }

        assert_eq!(total_once, 15);
        assert_eq!(total_once, total_many);
        assert_eq!(once.get(Channel::LowAffection), many.get(Channel::LowAffection));
    }
}
