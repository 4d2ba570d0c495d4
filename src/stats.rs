//! Aggregation math over a [`RunningSummary`].
//!
//! Latency statistics only ever see successful round trips. Packet loss is
//! counted from timeouts alone, while `excluded_pings` counts every probe
//! that did not succeed.

use crate::ping::{RunningSummary, UNSET_MINIMUM};

/// Round to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Fold a successful round trip into the bounds, sample list and sum.
pub fn update_on_success(summary: &mut RunningSummary, round_trip_ms: u64) {
    if round_trip_ms < summary.minimum_ping {
        summary.minimum_ping = round_trip_ms;
    }
    if round_trip_ms > summary.maximum_ping {
        summary.maximum_ping = round_trip_ms;
    }
    summary.round_trips.push(round_trip_ms);
    summary.ping_sum += round_trip_ms;
}

/// Mean absolute difference between adjacent round trips.
pub fn jitter(round_trips: &[u64]) -> f64 {
    if round_trips.len() < 2 {
        return 0.0;
    }
    let total: u64 = round_trips
        .windows(2)
        .map(|pair| pair[0].abs_diff(pair[1]))
        .sum();
    round3(total as f64 / (round_trips.len() - 1) as f64)
}

/// Mean round trip of the probes that were not excluded.
pub fn finalize_average(summary: &RunningSummary) -> f64 {
    let counted = summary.packets_sent.saturating_sub(summary.excluded_pings);
    if counted == 0 {
        return 0.0;
    }
    round3(summary.ping_sum as f64 / counted as f64)
}

/// Percentage of sent probes that were lost.
pub fn packet_loss(sent: u32, lost: u32) -> f64 {
    if lost == 0 || sent == 0 {
        return 0.0;
    }
    round3(100.0 * round3(lost as f64 / sent as f64))
}

/// Replace the sentinel bounds with zero when nothing succeeded.
pub fn reset_bounds_if_unused(summary: &mut RunningSummary) {
    if summary.minimum_ping == UNSET_MINIMUM {
        summary.minimum_ping = 0;
        summary.maximum_ping = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::GroupEnd;

    #[test]
    fn jitter_of_single_sample_is_zero() {
        assert_eq!(jitter(&[]), 0.0);
        assert_eq!(jitter(&[42]), 0.0);
    }

    #[test]
    fn jitter_of_pair_is_their_distance() {
        assert_eq!(jitter(&[5, 12]), 7.0);
        assert_eq!(jitter(&[12, 5]), 7.0);
    }

    #[test]
    fn jitter_over_a_longer_run() {
        assert_eq!(jitter(&[7, 23, 48, 57, 6, 3, 9, 123, 115]), 29.0);
    }

    #[test]
    fn jitter_rounds_to_three_places() {
        assert_eq!(jitter(&[1, 2, 4, 4]), 1.0);
        assert_eq!(jitter(&[0, 1, 0, 0]), 0.667);
    }

    #[test]
    fn packet_loss_percentages() {
        assert_eq!(packet_loss(2, 1), 50.0);
        assert_eq!(packet_loss(2, 0), 0.0);
        assert_eq!(packet_loss(2, 2), 100.0);
        assert_eq!(packet_loss(0, 0), 0.0);
    }

    #[test]
    fn packet_loss_has_no_float_noise() {
        assert_eq!(packet_loss(3, 1), 33.3);
        assert_eq!(packet_loss(3, 2), 66.7);
        assert_eq!(packet_loss(7, 1), 14.3);
    }

    #[test]
    fn success_updates_bounds_and_sum() {
        let mut summary = RunningSummary::new("host");
        update_on_success(&mut summary, 5);
        update_on_success(&mut summary, 4);
        update_on_success(&mut summary, 9);
        assert_eq!(summary.minimum_ping, 4);
        assert_eq!(summary.maximum_ping, 9);
        assert_eq!(summary.ping_sum, 18);
        assert_eq!(summary.round_trips, vec![5, 4, 9]);
    }

    #[test]
    fn average_excludes_failed_probes() {
        let mut summary = RunningSummary::new("host");
        update_on_success(&mut summary, 10);
        update_on_success(&mut summary, 20);
        summary.packets_sent = 3;
        summary.excluded_pings = 1;
        assert_eq!(finalize_average(&summary), 15.0);
    }

    #[test]
    fn average_without_successes_is_zero() {
        let mut summary = RunningSummary::new("host");
        summary.packets_sent = 2;
        summary.excluded_pings = 2;
        assert_eq!(finalize_average(&summary), 0.0);
    }

    #[test]
    fn unused_bounds_are_zeroed() {
        let mut summary = RunningSummary::new("host");
        reset_bounds_if_unused(&mut summary);
        assert_eq!((summary.minimum_ping, summary.maximum_ping), (0, 0));

        let mut summary = RunningSummary::new("host");
        update_on_success(&mut summary, 7);
        reset_bounds_if_unused(&mut summary);
        assert_eq!((summary.minimum_ping, summary.maximum_ping), (7, 7));
    }

    #[test]
    fn finished_summary_orders_min_average_max() {
        let mut summary = RunningSummary::new("host");
        for rtt in [30, 11, 58, 12] {
            update_on_success(&mut summary, rtt);
            summary.packets_sent += 1;
        }
        let done = summary.finish(GroupEnd::Completed);
        assert!(done.minimum_ping as f64 <= done.average_ping);
        assert!(done.average_ping <= done.maximum_ping as f64);
        assert_eq!(done.average_ping, 27.75);
    }
}
