use bitflags::bitflags;

use crate::config::ThresholdConfig;
use crate::ping::GroupSummary;

bitflags! {
    /// Metrics of a finished group that went over their threshold.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct QualityFlags: u8 {
        const HIGH_MINIMUM_PING = 1 << 0;
        const HIGH_AVERAGE_PING = 1 << 1;
        const HIGH_MAXIMUM_PING = 1 << 2;
        const HIGH_JITTER = 1 << 3;
        const HIGH_PACKET_LOSS = 1 << 4;
    }
}

/// Display names, in declaration order.
const FLAG_NAMES: [(QualityFlags, &str); 5] = [
    (QualityFlags::HIGH_MINIMUM_PING, "HighMinimumPing"),
    (QualityFlags::HIGH_AVERAGE_PING, "HighAveragePing"),
    (QualityFlags::HIGH_MAXIMUM_PING, "HighMaximumPing"),
    (QualityFlags::HIGH_JITTER, "HighJitter"),
    (QualityFlags::HIGH_PACKET_LOSS, "HighPacketLoss"),
];

impl QualityFlags {
    pub const NOT_EXCEEDED: Self = Self::empty();
}

/// Flag every metric that strictly exceeds its threshold.
pub fn evaluate(summary: &GroupSummary, thresholds: &ThresholdConfig) -> QualityFlags {
    let mut flags = QualityFlags::NOT_EXCEEDED;
    flags.set(
        QualityFlags::HIGH_MINIMUM_PING,
        summary.minimum_ping > thresholds.minimum_ping,
    );
    flags.set(
        QualityFlags::HIGH_AVERAGE_PING,
        summary.average_ping > thresholds.average_ping,
    );
    flags.set(
        QualityFlags::HIGH_MAXIMUM_PING,
        summary.maximum_ping > thresholds.maximum_ping,
    );
    flags.set(QualityFlags::HIGH_JITTER, summary.jitter > thresholds.jitter);
    flags.set(
        QualityFlags::HIGH_PACKET_LOSS,
        summary.packet_loss > thresholds.packet_loss,
    );
    flags
}

/// Comma separated names of the set flags; empty when nothing was exceeded.
pub fn describe(flags: QualityFlags) -> String {
    if flags == QualityFlags::NOT_EXCEEDED {
        return String::new();
    }
    FLAG_NAMES
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}
