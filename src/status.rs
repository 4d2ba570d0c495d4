//! Classification of ICMP status codes.
//!
//! Every status a probe can produce maps to a descriptive record and to the
//! [`ProbeState`] that tells the group loop how to proceed. The table is
//! embedded at build time and parsed once on first use.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;

const STATUS_TABLE: &str = include_str!("status_table.json");

/// How the group loop reacts to a classified outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeState {
    Continue,
    Pause,
    PacketLossCaution,
    Halt,
}

/// ICMP status of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpStatus {
    Success,
    DestinationNetworkUnreachable,
    DestinationHostUnreachable,
    /// IPv4 reading of raw code 11004.
    DestinationProtocolUnreachable,
    /// IPv6 reading of raw code 11004.
    DestinationProhibited,
    DestinationPortUnreachable,
    NoResources,
    BadOption,
    HardwareError,
    PacketTooBig,
    TimedOut,
    BadRoute,
    TtlExpired,
    TtlReassemblyTimeExceeded,
    ParameterProblem,
    SourceQuench,
    BadDestination,
    DestinationUnreachable,
    TimeExceeded,
    BadHeader,
    UnrecognizedNextHeader,
    IcmpError,
    DestinationScopeMismatch,
    Unknown,
}

impl IpStatus {
    /// Every status, in table order.
    pub const ALL: [IpStatus; 24] = [
        IpStatus::Success,
        IpStatus::DestinationNetworkUnreachable,
        IpStatus::DestinationHostUnreachable,
        IpStatus::DestinationProtocolUnreachable,
        IpStatus::DestinationProhibited,
        IpStatus::DestinationPortUnreachable,
        IpStatus::NoResources,
        IpStatus::BadOption,
        IpStatus::HardwareError,
        IpStatus::PacketTooBig,
        IpStatus::TimedOut,
        IpStatus::BadRoute,
        IpStatus::TtlExpired,
        IpStatus::TtlReassemblyTimeExceeded,
        IpStatus::ParameterProblem,
        IpStatus::SourceQuench,
        IpStatus::BadDestination,
        IpStatus::DestinationUnreachable,
        IpStatus::TimeExceeded,
        IpStatus::BadHeader,
        IpStatus::UnrecognizedNextHeader,
        IpStatus::IcmpError,
        IpStatus::DestinationScopeMismatch,
        IpStatus::Unknown,
    ];

    /// Raw wire ordinal of this status.
    pub fn code(self) -> i32 {
        match self {
            IpStatus::Success => 0,
            IpStatus::DestinationNetworkUnreachable => 11002,
            IpStatus::DestinationHostUnreachable => 11003,
            IpStatus::DestinationProtocolUnreachable | IpStatus::DestinationProhibited => 11004,
            IpStatus::DestinationPortUnreachable => 11005,
            IpStatus::NoResources => 11006,
            IpStatus::BadOption => 11007,
            IpStatus::HardwareError => 11008,
            IpStatus::PacketTooBig => 11009,
            IpStatus::TimedOut => 11010,
            IpStatus::BadRoute => 11012,
            IpStatus::TtlExpired => 11013,
            IpStatus::TtlReassemblyTimeExceeded => 11014,
            IpStatus::ParameterProblem => 11015,
            IpStatus::SourceQuench => 11016,
            IpStatus::BadDestination => 11018,
            IpStatus::DestinationUnreachable => 11040,
            IpStatus::TimeExceeded => 11041,
            IpStatus::BadHeader => 11042,
            IpStatus::UnrecognizedNextHeader => 11043,
            IpStatus::IcmpError => 11044,
            IpStatus::DestinationScopeMismatch => 11045,
            IpStatus::Unknown => -1,
        }
    }

    /// Resolve a raw ordinal, using the responder's address family to pick
    /// between the two statuses that share 11004.
    pub fn from_code(code: i32, ipv4: bool) -> Option<IpStatus> {
        if code == 11004 {
            return Some(if ipv4 {
                IpStatus::DestinationProtocolUnreachable
            } else {
                IpStatus::DestinationProhibited
            });
        }
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn is_success(self) -> bool {
        self == IpStatus::Success
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusClassification {
    pub status: IpStatus,
    pub brief: String,
    pub extended: String,
    pub state: ProbeState,
}

#[derive(Deserialize)]
struct StatusTable {
    version: u32,
    entries: Vec<StatusClassification>,
}

static TABLE: LazyLock<HashMap<IpStatus, StatusClassification>> = LazyLock::new(|| {
    match serde_json::from_str::<StatusTable>(STATUS_TABLE) {
        Ok(table) => {
            log::debug!(
                "Loaded status table v{} with {} entries",
                table.version,
                table.entries.len()
            );
            table
                .entries
                .into_iter()
                .map(|entry| (entry.status, entry))
                .collect()
        }
        Err(e) => {
            log::error!("Embedded status table is malformed: {e}");
            HashMap::new()
        }
    }
});

/// Classify a raw status code reported by a responder.
pub fn classify(code: i32, ipv4: bool) -> Result<&'static StatusClassification, ClassificationError> {
    let status = IpStatus::from_code(code, ipv4)
        .ok_or(ClassificationError::UnknownCode { code, ipv4 })?;
    lookup(status)
}

/// Look up an already resolved status.
pub fn lookup(status: IpStatus) -> Result<&'static StatusClassification, ClassificationError> {
    TABLE
        .get(&status)
        .ok_or(ClassificationError::MissingEntry(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_status() {
        for status in IpStatus::ALL {
            let entry = lookup(status).unwrap();
            assert_eq!(entry.status, status);
            assert!(!entry.brief.is_empty());
        }
    }

    #[test]
    fn every_code_round_trips_through_its_family() {
        for status in IpStatus::ALL {
            let ipv4 = status != IpStatus::DestinationProhibited;
            assert_eq!(IpStatus::from_code(status.code(), ipv4), Some(status));
        }
    }

    #[test]
    fn shared_ordinal_is_resolved_by_family() {
        let v4 = classify(11004, true).unwrap();
        let v6 = classify(11004, false).unwrap();
        assert_eq!(v4.status, IpStatus::DestinationProtocolUnreachable);
        assert_eq!(v6.status, IpStatus::DestinationProhibited);
    }

    #[test]
    fn states_match_orchestration_semantics() {
        assert_eq!(classify(0, true).unwrap().state, ProbeState::Continue);
        assert_eq!(classify(11010, true).unwrap().state, ProbeState::PacketLossCaution);
        assert_eq!(classify(11016, false).unwrap().state, ProbeState::Pause);
        assert_eq!(classify(11003, true).unwrap().state, ProbeState::Halt);
        assert_eq!(classify(-1, true).unwrap().state, ProbeState::Halt);
    }

    #[test]
    fn unknown_code_is_an_error() {
        assert_eq!(
            classify(4242, true),
            Err(ClassificationError::UnknownCode { code: 4242, ipv4: true })
        );
    }
}
