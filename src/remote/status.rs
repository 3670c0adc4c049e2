//! # Remote Cache Status Taxonomy
//!
//! The closed set of status values carried in the remote cache header. The
//! set covers lifecycle no-ops, payload encoding state, negotiation
//! mismatches, transport faults, timeouts, admission control, and terminal
//! results. Timeouts and cancellation are reported in-band through these
//! values rather than raised; no status implies an automatic retry.

use crate::remote::ProtocolError;
use serde::{Deserialize, Serialize};

/// Status values exchanged in [`RemoteCacheHeader`](crate::remote::RemoteCacheHeader).
///
/// Discriminants are the wire encoding; the set is closed and append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum RcStatus {
    // Lifecycle / no-op
    None = 0,
    Heartbeat = 1,

    // Payload encoding state
    CompressedValue = 2,
    UncompressedValue = 3,
    NotCompressedCache = 4,

    // Negotiation mismatches
    DaoVersionMismatch = 5,
    DatabaseMismatch = 6,
    HeaderVersionMismatch = 7,
    BaselineMismatch = 8,
    IncompatibleMode = 9,
    MasterNonHistorical = 10,

    // Transport / operational faults
    ConnectionRefused = 11,
    AddressNotAvailable = 12,
    ReadError = 13,
    WriteError = 14,
    ServerError = 15,
    ClientError = 16,
    NotImplemented = 17,

    // Timeouts
    ServerTimeout = 18,
    ClientConnectionTimeout = 19,
    ClientProcessingTimeout = 20,
    HealthcheckTimeout = 21,

    // Admission control
    ServerBusy = 22,
    ServerNotReady = 23,
    MaxNumberClientsExceeded = 24,
    QueueLimitExceeded = 25,

    // Terminal results
    NotFound = 26,
    RequestCanceled = 27,
    RequestIdMismatch = 28,
    RequestFromSameHost = 29,
    UnknownError = 30,
    BadRequest = 31,
    BadRequestStatus = 32,
    WrongMagicString = 33,
    NotServerForDatatype = 34,
    MasterCacheUpdateStopped = 35,
}

/// Number of defined status values; any wire value at or above this is
/// rejected as `BAD_REQUEST_STATUS`.
pub const STATUS_COUNT: usize = 36;

/// Every status in discriminant order.
pub const ALL_STATUSES: [RcStatus; STATUS_COUNT] = [
    RcStatus::None,
    RcStatus::Heartbeat,
    RcStatus::CompressedValue,
    RcStatus::UncompressedValue,
    RcStatus::NotCompressedCache,
    RcStatus::DaoVersionMismatch,
    RcStatus::DatabaseMismatch,
    RcStatus::HeaderVersionMismatch,
    RcStatus::BaselineMismatch,
    RcStatus::IncompatibleMode,
    RcStatus::MasterNonHistorical,
    RcStatus::ConnectionRefused,
    RcStatus::AddressNotAvailable,
    RcStatus::ReadError,
    RcStatus::WriteError,
    RcStatus::ServerError,
    RcStatus::ClientError,
    RcStatus::NotImplemented,
    RcStatus::ServerTimeout,
    RcStatus::ClientConnectionTimeout,
    RcStatus::ClientProcessingTimeout,
    RcStatus::HealthcheckTimeout,
    RcStatus::ServerBusy,
    RcStatus::ServerNotReady,
    RcStatus::MaxNumberClientsExceeded,
    RcStatus::QueueLimitExceeded,
    RcStatus::NotFound,
    RcStatus::RequestCanceled,
    RcStatus::RequestIdMismatch,
    RcStatus::RequestFromSameHost,
    RcStatus::UnknownError,
    RcStatus::BadRequest,
    RcStatus::BadRequestStatus,
    RcStatus::WrongMagicString,
    RcStatus::NotServerForDatatype,
    RcStatus::MasterCacheUpdateStopped,
];

impl RcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RcStatus::None => "NONE",
            RcStatus::Heartbeat => "HEARTBEAT",
            RcStatus::CompressedValue => "COMPRESSED_VALUE",
            RcStatus::UncompressedValue => "UNCOMPRESSED_VALUE",
            RcStatus::NotCompressedCache => "NOT_COMPRESSED_CACHE",
            RcStatus::DaoVersionMismatch => "DAO_VERSION_MISMATCH",
            RcStatus::DatabaseMismatch => "DATABASE_MISMATCH",
            RcStatus::HeaderVersionMismatch => "HEADER_VERSION_MISMATCH",
            RcStatus::BaselineMismatch => "BASELINE_MISMATCH",
            RcStatus::IncompatibleMode => "INCOMPATIBLE_MODE",
            RcStatus::MasterNonHistorical => "MASTER_NONHISTORICAL",
            RcStatus::ConnectionRefused => "CONNECTION_REFUSED",
            RcStatus::AddressNotAvailable => "ADDRESS_NOT_AVAILABLE",
            RcStatus::ReadError => "READ_ERROR",
            RcStatus::WriteError => "WRITE_ERROR",
            RcStatus::ServerError => "SERVER_ERROR",
            RcStatus::ClientError => "CLIENT_ERROR",
            RcStatus::NotImplemented => "NOT_IMPLEMENTED",
            RcStatus::ServerTimeout => "SERVER_TIMEOUT",
            RcStatus::ClientConnectionTimeout => "CLIENT_CONNECTION_TIMEOUT",
            RcStatus::ClientProcessingTimeout => "CLIENT_PROCESSING_TIMEOUT",
            RcStatus::HealthcheckTimeout => "HEALTHCHECK_TIMEOUT",
            RcStatus::ServerBusy => "SERVER_BUSY",
            RcStatus::ServerNotReady => "SERVER_NOT_READY",
            RcStatus::MaxNumberClientsExceeded => "MAX_NUMBER_CLIENTS_EXCEEDED",
            RcStatus::QueueLimitExceeded => "QUEUE_LIMIT_EXCEEDED",
            RcStatus::NotFound => "NOT_FOUND",
            RcStatus::RequestCanceled => "REQUEST_CANCELED",
            RcStatus::RequestIdMismatch => "REQUEST_ID_MISMATCH",
            RcStatus::RequestFromSameHost => "REQUEST_FROM_SAME_HOST",
            RcStatus::UnknownError => "UNKNOWN_ERROR",
            RcStatus::BadRequest => "BAD_REQUEST",
            RcStatus::BadRequestStatus => "BAD_REQUEST_STATUS",
            RcStatus::WrongMagicString => "WRONG_MAGIC_STRING",
            RcStatus::NotServerForDatatype => "NOT_SERVER_FOR_DATATYPE",
            RcStatus::MasterCacheUpdateStopped => "MASTER_CACHE_UPDATE_STOPPED",
        }
    }

    /// True for statuses that report a timeout of some flavor.
    pub fn is_timeout(&self) -> bool {
        status_groups::TIMEOUTS.contains(self)
    }

    /// True for transport or operational faults.
    pub fn is_transport_fault(&self) -> bool {
        status_groups::TRANSPORT_FAULTS.contains(self)
    }

    /// True when the server refused the request for load reasons.
    pub fn is_admission_rejection(&self) -> bool {
        status_groups::ADMISSION_CONTROL.contains(self)
    }

    /// True when the payload following the header is compressed and
    /// `inflated_size` describes the decompressed length.
    pub fn indicates_compressed_payload(&self) -> bool {
        matches!(self, RcStatus::CompressedValue)
    }

    /// True when a payload of `payload_size` bytes follows the header.
    pub fn carries_payload(&self) -> bool {
        matches!(
            self,
            RcStatus::CompressedValue | RcStatus::UncompressedValue | RcStatus::NotCompressedCache
        )
    }
}

impl std::fmt::Display for RcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u32> for RcStatus {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, ProtocolError> {
        ALL_STATUSES
            .get(value as usize)
            .copied()
            .ok_or(ProtocolError::BadRequestStatus(value))
    }
}

/// Status groupings for validation and reporting logic.
pub mod status_groups {
    use super::RcStatus;

    /// Statuses that carry no request semantics.
    pub const LIFECYCLE: &[RcStatus] = &[RcStatus::None, RcStatus::Heartbeat];

    /// Statuses describing the encoding of the payload that follows.
    pub const PAYLOAD_ENCODING: &[RcStatus] = &[
        RcStatus::CompressedValue,
        RcStatus::UncompressedValue,
        RcStatus::NotCompressedCache,
    ];

    /// Client/server negotiation mismatches.
    pub const NEGOTIATION_MISMATCHES: &[RcStatus] = &[
        RcStatus::DaoVersionMismatch,
        RcStatus::DatabaseMismatch,
        RcStatus::HeaderVersionMismatch,
        RcStatus::BaselineMismatch,
        RcStatus::IncompatibleMode,
        RcStatus::MasterNonHistorical,
    ];

    /// Transport and operational faults.
    pub const TRANSPORT_FAULTS: &[RcStatus] = &[
        RcStatus::ConnectionRefused,
        RcStatus::AddressNotAvailable,
        RcStatus::ReadError,
        RcStatus::WriteError,
        RcStatus::ServerError,
        RcStatus::ClientError,
        RcStatus::NotImplemented,
    ];

    /// Timeout flavors.
    pub const TIMEOUTS: &[RcStatus] = &[
        RcStatus::ServerTimeout,
        RcStatus::ClientConnectionTimeout,
        RcStatus::ClientProcessingTimeout,
        RcStatus::HealthcheckTimeout,
    ];

    /// Load-shedding rejections.
    pub const ADMISSION_CONTROL: &[RcStatus] = &[
        RcStatus::ServerBusy,
        RcStatus::ServerNotReady,
        RcStatus::MaxNumberClientsExceeded,
        RcStatus::QueueLimitExceeded,
    ];

    /// Terminal results for a single exchange.
    pub const TERMINAL_RESULTS: &[RcStatus] = &[
        RcStatus::NotFound,
        RcStatus::RequestCanceled,
        RcStatus::RequestIdMismatch,
        RcStatus::RequestFromSameHost,
        RcStatus::UnknownError,
        RcStatus::BadRequest,
        RcStatus::BadRequestStatus,
        RcStatus::WrongMagicString,
        RcStatus::NotServerForDatatype,
        RcStatus::MasterCacheUpdateStopped,
    ];
}
