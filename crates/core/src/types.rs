/// Advertisements are addressed by an opaque, caller-supplied string.
pub type AdId = String;

/// Version ids are UUIDv7 strings, unique within an (ad, stream) pair.
pub type VersionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
