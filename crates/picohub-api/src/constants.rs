/// Prefix for every versioned route
pub const API_PREFIX: &str = "/api/v1";

/// Multipart field carrying the skill package
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Extra request body allowance on top of the package size limit, for the
/// multipart envelope
pub const MULTIPART_OVERHEAD_BYTES: usize = 1 << 20;

pub const SERVICE_NAME: &str = "picohub-api";
