/// Error class reported when no provider could supply a security's profile.
pub const SECURITY_INFO_MISSING_ERROR: &str = "SecurityInfoMissingError";

/// Message attached to [`SECURITY_INFO_MISSING_ERROR`] reports.
pub const SECURITY_INFO_MISSING_MESSAGE: &str = "Failed to get security info from all providers";
