//! Message-bus subjects

/// Inbound resize commands
pub const INSTANCE_UPDATE: &str = "instance.update.aws";

/// Failed requests, or raw payloads that could not be parsed
pub const INSTANCE_UPDATE_ERROR: &str = "instance.update.aws.error";

/// Completed requests
pub const INSTANCE_UPDATE_DONE: &str = "instance.update.aws.done";
