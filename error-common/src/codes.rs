// Error codes implementation
// Standardized error codes attached to structured error logs

pub const INTERNAL: &str = "INTERNAL_9000";

pub mod config {
    pub const INVALID_CONFIG: &str = "CONFIG_1001";
    pub const SOURCE_UNAVAILABLE: &str = "CONFIG_1002";
    pub const MISSING_SECTION: &str = "CONFIG_1003";
}

pub mod network {
    pub const CONNECTION_FAILED: &str = "NET_2001";
    pub const UPSTREAM_STATUS: &str = "NET_2002";
    pub const TIMEOUT: &str = "NET_2003";
}

pub mod transport {
    pub const DISPATCH_FAILED: &str = "BUS_3001";
    pub const NO_HANDLER: &str = "BUS_3002";
}
