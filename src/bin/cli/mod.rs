pub mod args;
pub mod commands;
pub mod plain;

/// Exit codes for different error conditions
pub mod exit_codes {
    /// Successful execution
    pub const SUCCESS: u8 = 0;
    /// The connection could not be started (bad url, no runtime)
    pub const CONNECT_ERROR: u8 = 1;
    /// Invalid command-line arguments
    pub const USAGE_ERROR: u8 = 2;
}
