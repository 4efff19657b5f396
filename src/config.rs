/// Centralized configuration constants for radarlink

// Timing
pub const INIT_COMMAND_DELAY_MS: u64 = 500;
pub const DEFAULT_LISTEN_SECS: u64 = 10;
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

// Log surface
pub const MAX_LOG_ENTRIES: usize = 500;

// Ping defaults
pub const DEFAULT_PING_TARGET: &str = "google.com";
pub const DEFAULT_PING_COUNT: u32 = 5;

// Sentinel RSSI the device reports while a tracked target is not visible
pub const NO_SIGNAL_RSSI: i32 = -120;

// Direction finding
pub const MIN_USABLE_RSSI: i32 = -100;
pub const DEFAULT_MEASURE_SAMPLES: u32 = 2;
pub const MIN_ESTIMATE_POINTS: usize = 3;
pub const SURVEY_CSV_HEADER: &str = "ID,Angle,AvgRSSI,Count,Raw_Samples";

/// Line prefixes of the device protocol
pub mod prefix {
    pub const STATUS_DEVICE: &str = "STATUS:DEVICE:";
    pub const SCAN_START: &str = "STATUS:SCAN_START";
    pub const SCAN_END: &str = "STATUS:SCAN_END";
    pub const LIST: &str = "LIST:";
    pub const DATA: &str = "DATA:";
    pub const LOG: &str = "LOG:";
}

/// Sources shown in the log surface
pub mod source {
    pub const SYS: &str = "SYS";
    pub const DEV: &str = "DEV";
    pub const ERR: &str = "ERR";
    pub const RAW: &str = "RAW";
    pub const MAP: &str = "MAP";
}
