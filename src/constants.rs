// Local storage
pub const STORAGE_NAME: &str = "hormiga-storage";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_FILE: &str = "hormiga.json";
pub const OUTBOX_FILE: &str = "outbox.json";
pub const DEFAULT_DATA_PATH: &str = "data";

// Sync worker
pub const SYNC_INTERVAL_SECS: u64 = 30;
pub const SYNC_QUEUE_CAPACITY: usize = 64;
pub const MAX_SYNC_ATTEMPTS: u32 = 5;

// Analytics
pub const MS_PER_DAY: i64 = 86_400_000;
pub const DEFAULT_SERIES_DAYS: i64 = 30;
pub const UNCATEGORIZED_BUCKET: &str = "uncategorized";

// Validation limits
pub const MAX_GROUP_NAME_LENGTH: usize = 100;
pub const MAX_CATEGORY_LABEL_LENGTH: usize = 100;
pub const JOIN_CODE_LENGTH: usize = 6;

// Error messages shared with the remote RPC contract
pub const ERR_GROUP_NOT_FOUND: &str = "Group not found";
pub const ERR_ALREADY_MEMBER: &str = "Already a member";
