//! Catalog limits and behavior switches.

/// Default maximum identifier length, in bytes.
pub const DEFAULT_MAX_IDENT_LEN: usize = 255;

/// Default maximum number of fields per type, system fields included.
pub const DEFAULT_MAX_FIELDS_PER_TYPE: usize = 65_536;

/// Default maximum number of containers per type.
pub const DEFAULT_MAX_CONTAINERS_PER_TYPE: usize = 65_536;

/// Default maximum number of uniques per type.
pub const DEFAULT_MAX_UNIQUES_PER_TYPE: usize = 100;

/// Default maximum number of fields in one unique.
pub const DEFAULT_MAX_FIELDS_PER_UNIQUE: usize = 256;

/// Configuration for a catalog builder.
///
/// Limits are checked when entities are added, so exceeding one aborts the
/// offending builder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Maximum identifier length for package, entity and field names.
    pub max_ident_len: usize,
    /// Maximum number of fields per type.
    pub max_fields_per_type: usize,
    /// Maximum number of containers per type.
    pub max_containers_per_type: usize,
    /// Maximum number of uniques per type.
    pub max_uniques_per_type: usize,
    /// Maximum number of fields in one unique.
    pub max_fields_per_unique: usize,
    /// Emit a debug event with the reason whenever an ACL query is denied.
    pub log_denied_access: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_ident_len: DEFAULT_MAX_IDENT_LEN,
            max_fields_per_type: DEFAULT_MAX_FIELDS_PER_TYPE,
            max_containers_per_type: DEFAULT_MAX_CONTAINERS_PER_TYPE,
            max_uniques_per_type: DEFAULT_MAX_UNIQUES_PER_TYPE,
            max_fields_per_unique: DEFAULT_MAX_FIELDS_PER_UNIQUE,
            log_denied_access: false,
        }
    }
}

impl CatalogConfig {
    /// Create a configuration with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum identifier length.
    pub fn with_max_ident_len(mut self, len: usize) -> Self {
        self.max_ident_len = len;
        self
    }

    /// Set the maximum number of fields per type.
    pub fn with_max_fields_per_type(mut self, count: usize) -> Self {
        self.max_fields_per_type = count;
        self
    }

    /// Set the maximum number of containers per type.
    pub fn with_max_containers_per_type(mut self, count: usize) -> Self {
        self.max_containers_per_type = count;
        self
    }

    /// Set the maximum number of uniques per type.
    pub fn with_max_uniques_per_type(mut self, count: usize) -> Self {
        self.max_uniques_per_type = count;
        self
    }

    /// Set the maximum number of fields in one unique.
    pub fn with_max_fields_per_unique(mut self, count: usize) -> Self {
        self.max_fields_per_unique = count;
        self
    }

    /// Enable or disable denial logging for ACL queries.
    pub fn with_log_denied_access(mut self, enabled: bool) -> Self {
        self.log_denied_access = enabled;
        self
    }
}
