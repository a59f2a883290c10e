//! Reserved names and markers of the key namespace.
//!
//! Values live at `<document>/<region>/<key-path>`, audit records at
//! `audit/<document>/<region>/<key-path>/<revision>` and serialized documents at
//! `document/<name>`.

/// Separator between the segments of a key path.
pub const HIERARCHY_SEPARATOR: char = '/';

/// Prefix of a segment that addresses an array element (`...0`, `...1`, ...).
pub const ARRAY_PREFIX: &str = "...";

/// Baseline region every other region falls back to.
pub const DEFAULT_REGION: &str = "default";

/// Root namespace of the audit trail.
pub const AUDIT_REGION: &str = "audit";

/// Root namespace of the serialized document key sets.
pub const DOCUMENT_REGION: &str = "document";

/// Old value recorded in the audit trail when a key had no value in the region.
pub const NO_VALUE: &str = "<None>";

/// Field whose string value names a parent template to inherit keys from.
pub const PARENT_CONFIG_FIELD: &str = "parentConfigurationFile";

/// Separator between keys in a serialized key set.
pub const KEYSET_SEPARATOR: char = '\n';

/// Literal stored values decoded as booleans.
pub const BOOLEAN_VALUES: [&str; 2] = ["true", "false"];

/// Literal stored value decoded as null.
pub const NULL_VALUE: &str = "null";

/// Names that cannot be used as a document because they own a root namespace.
pub const RESERVED_NAMESPACES: [&str; 2] = [AUDIT_REGION, DOCUMENT_REGION];
