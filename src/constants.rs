//! Global constants used throughout the xl-render codebase.
//!
//! Format versions, reserved document kinds and well-known file names that
//! more than one module needs.

/// `apiVersion` of documents owned by the engine itself (`Import`, `Blueprint`).
pub const YAML_FORMAT_VERSION: &str = "xl/v1";

/// Document kind reserved for files that only declare imports.
pub const IMPORT_KIND: &str = "Import";

/// Document kind of a blueprint metadata file.
pub const BLUEPRINT_KIND: &str = "Blueprint";

/// `apiVersion` accepted by the XL Deploy target.
pub const XL_DEPLOY_API_VERSION: &str = "xl-deploy/v1";

/// `apiVersion` accepted by the XL Release target.
pub const XL_RELEASE_API_VERSION: &str = "xl-release/v1";

/// Per-user directory holding configuration and home `.xlvals` files.
pub const XEBIALABS_DIR: &str = ".xebialabs";

/// Engine configuration file inside [`XEBIALABS_DIR`].
pub const CONFIG_FILE_NAME: &str = "xlr.toml";

/// Metadata key listing the files a document imports.
pub const IMPORTS_KEY: &str = "imports";
