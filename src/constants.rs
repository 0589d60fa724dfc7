//! Constants affecting cache layout and playback defaults.

/// Prefix prepended to bundle-relative identifiers when reading bundled resources.
pub const DEFAULT_PREFIX: &str = "assets/";

/// URL schemes which mark an identifier as a network asset.
pub const NETWORK_SCHEMES: [&str; 2] = ["http", "https"];

/// Extension given to partially written files before they are renamed into place.
pub const PARTIAL_EXTENSION: &str = "part";
