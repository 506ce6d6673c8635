use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for system-generated stored filenames:
    /// UTC timestamp (second precision), 8 hex chars, accepted image extension
    /// - Valid: "20250817_093015_a1b2c3d4.jpg"
    /// - Invalid: "photo.jpg", "20250817_093015_a1b2c3d4.pdf", "../etc/passwd"
    pub static ref STORED_FILENAME_REGEX: Regex =
        Regex::new(r"^[0-9]{8}_[0-9]{6}_[0-9a-f]{8}\.(jpg|jpeg|png)$").unwrap();
}

/// True when a stored name can be resolved against the storage root without
/// escaping it. Stored names are flat file names, never paths.
pub fn is_path_safe(name: &str) -> bool {
    !name.is_empty() && !name.contains("..") && !name.contains('/') && !name.contains('\\')
}
