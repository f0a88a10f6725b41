//! The catalog-eligible file extensions.
//!
//! One list, shared by import, directory scan, sync and status reporting.

use std::path::Path;

pub const ENTRY_EXTENSIONS: &[&str] = &[
    "pk1", "pk2", "pk3", "pk4", "pk5", "pk6", "pk7", "pk8", "pk9", "pb7", "pb8", "ek1", "ek2",
    "ek3", "ek4", "ek5", "ek6", "ek7", "ek8", "ek9", "ekx",
];

/// True if `ext` (without the dot, any case) is catalog-eligible.
pub fn is_entry_extension(ext: &str) -> bool {
    ENTRY_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// The lowercase extension of `path`, if it is catalog-eligible.
pub fn entry_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| is_entry_extension(e))
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_entry_file(path: &Path) -> bool {
    entry_extension(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_matches_case_insensitively() {
        assert!(is_entry_extension("pk9"));
        assert!(is_entry_extension("PB8"));
        assert!(is_entry_extension("ekx"));
        assert!(!is_entry_extension("pk10"));
        assert!(!is_entry_extension("sav"));
    }

    #[test]
    fn extension_from_path() {
        assert_eq!(entry_extension(Path::new("a/Mew.PK3")).as_deref(), Some("pk3"));
        assert_eq!(entry_extension(Path::new("readme.txt")), None);
        assert_eq!(entry_extension(Path::new("pk9")), None);
    }
}
