//! Persistence adapters.
//!
//! - `json_file`: progress and case documents as JSON files on disk
//! - `in_memory`: process-local stores for tests and ephemeral sessions

mod in_memory;
mod json_file;

pub use in_memory::{InMemoryCaseRepo, InMemoryProgressRepo};
pub use json_file::{JsonCaseRepo, JsonFileProgressRepo};

/// Make a document id usable as a file name component.
fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::file_safe;

    #[test]
    fn file_safe_replaces_path_characters() {
        assert_eq!(file_safe("gallery_heist"), "gallery_heist");
        assert_eq!(file_safe("../etc/passwd"), "___etc_passwd");
        assert_eq!(file_safe("ana maría"), "ana_mar_a");
    }
}
