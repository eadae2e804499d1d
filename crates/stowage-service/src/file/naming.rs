//! Object key construction.

use uuid::Uuid;

/// Longest file name kept in an object key.
const MAX_NAME_LEN: usize = 255;

/// Reduce a client-supplied file name to a safe final key segment.
///
/// Directory components are dropped, characters outside
/// `[A-Za-z0-9._-]` become `_`, leading dots are stripped. An empty result
/// falls back to `file`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Build the object key `{owner}/{unique}/{name}` for a new upload.
pub fn object_key(owner_id: Uuid, file_name: &str) -> String {
    format!("{}/{}/{}", owner_id, Uuid::now_v7(), sanitize_file_name(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(sanitize_file_name("my file (1).txt"), "my_file__1_.txt");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), 255);
    }

    #[test]
    fn test_object_key_layout() {
        let owner = Uuid::new_v4();
        let key = object_key(owner, "photo.jpg");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], owner.to_string());
        assert!(Uuid::parse_str(parts[1]).is_ok());
        assert_eq!(parts[2], "photo.jpg");
    }
}
