//! PostgreSQL implementations of the store traits.

pub mod admin_group;
pub mod file;
pub mod file_event;
pub mod file_operation;
pub mod lock;
pub mod login_attempt;
pub mod refresh_token;
pub mod user;

pub use admin_group::AdminGroupRepository;
pub use file::FileRepository;
pub use file_event::FileEventRepository;
pub use file_operation::FileOperationRepository;
pub use lock::LockRepository;
pub use login_attempt::LoginAttemptRepository;
pub use refresh_token::RefreshTokenRepository;
pub use user::UserAccountRepository;

/// Build an `ILIKE` pattern for an optional search term.
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some(" 50%_off ")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }
}
