use std::sync::{PoisonError, RwLock};

/// Holds the bearer credential for outgoing requests.
///
/// One session is created at startup and handed to every component that talks
/// to the backend. Issuing or refreshing tokens happens elsewhere; the session
/// only carries whatever credential it was given.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn init(token: Option<String>) -> Self {
        let token = token.filter(|token| !token.trim().is_empty());
        Self {
            token: RwLock::new(token),
        }
    }

    /// Value for the `Authorization` header, if a credential is present.
    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .map(|token| format!("Bearer {token}"))
    }

    pub fn replace_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn teardown(&self) {
        self.replace_token(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bearer_header() {
        let session = Session::init(Some("abc123".to_string()));
        assert_eq!(session.bearer().as_deref(), Some("Bearer abc123"));
    }

    #[test]
    fn blank_token_counts_as_absent() {
        let session = Session::init(Some("   ".to_string()));
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), None);
    }

    #[test]
    fn teardown_drops_credential() {
        let session = Session::init(Some("abc123".to_string()));
        session.teardown();
        assert_eq!(session.bearer(), None);

        session.replace_token(Some("fresh".to_string()));
        assert!(session.is_authenticated());
    }
}
