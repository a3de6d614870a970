//! In-memory users and tokens.

use super::{
    generate_token_secret, hash_password, hash_token, split_token, AccessToken, AuthError,
    AuthenticatedUser, Credentials, RegisterUser, User, MIN_PASSWORD_LEN,
};
use chrono::Utc;
use guest_core::FieldErrors;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

/// Users and tokens as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTables {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    tokens: Vec<AccessToken>,
    #[serde(default = "first_id")]
    next_user_id: u64,
    #[serde(default = "first_id")]
    next_token_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for AuthTables {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            tokens: Vec::new(),
            next_user_id: first_id(),
            next_token_id: first_id(),
        }
    }
}

/// Issues and validates bearer tokens for registered users.
#[derive(Debug, Clone, Default)]
pub struct AuthGateway {
    tables: AuthTables,
}

impl AuthGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway over previously stored tables.
    pub fn from_tables(mut tables: AuthTables) -> Result<Self, AuthError> {
        if let Some(max_user) = tables.users.iter().map(|u| u.id).max() {
            let floor = max_user.checked_add(1).ok_or(AuthError::IdsExhausted)?;
            tables.next_user_id = tables.next_user_id.max(floor);
        }
        if let Some(max_token) = tables.tokens.iter().map(|t| t.id).max() {
            let floor = max_token.checked_add(1).ok_or(AuthError::IdsExhausted)?;
            tables.next_token_id = tables.next_token_id.max(floor);
        }
        Ok(Self { tables })
    }

    /// Underlying tables, for persistence.
    pub fn tables(&self) -> &AuthTables {
        &self.tables
    }

    pub fn user_count(&self) -> usize {
        self.tables.users.len()
    }

    pub fn token_count(&self) -> usize {
        self.tables.tokens.len()
    }

    fn find_by_email(&self, email: &str) -> Option<&User> {
        self.tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Register a new user.
    pub fn register(&mut self, input: RegisterUser) -> Result<User, AuthError> {
        let name = input.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let email = input.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        let input = RegisterUser {
            name,
            email,
            password: input.password,
        };

        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        if let Some(email) = input.email.as_deref() {
            if self.find_by_email(email).is_some() {
                errors.add("email", "The email has already been taken.");
            }
        }

        let password = input
            .password
            .as_ref()
            .map(|p| p.expose_secret().as_str())
            .unwrap_or_default();
        if password.is_empty() {
            errors.add("password", "The password field is required.");
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("The password must be at least {} characters.", MIN_PASSWORD_LEN),
            );
        }

        errors.into_result().map_err(AuthError::Validation)?;
        let password_hash = hash_password(password)?;

        let id = self.tables.next_user_id;
        self.tables.next_user_id = id.checked_add(1).ok_or(AuthError::IdsExhausted)?;

        let now = Utc::now();
        let user = User {
            id,
            name: input.name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
            password_hash,
            created_at: now,
            updated_at: now,
        };
        self.tables.users.push(user.clone());

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a fresh token, revoking any earlier ones.
    ///
    /// Returns the user and the plain-text token. The plain-text token is
    /// never stored.
    pub fn login(&mut self, credentials: Credentials) -> Result<(User, String), AuthError> {
        let mut errors = match credentials.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };
        let password = credentials
            .password
            .as_ref()
            .map(|p| p.expose_secret().as_str())
            .unwrap_or_default();
        if password.is_empty() {
            errors.add("password", "The password field is required.");
        }
        errors.into_result().map_err(AuthError::Validation)?;

        let email = credentials.email.as_deref().unwrap_or_default().trim();
        let user = match self.find_by_email(email) {
            Some(user) if user.verify_password(password) => user.clone(),
            _ => {
                warn!("Login failed");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let id = self.tables.next_token_id;
        self.tables.next_token_id = id.checked_add(1).ok_or(AuthError::IdsExhausted)?;

        let revoked = self.revoke_all(user.id);
        if revoked > 0 {
            debug!(user_id = user.id, revoked, "Revoked previous tokens");
        }

        let secret = generate_token_secret();
        let token = AccessToken {
            id,
            user_id: user.id,
            name: format!("Token of {}", user.name),
            token_hash: hash_token(&secret),
            created_at: Utc::now(),
            last_used_at: None,
        };
        let plain = format!("{}|{}", token.id, secret);
        self.tables.tokens.push(token);

        info!(user_id = user.id, "User logged in");
        Ok((user, plain))
    }

    /// Resolve a plain-text `{id}|{secret}` bearer token to its user and mark
    /// the token used.
    pub fn authenticate(&mut self, plain: &str) -> Result<AuthenticatedUser, AuthError> {
        let (id, secret) = split_token(plain).ok_or(AuthError::Unauthenticated)?;
        let hash = hash_token(secret);
        let token = self
            .tables
            .tokens
            .iter_mut()
            .find(|t| t.id == id && t.token_hash == hash)
            .ok_or(AuthError::Unauthenticated)?;

        token.last_used_at = Some(Utc::now());
        let (token_id, user_id) = (token.id, token.user_id);

        let user = self
            .tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::Unauthenticated)?;

        Ok(AuthenticatedUser {
            user: user.clone(),
            token_id,
        })
    }

    /// Revoke a single token. Returns whether it existed.
    pub fn logout(&mut self, token_id: u64) -> bool {
        let before = self.tables.tokens.len();
        self.tables.tokens.retain(|t| t.id != token_id);
        let removed = self.tables.tokens.len() < before;
        if removed {
            info!(token_id, "Token revoked");
        }
        removed
    }

    fn revoke_all(&mut self, user_id: u64) -> usize {
        let before = self.tables.tokens.len();
        self.tables.tokens.retain(|t| t.user_id != user_id);
        before - self.tables.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn register_input(name: &str, email: &str, password: &str) -> RegisterUser {
        RegisterUser {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(SecretString::new(password.into())),
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: Some(email.into()),
            password: Some(SecretString::new(password.into())),
        }
    }

    #[test]
    fn test_register_and_login() {
        let mut auth = AuthGateway::new();
        let user = auth
            .register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(auth.user_count(), 1);

        let (logged_in, token) = auth.login(credentials("ada@example.com", "password123")).unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(token.starts_with("1|"));

        let current = auth.authenticate(&token).unwrap();
        assert_eq!(current.user.email, "ada@example.com");
        assert_eq!(current.token_id, 1);
        assert!(auth.tables().tokens[0].last_used_at.is_some());
    }

    #[test]
    fn test_register_validation() {
        let mut auth = AuthGateway::new();
        let err = auth
            .register(RegisterUser {
                name: Some("  ".into()),
                email: Some("nope".into()),
                password: Some(SecretString::new("short".into())),
            })
            .unwrap_err();

        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("name"));
        assert!(errors.contains("email"));
        assert_eq!(
            errors.messages("password"),
            ["The password must be at least 8 characters."]
        );
        assert_eq!(auth.user_count(), 0);
    }

    #[test]
    fn test_register_duplicate_email() {
        let mut auth = AuthGateway::new();
        auth.register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();

        let err = auth
            .register(register_input("Other", "ADA@example.com", "password123"))
            .unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.messages("email"), ["The email has already been taken."]);
    }

    #[test]
    fn test_login_wrong_password() {
        let mut auth = AuthGateway::new();
        auth.register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();

        let err = auth.login(credentials("ada@example.com", "wrong-password")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth.login(credentials("nobody@example.com", "password123")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(auth.token_count(), 0);
    }

    #[test]
    fn test_login_requires_fields() {
        let mut auth = AuthGateway::new();
        let err = auth.login(Credentials::default()).unwrap_err();
        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("email"));
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_login_revokes_previous_tokens() {
        let mut auth = AuthGateway::new();
        auth.register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();

        let (_, first) = auth.login(credentials("ada@example.com", "password123")).unwrap();
        let (_, second) = auth.login(credentials("ada@example.com", "password123")).unwrap();

        assert!(matches!(auth.authenticate(&first), Err(AuthError::Unauthenticated)));
        assert!(auth.authenticate(&second).is_ok());
        assert_eq!(auth.token_count(), 1);
    }

    #[test]
    fn test_logout_revokes_only_current_token() {
        let mut auth = AuthGateway::new();
        auth.register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();
        auth.register(register_input("Bob", "bob@example.com", "password456"))
            .unwrap();

        let (_, ada) = auth.login(credentials("ada@example.com", "password123")).unwrap();
        let (_, bob) = auth.login(credentials("bob@example.com", "password456")).unwrap();

        let current = auth.authenticate(&ada).unwrap();
        assert!(auth.logout(current.token_id));
        assert!(!auth.logout(current.token_id));

        assert!(auth.authenticate(&ada).is_err());
        assert!(auth.authenticate(&bob).is_ok());
    }

    #[test]
    fn test_authenticate_rejects_tampered_tokens() {
        let mut auth = AuthGateway::new();
        auth.register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();
        let (_, token) = auth.login(credentials("ada@example.com", "password123")).unwrap();

        let (_, secret) = token.split_once('|').unwrap();
        assert!(auth.authenticate(&format!("2|{}", secret)).is_err());
        assert!(auth.authenticate("1|wrong").is_err());
        assert!(auth.authenticate("").is_err());
        assert!(auth.authenticate(secret).is_err());
    }

    #[test]
    fn test_tables_serialization_round_trip() {
        let mut auth = AuthGateway::new();
        auth.register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap();
        let (_, token) = auth.login(credentials("ada@example.com", "password123")).unwrap();

        let json = serde_json::to_string(auth.tables()).unwrap();
        assert!(!json.contains(token.split_once('|').unwrap().1));

        let mut restored = AuthGateway::from_tables(serde_json::from_str(&json).unwrap()).unwrap();
        assert!(restored.authenticate(&token).is_ok());
        assert_eq!(restored.user_count(), 1);
    }

    #[test]
    fn test_from_tables_rejects_exhausted_ids() {
        let json = format!(
            r#"{{"tokens": [{{
                "id": {},
                "user_id": 1,
                "name": "Token of Ada",
                "token_hash": "00",
                "created_at": "2024-01-01T00:00:00Z"
            }}]}}"#,
            u64::MAX
        );
        let result = AuthGateway::from_tables(serde_json::from_str(&json).unwrap());
        assert!(matches!(result, Err(AuthError::IdsExhausted)));
    }

    #[test]
    fn test_register_fails_when_counter_is_exhausted() {
        let json = format!(r#"{{"next_user_id": {}}}"#, u64::MAX);
        let mut auth = AuthGateway::from_tables(serde_json::from_str(&json).unwrap()).unwrap();

        let err = auth
            .register(register_input("Ada", "ada@example.com", "password123"))
            .unwrap_err();
        assert!(matches!(err, AuthError::IdsExhausted));
        assert_eq!(auth.user_count(), 0);
    }
}
