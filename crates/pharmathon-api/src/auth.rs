use argon2::{Argon2, PasswordHash, PasswordVerifier};
use tracing::warn;

/// What a caller can present at the gate.
pub enum AdminCredential<'a> {
    Token(&'a str),
    Password { username: &'a str, password: &'a str },
}

/// One capability: exchange a presented credential for the shared admin
/// token. The static-secret match and the username/password login are just
/// two implementations of the same contract; downstream the gate only ever
/// sees "valid token required".
pub trait AdminVerifier: Send + Sync {
    fn verify(&self, credential: &AdminCredential<'_>) -> Option<String>;
}

/// Exact match against the configured shared secret. An empty secret matches
/// nothing, so an unconfigured deployment denies everything.
pub struct StaticSecret {
    secret: String,
}

impl StaticSecret {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl AdminVerifier for StaticSecret {
    fn verify(&self, credential: &AdminCredential<'_>) -> Option<String> {
        match credential {
            AdminCredential::Token(t) if !self.secret.is_empty() && *t == self.secret => {
                Some(self.secret.clone())
            }
            _ => None,
        }
    }
}

/// Username/password login that hands out the same shared token the gate
/// checks. The password is verified against a configured argon2 PHC hash.
pub struct PasswordLogin {
    username: String,
    password_hash: String,
    secret: String,
}

impl PasswordLogin {
    pub fn new(username: String, password_hash: String, secret: String) -> Self {
        Self {
            username,
            password_hash,
            secret,
        }
    }
}

impl AdminVerifier for PasswordLogin {
    fn verify(&self, credential: &AdminCredential<'_>) -> Option<String> {
        let AdminCredential::Password { username, password } = credential else {
            return None;
        };
        if *username != self.username {
            return None;
        }

        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(h) => h,
            Err(e) => {
                warn!("ADMIN_PASSWORD_HASH is not a valid PHC string: {}", e);
                return None;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .ok()
            .map(|_| self.secret.clone())
    }
}

/// The admin access gate: stateless per request, tries each configured
/// verifier in turn.
pub struct AdminGate {
    verifiers: Vec<Box<dyn AdminVerifier>>,
}

impl AdminGate {
    pub fn new(verifiers: Vec<Box<dyn AdminVerifier>>) -> Self {
        Self { verifiers }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        let mut verifiers: Vec<Box<dyn AdminVerifier>> =
            vec![Box::new(StaticSecret::new(config.admin_token.clone()))];

        if let (Some(username), Some(hash)) =
            (&config.admin_username, &config.admin_password_hash)
        {
            verifiers.push(Box::new(PasswordLogin::new(
                username.clone(),
                hash.clone(),
                config.admin_token.clone(),
            )));
        }

        Self::new(verifiers)
    }

    pub fn verify(&self, credential: &AdminCredential<'_>) -> Option<String> {
        self.verifiers.iter().find_map(|v| v.verify(credential))
    }

    pub fn authorizes(&self, token: &str) -> bool {
        self.verify(&AdminCredential::Token(token)).is_some()
    }
}
