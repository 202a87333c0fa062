//! Random secrets for the director's internal services.

use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;

/// Length used for generated secrets unless configured otherwise.
pub const DEFAULT_CREDENTIAL_LENGTH: usize = 12;

/// Errors raised while configuring credential generation.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum CredentialsError {
    /// Raised when a zero-length secret is requested.
    #[error("credential length must be positive")]
    ZeroLength,
}

/// Passwords for every service the director deployment runs.
#[derive(Clone, Eq, PartialEq)]
pub struct DirectorCredentials {
    /// Message bus password used by the bootstrap agent.
    pub mbus: String,
    /// NATS password.
    pub nats: String,
    /// Redis password.
    pub redis: String,
    /// Postgres password.
    pub postgres: String,
    /// Registry password.
    pub registry: String,
    /// Blobstore password for the director.
    pub blobstore_director: String,
    /// Blobstore password for agents.
    pub blobstore_agent: String,
    /// Health monitor password.
    pub health_monitor: String,
    /// Operator password for the `admin` user.
    pub admin: String,
}

impl std::fmt::Debug for DirectorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorCredentials").finish_non_exhaustive()
    }
}

/// Fills credential bundles from an injected random source.
#[derive(Debug)]
pub struct CredentialGenerator<R> {
    rng: R,
    length: usize,
}

impl<R: Rng> CredentialGenerator<R> {
    /// Creates a generator producing secrets of `length` characters.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::ZeroLength`] when `length` is zero.
    pub fn new(rng: R, length: usize) -> Result<Self, CredentialsError> {
        if length == 0 {
            return Err(CredentialsError::ZeroLength);
        }
        Ok(Self { rng, length })
    }

    /// Draws one alphanumeric secret.
    pub fn secret(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }

    /// Draws an independent secret for each director service.
    pub fn director_credentials(&mut self) -> DirectorCredentials {
        DirectorCredentials {
            mbus: self.secret(),
            nats: self.secret(),
            redis: self.secret(),
            postgres: self.secret(),
            registry: self.secret(),
            blobstore_director: self.secret(),
            blobstore_agent: self.secret(),
            health_monitor: self.secret(),
            admin: self.secret(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn generator() -> CredentialGenerator<StdRng> {
        CredentialGenerator::new(StdRng::seed_from_u64(7), DEFAULT_CREDENTIAL_LENGTH)
            .unwrap_or_else(|err| panic!("generator: {err}"))
    }

    #[test]
    fn rejects_zero_length() {
        let result = CredentialGenerator::new(StdRng::seed_from_u64(1), 0);
        assert!(matches!(result, Err(CredentialsError::ZeroLength)));
    }

    #[rstest]
    #[case(1)]
    #[case(12)]
    #[case(40)]
    fn secrets_have_requested_length(#[case] length: usize) {
        let mut generator = CredentialGenerator::new(StdRng::seed_from_u64(3), length)
            .unwrap_or_else(|err| panic!("generator: {err}"));
        let secret = generator.secret();
        assert_eq!(secret.len(), length);
        assert!(secret.chars().all(|ch| ch.is_ascii_alphanumeric()));
    }

    #[rstest]
    fn fields_are_generated_independently(mut generator: CredentialGenerator<StdRng>) {
        let creds = generator.director_credentials();
        let distinct: BTreeSet<&str> = [
            creds.mbus.as_str(),
            creds.nats.as_str(),
            creds.redis.as_str(),
            creds.postgres.as_str(),
            creds.registry.as_str(),
            creds.blobstore_director.as_str(),
            creds.blobstore_agent.as_str(),
            creds.health_monitor.as_str(),
            creds.admin.as_str(),
        ]
        .into_iter()
        .collect();
        assert_eq!(distinct.len(), 9);
    }

    #[rstest]
    fn successive_bundles_differ(mut generator: CredentialGenerator<StdRng>) {
        let first = generator.director_credentials();
        let second = generator.director_credentials();
        assert_ne!(first, second);
    }

    #[rstest]
    fn debug_output_is_redacted(mut generator: CredentialGenerator<StdRng>) {
        let creds = generator.director_credentials();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains(&creds.admin));
    }
}
