use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Which HTTP authentication scheme established a stream.
///
/// Marker enum (no data) -- the actual credentials live in [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// The device answered the bare request without a challenge.
    None,
    /// RFC 7616 challenge/response.
    Digest,
    /// RFC 7617 `Authorization: Basic`.
    Basic,
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Digest => "digest",
            Self::Basic => "basic",
        })
    }
}

/// Username/password pair presented to a camera.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Answer a `WWW-Authenticate: Digest ...` challenge for a GET of `uri`.
    ///
    /// `uri` is the request-target (path plus query), not the absolute URL.
    pub(crate) fn digest_authorization(&self, challenge: &str, uri: &str) -> Result<String, Error> {
        let mut prompt =
            digest_auth::parse(challenge).map_err(|e| Error::Digest(e.to_string()))?;
        let context = digest_auth::AuthContext::new(
            self.username.as_str(),
            self.password.expose_secret(),
            uri,
        );
        let answer = prompt
            .respond(&context)
            .map_err(|e| Error::Digest(e.to_string()))?;
        Ok(answer.to_string())
    }
}

/// Pick the digest challenge out of a set of `WWW-Authenticate` values.
///
/// Cameras commonly advertise both `Digest` and `Basic`; only the former
/// is usable for challenge/response.
pub(crate) fn find_digest_challenge<'a>(
    challenges: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    challenges.into_iter().find(|value| {
        value
            .trim_start()
            .get(..6)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("digest"))
    })
}
