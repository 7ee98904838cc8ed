use std::fmt;

/// Personal access token for the Azure DevOps organization.
///
/// Never printed: `Debug` is redacted so the token cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Organization endpoint, project and token needed to talk to the build service.
#[derive(Debug, Clone)]
pub struct AdoContext {
    pub organization_url: String,
    pub project: String,
    pub token: Token,
}
