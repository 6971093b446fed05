use std::fmt;

use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterCommand {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginCommand {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegisterResult {
    #[serde(rename = "userId")]
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginResult {
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileResult {
    #[serde(rename = "userId")]
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Every result the engine can hand to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseCaseOutput {
    Registered(RegisterResult),
    LoggedIn(LoginResult),
    Profile(ProfileResult),
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
