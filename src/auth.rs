// ABOUTME: Login gate — checks a username/password pair against configured credentials.
// ABOUTME: With no credentials configured the gate is open; prompts go through dialoguer.

use std::fmt;

/// Expected login pair.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check an attempt. Both fields are always compared in full.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

/// Ask for a username and password on the terminal; the password is not echoed.
///
/// Returns `None` on Ctrl-C or when the terminal is unavailable.
pub fn prompt_credentials() -> Option<(String, String)> {
    let username = interactive(
        dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text(),
    )?;
    let password = interactive(dialoguer::Password::new().with_prompt("Password").interact())?;
    Some((username, password))
}

/// Collapse a dialoguer prompt result, treating interrupts and IO failures as no input.
fn interactive<T>(result: dialoguer::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(dialoguer::Error::IO(ref e)) if e.kind() == std::io::ErrorKind::Interrupted => None,
        Err(e) => {
            tracing::warn!(error = %e, "login prompt failed");
            None
        }
    }
}

/// Outcome of the login prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// No credentials configured.
    Open,
    Granted,
    Denied,
}

/// Run the login gate, asking `prompt` for a username/password pair up to `attempts` times.
///
/// `prompt` returns `None` when input is exhausted, which denies immediately.
pub fn login(
    expected: Option<&Credentials>,
    attempts: u32,
    mut prompt: impl FnMut() -> Option<(String, String)>,
) -> LoginOutcome {
    let Some(expected) = expected else {
        return LoginOutcome::Open;
    };

    for attempt in 1..=attempts {
        let Some((username, password)) = prompt() else {
            break;
        };
        if expected.verify(username.trim(), &password) {
            tracing::info!(username = %username.trim(), "login succeeded");
            return LoginOutcome::Granted;
        }
        tracing::warn!(attempt, "login failed");
    }
    LoginOutcome::Denied
}
