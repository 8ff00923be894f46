//! Terminal implementations of the core host and prompt seams.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tether_core::host::{CallbackFlavor, CredentialInput, Host, LoginChoice, LoginPrompts};

/// Stdin-driven login prompts.
pub struct TerminalPrompts;

#[async_trait]
impl LoginPrompts for TerminalPrompts {
    async fn choose_login(&self, history: &[String]) -> Option<LoginChoice> {
        println!("How do you want to sign in?");
        for (index, endpoint) in history.iter().enumerate() {
            println!("  {}. {endpoint}", index + 1);
        }
        let base = history.len();
        println!("  {}. Add an enterprise instance", base + 1);
        println!("  {}. Continue with tether.dev", base + 2);
        println!("  {}. Paste an access token", base + 3);
        print!("> ");
        io::stdout().flush().ok()?;

        let line = read_line()?;
        let selection: usize = line.parse().ok()?;
        match selection.checked_sub(1)? {
            n if n < base => Some(LoginChoice::History(history[n].clone())),
            n if n == base => Some(LoginChoice::Enterprise),
            n if n == base + 1 => Some(LoginChoice::Dotcom),
            n if n == base + 2 => Some(LoginChoice::AccessToken),
            _ => None,
        }
    }

    async fn endpoint_input(&self) -> Option<String> {
        print!("Instance URL (e.g. https://code.example.com): ");
        io::stdout().flush().ok()?;
        read_line()
    }

    async fn credential_input(&self, endpoint: &str) -> Option<CredentialInput> {
        print!("Instance URL [{endpoint}]: ");
        io::stdout().flush().ok()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let entered = line.trim();
        let chosen = if entered.is_empty() {
            endpoint.to_string()
        } else {
            entered.to_string()
        };

        print!("Access token: ");
        io::stdout().flush().ok()?;
        Some(CredentialInput {
            endpoint: Some(chosen),
            token: read_line(),
        })
    }
}

/// Reads one trimmed line from stdin; `None` on EOF or empty input.
fn read_line() -> Option<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Terminal host: opens the browser and prints notifications.
#[derive(Clone, Default)]
pub struct TerminalHost {
    opened: Arc<Mutex<Option<String>>>,
}

impl TerminalHost {
    /// URL passed to the most recent `open_external` call, if any.
    pub fn opened_url(&self) -> Option<String> {
        self.opened.lock().ok()?.clone()
    }
}

#[async_trait]
impl Host for TerminalHost {
    async fn set_activated(&self, activated: bool) {
        tracing::debug!("assistant activation set to {activated}");
    }

    fn open_external(&self, url: &str) -> Result<()> {
        if let Ok(mut opened) = self.opened.lock() {
            *opened = Some(url.to_string());
        }
        println!("Opening your browser to complete the sign-in:");
        println!("  {url}");
        // Best effort; headless environments paste the callback manually.
        if std::env::var("TETHER_NO_BROWSER").is_err() {
            let _ = open::that(url);
        }
        Ok(())
    }

    async fn show_login_success(&self, flavor: CallbackFlavor) -> bool {
        let message = match flavor {
            CallbackFlavor::LocalApp => "Connected to the Tether app",
            CallbackFlavor::Dotcom => "Logged in to tether.dev",
        };
        println!("✓ {message}");
        false
    }

    async fn focus_chat(&self) {}

    fn request_from(&self) -> &str {
        "TETHER_CLI"
    }
}
