//! Auth command handlers.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;
use url::Url;

use tether_core::auth::history::{HistoryFile, HistoryStore};
use tether_core::auth::secrets::{SecretStore, TokenFile, mask_token};
use tether_core::auth::{AuthProvider, AuthStatus};
use tether_core::config::Config;
use tether_core::endpoint::normalize_endpoint;
use tether_core::probe::{ClientConfig, GraphQlProbeFactory};

use crate::prompts::{TerminalHost, TerminalPrompts};

/// Port the local callback listener binds for browser redirects.
const CALLBACK_PORT: u16 = 3178;

/// Path the instance redirects back to after minting a token.
const CALLBACK_PATH: &str = "/auth/callback";

pub async fn login(config: &Config, endpoint_hint: Option<&str>) -> Result<()> {
    let secrets = TokenFile::default_location();
    let host = TerminalHost::default();
    let mut provider = build_provider(config, host.clone(), &config.endpoint);

    provider.login(endpoint_hint).await?;

    if let Some(redirect) = host.opened_url() {
        // Browser flows finish out-of-band: wait for the instance callback.
        tracing::debug!("waiting for token callback after redirect to {redirect}");
        println!("Waiting for the browser sign-in to complete...");
        match wait_for_token_callback() {
            Some(callback) => {
                provider
                    .token_callback_handler(&callback, config.custom_headers.clone())
                    .await?;
            }
            None => {
                println!("Timed out waiting for the browser sign-in.");
                println!("You can paste a token instead: run `tether login` again.");
                return Ok(());
            }
        }
    } else if provider.status().is_none() {
        // Token-paste and history flows may store a credential without
        // probing it; verify so the user sees a definitive answer.
        if let Some(token) = secrets.get(provider.endpoint())? {
            let endpoint = provider.endpoint().to_string();
            provider.auth(&endpoint, Some(&token), None).await;
        }
    }

    match provider.status() {
        Some(status) if status.logged_in() => {
            print_status(provider.endpoint(), status, None);
        }
        Some(_) => {
            println!("Sign-in to {} did not complete.", provider.endpoint());
            println!("Check the token and instance URL, then run `tether login` again.");
        }
        None => println!("Login cancelled."),
    }
    Ok(())
}

pub async fn status(config: &Config, endpoint_flag: Option<&str>) -> Result<()> {
    let secrets = TokenFile::default_location();
    let history = HistoryFile::default_location();
    let entries = history.endpoint_history().unwrap_or_default();
    let endpoint = resolve_endpoint(config, endpoint_flag, &entries);
    let token = secrets.get(&endpoint)?;

    let mut provider = build_provider(config, TerminalHost::default(), &endpoint);
    let logged_in = provider.auth(&endpoint, token.as_deref(), None).await;

    match provider.status() {
        Some(status) if logged_in => print_status(&endpoint, status, token.as_deref()),
        Some(status) if status.invalid_token => {
            println!("Not logged in to {endpoint} (stored token was rejected).");
            println!("Run `tether login` to re-authenticate.");
        }
        _ => {
            println!("Not logged in to {endpoint}.");
            println!("Run `tether login` to authenticate.");
        }
    }
    Ok(())
}

pub async fn logout(config: &Config, endpoint_flag: Option<&str>) -> Result<()> {
    let history = HistoryFile::default_location();
    let entries = history.endpoint_history().unwrap_or_default();
    let endpoint = resolve_endpoint(config, endpoint_flag, &entries);

    let mut provider = build_provider(config, TerminalHost::default(), &endpoint);
    let existed = provider.logout().await?;

    if existed {
        println!("✓ Logged out from {endpoint}");
    } else {
        println!("No stored token for {endpoint}.");
    }
    Ok(())
}

fn build_provider(config: &Config, host: TerminalHost, endpoint: &str) -> AuthProvider {
    let client_config = ClientConfig {
        endpoint: endpoint.to_string(),
        token: None,
        custom_headers: config.custom_headers.clone(),
    };
    AuthProvider::new(
        client_config,
        Box::new(TokenFile::default_location()),
        Box::new(HistoryFile::default_location()),
        Box::new(host),
        Box::new(TerminalPrompts),
        Box::new(GraphQlProbeFactory),
    )
}

/// Picks the endpoint to act on: explicit flag, then the most recently
/// authenticated endpoint, then the configured default.
fn resolve_endpoint(config: &Config, flag: Option<&str>, history: &[String]) -> String {
    if let Some(endpoint) = flag {
        return normalize_endpoint(endpoint);
    }
    if let Some(last) = history.last() {
        return last.clone();
    }
    normalize_endpoint(&config.endpoint)
}

fn print_status(endpoint: &str, status: &AuthStatus, token: Option<&str>) {
    println!("✓ Logged in to {endpoint}");
    if let Some(token) = token {
        println!("  Token: {}", mask_token(token));
    }
    if !status.site_version.is_empty() {
        println!("  Site version: {}", status.site_version);
    }
    println!(
        "  Assist: {}",
        if status.site_has_assist_enabled {
            "enabled"
        } else {
            "not enabled on this instance"
        }
    );
    if status.requires_verified_email {
        println!(
            "  Email: {}",
            if status.has_verified_email {
                "verified"
            } else {
                "not verified"
            }
        );
    }
}

/// Blocks until the instance calls back with a token, or times out.
///
/// The listener accepts a single request so a stray second hit cannot
/// overwrite the first callback.
fn wait_for_token_callback() -> Option<Url> {
    let listener = match TcpListener::bind(format!("127.0.0.1:{CALLBACK_PORT}")) {
        Ok(listener) => listener,
        Err(_) => return None,
    };
    let _ = listener.set_nonblocking(true);

    let (tx, rx) = std::sync::mpsc::channel::<Option<Url>>();

    std::thread::spawn(move || {
        let start = std::time::Instant::now();
        loop {
            match listener.accept() {
                Ok((mut stream, _)) => {
                    let mut buffer = [0u8; 2048];
                    let _ = stream.read(&mut buffer);
                    let request = String::from_utf8_lossy(&buffer);
                    let callback = extract_callback_from_request(&request);
                    let response = match callback.is_some() {
                        true => callback_success_response(),
                        false => callback_error_response(),
                    };
                    let _ = stream.write_all(response.as_bytes());
                    let _ = tx.send(callback);
                    break;
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > Duration::from_secs(120) {
                        let _ = tx.send(None);
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(_) => {
                    let _ = tx.send(None);
                    break;
                }
            }
        }
    });

    rx.recv_timeout(Duration::from_secs(120)).ok().flatten()
}

fn extract_callback_from_request(request: &str) -> Option<Url> {
    let request_line = request.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    let path = parts.next()?;

    let url = Url::parse(&format!("http://127.0.0.1:{CALLBACK_PORT}{path}")).ok()?;
    if url.path() != CALLBACK_PATH {
        return None;
    }
    url.query_pairs().any(|(k, _)| k == "code").then_some(url)
}

fn callback_success_response() -> String {
    let body = "<!doctype html><html><head><meta charset=\"utf-8\" /><title>Sign-in successful</title></head><body><p>Sign-in successful. Return to your terminal to continue.</p></body></html>";
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

fn callback_error_response() -> String {
    let body = "Invalid sign-in callback";
    format!(
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: callback extraction requires the callback path and a code.
    #[test]
    fn test_extract_callback_from_request() {
        let request = "GET /auth/callback?code=abc&type=app HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let url = extract_callback_from_request(request).unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "code" && v == "abc"));
        assert!(url.query_pairs().any(|(k, v)| k == "type" && v == "app"));

        let wrong_path = "GET /favicon.ico HTTP/1.1\r\n\r\n";
        assert!(extract_callback_from_request(wrong_path).is_none());

        let no_code = "GET /auth/callback?type=app HTTP/1.1\r\n\r\n";
        assert!(extract_callback_from_request(no_code).is_none());
    }

    /// Test: endpoint resolution prefers flag, then history, then config.
    #[test]
    fn test_resolve_endpoint_precedence() {
        let config = Config::default();
        let history = vec![
            "https://old.example.com/".to_string(),
            "https://recent.example.com/".to_string(),
        ];

        assert_eq!(
            resolve_endpoint(&config, Some("corp.example.com"), &history),
            "https://corp.example.com/"
        );
        assert_eq!(
            resolve_endpoint(&config, None, &history),
            "https://recent.example.com/"
        );
        assert_eq!(
            resolve_endpoint(&config, None, &[]),
            tether_core::endpoint::DOTCOM_URL
        );
    }
}
