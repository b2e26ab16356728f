use std::time::Duration;

use reqwest::Client;

use crate::config::Config;

pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
        }
    }

    fn warning(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
        }
    }

    fn error(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.status {
            CheckStatus::Ok => "✓",
            CheckStatus::Warning => "⚠",
            CheckStatus::Error => "✗",
        }
    }

    pub fn color(&self) -> &'static str {
        match self.status {
            CheckStatus::Ok => "\x1b[32m",      // green
            CheckStatus::Warning => "\x1b[33m", // yellow
            CheckStatus::Error => "\x1b[31m",   // red
        }
    }
}

pub async fn run_checks(config: &Config) -> Vec<CheckResult> {
    vec![
        check_catalog(config).await,
        check_player(config),
        check_settings(config),
    ]
}

/// Print results and report whether every check passed
pub fn print_results(results: &[CheckResult]) -> bool {
    const RESET: &str = "\x1b[0m";
    for r in results {
        println!("{}{}{} {:<10} {}", r.color(), r.icon(), RESET, r.name, r.message);
    }
    results.iter().all(|r| r.status != CheckStatus::Error)
}

async fn check_catalog(config: &Config) -> CheckResult {
    let client = match Client::builder().timeout(Duration::from_secs(5)).build() {
        Ok(c) => c,
        Err(e) => return CheckResult::error("Catalog", &e.to_string()),
    };

    // Any HTTP answer means the backend is up; the procedures themselves
    // only accept POST with a body.
    match client.get(&config.catalog.url).send().await {
        Ok(response) if response.status().is_server_error() => CheckResult::warning(
            "Catalog",
            &format!("{} answered {}", config.catalog.url, response.status()),
        ),
        Ok(_) => CheckResult::ok("Catalog", &format!("reachable at {}", config.catalog.url)),
        Err(e) if e.is_timeout() => CheckResult::error("Catalog", "connection timed out"),
        Err(e) => CheckResult::error("Catalog", &format!("unreachable: {}", e)),
    }
}

fn check_player(config: &Config) -> CheckResult {
    match which::which(&config.player.command) {
        Ok(path) => CheckResult::ok("Player", &format!("{}", path.display())),
        Err(_) => CheckResult::error(
            "Player",
            &format!("'{}' not found in PATH", config.player.command),
        ),
    }
}

fn check_settings(config: &Config) -> CheckResult {
    if config.playback.anime_headers.is_empty() {
        return CheckResult::warning(
            "Playback",
            "no anime headers configured, some anime streams may refuse playback",
        );
    }
    CheckResult::ok(
        "Playback",
        &format!(
            "debounce {}ms, {} episodes per page, {} attempts per call",
            config.search.debounce_ms, config.search.page_size, config.retry.attempts
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_player_is_error() {
        let mut config = Config::parse("[catalog]\nurl = \"http://localhost:1\"\n").unwrap();
        config.player.command = "t3watch-no-such-player".to_string();
        let result = check_player(&config);
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.icon(), "✗");
    }

    #[test]
    fn test_empty_headers_is_warning() {
        let mut config = Config::parse("[catalog]\nurl = \"http://localhost:1\"\n").unwrap();
        assert_eq!(check_settings(&config).status, CheckStatus::Ok);
        config.playback.anime_headers.clear();
        assert_eq!(check_settings(&config).status, CheckStatus::Warning);
    }

    #[test]
    fn test_print_results_fails_on_error() {
        let results = vec![
            CheckResult::ok("Catalog", "fine"),
            CheckResult::warning("Playback", "meh"),
        ];
        assert!(print_results(&results));

        let results = vec![CheckResult::error("Player", "missing")];
        assert!(!print_results(&results));
    }
}
