use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use url::Url;

use crate::capture::CaptureConfig;
use crate::retry::RetryPolicy;
use crate::{OUTPUT_DIR, WAIT_MS};

#[derive(Parser, Debug)]
#[command(version, about = "Mirror the text sources a page loads in headless Chrome")]
pub struct Cli {
    /// URL to capture (https:// is assumed when no scheme is given)
    #[arg(value_parser = parse_target_url)]
    pub url: String,
    /// Milliseconds to keep the page open after load for lazy assets
    #[arg(default_value_t = WAIT_MS)]
    pub wait_ms: u64,
    /// "true" to show the browser window; anything else runs headless
    #[arg(value_parser = parse_headed, action = ArgAction::Set, default_value = "false")]
    pub headed: bool,
    /// Directory the mirror is written under
    #[arg(long, default_value = OUTPUT_DIR)]
    pub out_dir: PathBuf,
    /// Send a generated desktop user agent instead of HeadlessChrome's
    #[arg(long)]
    pub spoof_ua: bool,
    /// Proxy server URL (http:// or socks5://)
    #[arg(long)]
    pub proxy: Option<String>,
    /// Write a JSON run summary to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl Cli {
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            url: self.url.clone(),
            wait: Duration::from_millis(self.wait_ms),
            headed: self.headed,
            out_dir: self.out_dir.clone(),
            spoof_user_agent: self.spoof_ua,
            proxy: self.proxy.clone(),
            retry: RetryPolicy::default(),
        }
    }
}

fn parse_target_url(s: &str) -> Result<String, String> {
    let s = s.trim();
    match Url::parse(s) {
        Ok(u) => Ok(u.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{s}"))
            .map(|u| u.to_string())
            .map_err(|e| format!("not a valid URL: {e}")),
        Err(e) => Err(format!("not a valid URL: {e}")),
    }
}

fn parse_headed(s: &str) -> Result<bool, String> {
    Ok(s.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("sitesource").chain(args.iter().copied()))
    }

    #[test]
    fn url_only_uses_defaults() {
        let cli = parse(&["https://a.com/"]).unwrap();
        assert_eq!(cli.url, "https://a.com/");
        assert_eq!(cli.wait_ms, WAIT_MS);
        assert!(!cli.headed);
        assert_eq!(cli.out_dir, PathBuf::from(OUTPUT_DIR));
    }

    #[test]
    fn positional_wait_and_headed() {
        let cli = parse(&["https://a.com", "2500", "TRUE"]).unwrap();
        assert_eq!(cli.wait_ms, 2500);
        assert!(cli.headed);

        let cli = parse(&["https://a.com", "2500", "yes"]).unwrap();
        assert!(!cli.headed);
    }

    #[test]
    fn scheme_is_added_when_missing() {
        let cli = parse(&["example.com/app"]).unwrap();
        assert_eq!(cli.url, "https://example.com/app");
    }

    #[test]
    fn missing_url_and_bad_wait_fail() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["https://a.com", "soon"]).is_err());
    }

    #[test]
    fn config_carries_flags() {
        let cli = parse(&[
            "--out-dir",
            "/tmp/mirror",
            "--spoof-ua",
            "--proxy",
            "socks5://127.0.0.1:9050",
            "https://a.com",
            "100",
        ])
        .unwrap();
        let cfg = cli.capture_config();
        assert_eq!(cfg.wait, Duration::from_millis(100));
        assert_eq!(cfg.out_dir, PathBuf::from("/tmp/mirror"));
        assert!(cfg.spoof_user_agent);
        assert_eq!(cfg.proxy.as_deref(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(cfg.retry.attempts, 3);
    }
}
