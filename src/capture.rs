//! Browser session and response capture.
//!
//! `headless_chrome` is synchronous and calls response handlers on its own
//! event thread, so the session runs under `spawn_blocking`. Accepted bodies
//! are handed over a channel to a single async writer, which keeps disk I/O
//! off the event thread and serializes writes to the same path.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use headless_chrome::browser::tab::ResponseHandler;
use headless_chrome::protocol::cdp::Network;
use headless_chrome::{Browser, LaunchOptionsBuilder};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::error::{CaptureError, Result};
use crate::filter::{header_value, is_success, should_save};
use crate::mirror::save_asset;
use crate::retry::RetryPolicy;
use crate::{OUTPUT_DIR, WAIT_MS};

const HANDLER_NAME: &str = "sitesource";

type BodyResult = anyhow::Result<Network::GetResponseBodyReturnObject>;

/// Extra time the browser connection may sit idle beyond the settle period.
const IDLE_GRACE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub url: String,
    /// Settle period after navigation.
    pub wait: Duration,
    pub headed: bool,
    pub out_dir: PathBuf,
    pub spoof_user_agent: bool,
    pub proxy: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            wait: Duration::from_millis(WAIT_MS),
            headed: false,
            out_dir: PathBuf::from(OUTPUT_DIR),
            spoof_user_agent: false,
            proxy: None,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub input_url: String,
    pub final_url: String,
    pub output_dir: String,
    pub wait_ms: u64,
    pub headed: bool,
    pub started_at: String,
    pub elapsed_ms: u64,
    pub responses_seen: usize,
    pub assets_saved: usize,
    pub assets_failed: usize,
    pub overwritten: usize,
    pub files: Vec<String>,
}

/// A response body accepted for the mirror.
#[derive(Debug)]
pub struct Asset {
    pub url: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct Counters {
    seen: AtomicUsize,
    failed: AtomicUsize,
}

/// Sending side of the writer channel. Closing it ends the writer even if the
/// browser still holds the handler that owns a reference.
struct AssetSink(Mutex<Option<UnboundedSender<Asset>>>);

impl AssetSink {
    fn new(tx: UnboundedSender<Asset>) -> Self {
        Self(Mutex::new(Some(tx)))
    }

    fn send(&self, asset: Asset) -> bool {
        match self.0.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|tx| tx.send(asset).is_ok()),
            Err(_) => false,
        }
    }

    fn close(&self) {
        if let Ok(mut guard) = self.0.lock() {
            guard.take();
        }
    }
}

#[derive(Debug, Default)]
struct WriterReport {
    written: BTreeSet<PathBuf>,
    writes: usize,
    overwritten: usize,
    failed: usize,
}

/// Open the page, mirror what it loads during the settle period, close.
pub async fn run(config: CaptureConfig) -> anyhow::Result<Summary> {
    let started_at = chrono::Local::now();
    let start = Instant::now();

    let (tx, rx) = mpsc::unbounded_channel();
    let sink = Arc::new(AssetSink::new(tx));
    let counters = Arc::new(Counters::default());

    let writer = tokio::spawn(write_assets(config.out_dir.clone(), rx));

    let handler = response_handler(sink.clone(), counters.clone(), config.retry);
    let session_config = config.clone();
    let session = tokio::task::spawn_blocking(move || drive_browser(&session_config, handler))
        .await
        .context("browser session thread panicked");

    sink.close();
    let report = writer.await.context("asset writer panicked")?;
    let final_url = session??;

    let output_dir = dunce::canonicalize(&config.out_dir).unwrap_or_else(|_| config.out_dir.clone());

    Ok(Summary {
        input_url: config.url,
        final_url,
        output_dir: output_dir.display().to_string(),
        wait_ms: config.wait.as_millis() as u64,
        headed: config.headed,
        started_at: started_at.to_rfc3339(),
        elapsed_ms: start.elapsed().as_millis() as u64,
        responses_seen: counters.seen.load(Ordering::Relaxed),
        assets_saved: report.writes,
        assets_failed: counters.failed.load(Ordering::Relaxed) + report.failed,
        overwritten: report.overwritten,
        files: report
            .written
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    })
}

/// Runs on a blocking thread. Returns the tab's URL at close time.
fn drive_browser(config: &CaptureConfig, handler: ResponseHandler) -> anyhow::Result<String> {
    let mut arg_vec: Vec<OsString> = vec![
        OsString::from("--disable-gpu"),
        OsString::from("--disable-dev-shm-usage"),
        OsString::from("--no-first-run"),
        OsString::from("--no-default-browser-check"),
    ];
    if !config.headed {
        arg_vec.push(OsString::from("--headless=new"));
    }
    if let Some(p) = &config.proxy {
        arg_vec.push(OsString::from(format!("--proxy-server={}", p)));
    }

    let launch_opts = LaunchOptionsBuilder::default()
        .headless(!config.headed)
        .idle_browser_timeout(config.wait + IDLE_GRACE)
        .args(
            arg_vec
                .iter()
                .map(|s| s.as_os_str())
                .collect::<Vec<&OsStr>>(),
        )
        .build()
        .map_err(|e| anyhow!("invalid browser launch options: {e}"))?;

    let browser = Browser::new(launch_opts).context("failed to launch Chrome")?;
    let tab = browser.new_tab().context("failed to open a tab")?;

    if config.spoof_user_agent {
        tab.set_user_agent(&ua_generator::ua::spoof_ua(), None, None)?;
    }

    tab.call_method(Network::Enable {
        max_total_buffer_size: None,
        max_resource_buffer_size: None,
        max_post_data_size: None,
        report_direct_socket_traffic: None,
        enable_durable_messages: None,
    })?;
    tab.register_response_handling(HANDLER_NAME, handler)?;

    info!("Navigating to {}", config.url);
    if let Err(e) = tab
        .navigate_to(&config.url)
        .and_then(|t| t.wait_until_navigated())
    {
        warn!("Navigation to {} did not complete: {e:#}", config.url);
    }

    std::thread::sleep(config.wait);
    let final_url = tab.get_url();

    info!("Capture complete, closing browser...");
    drop(tab);
    drop(browser);

    Ok(final_url)
}

fn response_handler(
    sink: Arc<AssetSink>,
    counters: Arc<Counters>,
    retry: RetryPolicy,
) -> ResponseHandler {
    Box::new(
        move |event: Network::events::ResponseReceivedEventParams,
              fetch_body: &dyn Fn() -> BodyResult| {
            counters.seen.fetch_add(1, Ordering::Relaxed);
            let response = &event.response;
            let content_type = response
                .headers
                .0
                .as_ref()
                .and_then(|h| header_value(h, "content-type"));

            match process_response(&response.url, response.status, content_type, &retry, fetch_body) {
                Ok(Some(asset)) => {
                    if !sink.send(asset) {
                        debug!("writer closed, dropping {}", response.url);
                    }
                }
                Ok(None) => {}
                Err(e @ CaptureError::BodyUnavailable { .. }) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed {}: {e}", response.url);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Skipped {}: {e}", response.url);
                }
            }
        },
    )
}

/// Filter one response and, if it is kept, read its body.
/// `Ok(None)` means the response was not wanted.
fn process_response(
    url: &str,
    status: u32,
    content_type: Option<&str>,
    retry: &RetryPolicy,
    fetch_body: &dyn Fn() -> BodyResult,
) -> Result<Option<Asset>> {
    if !is_success(status) {
        debug!(status, "skipping {url}");
        return Ok(None);
    }
    if !should_save(content_type) {
        return Ok(None);
    }

    let raw = retry
        .run(|_| fetch_body())
        .map_err(|e| CaptureError::BodyUnavailable {
            url: url.to_string(),
            attempts: retry.attempts(),
            reason: format!("{e:#}"),
        })?;

    let body = if raw.base_64_encoded {
        B64.decode(raw.body.as_bytes())
            .map_err(|source| CaptureError::Decode {
                url: url.to_string(),
                source,
            })?
    } else {
        raw.body.into_bytes()
    };

    Ok(Some(Asset {
        url: url.to_string(),
        body,
    }))
}

async fn write_assets(out_dir: PathBuf, mut rx: UnboundedReceiver<Asset>) -> WriterReport {
    let mut report = WriterReport::default();
    while let Some(asset) = rx.recv().await {
        match save_asset(&out_dir, &asset.url, &asset.body).await {
            Ok(path) => {
                info!("Saved {} ({} bytes)", path.display(), asset.body.len());
                report.writes += 1;
                if !report.written.insert(path.clone()) {
                    report.overwritten += 1;
                    debug!("overwrote {} with {}", path.display(), asset.url);
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!("Failed {}: {e}", asset.url);
            }
        }
    }
    report
}
