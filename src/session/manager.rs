//! Persistent browser session lifecycle.
//!
//! One process holds at most one [`Session`]: a chromiumoxide browsing
//! context launched against the persistent profile, exposing a single
//! reusable page. Closing the session is what releases the profile lock, so
//! it must happen on every exit path; [`with_session`] enforces that.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::lock::{LockReconciler, LockState};
use crate::config::Config;
use crate::error::Error;

struct Driver {
    browser: Browser,
    handler: Option<JoinHandle<()>>,
}

/// The authenticated browsing context bound to the profile directory.
///
/// Clones share the same underlying browser; `close` is idempotent across
/// all of them.
#[derive(Clone)]
pub struct Session {
    driver: Arc<tokio::sync::Mutex<Driver>>,
    page: Page,
    closed: Arc<AtomicBool>,
}

impl Session {
    /// Reconcile the profile lock, then launch the persistent context.
    ///
    /// A profile held by a live process surfaces as `SessionBusy` and is not
    /// retried here; the caller re-runs the whole process later if it wants.
    pub async fn open(config: &Config) -> Result<Self, Error> {
        std::fs::create_dir_all(&config.profile_dir).map_err(|e| {
            Error::SessionLaunch(format!(
                "cannot create profile directory {}: {e}",
                config.profile_dir.display()
            ))
        })?;

        match LockReconciler::new().reconcile(&config.profile_dir)? {
            LockState::HeldLive { pid: Some(pid) } => {
                return Err(Error::SessionBusy(format!(
                    "profile is held by running process {pid}"
                )));
            }
            LockState::HeldLive { pid: None } => {
                return Err(Error::SessionBusy(
                    "profile lock is fresh and may still have an owner".to_string(),
                ));
            }
            LockState::HeldStale => {
                tracing::info!("Cleared stale profile lock from a previous crash");
            }
            LockState::Clean => {}
        }

        let browser_config = build_browser_config(config)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::SessionLaunch(e.to_string()))?;

        // Drive CDP events until the browser goes away.
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                handle.abort();
                return Err(Error::SessionLaunch(format!("failed to open page: {e}")));
            }
        };

        tracing::info!(
            profile = %config.profile_dir.display(),
            headless = config.headless,
            "Browser session ready"
        );

        Ok(Self {
            driver: Arc::new(tokio::sync::Mutex::new(Driver {
                browser,
                handler: Some(handle),
            })),
            page,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The single reusable page of this session.
    #[must_use]
    pub fn page(&self) -> Page {
        self.page.clone()
    }

    /// Close the browser and release the profile lock.
    ///
    /// Safe to call more than once; only the first call does anything.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut driver = self.driver.lock().await;
        driver.browser.close().await?;
        if let Some(handle) = driver.handler.take() {
            let _ = handle.await;
        }
        tracing::debug!("Browser session closed");
        Ok(())
    }
}

fn build_browser_config(config: &Config) -> Result<BrowserConfig, Error> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(&config.browser_executable)
        .user_data_dir(&config.profile_dir)
        .window_size(config.viewport.0, config.viewport.1);

    for arg in &config.launch_args {
        builder = builder.arg(arg.as_str());
    }

    if config.headless {
        // Keep the CDP endpoint reachable for the tunnel-based login flow.
        builder = builder.arg(format!("--remote-debugging-port={}", config.debug_port));
    } else {
        builder = builder.with_head();
    }

    builder.build().map_err(Error::SessionLaunch)
}

/// Seam between the scoped-acquisition policy and the real browser, so the
/// close-on-every-path contract is testable without launching anything.
pub(crate) trait SessionLifecycle: Clone {
    async fn close_once(&self) -> Result<()>;
}

impl SessionLifecycle for Session {
    async fn close_once(&self) -> Result<()> {
        self.close().await
    }
}

/// Open a session, run `work`, and close on every exit path.
///
/// A close failure after successful work surfaces as the error; a close
/// failure after failed work is logged so it cannot mask the original fault.
pub async fn with_session<T, F, Fut>(config: &Config, work: F) -> Result<T>
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = Session::open(config).await?;
    run_scoped(session, work).await
}

async fn run_scoped<S, T, F, Fut>(session: S, work: F) -> Result<T>
where
    S: SessionLifecycle,
    F: FnOnce(S) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match work(session.clone()).await {
        Ok(value) => {
            session.close_once().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(close_err) = session.close_once().await {
                tracing::warn!(error = %close_err, "Failed to close session after handler error");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Default)]
    struct FakeSession {
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    impl SessionLifecycle for FakeSession {
        async fn close_once(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                anyhow::bail!("close failed");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_closes_exactly_once_on_success() {
        let session = FakeSession::default();
        let closes = session.closes.clone();

        let value = run_scoped(session, |_s| async { Ok::<_, anyhow::Error>(42) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closes_exactly_once_on_error() {
        let session = FakeSession::default();
        let closes = session.closes.clone();

        let result: Result<u32> = run_scoped(session, |_s| async { anyhow::bail!("boom") }).await;

        assert_eq!(result.unwrap_err().to_string(), "boom");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_handler_error() {
        let session = FakeSession {
            fail_close: true,
            ..FakeSession::default()
        };

        let result: Result<u32> = run_scoped(session, |_s| async { anyhow::bail!("boom") }).await;

        assert_eq!(result.unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn test_close_failure_surfaces_after_successful_work() {
        let session = FakeSession {
            fail_close: true,
            ..FakeSession::default()
        };

        let result: Result<u32> =
            run_scoped(session, |_s| async { Ok::<_, anyhow::Error>(7) }).await;

        assert_eq!(result.unwrap_err().to_string(), "close failed");
    }
}
