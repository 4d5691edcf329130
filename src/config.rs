//! Process-wide configuration, resolved once at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Default per-navigation timeout.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(25);

/// Default settle delay after navigation, before extraction. X renders its
/// content client-side well after the load event fires.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Default wait budget for a mandatory detail-page container.
pub const DEFAULT_ELEMENT_WAIT: Duration = Duration::from_secs(12);

/// Default viewport dimensions.
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 1024);

/// CDP port exposed in headless mode so a login can be tunnelled in.
pub const DEFAULT_DEBUG_PORT: u16 = 9223;

/// Launch flags shared by every session.
const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-blink-features=AutomationControlled",
    "--disable-background-timer-throttling",
    "--disable-renderer-backgrounding",
];

#[cfg(target_os = "linux")]
const EXECUTABLE_CANDIDATES: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
];

#[cfg(target_os = "macos")]
const EXECUTABLE_CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const EXECUTABLE_CANDIDATES: &[&str] = &[];

/// Immutable configuration shared by reference across all components.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chromium executable used for every launch.
    pub browser_executable: PathBuf,
    /// Persistent profile directory holding cookies and local storage.
    pub profile_dir: PathBuf,
    /// File recording when an interactive login last succeeded.
    pub auth_marker_path: PathBuf,
    /// Upper bound for a single navigation.
    pub navigation_timeout: Duration,
    /// Fixed wait after navigation for client-side rendering.
    pub settle_delay: Duration,
    /// Wait budget for a mandatory primary container.
    pub element_wait: Duration,
    /// Viewport width and height.
    pub viewport: (u32, u32),
    /// Extra browser launch arguments.
    pub launch_args: Vec<String>,
    /// Whether to launch without a visible window.
    pub headless: bool,
    /// Remote-debugging port exposed in headless mode.
    pub debug_port: u16,
}

impl Config {
    /// Resolve configuration from environment variables and defaults.
    ///
    /// # Environment Variables
    /// - `BIRDWATCH_BROWSER` / `CHROME_EXECUTABLE`: browser executable override
    /// - `BIRDWATCH_PROFILE_DIR`: profile directory (default `~/.birdwatch/profile`)
    /// - `BIRDWATCH_NAV_TIMEOUT_SECS`, `BIRDWATCH_SETTLE_SECS`,
    ///   `BIRDWATCH_ELEMENT_WAIT_SECS`: timeout overrides in seconds
    /// - `BIRDWATCH_HEADLESS`: force headless even when a display is present
    pub fn load() -> Result<Self, Error> {
        let browser_executable = resolve_executable()?;

        let profile_dir = std::env::var("BIRDWATCH_PROFILE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_profile_dir());

        let auth_marker_path = profile_dir
            .parent()
            .map(|parent| parent.join("auth.json"))
            .unwrap_or_else(|| PathBuf::from("auth.json"));

        let headless = headless_from(
            std::env::var("BIRDWATCH_HEADLESS").is_ok(),
            std::env::var("DISPLAY").ok().as_deref(),
            std::env::var("WAYLAND_DISPLAY").ok().as_deref(),
        );

        Ok(Self {
            browser_executable,
            profile_dir,
            auth_marker_path,
            navigation_timeout: env_secs("BIRDWATCH_NAV_TIMEOUT_SECS", DEFAULT_NAVIGATION_TIMEOUT),
            settle_delay: env_secs("BIRDWATCH_SETTLE_SECS", DEFAULT_SETTLE_DELAY),
            element_wait: env_secs("BIRDWATCH_ELEMENT_WAIT_SECS", DEFAULT_ELEMENT_WAIT),
            viewport: DEFAULT_VIEWPORT,
            launch_args: LAUNCH_ARGS.iter().map(|arg| (*arg).to_string()).collect(),
            headless,
            debug_port: DEFAULT_DEBUG_PORT,
        })
    }
}

fn default_profile_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".birdwatch")
        .join("profile")
}

/// Locate the browser executable: explicit env override first, then the
/// per-OS candidate list. An override pointing at a missing file is fatal
/// rather than silently falling through.
fn resolve_executable() -> Result<PathBuf, Error> {
    for var in ["BIRDWATCH_BROWSER", "CHROME_EXECUTABLE"] {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(&value);
            if path.exists() {
                return Ok(path);
            }
            return Err(Error::Configuration(format!(
                "{var} points at {value}, which does not exist"
            )));
        }
    }

    first_existing(EXECUTABLE_CANDIDATES).ok_or_else(|| {
        Error::Configuration(
            "no Chromium executable found; set BIRDWATCH_BROWSER to the browser path".to_string(),
        )
    })
}

fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .copied()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Headless unless a display server is available or headless is forced.
fn headless_from(force: bool, display: Option<&str>, wayland: Option<&str>) -> bool {
    if force {
        return true;
    }
    let has_display = display.is_some_and(|d| !d.is_empty());
    let has_wayland = wayland.is_some_and(|w| !w.is_empty());
    !(has_display || has_wayland)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_from_display() {
        assert!(!headless_from(false, Some(":0"), None));
        assert!(!headless_from(false, None, Some("wayland-0")));
        assert!(headless_from(false, None, None));
        assert!(headless_from(false, Some(""), Some("")));
    }

    #[test]
    fn test_headless_forced_wins_over_display() {
        assert!(headless_from(true, Some(":0"), None));
    }

    #[test]
    fn test_first_existing_skips_missing_paths() {
        assert_eq!(first_existing(&["/definitely/not/here"]), None);

        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert_eq!(
            first_existing(&["/definitely/not/here", &path]),
            Some(PathBuf::from(&path))
        );
    }
}
