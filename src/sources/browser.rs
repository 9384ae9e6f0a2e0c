//! Headless Chrome session for JS-rendered and authenticated sources
//!
//! `headless_chrome` is a blocking API; every session lives inside a
//! `spawn_blocking` task started by [`run_in_browser`].

use crate::config::{BrowserConfig, UserAgentConfig};
use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// One browser process with a single tab
///
/// Dropping the session closes the tab and then the browser process, on
/// success and error paths alike. Field order matters: the tab drops first.
pub struct BrowserSession {
    tab: Arc<Tab>,
    _browser: Browser,
    scroll_wait: Duration,
    ready_timeout: Duration,
}

impl BrowserSession {
    /// Launches Chrome and opens a tab with the configured identity
    pub fn launch(config: &BrowserConfig, user_agent: &UserAgentConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((1280, 900)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(
            &user_agent.browser_agent,
            Some(&user_agent.accept_language),
            None,
        )?;

        Ok(Self {
            tab,
            _browser: browser,
            scroll_wait: Duration::from_millis(config.scroll_wait),
            ready_timeout: Duration::from_millis(config.ready_timeout),
        })
    }

    /// Navigates and waits for the load to finish
    pub fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    /// Waits up to the ready timeout for `selector`; returns whether it appeared
    pub fn wait_for_ready(&self, selector: &str) -> bool {
        match self
            .tab
            .wait_for_element_with_custom_timeout(selector, self.ready_timeout)
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Ready selector {} not found: {}", selector, e);
                false
            }
        }
    }

    /// Fills a login form and submits it
    pub fn login(&self, login_url: &str, email: &str, password: &str) -> Result<()> {
        self.goto(login_url)?;

        self.tab
            .wait_for_element_with_custom_timeout(r#"input[name="email"]"#, Duration::from_secs(15))
            .context("Login form did not appear")?
            .click()?;
        self.tab.type_str(email)?;

        self.tab.find_element(r#"input[name="pass"]"#)?.click()?;
        self.tab.type_str(password)?;

        self.tab.find_element(r#"button[name="login"]"#)?.click()?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    /// Scrolls to the bottom `rounds` times, pausing after each
    pub fn scroll(&self, rounds: u32) -> Result<()> {
        for round in 0..rounds {
            self.tab
                .evaluate("window.scrollBy(0, document.body.scrollHeight)", false)?;
            thread::sleep(self.scroll_wait);
            debug!("Scroll round {}/{}", round + 1, rounds);
        }
        Ok(())
    }

    /// Pauses for one scroll interval
    pub fn settle(&self) {
        thread::sleep(self.scroll_wait);
    }

    /// Captures the live DOM
    pub fn html(&self) -> Result<String> {
        let result = self
            .tab
            .evaluate("document.documentElement.outerHTML", false)?;

        result
            .value
            .as_ref()
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Page returned no HTML"))
    }

    /// Returns the URL currently shown in the tab
    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            debug!("Closing tab failed: {}", e);
        }
    }
}

/// Runs blocking browser work off the async runtime
///
/// Errors (including a panicked or cancelled task) become adapter error
/// strings.
pub async fn run_in_browser<F, T>(work: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(e) => Err(format!("browser task failed: {}", e)),
    }
}
