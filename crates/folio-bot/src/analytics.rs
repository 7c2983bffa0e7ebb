//! Visitor analytics monitor
//!
//! Polls Matomo's `Live.getLastVisitsDetails` on a fixed cadence and
//! pushes a note to the admin chat for every visit newer than the last
//! check. The first window reaches one hour back so a freshly started
//! bot still reports recent activity. Start and stop are explicit; the
//! poll task holds an `Arc` back to the monitor.

use crate::config::MatomoConfig;
use crate::error::BotError;
use crate::format::escape_markdown;
use crate::telegram::TelegramClient;
use chrono::{DateTime, Utc};
use folio_store::ContentStore;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How far back the first poll window reaches
const INITIAL_WINDOW: Duration = Duration::from_secs(60 * 60);

/// How many notes `/recent_visits` keeps
const RECENT_CAPACITY: usize = 10;

/// One visit as returned by Matomo, reduced to the fields we report
#[derive(Debug, Clone, Deserialize)]
pub struct MatomoVisit {
    /// Visit start as a unix timestamp
    #[serde(rename = "serverTimestamp", default)]
    pub server_timestamp: i64,
    /// Value of the access-code custom dimension, when set
    #[serde(rename = "dimension1", default)]
    pub access_code: Option<String>,
    /// Visitor country
    #[serde(default)]
    pub country: Option<String>,
    /// Device class reported by Matomo
    #[serde(rename = "deviceType", default)]
    pub device_type: Option<String>,
    /// Referrer name, when known
    #[serde(rename = "referrerName", default)]
    pub referrer: Option<String>,
}

/// A processed visit kept for `/recent_visits`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitNote {
    /// Visit start time
    pub when: DateTime<Utc>,
    /// Access code the visitor browsed with, when set
    pub access_code: Option<String>,
    /// Company resolved from the matching profile, when found
    pub company: Option<String>,
    /// Visitor country
    pub country: Option<String>,
    /// Device class
    pub device_type: Option<String>,
    /// Referrer name
    pub referrer: Option<String>,
}

impl VisitNote {
    /// One-line plain-text summary
    #[must_use]
    pub fn summary(&self) -> String {
        let who = match (&self.company, &self.access_code) {
            (Some(company), Some(code)) => format!("{company} ({code})"),
            (None, Some(code)) => format!("code {code}"),
            _ => "anonymous visitor".to_string(),
        };
        let mut line = format!("{} — {who}", self.when.format("%Y-%m-%d %H:%M UTC"));
        if let Some(country) = &self.country {
            line.push_str(&format!(", {country}"));
        }
        if let Some(device) = &self.device_type {
            line.push_str(&format!(", {device}"));
        }
        if let Some(referrer) = &self.referrer {
            line.push_str(&format!(", via {referrer}"));
        }
        line
    }
}

/// Visits strictly newer than `since`, oldest first
#[must_use]
pub fn filter_new_visits(visits: Vec<MatomoVisit>, since: i64) -> Vec<MatomoVisit> {
    let mut fresh: Vec<MatomoVisit> = visits
        .into_iter()
        .filter(|visit| visit.server_timestamp > since)
        .collect();
    fresh.sort_by_key(|visit| visit.server_timestamp);
    fresh
}

struct MonitorState {
    last_check: i64,
    recent: VecDeque<VisitNote>,
    task: Option<JoinHandle<()>>,
}

/// The analytics poll loop and its accumulated state
pub struct AnalyticsMonitor {
    client: TelegramClient,
    store: Arc<ContentStore>,
    matomo: MatomoConfig,
    admin_chat_id: i64,
    http: reqwest::Client,
    state: Mutex<MonitorState>,
}

impl AnalyticsMonitor {
    /// Build a stopped monitor
    #[must_use]
    pub fn new(
        client: TelegramClient,
        store: Arc<ContentStore>,
        matomo: MatomoConfig,
        admin_chat_id: i64,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            store,
            matomo,
            admin_chat_id,
            http: reqwest::Client::new(),
            state: Mutex::new(MonitorState {
                last_check: (Utc::now() - INITIAL_WINDOW).timestamp(),
                recent: VecDeque::with_capacity(RECENT_CAPACITY),
                task: None,
            }),
        })
    }

    /// Whether the poll task is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().task.is_some()
    }

    /// Start the poll loop; returns false when it was already running
    pub fn start(self: &Arc<Self>, interval: Duration) -> bool {
        let mut state = self.state.lock();
        if state.task.is_some() {
            return false;
        }
        let monitor = Arc::clone(self);
        state.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so a start right
            // after a manual /analytics check does not double-report.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match monitor.check_now().await {
                    Ok(notes) => monitor.announce(&notes).await,
                    Err(err) => warn!(error = %err, "analytics poll failed"),
                }
            }
        }));
        info!(interval_secs = interval.as_secs(), "analytics monitor started");
        true
    }

    /// Stop the poll loop; returns false when it was not running
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        match state.task.take() {
            Some(task) => {
                task.abort();
                info!("analytics monitor stopped");
                true
            }
            None => false,
        }
    }

    /// Poll once and record what came back
    ///
    /// Advances the check cursor and appends to the recent-visit ring.
    /// Used by both the poll loop and the `/analytics` command.
    ///
    /// # Errors
    /// [`BotError::Http`] or [`BotError::Analytics`] when the backend is
    /// unreachable or returns something other than a visit list.
    pub async fn check_now(&self) -> Result<Vec<VisitNote>, BotError> {
        let since = self.state.lock().last_check;
        let visits = self.fetch_visits().await?;
        let now = Utc::now().timestamp();
        let fresh = filter_new_visits(visits, since);

        let notes: Vec<VisitNote> = fresh.into_iter().map(|visit| self.note_for(visit)).collect();
        let mut state = self.state.lock();
        state.last_check = now;
        for note in &notes {
            if state.recent.len() == RECENT_CAPACITY {
                state.recent.pop_front();
            }
            state.recent.push_back(note.clone());
        }
        debug!(new_visits = notes.len(), "analytics check complete");
        Ok(notes)
    }

    /// Recent visit notes, newest last
    #[must_use]
    pub fn recent(&self) -> Vec<VisitNote> {
        self.state.lock().recent.iter().cloned().collect()
    }

    async fn fetch_visits(&self) -> Result<Vec<MatomoVisit>, BotError> {
        let response = self
            .http
            .get(format!("{}/index.php", self.matomo.base_url))
            .query(&[
                ("module", "API"),
                ("method", "Live.getLastVisitsDetails"),
                ("idSite", self.matomo.site_id.as_str()),
                ("period", "day"),
                ("date", "today"),
                ("format", "JSON"),
                ("filter_limit", "50"),
                ("token_auth", self.matomo.token.as_str()),
            ])
            .send()
            .await?;
        let body: serde_json::Value = response.json().await?;
        // Matomo reports errors as an object with a "result" field
        // instead of failing the HTTP request.
        if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
            return Err(BotError::Analytics(message.to_string()));
        }
        serde_json::from_value(body)
            .map_err(|err| BotError::Analytics(format!("unexpected visit payload: {err}")))
    }

    fn note_for(&self, visit: MatomoVisit) -> VisitNote {
        let company = visit.access_code.as_deref().and_then(|code| {
            let doc = self.store.read().ok()?;
            let company = doc
                .profiles()
                .find(|(key, _)| *key == code)
                .and_then(|(_, profile)| profile.get("meta")?.get("company")?.as_str())
                .map(ToString::to_string);
            company
        });
        VisitNote {
            when: DateTime::from_timestamp(visit.server_timestamp, 0).unwrap_or_else(Utc::now),
            access_code: visit.access_code,
            company,
            country: visit.country,
            device_type: visit.device_type,
            referrer: visit.referrer,
        }
    }

    async fn announce(&self, notes: &[VisitNote]) {
        for note in notes {
            let text = format!(
                "👀 *New visit*\n{}",
                escape_markdown(&note.summary())
            );
            if let Err(err) = self.client.send_markdown(self.admin_chat_id, &text).await {
                warn!(error = %err, "failed to deliver visit notification");
            }
        }
    }
}
