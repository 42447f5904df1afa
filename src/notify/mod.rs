use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::notification_config::NotificationConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream-timeout chatter is capped at one notification per hour; the
/// relay would otherwise be flooded while an exchange endpoint is down.
const TIMEOUT_MARKER: &str = "Operation timed out after";
const TIMEOUT_ALERT_WINDOW: Duration = Duration::from_secs(60 * 60);

static LAST_TIMEOUT_ALERT: Mutex<Option<Instant>> = Mutex::new(None);

/// Hands messages to the relay endpoint. Every send is spawned onto the
/// runtime and never awaited by the check pass; delivery failures are logged
/// here and surfaced nowhere else.
pub struct Notifier {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl Notifier {
    pub fn new(client: reqwest::Client, config: NotificationConfig) -> Self {
        Self { client, config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Fire-and-forget dispatch of one message to one recipient.
    pub fn send_async(&self, recipient: &str, body: &str) {
        if suppress_repeated_timeout(body) {
            log::warn!("suppressing repeated timeout notification to {recipient}");
            return;
        }

        let client = self.client.clone();
        let endpoint = self.config.endpoint.clone();
        let recipient = recipient.to_string();
        let content = format!("{}\n{}", self.config.title, body);

        log::debug!("notification queued for {recipient}");
        tokio::spawn(async move {
            let payload = serde_json::json!({
                "cmd": "sendtext",
                "touser": recipient,
                "msgcontent": content,
            });

            let result = client
                .post(&endpoint)
                .json(&payload)
                .timeout(SEND_TIMEOUT)
                .send()
                .await;

            match result {
                Ok(response) => {
                    log::info!("notification sent to {recipient}: {}", response.status());
                }
                Err(e) => {
                    log::error!("notification delivery to {recipient} failed: {e}");
                }
            }
        });
    }
}

fn suppress_repeated_timeout(body: &str) -> bool {
    if !body.contains(TIMEOUT_MARKER) {
        return false;
    }

    let Ok(mut last) = LAST_TIMEOUT_ALERT.lock() else {
        return false;
    };
    match *last {
        Some(sent_at) if sent_at.elapsed() < TIMEOUT_ALERT_WINDOW => true,
        _ => {
            *last = Some(Instant::now());
            false
        }
    }
}
