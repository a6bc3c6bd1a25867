//! Outbound Telegram alerts
//!
//! Delivery is best effort and at most once per signal: a failed send is
//! reported to the caller for logging, never retried.

use crate::error::{Error, Result};
use crate::types::StoredSignal;
use serde::Serialize;

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    credentials: Option<Credentials>,
}

#[derive(Clone)]
struct Credentials {
    bot_token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
    parse_mode: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials: Some(Credentials { bot_token, chat_id }),
        }
    }

    /// A notifier that drops every message
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn send(&self, text: &str) -> Result<()> {
        let Some(credentials) = &self.credentials else {
            return Ok(());
        };

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            credentials.bot_token
        );
        let request = SendMessageRequest {
            chat_id: credentials.chat_id.clone(),
            text: text.to_string(),
            parse_mode: "HTML".to_string(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Notify(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Notify(format!(
                "telegram returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub async fn startup(&self, dry_run: bool) -> Result<()> {
        let mode = if dry_run { " (dry run)" } else { "" };
        self.send(&format!(
            "🔎 <b>Super-Scanner started</b>{mode}\n\nWatching Indodax IDR pairs for signals."
        ))
        .await
    }

    /// Formatted alert for a dispatched signal
    pub async fn signal(&self, signal: &StoredSignal) -> Result<()> {
        let news_line = if signal.news { "\n📰 News flagged" } else { "" };
        let text = format!(
            "🚨 <b>{} SIGNAL</b> on <code>{}</code>\n\n\
            Entry: <code>{}</code>\n\
            TP: <code>{}</code> | SL: <code>{}</code>\n\
            Priority: <code>{:.1}</code> | Imbalance: <code>{:+.1}%</code>{}",
            signal.mode.as_str().to_uppercase(),
            signal.pair.to_uppercase(),
            signal.entry,
            signal.take_profit,
            signal.stop_loss,
            signal.priority,
            signal.imbalance,
            news_line,
        );
        self.send(&text).await
    }
}
