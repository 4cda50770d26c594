use anyhow::{Context, Result};
use reqwest::Client;

use super::AlertPayload;

/// Instant push channel via the Telegram bot API. Disabled unless both
/// `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` are set.
pub struct TelegramNotifier {
    credentials: Option<(String, String)>,
    client: Client,
}

impl TelegramNotifier {
    pub fn from_env() -> Self {
        let credentials = match (
            std::env::var("TELEGRAM_BOT_TOKEN"),
            std::env::var("TELEGRAM_CHAT_ID"),
        ) {
            (Ok(token), Ok(chat_id)) => Some((token, chat_id)),
            _ => None,
        };
        Self {
            credentials,
            client: Client::new(),
        }
    }

    pub fn new_disabled() -> Self {
        Self {
            credentials: None,
            client: Client::new(),
        }
    }

    pub async fn send(&self, payload: &AlertPayload) -> Result<()> {
        let Some((token, chat_id)) = &self.credentials else {
            tracing::debug!("Telegram disabled (no TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID)");
            return Ok(());
        };

        let api_url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": render_message(payload),
            "parse_mode": "HTML",
            "disable_web_page_preview": false,
        });

        self.client
            .post(&api_url)
            .json(&body)
            .send()
            .await
            .context("telegram post")?
            .error_for_status()
            .context("telegram non-2xx")?;
        Ok(())
    }
}

fn render_message(p: &AlertPayload) -> String {
    format!(
        "<b>URGENT JOB MATCH</b>\n\
         Score: {}/100\n\n\
         <b>{}</b>\n\
         <b>{}</b>\n\n\
         <a href=\"{}\">Apply now</a>",
        p.score, p.company, p.title, p.url
    )
}
