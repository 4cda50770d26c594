pub mod email;
pub mod telegram;

use crate::tier::Tier;

/// What a channel needs to render one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    pub company: String,
    pub title: String,
    pub url: String,
    pub score: u8,
    pub tier: Tier,
}

/// Plain-text digest body: tiers highest-first, postings sorted by score
/// descending inside each tier. Pure so the formatting is testable.
pub fn format_digest_body(items: &[AlertPayload]) -> String {
    let mut body = String::new();
    body.push_str(&format!("Total: {} new matching roles\n\n", items.len()));

    for tier in [Tier::Urgent, Tier::High, Tier::Medium, Tier::Low] {
        let mut in_tier: Vec<&AlertPayload> = items.iter().filter(|p| p.tier == tier).collect();
        if in_tier.is_empty() {
            continue;
        }
        in_tier.sort_by(|a, b| b.score.cmp(&a.score));

        body.push_str(&format!("{:?} ({} roles)\n", tier, in_tier.len()));
        body.push_str(&"-".repeat(60));
        body.push('\n');
        for p in in_tier {
            body.push_str(&format!(
                "{} — {}\n  match score {}/100\n  {}\n\n",
                p.company, p.title, p.score, p.url
            ));
        }
    }

    body
}

/// Fans decisions out to the concrete channels. Channels that are not
/// configured are simply disabled; delivery failures are logged and never
/// fail a run.
pub struct Dispatcher {
    telegram: telegram::TelegramNotifier,
    email: Option<email::EmailSender>,
}

impl Dispatcher {
    /// All channels off. Used by dry runs and tests.
    pub fn disabled() -> Self {
        Self {
            telegram: telegram::TelegramNotifier::new_disabled(),
            email: None,
        }
    }

    pub fn from_env() -> Self {
        let email = match email::EmailSender::from_env() {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = ?err, "email misconfigured; channel disabled");
                None
            }
        };
        Self {
            telegram: telegram::TelegramNotifier::from_env(),
            email,
        }
    }

    /// Instant push for an URGENT match.
    pub async fn push(&self, payload: &AlertPayload) {
        if let Err(e) = self.telegram.send(payload).await {
            tracing::warn!(error = ?e, company = %payload.company, "push failed");
        }
    }

    /// Batched email for queued digest or weekly items.
    pub async fn send_batch(&self, subject: &str, items: &[AlertPayload]) {
        if items.is_empty() {
            return;
        }
        let Some(email) = &self.email else {
            tracing::debug!("email disabled; dropping {} queued items", items.len());
            return;
        };
        let body = format_digest_body(items);
        if let Err(e) = email.send(subject, &body).await {
            tracing::warn!(error = ?e, "digest email failed");
        } else {
            tracing::info!(count = items.len(), subject, "digest email sent");
        }
    }
}
