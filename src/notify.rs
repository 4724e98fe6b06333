use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::filter::Posting;
use crate::store::NotifiedStore;

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One outbound notification, shaped for a Discord-style embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    embeds: [&'a Message; 1],
}

/// Outbound transport for notifications.
#[allow(async_fn_in_trait)]
pub trait Sink {
    async fn send(&self, message: &Message) -> Result<()>;
}

/// Production sink: POSTs the message as a single embed to a Discord
/// webhook endpoint.
pub struct DiscordWebhook {
    endpoint: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DISPATCH_TIMEOUT)
            .build()
            .context("building webhook HTTP client")?;
        Ok(Self { endpoint, client })
    }
}

impl Sink for DiscordWebhook {
    async fn send(&self, message: &Message) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&WebhookPayload { embeds: [message] })
            .send()
            .await
            .context("sending webhook request")?
            .error_for_status()
            .context("webhook endpoint rejected the notification")?;
        Ok(())
    }
}

fn display(value: &str) -> &str {
    if value.is_empty() {
        "—"
    } else {
        value
    }
}

/// Fixed-shape message for one posting.
pub fn build_message(posting: &Posting, country: &str, category: &str) -> Message {
    let company = if posting.company.is_empty() {
        "Unknown"
    } else {
        &posting.company
    };
    let description = match &posting.link {
        Some(link) => format!("[Click to apply]({link})"),
        None => "Application link not found.".to_string(),
    };

    Message {
        title: format!("New {country} {category} Intern — {company}"),
        description,
        url: posting.link.clone(),
        fields: vec![
            EmbedField {
                name: "Company".to_string(),
                value: display(&posting.company).to_string(),
                inline: true,
            },
            EmbedField {
                name: "Role".to_string(),
                value: display(&posting.role).to_string(),
                inline: true,
            },
            EmbedField {
                name: "Location".to_string(),
                value: display(&posting.location).to_string(),
                inline: true,
            },
            EmbedField {
                name: "Age".to_string(),
                value: display(&posting.age).to_string(),
                inline: true,
            },
        ],
    }
}

pub struct DispatchStats {
    pub sent: usize,
    pub failed: usize,
}

/// Send one message per posting, persisting the notified set after every
/// successful dispatch so a later failure cannot lose earlier successes.
/// A failed send is logged and skipped; the loop never aborts the batch.
pub async fn dispatch(
    postings: &[Posting],
    notified: &mut HashSet<String>,
    store: &NotifiedStore,
    sink: &impl Sink,
    country: &str,
    category: &str,
) -> Result<DispatchStats> {
    let mut stats = DispatchStats { sent: 0, failed: 0 };

    for posting in postings {
        // Two rows can resolve to the same key within one run.
        if notified.contains(&posting.key) {
            continue;
        }

        let message = build_message(posting, country, category);
        match sink.send(&message).await {
            Ok(()) => {
                println!(
                    "Notified: {} — {} — {}",
                    display(&posting.company),
                    display(&posting.role),
                    display(&posting.location)
                );
                notified.insert(posting.key.clone());
                store.save(notified)?;
                stats.sent += 1;
            }
            Err(e) => {
                warn!("Failed sending webhook for {}: {:#}", posting.company, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

// ── Tests ──
