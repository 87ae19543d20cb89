//! Posts booking and result notices to a chat channel through an incoming webhook.
use std::{sync::Arc, time::Duration};

use log::*;
use match_tracker_engine::{
    db_types::{Match, Team, TeamOutcome},
    traits::{NotificationReceipt, Notifier, NotifierError},
};
use reqwest::Client;
use serde::Serialize;

use crate::config::ChatConfig;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    username: &'a str,
    text: String,
}

#[derive(Clone)]
pub struct ChatNotifier {
    config: ChatConfig,
    client: Arc<Client>,
}

impl ChatNotifier {
    pub fn new(config: ChatConfig) -> Result<Self, NotifierError> {
        let client =
            Client::builder().timeout(WEBHOOK_TIMEOUT).build().map_err(|e| NotifierError::Transport(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn post(&self, text: String, dry_run: bool) -> Result<NotificationReceipt, NotifierError> {
        if dry_run {
            return Ok(NotificationReceipt::DryRun { preview: text });
        }
        if self.config.webhook_url.is_empty() {
            return Ok(NotificationReceipt::Suppressed { reason: "No chat webhook is configured".into() });
        }
        let message = WebhookMessage { username: &self.config.username, text };
        let response = self
            .client
            .post(self.config.webhook_url.reveal())
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifierError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message_id = Some(body.trim().to_string()).filter(|s| !s.is_empty() && s != "ok");
            Ok(NotificationReceipt::Delivered { channel: "webhook".into(), message_id })
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(NotifierError::Rejected { status: status.as_u16(), message })
        }
    }
}

impl Notifier for ChatNotifier {
    async fn send_booking_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError> {
        trace!("💬️ Sending booking notice for match {}", m.match_id);
        self.post(booking_notice(m), dry_run).await
    }

    async fn send_result_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError> {
        trace!("💬️ Sending result notice for match {}", m.match_id);
        self.post(result_notice(m), dry_run).await
    }
}

pub fn booking_notice(m: &Match) -> String {
    let mut lines = vec![format!(
        "🎾 New club match on {} at {}",
        m.start_date.format("%A %d %B"),
        m.start_date.format("%H:%M")
    )];
    let venue = [m.venue.tenant_name.as_deref(), m.venue.resource_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");
    if !venue.is_empty() {
        lines.push(format!("📍 {venue}"));
    }
    let players = m
        .players()
        .map(|p| match p.paid {
            Some(false) => format!("{} (not paid)", p.name),
            _ => p.name.clone(),
        })
        .collect::<Vec<_>>();
    lines.push(format!("👥 {}", players.join(", ")));
    if let Some(code) = &m.venue.access_code {
        lines.push(format!("🔑 Access code: {code}"));
    }
    if let Some(price) = &m.venue.price {
        lines.push(format!("💶 {price}"));
    }
    match &m.duty {
        Some(duty) => lines.push(format!("🧹 On duty: {}", duty.player_name)),
        None => lines.push("🧹 Nobody is on duty for this match".into()),
    }
    lines.join("\n")
}

pub fn result_notice(m: &Match) -> String {
    let mut lines = vec![format!("🏆 Result of the match on {}", m.start_date.format("%A %d %B"))];
    for team in &m.teams {
        let names = team.players.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(" & ");
        let scores = m
            .results
            .iter()
            .map(|set| set.scores.get(&team.team_id).map(|s| s.to_string()).unwrap_or_else(|| "-".into()))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("{} {names}: {scores}", outcome_marker(team)));
    }
    lines.join("\n")
}

fn outcome_marker(team: &Team) -> &'static str {
    match team.outcome {
        Some(TeamOutcome::Won) => "🥇",
        Some(TeamOutcome::Lost) => "🥈",
        Some(TeamOutcome::Tied) => "🤝",
        None => "▫️",
    }
}
