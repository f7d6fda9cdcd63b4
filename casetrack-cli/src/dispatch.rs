//! Hand due notifications to a delivery transport, at most once per day.

use anyhow::{Context, Result, bail};
use casetrack_core::{Case, DueNotification, evaluate_due_on};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{Config, Transport};
use crate::state::{outbox_path, sent_keys_path};

/// One line of the outbox log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub dedupe_key: String,
    pub sent_at_utc: String,
    pub transport: Transport,
    pub notification: DueNotification,
}

pub enum Dispatcher {
    Outbox,
    Webhook {
        client: reqwest::Client,
        url: String,
        token: Option<String>,
    },
}

impl Dispatcher {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        match cfg.delivery.transport {
            Transport::Outbox => Ok(Dispatcher::Outbox),
            Transport::Webhook => {
                let url = cfg
                    .delivery
                    .webhook_url
                    .clone()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "transport = \"webhook\" needs [delivery].webhook_url in config.toml"
                        )
                    })?;
                Ok(Dispatcher::Webhook {
                    client: reqwest::Client::new(),
                    url,
                    token: cfg.webhook_token(),
                })
            }
        }
    }

    fn transport(&self) -> Transport {
        match self {
            Dispatcher::Outbox => Transport::Outbox,
            Dispatcher::Webhook { .. } => Transport::Webhook,
        }
    }

    /// The outbox transport delivers by writing the record; the webhook
    /// transport POSTs the notification JSON.
    async fn deliver(&self, n: &DueNotification) -> Result<()> {
        match self {
            Dispatcher::Outbox => Ok(()),
            Dispatcher::Webhook { client, url, token } => {
                let mut req = client.post(url).json(n);
                if let Some(t) = token {
                    req = req.bearer_auth(t);
                }

                info!(
                    url = %url,
                    case_id = %n.case_id,
                    channel = %n.channel,
                    "posting notification"
                );
                let resp = req
                    .send()
                    .await
                    .with_context(|| format!("POST {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    bail!("webhook returned {}: {}", status.as_u16(), body);
                }
                Ok(())
            }
        }
    }
}

pub fn read_sent_keys(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let f = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let lines = BufReader::new(f)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("read {}", path.display()))?;
    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Due notifications for `today` whose dedupe key has not been recorded.
pub fn pending(
    cases: &[Case],
    cfg: &Config,
    today: NaiveDate,
    sent: &HashSet<String>,
) -> Vec<DueNotification> {
    evaluate_due_on(cases, &cfg.notifications, today)
        .into_iter()
        .filter(|n| !sent.contains(&n.dedupe_key(today)))
        .collect()
}

pub async fn dispatch(
    cases: &[Case],
    cfg: &Config,
    today: NaiveDate,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let limit = limit.unwrap_or(cfg.delivery.max_dispatch_per_run);

    let sk = sent_keys_path()?;
    let sent = read_sent_keys(&sk)?;
    let due = pending(cases, cfg, today, &sent);

    if due.is_empty() {
        println!("No due unsent notifications for {today}.");
        return Ok(());
    }
    if due.len() > limit {
        warn!(due = due.len(), limit, "more notifications due than the per-run limit");
    }

    if dry_run {
        for n in due.iter().take(limit) {
            println!(
                "[DRY RUN] would send [{}] {} -> {}",
                n.channel,
                n.message,
                n.recipients.join(", ")
            );
        }
        return Ok(());
    }

    let dispatcher = Dispatcher::from_config(cfg)?;

    let ob = outbox_path()?;
    let mut outbox = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&ob)
        .with_context(|| format!("open {}", ob.display()))?;
    let mut sent_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&sk)
        .with_context(|| format!("open {}", sk.display()))?;

    let mut sent_now = 0usize;
    for n in due.into_iter().take(limit) {
        if n.recipients.is_empty() {
            warn!(case_id = %n.case_id, channel = %n.channel, "no recipients, skipping");
            continue;
        }

        dispatcher.deliver(&n).await?;

        let key = n.dedupe_key(today);
        let record = OutboxRecord {
            dedupe_key: key.clone(),
            sent_at_utc: Utc::now().to_rfc3339(),
            transport: dispatcher.transport(),
            notification: n,
        };
        writeln!(outbox, "{}", serde_json::to_string(&record)?)?;
        writeln!(sent_log, "{}", key)?;
        sent_now += 1;
    }

    println!("Dispatch complete. Sent {} notifications.", sent_now);
    Ok(())
}

pub fn list_outbox(limit: usize) -> Result<()> {
    let ob = outbox_path()?;
    if !ob.exists() {
        println!("No outbox at {}", ob.display());
        return Ok(());
    }

    let f = fs::File::open(&ob).with_context(|| format!("open {}", ob.display()))?;
    let mut rows: Vec<OutboxRecord> = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<OutboxRecord>(&line) {
            Ok(r) => rows.push(r),
            Err(e) => warn!(error = %e, "skipping malformed outbox line"),
        }
    }

    for (i, r) in rows.iter().rev().take(limit).enumerate() {
        println!(
            "{}. [{}] {} -> {} at {}",
            i + 1,
            r.notification.channel,
            r.notification.message,
            r.notification.recipients.join(", "),
            r.sent_at_utc
        );
    }

    Ok(())
}
