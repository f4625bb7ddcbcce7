// IMAP access to the inbox holding store newsletters.
use chrono::{Duration, Utc};
use mail_parser::MessageParser;
use tracing::{debug, info, warn};

use crate::config::MailConfig;
use crate::model::{MailError, Newsletter};

/// Pulls newsletters from the configured store senders, newest first,
/// looking back `days` days and stopping at the configured message cap.
pub fn fetch_recent(cfg: &MailConfig, days: u32) -> Result<Vec<Newsletter>, MailError> {
    let (user, password) = cfg.credentials().ok_or(MailError::MissingCredentials)?;

    let tls = native_tls::TlsConnector::builder().build()?;
    let client = imap::connect(
        (cfg.imap_server.as_str(), cfg.imap_port),
        cfg.imap_server.as_str(),
        &tls,
    )?;
    let mut session = client.login(&user, &password).map_err(|e| e.0)?;
    info!("Connected to {}", cfg.imap_server);
    session.select("INBOX")?;

    let since = (Utc::now() - Duration::days(i64::from(days)))
        .format("%d-%b-%Y")
        .to_string();

    let mut newsletters = Vec::new();
    let mut remaining = cfg.max_messages;

    'stores: for senders in &cfg.senders {
        for address in &senders.addresses {
            if remaining == 0 {
                break 'stores;
            }
            let query = format!(r#"(FROM "{address}" SINCE {since})"#);
            let ids = match session.search(&query) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!("Could not search emails from {address}: {e}");
                    continue;
                }
            };
            if ids.is_empty() {
                continue;
            }
            info!(
                "Found {} email(s) from {} ({address})",
                ids.len(),
                senders.store
            );

            let mut ids: Vec<u32> = ids.into_iter().collect();
            ids.sort_unstable_by(|a, b| b.cmp(a));
            ids.truncate(remaining);
            let sequence = ids
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");

            let fetches = match session.fetch(&sequence, "RFC822") {
                Ok(fetches) => fetches,
                Err(e) => {
                    warn!("Could not fetch emails from {address}: {e}");
                    continue;
                }
            };
            for fetch in fetches.iter() {
                let Some(body) = fetch.body() else {
                    continue;
                };
                match parse_newsletter(&senders.store, body) {
                    Some(newsletter) => {
                        newsletters.push(newsletter);
                        remaining = remaining.saturating_sub(1);
                    }
                    None => debug!("Skipping {} message without a usable body", senders.store),
                }
            }
        }
    }

    if let Err(e) = session.logout() {
        debug!("IMAP logout failed: {e}");
    }
    Ok(newsletters)
}

fn parse_newsletter(store: &str, raw: &[u8]) -> Option<Newsletter> {
    let message = MessageParser::default().parse(raw)?;
    let subject = message.subject().unwrap_or("(no subject)").to_string();
    // body_html falls back to the text part rendered as HTML, which the
    // newsletter extractor handles through its line-scan path.
    let html = message.body_html(0)?.into_owned();
    Some(Newsletter {
        store: store.to_string(),
        subject,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newsletter_parsing_reads_subject_and_html_body() {
        let raw = concat!(
            "From: Coles <coles@coles.com.au>\r\n",
            "To: me@example.com\r\n",
            "Subject: This week's specials\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<html><body><div class=\"product\">Tim Tam $2.50</div></body></html>\r\n",
        );
        let newsletter = parse_newsletter("Coles", raw.as_bytes()).expect("newsletter");
        assert_eq!(newsletter.store, "Coles");
        assert_eq!(newsletter.subject, "This week's specials");
        assert!(newsletter.html.contains("Tim Tam $2.50"));
    }

    #[test]
    fn missing_subject_gets_a_placeholder() {
        let raw = concat!(
            "From: Coles <coles@coles.com.au>\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<html><body>Specials inside</body></html>\r\n",
        );
        let newsletter = parse_newsletter("Coles", raw.as_bytes()).expect("newsletter");
        assert_eq!(newsletter.subject, "(no subject)");
    }
}
