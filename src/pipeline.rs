use crate::analyzer::{evaluate, render_report, CriteriaSet};
use crate::model::{CanonicalOffer, MalformedOffer, RawOffer};
use crate::normalizer::normalize_all;
use crate::notifier::{render, Notifier};
use crate::storage::SeenLedger;
use tracing::{debug, info, warn};

/// Per-run switches that are not criteria.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tax_percent: f64,
    /// Evaluate and report only: no ledger access, nothing sent.
    pub test_mode: bool,
    /// Log every raw record before it is evaluated.
    pub debug: bool,
    /// Attach the raw record to notifications.
    pub send_payload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Malformed,
    AlreadySeen,
    Rejected,
    /// Admitted in test mode, so not dispatched.
    Admitted,
    Notified,
    /// Sent, but the ledger write failed afterwards.
    NotifiedUnmarked,
    NotifyFailed,
    LedgerFailed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub malformed: usize,
    pub already_seen: usize,
    pub rejected: usize,
    pub admitted: usize,
    pub notified: usize,
    pub notify_failed: usize,
    pub ledger_failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: OfferOutcome) {
        self.total += 1;
        match outcome {
            OfferOutcome::Malformed => self.malformed += 1,
            OfferOutcome::AlreadySeen => self.already_seen += 1,
            OfferOutcome::Rejected => self.rejected += 1,
            OfferOutcome::Admitted => self.admitted += 1,
            OfferOutcome::Notified => {
                self.admitted += 1;
                self.notified += 1;
            }
            OfferOutcome::NotifiedUnmarked => {
                self.admitted += 1;
                self.notified += 1;
                self.ledger_failed += 1;
            }
            OfferOutcome::NotifyFailed => {
                self.admitted += 1;
                self.notify_failed += 1;
            }
            OfferOutcome::LedgerFailed => self.ledger_failed += 1,
        }
    }
}

/// Runs every raw offer through normalization, dedup, evaluation and dispatch, in feed order.
/// A failing offer never stops the batch.
pub async fn process_offers<L: SeenLedger + ?Sized>(
    raw_offers: &[RawOffer],
    criteria: &CriteriaSet,
    options: &RunOptions,
    mut ledger: Option<&mut L>,
    notifier: &dyn Notifier,
) -> RunSummary {
    if options.test_mode {
        ledger = None;
    }

    let mut summary = RunSummary::default();
    let normalized = normalize_all(raw_offers, options.tax_percent);
    for (raw, offer) in raw_offers.iter().zip(normalized) {
        let outcome = process_offer(raw, offer, criteria, options, ledger.as_deref_mut(), notifier).await;
        summary.record(outcome);
    }

    info!(
        "Processed {} offers: {} admitted, {} notified, {} rejected, {} already seen, {} malformed, {} notify failures, {} ledger failures",
        summary.total,
        summary.admitted,
        summary.notified,
        summary.rejected,
        summary.already_seen,
        summary.malformed,
        summary.notify_failed,
        summary.ledger_failed
    );
    summary
}

async fn process_offer<L: SeenLedger + ?Sized>(
    raw: &RawOffer,
    offer: Result<CanonicalOffer, MalformedOffer>,
    criteria: &CriteriaSet,
    options: &RunOptions,
    mut ledger: Option<&mut L>,
    notifier: &dyn Notifier,
) -> OfferOutcome {
    if options.debug {
        info!("Raw offer: {}", raw);
    }

    let offer = match offer {
        Ok(offer) => offer,
        Err(e) => {
            warn!("Skipping malformed offer: {}", e);
            return OfferOutcome::Malformed;
        }
    };

    if let Some(ledger) = ledger.as_deref_mut() {
        match ledger.has_seen(offer.id) {
            Ok(true) => {
                debug!("Already seen: {}", offer.id);
                return OfferOutcome::AlreadySeen;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Seen check failed for {}: {}", offer.id, e);
                return OfferOutcome::LedgerFailed;
            }
        }
    }

    let (admit, ctx) = evaluate(&offer, criteria);
    if !admit {
        if options.debug {
            info!("Offer {} evaluation:\n{}", offer.id, render_report(&ctx));
        }
        debug!("Offer {} rejected by: {}", offer.id, ctx.failed_fields().join(", "));
        return OfferOutcome::Rejected;
    }
    info!("Offer {} matches all criteria:\n{}", offer.id, render_report(&ctx));

    if options.test_mode {
        return OfferOutcome::Admitted;
    }

    let message = render(&offer, options.send_payload);
    if let Err(e) = notifier.send(&message).await {
        warn!("{} send error for {}: {}", notifier.name(), offer.id, e);
        return OfferOutcome::NotifyFailed;
    }

    // Marked only once the notification went out.
    if let Some(ledger) = ledger {
        if let Err(e) = ledger.mark_seen(offer.id) {
            warn!("Mark seen failed for {}: {}", offer.id, e);
            return OfferOutcome::NotifiedUnmarked;
        }
        info!("Offer {} notified and marked.", offer.id);
    }
    OfferOutcome::Notified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Criterion, Field};
    use crate::notifier::recording::RecordingNotifier;
    use crate::storage::memory::MemoryLedger;
    use serde_json::json;

    fn options() -> RunOptions {
        RunOptions {
            tax_percent: 19.0,
            test_mode: false,
            debug: false,
            send_payload: false,
        }
    }

    fn feed() -> Vec<RawOffer> {
        vec![
            json!({"id": 1, "price": 40, "ram_size": 64, "specials": ["ECC"]}),
            json!({"id": 2, "price": 40, "ram_size": 16}),
            json!("not an offer"),
            json!({"id": 3, "price": 500, "ram_size": 128}),
            json!({"id": 4, "price": 30, "ram_size": 32, "serverDiskData": {"nvme": "x"}}),
            json!({"id": 5, "price": 45, "ram_size": 32}),
        ]
    }

    fn criteria() -> CriteriaSet {
        let mut criteria = CriteriaSet::new();
        criteria.set_match(Field::RamSize, Criterion::AtLeast(32)).unwrap();
        criteria.set_match(Field::Price, Criterion::AtMost(100.0)).unwrap();
        criteria
    }

    #[tokio::test]
    async fn test_admitted_offers_are_sent_and_marked() {
        let mut ledger = MemoryLedger::default();
        let notifier = RecordingNotifier::default();

        let summary = process_offers(&feed(), &criteria(), &options(), Some(&mut ledger), &notifier).await;

        assert_eq!(notifier.sent_ids(), vec![1, 5]);
        assert!(ledger.seen.contains(&1) && ledger.seen.contains(&5));
        assert_eq!(ledger.seen.len(), 2);
        assert_eq!(
            summary,
            RunSummary {
                total: 6,
                malformed: 2,
                already_seen: 0,
                rejected: 2,
                admitted: 2,
                notified: 2,
                notify_failed: 0,
                ledger_failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_seen_offers_are_never_dispatched() {
        let mut ledger = MemoryLedger::default();
        ledger.seen.insert(1);
        let notifier = RecordingNotifier::default();

        let summary = process_offers(&feed(), &criteria(), &options(), Some(&mut ledger), &notifier).await;

        assert_eq!(notifier.sent_ids(), vec![5]);
        assert_eq!(summary.already_seen, 1);
    }

    #[tokio::test]
    async fn test_second_pass_sends_nothing() {
        let mut ledger = MemoryLedger::default();
        let notifier = RecordingNotifier::default();

        process_offers(&feed(), &criteria(), &options(), Some(&mut ledger), &notifier).await;
        let summary = process_offers(&feed(), &criteria(), &options(), Some(&mut ledger), &notifier).await;

        assert_eq!(notifier.sent_ids(), vec![1, 5]);
        assert_eq!(summary.already_seen, 2);
        assert_eq!(summary.notified, 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_in_one_feed_is_sent_once() {
        let mut ledger = MemoryLedger::default();
        let notifier = RecordingNotifier::default();
        let feed = vec![
            json!({"id": 9, "price": 10, "ram_size": 64}),
            json!({"id": 9, "price": 5, "ram_size": 64}),
        ];

        process_offers(&feed, &criteria(), &options(), Some(&mut ledger), &notifier).await;
        assert_eq!(notifier.sent_ids(), vec![9]);
    }

    #[tokio::test]
    async fn test_failed_dispatch_leaves_id_unmarked() {
        let mut ledger = MemoryLedger::default();
        let notifier = RecordingNotifier {
            fail_for: [1].into_iter().collect(),
            ..RecordingNotifier::default()
        };

        let summary = process_offers(&feed(), &criteria(), &options(), Some(&mut ledger), &notifier).await;

        assert!(!ledger.seen.contains(&1));
        assert!(ledger.seen.contains(&5));
        assert_eq!(summary.notify_failed, 1);
        assert_eq!(summary.notified, 1);
    }

    #[tokio::test]
    async fn test_test_mode_bypasses_ledger_and_notifier() {
        let mut ledger = MemoryLedger::default();
        ledger.seen.insert(1);
        let notifier = RecordingNotifier::default();
        let options = RunOptions {
            test_mode: true,
            ..options()
        };

        let summary = process_offers(&feed(), &criteria(), &options, Some(&mut ledger), &notifier).await;

        assert!(notifier.sent_ids().is_empty());
        assert_eq!(ledger.writes, 0);
        assert_eq!(summary.already_seen, 0);
        assert_eq!(summary.admitted, 2);
    }

    #[tokio::test]
    async fn test_send_payload_controls_verbosity() {
        let mut ledger = MemoryLedger::default();
        let notifier = RecordingNotifier::default();
        let options = RunOptions {
            send_payload: true,
            ..options()
        };
        let feed = vec![json!({"id": 11, "price": 10, "ram_size": 64})];

        process_offers(&feed, &criteria(), &options, Some(&mut ledger), &notifier).await;

        let sent = notifier.sent.lock().unwrap();
        assert!(sent[0].html.contains("<pre>"));
    }

    #[tokio::test]
    async fn test_failed_mark_is_counted_as_ledger_failure() {
        let mut ledger = MemoryLedger {
            fail_writes: true,
            ..MemoryLedger::default()
        };
        let notifier = RecordingNotifier::default();

        let summary = process_offers(&feed(), &criteria(), &options(), Some(&mut ledger), &notifier).await;

        assert_eq!(notifier.sent_ids(), vec![1, 5]);
        assert_eq!(summary.notified, 2);
        assert_eq!(summary.ledger_failed, 2);
    }
}
