//! Dashboard orchestrator.
//!
//! Owns every chart instance, dispatches payloads to the reconcilers,
//! and manages filter confirmation and transient notices. Charts are
//! mutated only here; transports never hold a reference to them.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::debug;

use stats_common::{SlaCategory, StatsFilter, StatsPayload};

use crate::charts::{BarChart, DonutRow, TrendChart};
use crate::reconcile::{reconcile_bars, reconcile_donuts, reconcile_trend};
use crate::transport::{FilterHandle, TransportEvent};

/// Lifetime of a transient notice.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Dashboard phases. There is no terminal error state: errors surface
/// as notices and the charts keep their last known good data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Placeholder charts, shown until the first real payload.
    Skeleton,
    /// Real data on screen, updated in place.
    Live,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub raised_at: Instant,
}

pub struct Dashboard {
    pub phase: Phase,
    pub connected: bool,
    pub trend: TrendChart,
    pub bars: BarChart,
    pub donuts: DonutRow,

    filters: FilterHandle,
    last_applied: Option<StatsPayload>,
    applied_updates: u64,
    notices: Vec<Notice>,
}

impl Dashboard {
    pub fn new(filters: FilterHandle, today: NaiveDate) -> Self {
        Self {
            phase: Phase::Skeleton,
            connected: false,
            trend: TrendChart::skeleton(today),
            bars: BarChart::skeleton(),
            donuts: DonutRow::skeleton(SlaCategory::Avr),
            filters,
            last_applied: None,
            applied_updates: 0,
            notices: Vec::new(),
        }
    }

    pub fn confirmed_filter(&self) -> StatsFilter {
        self.filters.current().filter
    }

    /// Number of payloads that actually reached the reconcilers.
    pub fn applied_updates(&self) -> u64 {
        self.applied_updates
    }

    pub fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Connected => self.connected = true,
            TransportEvent::Disconnected => self.connected = false,
            TransportEvent::Payload {
                payload,
                generation,
            } => self.apply_payload(payload, generation, now),
            TransportEvent::ServerError(message) => self.push_notice(message, now),
        }
    }

    /// Applies one payload: stale-generation guard first, then the
    /// structural dedup, then the reconcilers.
    fn apply_payload(&mut self, payload: StatsPayload, generation: u64, _now: Instant) {
        let confirmed = self.filters.current().generation;
        if generation < confirmed {
            debug!(
                "discarding payload for filter generation {generation} (confirmed {confirmed})"
            );
            return;
        }

        if self.last_applied.as_ref() == Some(&payload) {
            return;
        }

        reconcile_trend(&mut self.trend, &payload);
        reconcile_bars(&mut self.bars, &payload);
        reconcile_donuts(&mut self.donuts, &payload);

        self.phase = Phase::Live;
        self.applied_updates += 1;
        self.last_applied = Some(payload);
    }

    /// Explicit user apply. An inverted range raises exactly one
    /// warning and sends nothing.
    pub fn apply_filter(
        &mut self,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        now: Instant,
    ) -> bool {
        let filter = StatsFilter::new(start_date, end_date);
        if let Err(err) = filter.validate() {
            self.push_notice(err.to_string(), now);
            return false;
        }
        self.filters.confirm(filter);
        true
    }

    /// Restores the default range and resends it.
    pub fn reset_filter(&mut self, today: NaiveDate) {
        self.filters.confirm(StatsFilter::default_range(today));
    }

    /// Cycles the donut row through the SLA categories, re-deriving
    /// the slots from the last applied payload.
    pub fn cycle_sla_category(&mut self) {
        self.donuts.category = self.donuts.category.next();
        if let Some(payload) = self.last_applied.clone() {
            reconcile_donuts(&mut self.donuts, &payload);
        }
    }

    /// Adds a transient notice, de-duplicated by message: a repeat of
    /// an active notice refreshes it instead of stacking.
    pub fn push_notice(&mut self, message: String, now: Instant) {
        self.prune_notices(now);
        if let Some(existing) = self.notices.iter_mut().find(|n| n.message == message) {
            existing.raised_at = now;
            return;
        }
        self.notices.push(Notice {
            message,
            raised_at: now,
        });
    }

    /// Active (non-expired) notices, oldest first.
    pub fn notices(&mut self, now: Instant) -> &[Notice] {
        self.prune_notices(now);
        &self.notices
    }

    fn prune_notices(&mut self, now: Instant) {
        self.notices
            .retain(|notice| now.duration_since(notice.raised_at) < NOTICE_TTL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats_common::RegionStats;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn dashboard() -> Dashboard {
        let (filters, _rx) = FilterHandle::new(StatsFilter::default_range(d("2026-08-30")));
        Dashboard::new(filters, d("2026-08-30"))
    }

    fn payload(open: u64) -> StatsPayload {
        let mut region = RegionStats::empty("MR-1");
        region.total_open_incidents = open;
        region.daily_incidents.insert(d("2026-08-01"), open);
        StatsPayload {
            period: None,
            regions: vec![region],
        }
    }

    #[test]
    fn first_payload_moves_skeleton_to_live() {
        let mut dash = dashboard();
        assert_eq!(dash.phase, Phase::Skeleton);
        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(3),
                generation: 0,
            },
            Instant::now(),
        );
        assert_eq!(dash.phase, Phase::Live);
        assert_eq!(dash.bars.series[0].values, vec![3]);
    }

    #[test]
    fn structurally_equal_payload_mutates_nothing() {
        let mut dash = dashboard();
        let now = Instant::now();
        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(3),
                generation: 0,
            },
            now,
        );
        let trend_before = dash.trend.clone();
        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(3),
                generation: 0,
            },
            now,
        );
        assert_eq!(dash.applied_updates(), 1);
        assert_eq!(dash.trend, trend_before);

        // A genuinely different payload still goes through.
        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(4),
                generation: 0,
            },
            now,
        );
        assert_eq!(dash.applied_updates(), 2);
    }

    #[test]
    fn stale_generation_payload_is_discarded() {
        let mut dash = dashboard();
        let now = Instant::now();
        assert!(dash.apply_filter(d("2026-08-01"), None, now));

        // Response for the pre-apply filter arrives late.
        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(9),
                generation: 0,
            },
            now,
        );
        assert_eq!(dash.applied_updates(), 0);
        assert_eq!(dash.phase, Phase::Skeleton);

        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(9),
                generation: 1,
            },
            now,
        );
        assert_eq!(dash.applied_updates(), 1);
    }

    #[test]
    fn inverted_range_raises_one_warning_and_sends_nothing() {
        let mut dash = dashboard();
        let now = Instant::now();
        let generation_before = dash.filters.current().generation;

        assert!(!dash.apply_filter(d("2026-08-30"), Some(d("2026-08-01")), now));
        assert_eq!(dash.filters.current().generation, generation_before);
        assert_eq!(dash.notices(now).len(), 1);

        // Applying again refreshes the same notice, it does not stack.
        assert!(!dash.apply_filter(d("2026-08-30"), Some(d("2026-08-01")), now));
        assert_eq!(dash.notices(now).len(), 1);
    }

    #[test]
    fn reset_restores_the_default_range() {
        let mut dash = dashboard();
        let now = Instant::now();
        dash.apply_filter(d("2026-01-01"), Some(d("2026-01-31")), now);
        dash.reset_filter(d("2026-08-30"));
        assert_eq!(
            dash.confirmed_filter(),
            StatsFilter::default_range(d("2026-08-30"))
        );
    }

    #[test]
    fn notices_expire_after_their_ttl() {
        let mut dash = dashboard();
        let raised = Instant::now();
        dash.push_notice("Failed to load statistics".into(), raised);
        assert_eq!(dash.notices(raised).len(), 1);
        let later = raised + NOTICE_TTL + Duration::from_millis(1);
        assert!(dash.notices(later).is_empty());
    }

    #[test]
    fn server_errors_become_notices_and_leave_charts_alone() {
        let mut dash = dashboard();
        let now = Instant::now();
        dash.handle_event(
            TransportEvent::Payload {
                payload: payload(5),
                generation: 0,
            },
            now,
        );
        let bars_before = dash.bars.clone();

        dash.handle_event(
            TransportEvent::ServerError("Failed to load statistics".into()),
            now,
        );
        assert_eq!(dash.bars, bars_before);
        assert_eq!(dash.phase, Phase::Live);
        assert_eq!(dash.notices(now).len(), 1);
    }

    #[test]
    fn category_cycle_rederives_donuts_from_the_last_payload() {
        let mut dash = dashboard();
        let now = Instant::now();

        let mut region = RegionStats::empty("MR-1");
        region.sla_rvr.expired = 2;
        dash.handle_event(
            TransportEvent::Payload {
                payload: StatsPayload {
                    period: None,
                    regions: vec![region],
                },
                generation: 0,
            },
            now,
        );
        assert!(dash.donuts.slots[0].empty, "AVR buckets are all zero");

        dash.cycle_sla_category();
        assert_eq!(dash.donuts.category, SlaCategory::Rvr);
        assert_eq!(dash.donuts.slots[0].values, [2, 0, 0, 0]);
    }
}
