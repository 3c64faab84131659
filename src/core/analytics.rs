//! Analytics aggregation - Occupancy, ADR, `RevPAR` and stay-length figures.
//!
//! The pure functions here take already-loaded stays and a room count; the
//! `fetch_*` functions load exactly the rows the pure functions need. Date
//! ranges are inclusive on both ends, so a range from a day to itself is one
//! day long.
//!
//! Every ratio is guarded: a zero denominator yields 0, never `NaN`.

use crate::{
    core::reservation,
    entities::reservation as reservation_entity,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

/// The slice of a reservation analytics needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Stay {
    /// Arrival date
    pub arrival: NaiveDate,
    /// Departure date
    pub departure: NaiveDate,
    /// Total revenue of the stay
    pub rate_total: f64,
    /// Booking channel
    pub source: String,
}

impl From<&reservation_entity::Model> for Stay {
    fn from(model: &reservation_entity::Model) -> Self {
        Self {
            arrival: model.date_arrival,
            departure: model.date_departure,
            rate_total: model.rate_total,
            source: model.source.clone(),
        }
    }
}

impl Stay {
    /// Nights charged for the stay, never less than one.
    #[must_use]
    pub fn nights(&self) -> i64 {
        stay_nights(self.arrival, self.departure)
    }

    fn occupies(&self, day: NaiveDate) -> bool {
        if self.departure <= self.arrival {
            day == self.arrival
        } else {
            self.arrival <= day && day < self.departure
        }
    }
}

/// Headline KPIs for a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiData {
    /// Sold room-nights as a percentage of available room-nights, in `[0, 100]`
    pub occupancy_rate: f64,
    /// Average daily rate: revenue per reservation
    pub adr: f64,
    /// Revenue per available room-night
    pub revpar: f64,
    /// Sum of `rate_total` over the reservations
    pub total_revenue: f64,
    /// Number of reservations
    pub total_reservations: u64,
    /// Room-nights per reservation
    pub average_stay_length: f64,
    /// Sum of nights over the reservations
    pub total_room_nights: i64,
    /// Rooms × days in range
    pub available_room_nights: i64,
}

/// Occupied rooms on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOccupancy {
    /// The day
    pub date: NaiveDate,
    /// Rooms occupied that night
    pub occupied_rooms: u64,
    /// Occupied rooms as a percentage of all rooms, in `[0, 100]`
    pub occupancy_rate: f64,
}

/// Revenue attributed to one booking channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRevenue {
    /// Booking channel
    pub source: String,
    /// Revenue from that channel
    pub revenue: f64,
    /// Reservations from that channel
    pub reservations: u64,
}

/// Number of stays falling in one length bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StayLengthBucket {
    /// Bucket label: `"1"`, `"2"`, `"3"`, `"4-6"` or `"7+"`
    pub label: &'static str,
    /// Stays in the bucket
    pub count: u64,
}

/// Everything a property dashboard shows for a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Headline KPIs
    pub kpis: KpiData,
    /// Per-day occupancy series
    pub daily_occupancy: Vec<DailyOccupancy>,
    /// Revenue per booking channel
    pub revenue_by_source: Vec<SourceRevenue>,
    /// Stay-length histogram
    pub stay_lengths: Vec<StayLengthBucket>,
}

/// Nights for a stay: `max(1, ceil((departure − arrival) / 1 day))`.
///
/// Same-day and inverted records count as one night.
#[must_use]
pub fn stay_nights(arrival: NaiveDate, departure: NaiveDate) -> i64 {
    (departure - arrival).num_days().max(1)
}

/// Days in the inclusive range `[start, end]`, 0 when `end < start`.
#[must_use]
pub fn days_in_range(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: f64, denominator: i64) -> f64 {
    if denominator <= 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Computes the headline KPIs from the stays overlapping `[start, end]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_kpis(stays: &[Stay], total_rooms: u64, start: NaiveDate, end: NaiveDate) -> KpiData {
    let total_revenue: f64 = stays.iter().map(|stay| stay.rate_total).sum();
    let total_room_nights: i64 = stays.iter().map(Stay::nights).sum();
    let total_reservations = stays.len() as u64;
    let reservation_count = i64::try_from(stays.len()).unwrap_or(i64::MAX);

    let rooms = i64::try_from(total_rooms).unwrap_or(i64::MAX);
    let available_room_nights = rooms.saturating_mul(days_in_range(start, end));

    let occupancy_rate =
        ratio(total_room_nights as f64 * 100.0, available_room_nights).clamp(0.0, 100.0);

    KpiData {
        occupancy_rate,
        adr: ratio(total_revenue, reservation_count),
        revpar: ratio(total_revenue, available_room_nights),
        total_revenue,
        total_reservations,
        average_stay_length: ratio(total_room_nights as f64, reservation_count),
        total_room_nights,
        available_room_nights,
    }
}

/// Computes occupied rooms for every day of `[start, end]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_daily_occupancy(
    stays: &[Stay],
    total_rooms: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyOccupancy> {
    let rooms = i64::try_from(total_rooms).unwrap_or(i64::MAX);

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| {
            let occupied_rooms = stays.iter().filter(|stay| stay.occupies(date)).count() as u64;
            let occupancy_rate = ratio(occupied_rooms as f64 * 100.0, rooms).clamp(0.0, 100.0);
            DailyOccupancy {
                date,
                occupied_rooms,
                occupancy_rate,
            }
        })
        .collect()
}

/// Groups revenue by booking channel, highest revenue first.
#[must_use]
pub fn compute_revenue_by_source(stays: &[Stay]) -> Vec<SourceRevenue> {
    let mut by_source: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for stay in stays {
        let entry = by_source.entry(stay.source.as_str()).or_insert((0.0, 0));
        entry.0 += stay.rate_total;
        entry.1 += 1;
    }

    let mut result: Vec<SourceRevenue> = by_source
        .into_iter()
        .map(|(source, (revenue, reservations))| SourceRevenue {
            source: source.to_string(),
            revenue,
            reservations,
        })
        .collect();

    // BTreeMap already ordered names; a stable sort keeps that for equal revenue
    result.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    result
}

/// Buckets stays by length in nights.
#[must_use]
pub fn compute_stay_length_distribution(stays: &[Stay]) -> Vec<StayLengthBucket> {
    const LABELS: [&str; 5] = ["1", "2", "3", "4-6", "7+"];
    let mut counts = [0_u64; 5];

    for stay in stays {
        let index = match stay.nights() {
            1 => 0,
            2 => 1,
            3 => 2,
            4..=6 => 3,
            _ => 4,
        };
        counts[index] += 1;
    }

    LABELS
        .into_iter()
        .zip(counts)
        .map(|(label, count)| StayLengthBucket { label, count })
        .collect()
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(Error::InvalidDateRange { start, end });
    }
    Ok(())
}

async fn load_stays(
    db: &DatabaseConnection,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Stay>> {
    let reservations =
        reservation::get_occupying_reservations(db, organization_id, start, end).await?;
    Ok(reservations.iter().map(Stay::from).collect())
}

/// Loads reservations and rooms for `[start, end]` and computes the KPIs.
#[instrument(skip(db))]
pub async fn fetch_kpis(
    db: &DatabaseConnection,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<KpiData> {
    validate_range(start, end)?;
    let total_rooms = reservation::count_active_rooms(db, organization_id).await?;
    let stays = load_stays(db, organization_id, start, end).await?;
    Ok(compute_kpis(&stays, total_rooms, start, end))
}

/// Loads the per-day occupancy series for `[start, end]`.
pub async fn fetch_daily_occupancy(
    db: &DatabaseConnection,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyOccupancy>> {
    validate_range(start, end)?;
    let total_rooms = reservation::count_active_rooms(db, organization_id).await?;
    let stays = load_stays(db, organization_id, start, end).await?;
    Ok(compute_daily_occupancy(&stays, total_rooms, start, end))
}

/// Loads revenue per booking channel for `[start, end]`.
pub async fn fetch_revenue_by_source(
    db: &DatabaseConnection,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<SourceRevenue>> {
    validate_range(start, end)?;
    let stays = load_stays(db, organization_id, start, end).await?;
    Ok(compute_revenue_by_source(&stays))
}

/// Loads the stay-length histogram for `[start, end]`.
pub async fn fetch_stay_length_distribution(
    db: &DatabaseConnection,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<StayLengthBucket>> {
    validate_range(start, end)?;
    let stays = load_stays(db, organization_id, start, end).await?;
    Ok(compute_stay_length_distribution(&stays))
}

/// Loads every dashboard series concurrently.
///
/// The reads are independent; the first error aborts the whole dashboard.
#[instrument(skip(db))]
pub async fn load_dashboard(
    db: &DatabaseConnection,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Dashboard> {
    let (kpis, daily_occupancy, revenue_by_source, stay_lengths) = tokio::try_join!(
        fetch_kpis(db, organization_id, start, end),
        fetch_daily_occupancy(db, organization_id, start, end),
        fetch_revenue_by_source(db, organization_id, start, end),
        fetch_stay_length_distribution(db, organization_id, start, end),
    )?;

    Ok(Dashboard {
        kpis,
        daily_occupancy,
        revenue_by_source,
        stay_lengths,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn stay(arrival: &str, departure: &str, rate_total: f64, source: &str) -> Stay {
        Stay {
            arrival: date(arrival),
            departure: date(departure),
            rate_total,
            source: source.to_string(),
        }
    }

    #[test]
    fn test_same_day_stay_is_one_night() {
        assert_eq!(stay_nights(date("2024-01-01"), date("2024-01-01")), 1);
        assert_eq!(stay_nights(date("2024-01-03"), date("2024-01-01")), 1);
        assert_eq!(stay_nights(date("2024-01-01"), date("2024-01-04")), 3);
    }

    #[test]
    fn test_days_in_range_is_inclusive() {
        assert_eq!(days_in_range(date("2024-01-01"), date("2024-01-01")), 1);
        assert_eq!(days_in_range(date("2024-01-01"), date("2024-01-31")), 31);
        assert_eq!(days_in_range(date("2024-01-02"), date("2024-01-01")), 0);
    }

    #[test]
    fn test_single_same_day_reservation_fills_single_room() {
        let stays = vec![stay("2024-01-01", "2024-01-01", 120.0, "direct")];
        let kpis = compute_kpis(&stays, 1, date("2024-01-01"), date("2024-01-01"));

        assert_eq!(kpis.total_room_nights, 1);
        assert_eq!(kpis.occupancy_rate, 100.0);
        assert_eq!(kpis.adr, 120.0);
        assert_eq!(kpis.revpar, 120.0);
        assert_eq!(kpis.average_stay_length, 1.0);
    }

    #[test]
    fn test_zero_rooms_yields_zero_occupancy_and_revpar() {
        let stays = vec![stay("2024-01-01", "2024-01-03", 300.0, "direct")];
        let kpis = compute_kpis(&stays, 0, date("2024-01-01"), date("2024-01-07"));

        assert_eq!(kpis.occupancy_rate, 0.0);
        assert_eq!(kpis.revpar, 0.0);
        assert_eq!(kpis.available_room_nights, 0);
        assert_eq!(kpis.adr, 300.0);
    }

    #[test]
    fn test_no_reservations_yields_zero_adr_and_stay_length() {
        let kpis = compute_kpis(&[], 10, date("2024-01-01"), date("2024-01-07"));

        assert_eq!(kpis.adr, 0.0);
        assert_eq!(kpis.average_stay_length, 0.0);
        assert_eq!(kpis.occupancy_rate, 0.0);
        assert_eq!(kpis.total_reservations, 0);
        assert_eq!(kpis.available_room_nights, 70);
    }

    #[test]
    fn test_kpis_mixed_stays() {
        let stays = vec![
            stay("2024-01-01", "2024-01-03", 200.0, "direct"),
            stay("2024-01-02", "2024-01-06", 400.0, "ota"),
        ];
        // 2 rooms × 5 days = 10 available; 2 + 4 = 6 sold
        let kpis = compute_kpis(&stays, 2, date("2024-01-01"), date("2024-01-05"));

        assert_eq!(kpis.total_room_nights, 6);
        assert_eq!(kpis.available_room_nights, 10);
        assert_eq!(kpis.occupancy_rate, 60.0);
        assert_eq!(kpis.adr, 300.0);
        assert_eq!(kpis.revpar, 60.0);
        assert_eq!(kpis.average_stay_length, 3.0);
        assert_eq!(kpis.total_revenue, 600.0);
    }

    #[test]
    fn test_occupancy_is_capped_at_one_hundred() {
        let stays = vec![stay("2023-12-01", "2024-01-31", 5000.0, "direct")];
        let kpis = compute_kpis(&stays, 1, date("2024-01-10"), date("2024-01-12"));

        assert_eq!(kpis.occupancy_rate, 100.0);
    }

    #[test]
    fn test_daily_occupancy() {
        let stays = vec![
            stay("2024-01-01", "2024-01-03", 200.0, "direct"),
            stay("2024-01-02", "2024-01-02", 50.0, "walk-in"),
        ];
        let series = compute_daily_occupancy(&stays, 2, date("2024-01-01"), date("2024-01-03"));

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].occupied_rooms, 1);
        assert_eq!(series[0].occupancy_rate, 50.0);
        assert_eq!(series[1].occupied_rooms, 2);
        assert_eq!(series[1].occupancy_rate, 100.0);
        // departure day is not a night
        assert_eq!(series[2].occupied_rooms, 0);

        let no_rooms = compute_daily_occupancy(&stays, 0, date("2024-01-01"), date("2024-01-01"));
        assert_eq!(no_rooms[0].occupancy_rate, 0.0);
    }

    #[test]
    fn test_revenue_by_source_sorted_by_revenue() {
        let stays = vec![
            stay("2024-01-01", "2024-01-02", 100.0, "direct"),
            stay("2024-01-01", "2024-01-02", 300.0, "ota"),
            stay("2024-01-01", "2024-01-02", 50.0, "direct"),
            stay("2024-01-01", "2024-01-02", 150.0, "agent"),
        ];
        let revenue = compute_revenue_by_source(&stays);

        let sources: Vec<&str> = revenue.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["ota", "agent", "direct"]);
        assert_eq!(revenue[2].revenue, 150.0);
        assert_eq!(revenue[2].reservations, 2);
    }

    #[test]
    fn test_stay_length_distribution() {
        let stays = vec![
            stay("2024-01-01", "2024-01-01", 0.0, "direct"),
            stay("2024-01-01", "2024-01-02", 0.0, "direct"),
            stay("2024-01-01", "2024-01-04", 0.0, "direct"),
            stay("2024-01-01", "2024-01-06", 0.0, "direct"),
            stay("2024-01-01", "2024-01-15", 0.0, "direct"),
        ];
        let buckets = compute_stay_length_distribution(&stays);

        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 1, 1]);
        assert_eq!(buckets[4].label, "7+");
    }

    #[tokio::test]
    async fn test_fetch_kpis_rejects_inverted_range() -> Result<()> {
        let db = setup_test_db().await?;
        let result = fetch_kpis(&db, "org", date("2024-02-01"), date("2024-01-01")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidDateRange { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_kpis_from_database() -> Result<()> {
        let db = setup_test_db().await?;
        crate::core::reservation::create_room(&db, "org", "1", "single").await?;
        crate::core::reservation::create_reservation(
            &db,
            new_reservation("org", "2024-01-01", "2024-01-01", 80.0),
        )
        .await?;

        let kpis = fetch_kpis(&db, "org", date("2024-01-01"), date("2024-01-01")).await?;
        assert_eq!(kpis.occupancy_rate, 100.0);
        assert_eq!(kpis.total_reservations, 1);
        assert_eq!(kpis.adr, 80.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_stay_departing_on_range_start_is_not_counted() -> Result<()> {
        let db = setup_test_db().await?;
        crate::core::reservation::create_room(&db, "org", "1", "single").await?;
        crate::core::reservation::create_reservation(
            &db,
            new_reservation("org", "2023-12-30", "2024-01-01", 240.0),
        )
        .await?;

        let dashboard = load_dashboard(&db, "org", date("2024-01-01"), date("2024-01-01")).await?;

        assert_eq!(dashboard.kpis.total_reservations, 0);
        assert_eq!(dashboard.kpis.occupancy_rate, 0.0);
        assert_eq!(dashboard.kpis.total_revenue, 0.0);
        assert_eq!(dashboard.daily_occupancy[0].occupied_rooms, 0);
        assert!(dashboard.revenue_by_source.is_empty());

        // One day earlier the stay is in house
        let kpis = fetch_kpis(&db, "org", date("2023-12-31"), date("2023-12-31")).await?;
        assert_eq!(kpis.total_reservations, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_dashboard() -> Result<()> {
        let db = setup_test_db().await?;
        crate::core::reservation::create_room(&db, "org", "1", "single").await?;
        crate::core::reservation::create_room(&db, "org", "2", "double").await?;
        let mut booking = new_reservation("org", "2024-01-01", "2024-01-03", 200.0);
        booking.source = "OTA".to_string();
        crate::core::reservation::create_reservation(&db, booking).await?;
        crate::core::reservation::create_reservation(
            &db,
            new_reservation("org", "2024-01-02", "2024-01-03", 90.0),
        )
        .await?;

        let dashboard = load_dashboard(&db, "org", date("2024-01-01"), date("2024-01-02")).await?;

        assert_eq!(dashboard.kpis.total_reservations, 2);
        assert_eq!(dashboard.kpis.total_room_nights, 3);
        assert_eq!(dashboard.kpis.occupancy_rate, 75.0);
        assert_eq!(dashboard.daily_occupancy.len(), 2);
        assert_eq!(dashboard.daily_occupancy[1].occupied_rooms, 2);
        assert_eq!(dashboard.revenue_by_source[0].source, "ota");
        assert_eq!(dashboard.stay_lengths[0].count, 1);
        assert_eq!(dashboard.stay_lengths[1].count, 1);
        Ok(())
    }
}
