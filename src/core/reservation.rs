//! Room and reservation business logic.
//!
//! These are the writes the analytics read from. Room creation is metered
//! against the plan's room quota; reservations count as transactions. Status
//! moves `pending/confirmed → present → checked_out`, with `cancelled` as a
//! terminal side exit.

use crate::{
    core::usage::{self, Metric},
    entities::{Reservation, Room, reservation, room},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Requested but not yet guaranteed
    Pending,
    /// Guaranteed, guest not arrived
    Confirmed,
    /// Guest checked in and in house
    Present,
    /// Guest departed
    CheckedOut,
    /// Will not be honoured
    Cancelled,
}

impl ReservationStatus {
    /// Statuses that represent sold room-nights
    pub const OCCUPYING: [Self; 3] = [Self::Confirmed, Self::Present, Self::CheckedOut];

    /// Storage form of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Present => "present",
            Self::CheckedOut => "checked_out",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the storage form.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "present" => Ok(Self::Present),
            "checked_out" => Ok(Self::CheckedOut),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(Error::InvalidValue {
                field: "reservation status",
                value: value.to_string(),
            }),
        }
    }
}

/// Input for [`create_reservation`].
#[derive(Debug, Clone)]
pub struct NewReservation {
    /// Tenant that owns the reservation
    pub organization_id: String,
    /// Name of the lead guest
    pub guest_name: String,
    /// Arrival date
    pub date_arrival: NaiveDate,
    /// Departure date, on or after arrival
    pub date_departure: NaiveDate,
    /// Total amount charged for the stay
    pub rate_total: f64,
    /// Booking channel
    pub source: String,
}

/// Counts the organization's active rooms.
pub async fn count_active_rooms<C>(db: &C, organization_id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    Room::find()
        .filter(room::Column::OrganizationId.eq(organization_id))
        .filter(room::Column::IsActive.eq(true))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Lists the organization's active rooms by number.
pub async fn get_active_rooms(
    db: &DatabaseConnection,
    organization_id: &str,
) -> Result<Vec<room::Model>> {
    Room::find()
        .filter(room::Column::OrganizationId.eq(organization_id))
        .filter(room::Column::IsActive.eq(true))
        .order_by_asc(room::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds a room, refusing when the plan's room quota is used up.
#[instrument(skip(db))]
pub async fn create_room(
    db: &DatabaseConnection,
    organization_id: &str,
    number: &str,
    room_type: &str,
) -> Result<room::Model> {
    let number = number.trim();
    if number.is_empty() {
        return Err(Error::Config {
            message: "Room number cannot be empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    usage::ensure_within_limit(&txn, organization_id, Metric::Rooms).await?;

    let room = room::ActiveModel {
        organization_id: Set(organization_id.to_string()),
        number: Set(number.to_string()),
        room_type: Set(room_type.trim().to_string()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    usage::increment_usage(&txn, organization_id, Metric::Rooms, 1).await?;
    txn.commit().await?;

    info!("Created room {} for {}", room.number, organization_id);
    Ok(room)
}

/// Records a confirmed reservation and counts it as a transaction.
#[instrument(skip(db, new), fields(organization_id = %new.organization_id))]
pub async fn create_reservation(
    db: &DatabaseConnection,
    new: NewReservation,
) -> Result<reservation::Model> {
    if new.date_departure < new.date_arrival {
        return Err(Error::InvalidDateRange {
            start: new.date_arrival,
            end: new.date_departure,
        });
    }

    if new.rate_total < 0.0 || !new.rate_total.is_finite() {
        return Err(Error::InvalidAmount {
            amount: new.rate_total,
        });
    }

    let txn = db.begin().await?;

    let reservation = reservation::ActiveModel {
        organization_id: Set(new.organization_id.clone()),
        room_id: Set(None),
        guest_name: Set(new.guest_name.trim().to_string()),
        date_arrival: Set(new.date_arrival),
        date_departure: Set(new.date_departure),
        rate_total: Set(new.rate_total),
        status: Set(ReservationStatus::Confirmed.as_str().to_string()),
        source: Set(new.source.trim().to_lowercase()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    usage::increment_usage(&txn, &new.organization_id, Metric::Transactions, 1).await?;
    txn.commit().await?;

    Ok(reservation)
}

/// Finds a reservation by id.
pub async fn get_reservation_by_id<C>(db: &C, reservation_id: i64) -> Result<reservation::Model>
where
    C: ConnectionTrait,
{
    Reservation::find_by_id(reservation_id)
        .one(db)
        .await?
        .ok_or(Error::ReservationNotFound { reservation_id })
}

fn require_status(
    reservation: &reservation::Model,
    allowed: &[ReservationStatus],
    action: &'static str,
) -> Result<()> {
    let status = ReservationStatus::parse(&reservation.status)?;
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(Error::InvalidStatusTransition {
            action,
            status: reservation.status.clone(),
        })
    }
}

/// Assigns a room of the same organization to a pending or confirmed reservation.
pub async fn assign_room(
    db: &DatabaseConnection,
    reservation_id: i64,
    room_id: i64,
) -> Result<reservation::Model> {
    let txn = db.begin().await?;

    let reservation = get_reservation_by_id(&txn, reservation_id).await?;
    require_status(
        &reservation,
        &[ReservationStatus::Pending, ReservationStatus::Confirmed],
        "assign a room to",
    )?;

    Room::find_by_id(room_id)
        .one(&txn)
        .await?
        .filter(|room| room.is_active && room.organization_id == reservation.organization_id)
        .ok_or(Error::RoomNotFound { room_id })?;

    let mut active_model: reservation::ActiveModel = reservation.into();
    active_model.room_id = Set(Some(room_id));
    let updated = active_model.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

async fn transition(
    db: &DatabaseConnection,
    reservation_id: i64,
    from: ReservationStatus,
    to: ReservationStatus,
    action: &'static str,
) -> Result<reservation::Model> {
    let reservation = get_reservation_by_id(db, reservation_id).await?;
    require_status(&reservation, &[from], action)?;

    if to == ReservationStatus::Present && reservation.room_id.is_none() {
        return Err(Error::InvalidStatusTransition {
            action,
            status: format!("{} (no room assigned)", reservation.status),
        });
    }

    let mut active_model: reservation::ActiveModel = reservation.into();
    active_model.status = Set(to.as_str().to_string());
    active_model.update(db).await.map_err(Into::into)
}

/// Checks a guest in: `confirmed → present`. A room must be assigned first.
pub async fn check_in(db: &DatabaseConnection, reservation_id: i64) -> Result<reservation::Model> {
    transition(
        db,
        reservation_id,
        ReservationStatus::Confirmed,
        ReservationStatus::Present,
        "check in",
    )
    .await
}

/// Checks a guest out: `present → checked_out`.
pub async fn check_out(db: &DatabaseConnection, reservation_id: i64) -> Result<reservation::Model> {
    transition(
        db,
        reservation_id,
        ReservationStatus::Present,
        ReservationStatus::CheckedOut,
        "check out",
    )
    .await
}

/// Loads reservations that occupy a room on at least one night of `[start, end]`.
pub async fn get_occupying_reservations<C>(
    db: &C,
    organization_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<reservation::Model>>
where
    C: ConnectionTrait,
{
    let occupying: Vec<&str> = ReservationStatus::OCCUPYING
        .into_iter()
        .map(ReservationStatus::as_str)
        .collect();

    Reservation::find()
        .filter(reservation::Column::OrganizationId.eq(organization_id))
        .filter(reservation::Column::Status.is_in(occupying))
        .filter(reservation::Column::DateArrival.lte(end))
        // The departure day is not a night; same-day stays occupy their arrival
        .filter(
            Condition::any()
                .add(reservation::Column::DateDeparture.gt(start))
                .add(reservation::Column::DateArrival.gte(start)),
        )
        .order_by_asc(reservation::Column::DateArrival)
        .all(db)
        .await
        .map_err(Into::into)
}
