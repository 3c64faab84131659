//! Reservation entity - A guest stay, the raw input of all occupancy analytics.
//!
//! `date_departure` may equal `date_arrival` for day-use records; those still
//! count as one night.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reservation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    /// Unique identifier for the reservation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant that owns the reservation
    pub organization_id: String,
    /// Assigned room, `None` until a room is assigned
    pub room_id: Option<i64>,
    /// Name of the lead guest
    pub guest_name: String,
    /// Arrival date
    pub date_arrival: Date,
    /// Departure date
    pub date_departure: Date,
    /// Total amount charged for the stay
    pub rate_total: f64,
    /// `"pending"`, `"confirmed"`, `"present"`, `"checked_out"` or `"cancelled"`
    pub status: String,
    /// Booking channel (e.g., "direct", "booking.com")
    pub source: String,
    /// When the reservation was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Reservation and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reservation may occupy one room
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomId",
        to = "super::room::Column::Id"
    )]
    Room,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
