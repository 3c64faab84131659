//! Front-desk Discord commands - rooms, bookings, check-in/out and notifications.
//!
//! Every reservation write publishes a row change so `/notifications` can
//! report it.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::parse_date, handlers::autocomplete},
        core::reservation::{self as front_desk, NewReservation},
        entities::reservation,
        errors::{Error, Result},
        notifications::{ChangeKind, RowChange, WatchedTable},
    };
    use std::fmt::Write;

    /// Loads a reservation, treating other organizations' bookings as missing.
    async fn owned_reservation(
        ctx: poise::Context<'_, BotData, Error>,
        reservation_id: i64,
    ) -> Result<reservation::Model> {
        let data = ctx.data();
        let found = front_desk::get_reservation_by_id(&data.database, reservation_id).await?;
        if found.organization_id != data.organization_id {
            return Err(Error::ReservationNotFound { reservation_id });
        }
        Ok(found)
    }

    fn publish_update(ctx: poise::Context<'_, BotData, Error>, updated: &reservation::Model) {
        ctx.data().publish(RowChange::now(
            WatchedTable::Reservations,
            ChangeKind::Update,
            &updated.organization_id,
            updated.id,
        ));
    }

    /// Adds a room, counted against the plan's room quota.
    #[poise::command(slash_command, prefix_command)]
    pub async fn add_room(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Room number (e.g., '101')"] number: String,
        #[description = "Room type (e.g., 'double')"] room_type: String,
    ) -> Result<()> {
        let data = ctx.data();
        let room =
            front_desk::create_room(&data.database, &data.organization_id, &number, &room_type)
                .await?;
        let total = front_desk::count_active_rooms(&data.database, &data.organization_id).await?;

        ctx.say(format!(
            "✅ Added room **{}** ({}) as #{}. Active rooms: {total}.",
            room.number, room.room_type, room.id
        ))
        .await?;
        Ok(())
    }

    /// Records a confirmed reservation.
    #[poise::command(slash_command, prefix_command)]
    pub async fn book(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Lead guest name"] guest_name: String,
        #[description = "Arrival (YYYY-MM-DD)"] arrival: String,
        #[description = "Departure (YYYY-MM-DD)"] departure: String,
        #[description = "Total rate for the stay"] rate_total: f64,
        #[description = "Booking source (defaults to 'direct')"]
        #[autocomplete = "autocomplete::autocomplete_source"]
        source: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let new = NewReservation {
            organization_id: data.organization_id.clone(),
            guest_name,
            date_arrival: parse_date(&arrival)?,
            date_departure: parse_date(&departure)?,
            rate_total,
            source: source.unwrap_or_else(|| "direct".to_string()),
        };

        let created = front_desk::create_reservation(&data.database, new).await?;
        data.publish(RowChange::now(
            WatchedTable::Reservations,
            ChangeKind::Insert,
            &created.organization_id,
            created.id,
        ));

        ctx.say(format!(
            "✅ Reservation #{} for **{}**: {} to {}, ${:.2} via {}.",
            created.id,
            created.guest_name,
            created.date_arrival,
            created.date_departure,
            created.rate_total,
            created.source
        ))
        .await?;
        Ok(())
    }

    /// Assigns a room to a pending or confirmed reservation.
    #[poise::command(slash_command, prefix_command)]
    pub async fn assign_room(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Reservation id"] reservation_id: i64,
        #[description = "Room id"] room_id: i64,
    ) -> Result<()> {
        owned_reservation(ctx, reservation_id).await?;
        let updated = front_desk::assign_room(&ctx.data().database, reservation_id, room_id).await?;
        publish_update(ctx, &updated);

        ctx.say(format!(
            "🛏️ Room #{room_id} assigned to reservation #{} ({}).",
            updated.id, updated.guest_name
        ))
        .await?;
        Ok(())
    }

    /// Checks a guest in.
    #[poise::command(slash_command, prefix_command)]
    pub async fn checkin(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Reservation id"] reservation_id: i64,
    ) -> Result<()> {
        owned_reservation(ctx, reservation_id).await?;
        let updated = front_desk::check_in(&ctx.data().database, reservation_id).await?;
        publish_update(ctx, &updated);

        ctx.say(format!("🔑 {} checked in.", updated.guest_name))
            .await?;
        Ok(())
    }

    /// Checks a guest out.
    #[poise::command(slash_command, prefix_command)]
    pub async fn checkout(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Reservation id"] reservation_id: i64,
    ) -> Result<()> {
        owned_reservation(ctx, reservation_id).await?;
        let updated = front_desk::check_out(&ctx.data().database, reservation_id).await?;
        publish_update(ctx, &updated);

        ctx.say(format!("👋 {} checked out.", updated.guest_name))
            .await?;
        Ok(())
    }

    /// Shows unread reservation and payment changes.
    #[poise::command(slash_command, prefix_command)]
    pub async fn notifications(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Reset the unread counters afterwards"] mark_read: Option<bool>,
    ) -> Result<()> {
        let mut state = ctx.data().notification_state.write().await;

        let mut response = format!("🔔 **{} unread**\n", state.unread_count());
        writeln!(
            &mut response,
            "Reservations: {} new, {} updated",
            state.new_reservations, state.updated_reservations
        )?;
        writeln!(
            &mut response,
            "Payments: {} new, {} updated\n",
            state.new_payments, state.updated_payments
        )?;
        for change in state.recent.iter().take(10) {
            writeln!(
                &mut response,
                "• {} ({})",
                change.describe(),
                change.occurred_at.format("%Y-%m-%d %H:%M UTC")
            )?;
        }

        if mark_read.unwrap_or(false) {
            state.mark_all_read();
        }
        drop(state);

        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
