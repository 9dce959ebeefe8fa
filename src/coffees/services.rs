use time::{macros::format_description, Date, Time};
use tracing::info;
use uuid::Uuid;

use super::repo_types::{CoffeeEntry, NewCoffeeEntry};
use crate::{error::ApiError, state::AppState};

pub const INVALID_DATE: &str = "Invalid date format. Use YYYY-MM-DD.";
pub const INVALID_TIME: &str = "Invalid time format. Use HH:MM AM/PM.";

/// Parses the `YYYY-MM-DD` path segment.
pub fn parse_date(raw: &str) -> Result<Date, ApiError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ApiError::validation(INVALID_DATE))
}

/// Parses a 12-hour wall-clock time such as `09:05 AM` or `9:05 pm`.
pub fn parse_time(raw: &str) -> Result<Time, ApiError> {
    Time::parse(
        raw.trim(),
        format_description!("[hour repr:12 padding:none]:[minute] [period case_sensitive:false]"),
    )
    .map_err(|_| ApiError::validation(INVALID_TIME))
}

/// `9:05 AM` style, no leading zero on the hour.
pub fn format_time(t: Time) -> String {
    t.format(format_description!("[hour repr:12 padding:none]:[minute] [period]"))
        .unwrap_or_else(|_| t.to_string())
}

/// Logs one drink for `user_id`, snapshotting the price the user pays now.
pub async fn add_entry(
    state: &AppState,
    user_id: Uuid,
    entry_date: Date,
    coffee_type: &str,
    raw_time: &str,
) -> Result<CoffeeEntry, ApiError> {
    let ty = state.catalog.require(coffee_type)?;
    let entry_time = parse_time(raw_time)?;

    let cost = state
        .store
        .find_price(user_id, &ty.name)
        .await
        .map_err(ApiError::internal("Database error while adding coffee"))?
        .unwrap_or(ty.default_cost);

    let entry = state
        .store
        .insert_entry(NewCoffeeEntry {
            user_id,
            coffee_type: ty.name.clone(),
            entry_date,
            entry_time,
            cost,
        })
        .await
        .map_err(ApiError::internal("Database error while adding coffee"))?;

    info!(
        %user_id,
        entry_id = entry.id,
        coffee_type = %entry.coffee_type,
        date = %entry_date,
        cost,
        "coffee added"
    );
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_date("2024-03-01").unwrap(), date!(2024 - 03 - 01));
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("03/01/2024").is_err());
        assert!(parse_date("2024-3-1").is_err());
    }

    #[test]
    fn parses_twelve_hour_times() {
        assert_eq!(parse_time("09:05 AM").unwrap(), time!(9:05));
        assert_eq!(parse_time("9:05 AM").unwrap(), time!(9:05));
        assert_eq!(parse_time("12:00 AM").unwrap(), time!(0:00));
        assert_eq!(parse_time("12:30 PM").unwrap(), time!(12:30));
        assert_eq!(parse_time("07:45 pm").unwrap(), time!(19:45));
    }

    #[test]
    fn rejects_malformed_times() {
        for raw in ["13:00 PM", "09:60 AM", "0930", "09:30", "nine"] {
            let err = parse_time(raw).unwrap_err();
            assert_eq!(err.to_string(), INVALID_TIME, "{raw}");
        }
    }

    #[test]
    fn formats_without_leading_zero() {
        assert_eq!(format_time(time!(9:05)), "9:05 AM");
        assert_eq!(format_time(time!(0:15)), "12:15 AM");
        assert_eq!(format_time(time!(21:30)), "9:30 PM");
    }

    #[tokio::test]
    async fn add_entry_snapshots_current_price() {
        let state = AppState::fake();
        let user = state.store.create_user("ada", "x").await.unwrap().unwrap();
        let day = date!(2024 - 03 - 01);

        let first = add_entry(&state, user.id, day, "Roma", "09:00 AM").await.unwrap();
        assert_eq!(first.cost, 0.5);

        state
            .store
            .replace_prices(user.id, &[("Roma".to_string(), 0.8)])
            .await
            .unwrap();
        let second = add_entry(&state, user.id, day, "Roma", "10:00 AM").await.unwrap();
        assert_eq!(second.cost, 0.8);

        let rows = state.store.list_entries_for_date(user.id, day).await.unwrap();
        assert_eq!(rows[0].cost, 0.5);
        assert_eq!(rows[1].cost, 0.8);
    }

    #[tokio::test]
    async fn add_entry_rejects_unknown_type_before_time() {
        let state = AppState::fake();
        let err = add_entry(&state, Uuid::new_v4(), date!(2024 - 03 - 01), "Mocha", "bad")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown coffee type: Mocha");
    }
}
