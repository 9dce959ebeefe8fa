use std::collections::BTreeMap;

use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

use super::dto::{ReportResponse, TypeBreakdown};
use crate::{
    catalog::Catalog, coffees::repo_types::TypeTotals, config::ReportConfig, error::ApiError,
    state::AppState,
};

/// Year, or year + month, a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    Year(i32),
    Month { year: i32, month: Month },
}

impl ReportWindow {
    pub fn year(&self) -> i32 {
        match self {
            ReportWindow::Year(y) | ReportWindow::Month { year: y, .. } => *y,
        }
    }

    pub fn month(&self) -> Option<u8> {
        match self {
            ReportWindow::Year(_) => None,
            ReportWindow::Month { month, .. } => Some(*month as u8),
        }
    }

    /// Half-open date range `[from, until)`.
    pub fn bounds(&self) -> Result<(Date, Date), ApiError> {
        let invalid = |_| ApiError::validation("Invalid year.");
        match *self {
            ReportWindow::Year(year) => Ok((
                Date::from_calendar_date(year, Month::January, 1).map_err(invalid)?,
                Date::from_calendar_date(year + 1, Month::January, 1).map_err(invalid)?,
            )),
            ReportWindow::Month { year, month } => {
                let (next_year, next_month) = match month {
                    Month::December => (year + 1, Month::January),
                    m => (year, m.next()),
                };
                Ok((
                    Date::from_calendar_date(year, month, 1).map_err(invalid)?,
                    Date::from_calendar_date(next_year, next_month, 1).map_err(invalid)?,
                ))
            }
        }
    }
}

/// Inclusive range of years a report may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(cfg: &ReportConfig, current_year: i32) -> Self {
        Self {
            min: cfg.min_year,
            max: current_year.saturating_add(cfg.years_ahead),
        }
    }

    pub fn current(cfg: &ReportConfig) -> Self {
        Self::new(cfg, OffsetDateTime::now_utc().year())
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// Narrows a parsed year to one `range` accepts.
fn checked_year(year: i64, range: YearRange) -> Option<i32> {
    i32::try_from(year).ok().filter(|y| range.contains(*y))
}

pub fn monthly_window(
    year: Option<&str>,
    month: Option<&str>,
    range: YearRange,
) -> Result<ReportWindow, ApiError> {
    let (Some(year), Some(month)) = (parse_int(year), parse_int(month)) else {
        return Err(ApiError::validation("Year/month required as integers."));
    };
    let invalid = || ApiError::validation("Invalid year or month.");
    let month = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(invalid)?;
    let year = checked_year(year, range).ok_or_else(invalid)?;
    Ok(ReportWindow::Month { year, month })
}

pub fn yearly_window(year: Option<&str>, range: YearRange) -> Result<ReportWindow, ApiError> {
    let year = parse_int(year).ok_or_else(|| ApiError::validation("Year required as integer."))?;
    let year = checked_year(year, range).ok_or_else(|| ApiError::validation("Invalid year."))?;
    Ok(ReportWindow::Year(year))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Only(String),
}

impl TypeFilter {
    pub fn parse(raw: Option<&str>, catalog: &Catalog) -> Result<Self, ApiError> {
        match raw {
            None | Some("All") => Ok(TypeFilter::All),
            Some(name) if catalog.contains(name) => Ok(TypeFilter::Only(name.to_string())),
            Some(name) => Err(ApiError::validation(format!("Invalid coffee type: {}", name))),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TypeFilter::All => "All",
            TypeFilter::Only(name) => name,
        }
    }

    pub fn coffee_type(&self) -> Option<&str> {
        match self {
            TypeFilter::All => None,
            TypeFilter::Only(name) => Some(name),
        }
    }
}

/// Unrounded totals over a set of per-type groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total_coffees: i64,
    pub total_cost: f64,
    pub breakdown: BTreeMap<String, (i64, f64)>,
}

/// Reduces grouped rows into totals. The breakdown is only filled for
/// `TypeFilter::All`.
pub fn summarize(groups: &[TypeTotals], filter: &TypeFilter) -> Summary {
    let mut summary = Summary::default();
    for g in groups {
        match filter {
            TypeFilter::All => {
                let slot = summary
                    .breakdown
                    .entry(g.coffee_type.clone())
                    .or_insert((0, 0.0));
                slot.0 += g.count;
                slot.1 += g.total_cost;
            }
            TypeFilter::Only(name) if *name != g.coffee_type => continue,
            TypeFilter::Only(_) => {}
        }
        summary.total_coffees += g.count;
        summary.total_cost += g.total_cost;
    }
    summary
}

/// Σ count × volume; types missing from the catalog count as zero.
pub fn total_volume_ml(groups: &[TypeTotals], catalog: &Catalog) -> i64 {
    groups
        .iter()
        .filter_map(|g| catalog.volume_of(&g.coffee_type).map(|v| v * g.count))
        .sum()
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn to_response(
    window: ReportWindow,
    filter: &TypeFilter,
    summary: Summary,
    currency_symbol: &str,
) -> ReportResponse {
    let breakdown_by_type: BTreeMap<String, TypeBreakdown> = summary
        .breakdown
        .into_iter()
        .map(|(name, (count, cost))| {
            (
                name,
                TypeBreakdown {
                    count,
                    cost: round_cents(cost),
                },
            )
        })
        .collect();

    // Sum of the rounded breakdown costs.
    let total_cost = if breakdown_by_type.is_empty() {
        round_cents(summary.total_cost)
    } else {
        round_cents(breakdown_by_type.values().map(|b| b.cost).sum())
    };

    ReportResponse {
        year: window.year(),
        month: window.month(),
        coffee_type_filter: filter.label().to_string(),
        total_coffees: summary.total_coffees,
        total_cost,
        currency_symbol: currency_symbol.to_string(),
        breakdown_by_type,
    }
}

pub async fn build_report(
    state: &AppState,
    user_id: Uuid,
    window: ReportWindow,
    filter: TypeFilter,
) -> Result<ReportResponse, ApiError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await
        .map_err(ApiError::internal("Database error"))?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let (from, until) = window.bounds()?;
    let groups = state
        .store
        .type_totals(user_id, from, until, filter.coffee_type())
        .await
        .map_err(ApiError::internal("Database error"))?;

    let summary = summarize(&groups, &filter);
    Ok(to_response(window, &filter, summary, &user.currency_symbol))
}

pub async fn yearly_volume(state: &AppState, user_id: Uuid, year: i32) -> Result<i64, ApiError> {
    let (from, until) = ReportWindow::Year(year).bounds()?;
    let groups = state
        .store
        .type_totals(user_id, from, until, None)
        .await
        .map_err(ApiError::internal("Database error"))?;
    Ok(total_volume_ml(&groups, &state.catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn group(name: &str, count: i64, total_cost: f64) -> TypeTotals {
        TypeTotals {
            coffee_type: name.into(),
            count,
            total_cost,
        }
    }

    fn range() -> YearRange {
        YearRange::new(&ReportConfig::default(), 2024)
    }

    #[test]
    fn month_bounds_roll_over_december() {
        let w = ReportWindow::Month {
            year: 2024,
            month: Month::December,
        };
        assert_eq!(w.bounds().unwrap(), (date!(2024 - 12 - 01), date!(2025 - 01 - 01)));

        let feb = ReportWindow::Month {
            year: 2024,
            month: Month::February,
        };
        assert_eq!(feb.bounds().unwrap(), (date!(2024 - 02 - 01), date!(2024 - 03 - 01)));
    }

    #[test]
    fn year_bounds_cover_whole_year() {
        assert_eq!(
            ReportWindow::Year(2023).bounds().unwrap(),
            (date!(2023 - 01 - 01), date!(2024 - 01 - 01))
        );
    }

    #[test]
    fn monthly_window_validation_messages() {
        let err = monthly_window(Some("2024"), None, range()).unwrap_err();
        assert_eq!(err.to_string(), "Year/month required as integers.");

        let err = monthly_window(Some("2024"), Some("13"), range()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid year or month.");

        let err = monthly_window(Some("1999"), Some("3"), range()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid year or month.");

        let ok = monthly_window(Some("2024"), Some("03"), range()).unwrap();
        assert_eq!(ok.month(), Some(3));
    }

    #[test]
    fn out_of_range_integers_are_invalid_not_malformed() {
        for (year, month) in [("2024", "300"), ("2024", "-1"), ("2024", "0"), ("99999999999", "3")] {
            let err = monthly_window(Some(year), Some(month), range()).unwrap_err();
            assert_eq!(err.to_string(), "Invalid year or month.", "{year}-{month}");
        }
        assert_eq!(
            yearly_window(Some("99999999999"), range()).unwrap_err().to_string(),
            "Invalid year."
        );
        assert_eq!(
            yearly_window(Some("-5"), range()).unwrap_err().to_string(),
            "Invalid year."
        );
    }

    #[test]
    fn year_range_saturates_on_huge_lookahead() {
        let cfg = ReportConfig {
            min_year: 2000,
            years_ahead: i32::MAX,
        };
        assert_eq!(YearRange::new(&cfg, 2024).max, i32::MAX);
    }

    #[test]
    fn yearly_window_respects_range() {
        assert!(yearly_window(Some("2029"), range()).is_ok());
        assert_eq!(
            yearly_window(Some("2030"), range()).unwrap_err().to_string(),
            "Invalid year."
        );
        assert_eq!(
            yearly_window(Some("abc"), range()).unwrap_err().to_string(),
            "Year required as integer."
        );
    }

    #[test]
    fn type_filter_parsing() {
        let catalog = Catalog::builtin();
        assert_eq!(TypeFilter::parse(None, &catalog).unwrap(), TypeFilter::All);
        assert_eq!(TypeFilter::parse(Some("All"), &catalog).unwrap(), TypeFilter::All);
        assert_eq!(
            TypeFilter::parse(Some("Roma"), &catalog).unwrap(),
            TypeFilter::Only("Roma".into())
        );
        assert_eq!(
            TypeFilter::parse(Some("Latte"), &catalog).unwrap_err().to_string(),
            "Invalid coffee type: Latte"
        );
        assert_eq!(
            TypeFilter::parse(Some(""), &catalog).unwrap_err().to_string(),
            "Invalid coffee type: "
        );
    }

    #[test]
    fn rounded_breakdown_adds_up_to_total() {
        let groups = vec![group("Cosi", 1, 0.334), group("Roma", 1, 0.334)];
        let s = summarize(&groups, &TypeFilter::All);
        let r = to_response(ReportWindow::Year(2024), &TypeFilter::All, s, "€");
        let parts: f64 = r.breakdown_by_type.values().map(|b| b.cost).sum();
        assert_eq!(r.total_cost, 0.66);
        assert!((parts - r.total_cost).abs() < 1e-9);
    }

    #[test]
    fn breakdown_sums_to_totals() {
        let groups = vec![group("Cosi", 3, 1.47), group("Roma", 2, 1.0), group("Vienna", 1, 0.54)];
        let s = summarize(&groups, &TypeFilter::All);

        let count: i64 = s.breakdown.values().map(|(c, _)| c).sum();
        let cost: f64 = s.breakdown.values().map(|(_, c)| c).sum();
        assert_eq!(count, s.total_coffees);
        assert!((cost - s.total_cost).abs() < 1e-9);
        assert_eq!(s.total_coffees, 6);
    }

    #[test]
    fn filtered_summary_has_no_breakdown() {
        let groups = vec![group("Roma", 2, 1.0)];
        let s = summarize(&groups, &TypeFilter::Only("Roma".into()));
        assert_eq!(s.total_coffees, 2);
        assert_eq!(s.total_cost, 1.0);
        assert!(s.breakdown.is_empty());
    }

    #[test]
    fn empty_groups_give_zero_report() {
        let s = summarize(&[], &TypeFilter::All);
        let r = to_response(ReportWindow::Year(2024), &TypeFilter::All, s, "€");
        assert_eq!(r.total_coffees, 0);
        assert_eq!(r.total_cost, 0.0);
        assert!(r.breakdown_by_type.is_empty());
        assert_eq!(r.month, None);
    }

    #[test]
    fn cost_is_rounded_only_in_response() {
        let groups = vec![group("Chiaro", 3, 0.55 + 0.55 + 0.55)];
        let s = summarize(&groups, &TypeFilter::All);
        assert_ne!(s.total_cost, 1.65);
        let r = to_response(ReportWindow::Year(2024), &TypeFilter::All, s, "€");
        assert_eq!(r.total_cost, 1.65);
        assert_eq!(r.breakdown_by_type["Chiaro"].cost, 1.65);
    }

    #[test]
    fn volume_ignores_unknown_types() {
        let catalog = Catalog::builtin();
        let groups = vec![group("Roma", 2, 1.0), group("Vienna", 1, 0.54), group("Retired", 5, 2.5)];
        assert_eq!(total_volume_ml(&groups, &catalog), 2 * 40 + 90);
    }
}
