use crate::error::{Result, SalesReportError};
use chrono::{Datelike, Days, Local, NaiveDate};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Regression features for a date: (day of year 1-366, calendar year).
pub fn date_features(date: NaiveDate) -> (f64, f64) {
    (date.ordinal() as f64, date.year() as f64)
}

/// The `horizon_days` consecutive dates that follow `reference`, earliest first.
///
/// Dates are produced lazily; a date past the end of the calendar yields a
/// `DateError` in its place.
pub fn future_dates(
    reference: NaiveDate,
    horizon_days: u32,
) -> impl Iterator<Item = Result<NaiveDate>> {
    (1..=u64::from(horizon_days)).map(move |offset| {
        reference.checked_add_days(Days::new(offset)).ok_or_else(|| {
            SalesReportError::DateError(format!(
                "{} plus {} days is out of the supported calendar range",
                reference, offset
            ))
        })
    })
}
