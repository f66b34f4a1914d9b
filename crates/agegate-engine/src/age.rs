use chrono::{Datelike, NaiveDate};

/// Whole years of age on `as_of` for someone born on `birth`.
///
/// The year difference, minus one when the birthday has not yet come round in
/// the `as_of` year. Someone born on 29 February has their birthday on
/// 1 March in non-leap years.
pub fn age_on(birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let years = as_of.year() - birth.year();
    if (as_of.month(), as_of.day()) < (birth.month(), birth.day()) {
        years - 1
    } else {
        years
    }
}

/// Whether someone born on `birth` has reached `adult_age` by `as_of`.
pub fn is_adult(birth: NaiveDate, as_of: NaiveDate, adult_age: u32) -> bool {
    i64::from(age_on(birth, as_of)) >= i64::from(adult_age)
}
