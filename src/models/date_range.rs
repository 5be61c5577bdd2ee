use chrono::NaiveDate;

use crate::error::ConfigError;

/// Inclusive span of calendar days. Construction rejects `start > end`, so
/// every value expands to at least one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Resolve the CLI's two date modes into a range.
    ///
    /// Exactly one of `date` or the `start`/`end` pair must be present.
    pub fn from_args(
        date: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, ConfigError> {
        match (date, start, end) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ConfigError::ConflictingDateModes),
            (Some(date), None, None) => Ok(Self::single(parse_date(date)?)),
            (None, Some(start), Some(end)) => Self::new(parse_date(start)?, parse_date(end)?),
            (None, Some(_), None) => Err(ConfigError::MissingEndDate),
            (None, None, Some(_)) => Err(ConfigError::MissingStartDate),
            (None, None, None) => Err(ConfigError::MissingDate),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every day from start to end, ascending, both ends included.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }

    pub fn expand(&self) -> Vec<NaiveDate> {
        self.days().collect()
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        value: value.to_string(),
    })
}
