use std::fmt;
use std::hash::{Hash, Hasher};

use strum::{Display, EnumCount, EnumIter};

use crate::errors::ScheduleError;
use crate::numeric::{find_max, find_min, find_unique, make_range};

/// The six units of a schedule, in pattern order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount)]
#[strum(serialize_all = "kebab-case")]
pub enum Field {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

/// Position of each field in a pattern string.
pub const FIELD_ORDER: [Field; Field::COUNT] = [
    Field::Second,
    Field::Minute,
    Field::Hour,
    Field::DayOfMonth,
    Field::Month,
    Field::DayOfWeek,
];

/// Inclusive bounds of the values a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain {
    pub min: u32,
    pub max: u32,
}

impl Domain {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Field {
    /// Allowed values for this field. Day-of-week 0 is Sunday.
    pub const fn domain(self) -> Domain {
        match self {
            Field::Second | Field::Minute => Domain::new(0, 59),
            Field::Hour => Domain::new(0, 23),
            Field::DayOfMonth => Domain::new(1, 31),
            Field::Month => Domain::new(1, 12),
            Field::DayOfWeek => Domain::new(0, 6),
        }
    }
}

/// A non-empty, strictly ascending set of values inside one field's domain.
///
/// Only [`parse_field`] builds these, after validating the bounds, so the search code
/// can rely on `min()` and `max()` without re-checking the domain.
#[derive(Debug, Clone)]
pub struct ValueSet {
    values: Vec<u32>,
    text: String,
}

impl ValueSet {
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> u32 {
        self.values[0]
    }

    pub fn max(&self) -> u32 {
        self.values[self.values.len() - 1]
    }

    pub fn contains(&self, value: u32) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    /// The token this set was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn is_contiguous(&self) -> bool {
        self.max() - self.min() + 1 == self.values.len() as u32
    }
}

impl PartialEq for ValueSet {
    // The source text is presentation only; `5-2` and `2-5` are the same set.
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for ValueSet {}

impl Hash for ValueSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.len() > 1 && self.is_contiguous() {
            return write!(f, "{}-{}", self.min(), self.max());
        }
        let rendered: Vec<String> = self.values.iter().map(u32::to_string).collect();
        write!(f, "{}", rendered.join(","))
    }
}

/// One parsed field of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSpec {
    /// Matches every value of the domain. Holds the token it was parsed from.
    Wildcard(Wildcard),
    /// Matches only the listed values.
    Explicit(ValueSet),
}

/// Text of a wildcard token, kept for diagnostics only.
#[derive(Debug, Clone)]
pub struct Wildcard {
    text: String,
}

impl Wildcard {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Wildcard {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Wildcard {}

impl Hash for Wildcard {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

impl FieldSpec {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, FieldSpec::Wildcard(_))
    }

    /// The explicit set, if this field restricts its values.
    pub fn explicit(&self) -> Option<&ValueSet> {
        match self {
            FieldSpec::Wildcard(_) => None,
            FieldSpec::Explicit(set) => Some(set),
        }
    }

    /// The token this field was parsed from.
    pub fn text(&self) -> &str {
        match self {
            FieldSpec::Wildcard(wildcard) => wildcard.text(),
            FieldSpec::Explicit(set) => set.text(),
        }
    }

    pub fn matches(&self, value: u32) -> bool {
        match self {
            FieldSpec::Wildcard(_) => true,
            FieldSpec::Explicit(set) => set.contains(value),
        }
    }

    /// Smallest value this field accepts within `domain`.
    pub fn min(&self, domain: Domain) -> u32 {
        match self {
            FieldSpec::Wildcard(_) => domain.min,
            FieldSpec::Explicit(set) => set.min(),
        }
    }

    /// First accepted value that is `>= floor`, if any is left in the domain.
    pub fn first_at_or_after(&self, floor: u32, domain: Domain) -> Option<u32> {
        match self {
            FieldSpec::Wildcard(_) => {
                let candidate = floor.max(domain.min);
                domain.contains(candidate).then_some(candidate)
            }
            FieldSpec::Explicit(set) => set.values.iter().copied().find(|&v| v >= floor),
        }
    }

    /// Accepted values `>= floor`, ascending.
    pub fn candidates(&self, floor: u32, domain: Domain) -> Vec<u32> {
        match self {
            FieldSpec::Wildcard(_) => (floor.max(domain.min)..=domain.max).collect(),
            FieldSpec::Explicit(set) => {
                set.values.iter().copied().filter(|&v| v >= floor).collect()
            }
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Wildcard(_) => write!(f, "*"),
            FieldSpec::Explicit(set) => set.fmt(f),
        }
    }
}

/// Parses a single field token and validates it against `field`'s domain.
///
/// Tokens are classified in priority order: anything containing `*` is a wildcard,
/// then `a-b` ranges, then `a,b,c` lists, then a single number. Separators are
/// never combined, so `11-15,16` fails on the sub-token `15,16`.
pub fn parse_field(token: &str, field: Field) -> Result<FieldSpec, ScheduleError> {
    if token.contains('*') {
        return Ok(FieldSpec::Wildcard(Wildcard {
            text: token.to_string(),
        }));
    }

    let values = if token.contains('-') {
        let bounds: Vec<&str> = token.split('-').collect();
        if bounds.len() != 2 {
            return Err(ScheduleError::RangeFormat {
                token: token.to_string(),
                parts: bounds.len(),
            });
        }
        make_range(parse_number(bounds[0])?, parse_number(bounds[1])?)
    } else if token.contains(',') {
        let list = token
            .split(',')
            .map(parse_number)
            .collect::<Result<Vec<u32>, _>>()?;
        find_unique(list)
    } else {
        vec![parse_number(token)?]
    };

    let set = ValueSet {
        values,
        text: token.to_string(),
    };
    check_domain(&set, field)?;
    Ok(FieldSpec::Explicit(set))
}

fn parse_number(token: &str) -> Result<u32, ScheduleError> {
    token.parse::<u32>().map_err(|_| ScheduleError::NumericParse {
        token: token.to_string(),
    })
}

fn check_domain(set: &ValueSet, field: Field) -> Result<(), ScheduleError> {
    let domain = field.domain();
    let (Some(found_min), Some(found_max)) = (find_min(&set.values), find_max(&set.values))
    else {
        return Err(ScheduleError::NumericParse {
            token: set.text.clone(),
        });
    };
    if !domain.contains(found_min) || !domain.contains(found_max) {
        return Err(ScheduleError::DomainRange {
            field,
            min: domain.min,
            max: domain.max,
            found_min,
            found_max,
            token: set.text.clone(),
        });
    }
    Ok(())
}
