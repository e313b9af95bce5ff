use crate::value::Value;

///
/// Filter
///
/// Closed set of lookups `find` can dispatch. Each variant names the index
/// it runs against by its field names.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Filter {
    /// Full table scan in id order.
    #[default]
    All,
    Hash(HashFilter),
    Prefix(PrefixFilter),
    Interval(IntervalFilter),
}

impl From<HashFilter> for Filter {
    fn from(filter: HashFilter) -> Self {
        Self::Hash(filter)
    }
}

impl From<PrefixFilter> for Filter {
    fn from(filter: PrefixFilter) -> Self {
        Self::Prefix(filter)
    }
}

impl From<IntervalFilter> for Filter {
    fn from(filter: IntervalFilter) -> Self {
        Self::Interval(filter)
    }
}

///
/// HashFilter
///
/// Equality on every field of one hash index. `None` matches null.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HashFilter {
    pub fields: Vec<(String, Option<Value>)>,
}

impl HashFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), Some(value.into())));
        self
    }

    #[must_use]
    pub fn null(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), None));
        self
    }
}

///
/// PrefixFilter
///
/// Word-prefix search over the text fields of one prefix index.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrefixFilter {
    pub fields: Vec<String>,
    pub phrase: String,
}

impl PrefixFilter {
    #[must_use]
    pub fn new(fields: &[&str], phrase: impl Into<String>) -> Self {
        Self {
            fields: fields.iter().map(ToString::to_string).collect(),
            phrase: phrase.into(),
        }
    }
}

///
/// IntervalTarget
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntervalTarget {
    /// Intervals containing the point.
    Point(i64),
    /// Intervals overlapping the half-open range.
    Range { begin: i64, end: i64 },
}

///
/// IntervalFilter
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IntervalFilter {
    pub hashed: Vec<(String, Option<Value>)>,
    pub begin_field: String,
    pub end_field: String,
    pub target: IntervalTarget,
}

impl IntervalFilter {
    #[must_use]
    pub fn contains(
        begin_field: impl Into<String>,
        end_field: impl Into<String>,
        point: i64,
    ) -> Self {
        Self {
            hashed: Vec::new(),
            begin_field: begin_field.into(),
            end_field: end_field.into(),
            target: IntervalTarget::Point(point),
        }
    }

    #[must_use]
    pub fn overlaps(
        begin_field: impl Into<String>,
        end_field: impl Into<String>,
        begin: i64,
        end: i64,
    ) -> Self {
        Self {
            hashed: Vec::new(),
            begin_field: begin_field.into(),
            end_field: end_field.into(),
            target: IntervalTarget::Range { begin, end },
        }
    }

    /// Restrict to the hash group with `field == value`.
    #[must_use]
    pub fn group(mut self, field: impl Into<String>, value: Option<Value>) -> Self {
        self.hashed.push((field.into(), value));
        self
    }
}
