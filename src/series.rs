use crate::error::{Result, TranslateError};

/// The metric type that switches on bucket handling.
pub const HISTOGRAM: &str = "histogram";

/// Upper bound of the implicit last histogram bucket.
pub const INF_BOUND: &str = "+Inf";

/// One option of the input stream, in command line order.
///
/// Values are kept verbatim: timestamps, bounds and counts are opaque strings
/// that end up in the output unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flag {
    Name(String),
    Type(String),
    Comment(String),
    Label(String),
    Timestamp(String),
    Le(String),
    Count(String),
    TotalCount(String),
    Value(String),
    /// A free token that is not an option at all.
    Stray(String),
}

impl Flag {
    /// Builds a flag from its long option name (without the leading dashes).
    /// Example:
    /// ```
    /// use prom_textfile::series::Flag;
    /// assert_eq!(Flag::from_long("total-count", "3"), Some(Flag::TotalCount("3".into())));
    /// assert_eq!(Flag::from_long("le", "0.5"), Some(Flag::Le("0.5".into())));
    /// assert!(Flag::from_long("bogus", "1").is_none());
    /// ```
    pub fn from_long(long: &str, arg: &str) -> Option<Flag> {
        let arg = arg.to_string();
        let flag = match long {
            "name" => Flag::Name(arg),
            "type" => Flag::Type(arg),
            "comment" => Flag::Comment(arg),
            "label" => Flag::Label(arg),
            "timestamp" => Flag::Timestamp(arg),
            "le" => Flag::Le(arg),
            "count" => Flag::Count(arg),
            "total-count" => Flag::TotalCount(arg),
            "value" => Flag::Value(arg),
            _ => return None,
        };
        Some(flag)
    }
}

/// Labels of one sample group, kept in first-insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    entries: Vec<(String, String)>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a label; an existing name keeps its position and gets the new value.
    pub fn insert(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    /// Parses and inserts a `NAME=VALUE` pair, splitting on the first `=`.
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                self.insert(name, value);
                Ok(())
            }
            _ => Err(TranslateError::MalformedLabel(pair.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub bound: String,
    pub count: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sample {
    Scalar(String),
    /// Buckets in accumulation order, the `+Inf` one last.
    Histogram {
        buckets: Vec<Bucket>,
        sum: String,
        count: String,
    },
}

/// A completed sample group, ready to be formatted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    /// `None` means the metric is untyped.
    pub metric_type: Option<String>,
    pub comment: String,
    pub labels: LabelSet,
    pub timestamp: Option<String>,
    pub sample: Sample,
}
