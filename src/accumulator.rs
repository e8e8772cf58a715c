use std::mem;

use log::{debug, warn};

use crate::error::{Result, TranslateError};
use crate::series::{Bucket, Flag, LabelSet, Sample, Series, HISTOGRAM, INF_BOUND};

/// Histogram fields of the group being built.
#[derive(Debug, Default)]
struct HistogramState {
    buckets: Vec<Bucket>,
    pending_bound: Option<String>,
    total_count: Option<String>,
    /// The bucket option that started the histogram.
    first_flag: Option<&'static str>,
}

impl HistogramState {
    fn note_flag(&mut self, flag: &'static str) {
        self.first_flag.get_or_insert(flag);
    }

    fn is_started(&self) -> bool {
        !self.buckets.is_empty() || self.pending_bound.is_some() || self.total_count.is_some()
    }
}

/// A completed series plus whether its header block has to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Emission {
    pub series: Series,
    pub header: bool,
}

/// Walks the option stream and builds one [`Series`] per `--value`.
///
/// The fields hold the sample group currently being formed. Only the metric
/// name (and the labels, until the next group starts) survive an emission.
#[derive(Debug, Default)]
pub struct Accumulator {
    name: Option<String>,
    declared_type: Option<String>,
    comment: String,
    labels: LabelSet,
    timestamp: Option<String>,
    histogram: HistogramState,
    last_emitted: Option<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one option. Returns the emission when the option was a `--value`.
    pub fn apply(&mut self, flag: Flag) -> Result<Option<Emission>> {
        match flag {
            Flag::Name(name) => self.set_name(name),
            Flag::Type(metric_type) => self.set_type(metric_type),
            Flag::Comment(comment) => self.set_comment(comment),
            Flag::Label(pair) => self.add_label(&pair)?,
            Flag::Timestamp(timestamp) => self.set_timestamp(timestamp),
            Flag::Le(bound) => self.bucket_bound(bound)?,
            Flag::Count(count) => self.bucket_count(count)?,
            Flag::TotalCount(count) => self.total_count(count)?,
            Flag::Value(value) => return self.emit(value).map(Some),
            Flag::Stray(arg) => return Err(TranslateError::UnexpectedArgument(arg)),
        }
        Ok(None)
    }

    // Name, type, comment and labels open a new group: the previous
    // timestamp and labels no longer apply.
    fn start_group(&mut self) {
        self.timestamp = None;
        self.labels.clear();
    }

    // An empty argument leaves the field unset.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name).filter(|n| !n.is_empty());
        self.start_group();
    }

    pub fn set_type(&mut self, metric_type: String) {
        self.declared_type = Some(metric_type).filter(|t| !t.is_empty());
        self.start_group();
    }

    pub fn set_comment(&mut self, comment: String) {
        self.comment = comment;
        self.start_group();
    }

    pub fn add_label(&mut self, pair: &str) -> Result<()> {
        self.labels.insert_pair(pair)?;
        self.timestamp = None;
        Ok(())
    }

    pub fn set_timestamp(&mut self, timestamp: String) {
        self.timestamp = Some(timestamp).filter(|t| !t.is_empty());
    }

    /// The declared type, or `histogram` when bucket options were used
    /// without one.
    fn effective_type(&self) -> Option<&str> {
        match self.declared_type.as_deref() {
            Some(t) => Some(t),
            None if self.histogram.is_started() => Some(HISTOGRAM),
            None => None,
        }
    }

    fn require_histogram(&self, flag: &'static str) -> Result<()> {
        match self.declared_type.as_deref() {
            Some(t) if t != HISTOGRAM => Err(TranslateError::TypeConflict {
                flag,
                declared: t.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn require_no_pending_bound(&self) -> Result<()> {
        match &self.histogram.pending_bound {
            Some(bound) => Err(TranslateError::UnmatchedBound(bound.clone())),
            None => Ok(()),
        }
    }

    pub fn bucket_bound(&mut self, bound: String) -> Result<()> {
        self.require_histogram("le")?;
        self.require_no_pending_bound()?;
        self.histogram.note_flag("le");
        self.histogram.pending_bound = Some(bound);
        Ok(())
    }

    pub fn bucket_count(&mut self, count: String) -> Result<()> {
        self.require_histogram("count")?;
        let bound = self
            .histogram
            .pending_bound
            .take()
            .ok_or_else(|| TranslateError::MissingBound(count.clone()))?;
        self.histogram.buckets.push(Bucket { bound, count });
        Ok(())
    }

    pub fn total_count(&mut self, count: String) -> Result<()> {
        self.require_histogram("total-count")?;
        self.require_no_pending_bound()?;
        if self.histogram.total_count.is_some() {
            return Err(TranslateError::DuplicateTotalCount);
        }
        self.histogram.note_flag("total-count");
        self.histogram.buckets.push(Bucket {
            bound: INF_BOUND.to_string(),
            count: count.clone(),
        });
        self.histogram.total_count = Some(count);
        Ok(())
    }

    /// Closes the current group into a series.
    pub fn emit(&mut self, value: String) -> Result<Emission> {
        let name = self.name.clone().ok_or(TranslateError::MissingName)?;
        self.require_no_pending_bound()?;
        let metric_type = self.effective_type().map(str::to_string);

        let sample = if metric_type.as_deref() == Some(HISTOGRAM) {
            let count = self
                .histogram
                .total_count
                .take()
                .ok_or_else(|| TranslateError::MissingTotalCount(name.clone()))?;
            Sample::Histogram {
                buckets: mem::take(&mut self.histogram.buckets),
                sum: value,
                count,
            }
        } else {
            if let (Some(declared), true) = (&metric_type, self.histogram.is_started()) {
                return Err(TranslateError::TypeConflict {
                    flag: self.histogram.first_flag.unwrap_or("le"),
                    declared: declared.clone(),
                });
            }
            Sample::Scalar(value)
        };

        let header = self.last_emitted.as_deref() != Some(name.as_str());
        if header {
            debug!("Emitting header for metric '{}'", name);
        }
        let series = Series {
            name: name.clone(),
            metric_type,
            comment: mem::take(&mut self.comment),
            labels: self.labels.clone(),
            timestamp: self.timestamp.take(),
            sample,
        };
        debug!("Emitting series {:?}", series);

        self.declared_type = None;
        self.histogram = HistogramState::default();
        self.last_emitted = Some(name);
        Ok(Emission { series, header })
    }

    /// Ends the stream. Any half-built histogram is dropped.
    pub fn finish(self) {
        if self.histogram.is_started() {
            warn!("Histogram options after the last --value were ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use speculoos::prelude::*;

    use super::{Accumulator, Emission};
    use crate::error::TranslateError;
    use crate::series::{Bucket, Flag, Sample};

    fn run(flags: Vec<Flag>) -> Result<Vec<Emission>, TranslateError> {
        let mut acc = Accumulator::new();
        let mut out = vec![];
        for flag in flags {
            if let Some(e) = acc.apply(flag)? {
                out.push(e);
            }
        }
        acc.finish();
        Ok(out)
    }

    fn name(s: &str) -> Flag {
        Flag::Name(s.to_string())
    }
    fn value(s: &str) -> Flag {
        Flag::Value(s.to_string())
    }

    #[test]
    fn scalar_defaults() {
        let out = run(vec![name("up"), value("1")]).unwrap();
        assert_that!(out).has_length(1);
        let series = &out[0].series;
        assert_that!(out[0].header).is_true();
        assert_that!(series.metric_type).is_none();
        assert_that!(series.comment.as_str()).is_equal_to("");
        assert_that!(series.timestamp).is_none();
        assert_that!(series.sample).is_equal_to(Sample::Scalar("1".to_string()));
    }

    #[test]
    fn header_only_for_name_change() {
        let out = run(vec![
            name("a"),
            value("1"),
            value("2"),
            name("b"),
            value("3"),
            name("a"),
            value("4"),
        ])
        .unwrap();
        let headers: Vec<bool> = out.iter().map(|e| e.header).collect();
        assert_that!(headers).is_equal_to(vec![true, false, true, true]);
    }

    #[test]
    fn emission_resets_group_fields() {
        let out = run(vec![
            name("a"),
            Flag::Type("gauge".to_string()),
            Flag::Comment("help".to_string()),
            Flag::Label("x=1".to_string()),
            Flag::Timestamp("100".to_string()),
            value("1"),
            value("2"),
        ])
        .unwrap();
        let first = &out[0].series;
        assert_that!(first.metric_type).is_equal_to(Some("gauge".to_string()));
        assert_that!(first.timestamp).is_equal_to(Some("100".to_string()));
        let second = &out[1].series;
        assert_that!(second.name.as_str()).is_equal_to("a");
        assert_that!(second.metric_type).is_none();
        assert_that!(second.comment.as_str()).is_equal_to("");
        assert_that!(second.timestamp).is_none();
        // Labels are only dropped when the next group starts.
        assert_that!(second.labels.len()).is_equal_to(1);
    }

    #[rstest]
    #[case::name(name("b"))]
    #[case::metric_type(Flag::Type("gauge".to_string()))]
    #[case::comment(Flag::Comment("c".to_string()))]
    fn group_start_clears_labels_and_timestamp(#[case] flag: Flag) {
        let out = run(vec![
            name("a"),
            Flag::Label("x=1".to_string()),
            Flag::Timestamp("5".to_string()),
            flag,
            value("1"),
        ])
        .unwrap();
        assert_that!(out[0].series.labels.is_empty()).is_true();
        assert_that!(out[0].series.timestamp).is_none();
    }

    #[test]
    fn empty_type_is_untyped() {
        let out = run(vec![name("a"), Flag::Type(String::new()), value("1")]).unwrap();
        assert_that!(out[0].series.metric_type).is_none();
    }

    #[test]
    fn empty_type_still_infers_histogram() {
        let out = run(vec![
            name("a"),
            Flag::Type(String::new()),
            Flag::Le("1".to_string()),
            Flag::Count("1".to_string()),
            Flag::TotalCount("2".to_string()),
            value("3"),
        ])
        .unwrap();
        assert_that!(out[0].series.metric_type).is_equal_to(Some("histogram".to_string()));
    }

    #[test]
    fn label_clears_timestamp() {
        let out = run(vec![
            name("a"),
            Flag::Timestamp("5".to_string()),
            Flag::Label("x=1".to_string()),
            value("1"),
        ])
        .unwrap();
        assert_that!(out[0].series.timestamp).is_none();
    }

    #[test]
    fn histogram_is_inferred_from_le() {
        let out = run(vec![
            name("h"),
            Flag::Le("0.1".to_string()),
            Flag::Count("3".to_string()),
            Flag::TotalCount("7".to_string()),
            value("1.5"),
        ])
        .unwrap();
        let series = &out[0].series;
        assert_that!(series.metric_type).is_equal_to(Some("histogram".to_string()));
        assert_that!(series.sample).is_equal_to(Sample::Histogram {
            buckets: vec![
                Bucket {
                    bound: "0.1".to_string(),
                    count: "3".to_string(),
                },
                Bucket {
                    bound: "+Inf".to_string(),
                    count: "7".to_string(),
                },
            ],
            sum: "1.5".to_string(),
            count: "7".to_string(),
        });
    }

    #[rstest]
    #[case::missing_name(vec![value("1")], TranslateError::MissingName)]
    #[case::missing_name_empty(vec![name(""), value("1")], TranslateError::MissingName)]
    #[case::empty_name_unsets(vec![name("a"), value("1"), name(""), value("2")],
        TranslateError::MissingName)]
    #[case::stray(vec![name("a"), Flag::Stray("oops".to_string())],
        TranslateError::UnexpectedArgument("oops".to_string()))]
    #[case::count_without_le(vec![name("a"), Flag::Count("1".to_string())],
        TranslateError::MissingBound("1".to_string()))]
    #[case::le_twice(vec![Flag::Le("1".to_string()), Flag::Le("2".to_string())],
        TranslateError::UnmatchedBound("1".to_string()))]
    #[case::le_then_value(vec![name("a"), Flag::Le("1".to_string()), value("2")],
        TranslateError::UnmatchedBound("1".to_string()))]
    #[case::le_then_total(vec![Flag::Le("1".to_string()), Flag::TotalCount("2".to_string())],
        TranslateError::UnmatchedBound("1".to_string()))]
    #[case::total_twice(vec![Flag::TotalCount("1".to_string()), Flag::TotalCount("2".to_string())],
        TranslateError::DuplicateTotalCount)]
    #[case::type_conflict(vec![Flag::Type("gauge".to_string()), Flag::Le("1".to_string())],
        TranslateError::TypeConflict { flag: "le", declared: "gauge".to_string() })]
    #[case::type_conflict_total(vec![Flag::Type("counter".to_string()), Flag::TotalCount("1".to_string())],
        TranslateError::TypeConflict { flag: "total-count", declared: "counter".to_string() })]
    #[case::type_after_total(vec![name("a"), Flag::TotalCount("1".to_string()),
        Flag::Type("gauge".to_string()), value("1")],
        TranslateError::TypeConflict { flag: "total-count", declared: "gauge".to_string() })]
    #[case::type_after_buckets(vec![name("a"), Flag::Le("1".to_string()), Flag::Count("1".to_string()),
        Flag::TotalCount("1".to_string()), Flag::Type("gauge".to_string()), value("1")],
        TranslateError::TypeConflict { flag: "le", declared: "gauge".to_string() })]
    #[case::missing_total(vec![name("a"), Flag::Type("histogram".to_string()), value("1")],
        TranslateError::MissingTotalCount("a".to_string()))]
    #[case::missing_total_inferred(vec![name("a"), Flag::Le("1".to_string()),
        Flag::Count("1".to_string()), value("1")],
        TranslateError::MissingTotalCount("a".to_string()))]
    #[case::bad_label(vec![Flag::Label("x".to_string())],
        TranslateError::MalformedLabel("x".to_string()))]
    fn failures(#[case] flags: Vec<Flag>, #[case] expected: TranslateError) {
        assert_that!(run(flags)).is_equal_to(Err(expected));
    }
}
