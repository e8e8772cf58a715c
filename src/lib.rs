//! Writes metrics in the Prometheus text exposition format from an ordered
//! list of command line options.

use log::info;

pub mod accumulator;
pub mod cli;
pub mod error;
pub mod format;
pub mod series;
pub mod textfile;

use accumulator::Accumulator;
use error::Result;
use series::Flag;

/// Runs the whole option stream and returns the complete output text.
///
/// Nothing is returned on failure, so a partial group is never written out.
/// Example:
/// ```
/// use prom_textfile::series::Flag;
/// let text = prom_textfile::translate(vec![
///     Flag::Name("up".into()),
///     Flag::Value("1".into()),
/// ]).unwrap();
/// assert_eq!(text, "# HELP up \n# TYPE up UNTYPED\nup 1\n");
/// ```
pub fn translate(flags: impl IntoIterator<Item = Flag>) -> Result<String> {
    let mut accumulator = Accumulator::new();
    let mut buffer = String::new();
    let mut series_count = 0;
    for flag in flags {
        if let Some(emission) = accumulator.apply(flag)? {
            for line in format::render(&emission.series, emission.header) {
                buffer.push_str(&line);
                buffer.push('\n');
            }
            series_count += 1;
        }
    }
    accumulator.finish();
    info!("Translated {} sample groups", series_count);
    Ok(buffer)
}
