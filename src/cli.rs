use std::io::Write;
use std::path::PathBuf;

use env_logger::Env;
use gumdrop::{Opt, Options, Parser, ParsingStyle};
use log::Level;

use crate::error::{Result, TranslateError};
use crate::series::Flag;

/// The option vocabulary, used for the usage text.
///
/// Order matters between options, so the arguments themselves are read by
/// [`parse_args_from`] rather than through this struct.
#[derive(Debug, Options)]
pub struct CliOptions {
    #[options(help = "print help message")]
    pub help: bool,

    #[options(no_short, help = "metric name, starts a new sample group")]
    pub name: Vec<String>,

    #[options(
        no_short,
        long = "type",
        meta = "TYPE",
        help = "metric type (counter, gauge, histogram, ...)"
    )]
    pub metric_type: Vec<String>,

    #[options(no_short, help = "help text of the metric")]
    pub comment: Vec<String>,

    #[options(no_short, meta = "NAME=VALUE", help = "add a label to the sample")]
    pub label: Vec<String>,

    #[options(no_short, help = "sample timestamp, passed through verbatim")]
    pub timestamp: Vec<String>,

    #[options(no_short, meta = "BOUND", help = "upper bound of the next histogram bucket")]
    pub le: Vec<String>,

    #[options(no_short, help = "count of the bucket given by the preceding --le")]
    pub count: Vec<String>,

    #[options(no_short, help = "total histogram count, adds the +Inf bucket")]
    pub total_count: Vec<String>,

    #[options(
        no_short,
        help = "sample value (histogram sum), writes out the sample group"
    )]
    pub value: Vec<String>,

    #[options(
        no_short,
        meta = "FILE",
        help = "write atomically to FILE instead of standard output"
    )]
    pub output: Option<PathBuf>,
}

/// What one invocation asks for.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub help: bool,
    pub output: Option<PathBuf>,
    pub flags: Vec<Flag>,
}

pub fn usage() -> String {
    format!(
        "Usage: prom-textfile [OPTIONS]\n\n\
         Writes metrics in the Prometheus text format. Each --value emits the\n\
         sample group described by the options before it.\n\n{}",
        CliOptions::usage()
    )
}

/// Reads the arguments (without the program name) into an ordered flag list.
pub fn parse_args_from<S: AsRef<str>>(args: &[S]) -> Result<Invocation> {
    let mut invocation = Invocation::default();
    let mut parser = Parser::new(args, ParsingStyle::AllOptions);
    while let Some(opt) = parser.next_opt() {
        let (long, arg) = match opt {
            Opt::Short('h') | Opt::Long("help") => {
                invocation.help = true;
                continue;
            }
            Opt::Short(c) => return Err(TranslateError::UnknownOption(format!("-{}", c))),
            Opt::Free(arg) => {
                invocation.flags.push(Flag::Stray(arg.to_string()));
                continue;
            }
            Opt::Long(long) => {
                let arg = parser
                    .next_arg()
                    .ok_or_else(|| TranslateError::MissingArgument(long.to_string()))?;
                (long, arg)
            }
            Opt::LongWithArg(long, arg) => (long, arg),
        };
        if long == "output" {
            invocation.output = Some(PathBuf::from(arg));
            continue;
        }
        let flag = Flag::from_long(long, arg)
            .ok_or_else(|| TranslateError::UnknownOption(format!("--{}", long)))?;
        invocation.flags.push(flag);
    }
    Ok(invocation)
}

pub fn parse_args() -> Result<Invocation> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_args_from(args.as_slice())
}

fn syslog_priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug | Level::Trace => 7,
    }
}

/// Sets up logging to stderr from `RUST_LOG`. With `RUST_LOG_SYSTEMD` set,
/// lines carry the syslog priority prefix understood by journald.
pub fn init_logging() {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if std::env::var_os("RUST_LOG_SYSTEMD").is_some() {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "<{}>{}: {}",
                syslog_priority(record.level()),
                record.target(),
                record.args()
            )
        });
    }
    builder.init();
}
