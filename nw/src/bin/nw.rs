use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::instrument;

use nw_tools_nw::{ReceiveSettings, SendSettings, Summary};

const EXIT_NO_MODE: i32 = 1;
const EXIT_TRANSFER_FAILED: i32 = 3;

fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let size = s
        .parse::<bytesize::ByteSize>()
        .map_err(|e| format!("{e}"))?;
    let size = usize::try_from(size.as_u64()).map_err(|e| format!("{e}"))?;
    if size == 0 {
        return Err("buffer size must be at least 1 byte".to_string());
    }
    Ok(size)
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Connect to --host:--port and stream PATH (or stdin)
    Send,
    /// Listen on --host:--port, accept one connection and write it to PATH (or stdout)
    Receive,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nw",
    version,
    about = "Send a file to, or receive a file from, another nw over a raw TCP stream",
    long_about = "`nw` moves one byte stream between two hosts over a single TCP connection.

The receiver listens and accepts exactly one connection; the sender connects, streams its
input and closes. Start the receiver first: the sender does not retry.

EXIT CODES:
    0 - Success
    1 - No mode given
    2 - Invalid mode or option
    3 - The transfer failed

EXAMPLES:
    # Receive into out.bin on port 4300
    nw --host 0.0.0.0 --port 4300 receive out.bin

    # Send in.bin to that receiver
    nw --host receiver.example.com --port 4300 send in.bin

    # Stream through pipes
    nw receive | tar x
    tar c dir | nw send"
)]
struct Args {
    // Connection
    /// Host to send to, or address to listen on
    #[arg(
        long,
        default_value = remote::endpoint::DEFAULT_HOST,
        value_name = "HOST",
        help_heading = "Connection"
    )]
    host: String,

    /// Port to send to, or port to listen on
    #[arg(
        long,
        default_value = remote::endpoint::DEFAULT_PORT,
        value_name = "PORT",
        help_heading = "Connection"
    )]
    port: String,

    // Transfer options
    /// Overwrite an existing destination file (receive only)
    #[arg(short, long, help_heading = "Transfer options")]
    overwrite: bool,

    /// Size of the copy buffer
    ///
    /// Accepts human readable sizes, e.g. "64KiB", "1MiB".
    #[arg(
        long,
        default_value = "128KiB",
        value_name = "SIZE",
        value_parser = parse_buffer_size,
        help_heading = "Transfer options"
    )]
    buffer_size: usize,

    // Progress & output
    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Print summary at the end (to stderr)
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    /// Append log output to this file instead of stderr
    #[arg(long, value_name = "PATH", help_heading = "Progress & output")]
    log_file: Option<std::path::PathBuf>,

    /// Permissions (octal) used when the log file has to be created
    #[arg(
        long,
        default_value = "600",
        value_name = "MODE",
        value_parser = common::config::parse_file_mode,
        help_heading = "Progress & output"
    )]
    log_file_mode: u32,

    // Advanced settings
    /// Number of worker threads, 0 means number of cores
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,

    // ARGUMENTS
    /// Whether to send or receive
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// File to read from (send) or write to (receive); stdin/stdout if omitted
    #[arg()]
    path: Option<std::path::PathBuf>,
}

#[instrument(skip(args))]
async fn async_main(mode: Mode, args: Args) -> Result<Summary, common::Error> {
    let endpoint = remote::Endpoint::new(args.host, args.port);
    match mode {
        Mode::Receive => {
            let diagnostics = common::TracingDiagnostics::new(common::Role::Receive);
            let settings = ReceiveSettings {
                overwrite: args.overwrite,
                buffer_size: args.buffer_size,
            };
            nw_tools_nw::receive(&endpoint, args.path.as_deref(), &settings, &diagnostics).await
        }
        Mode::Send => {
            if args.overwrite {
                tracing::warn!("--overwrite has no effect when sending");
            }
            let diagnostics = common::TracingDiagnostics::new(common::Role::Send);
            let settings = SendSettings {
                buffer_size: args.buffer_size,
            };
            nw_tools_nw::send(&endpoint, args.path.as_deref(), &settings, &diagnostics).await
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let Some(mode) = args.mode else {
        eprintln!("{}", Args::command().render_help());
        eprintln!("Need to provide either send or receive");
        std::process::exit(EXIT_NO_MODE);
    };
    let func = {
        let args = args.clone();
        || async_main(mode, args)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
    };
    let tracing = common::TracingConfig {
        log_file: args.log_file.clone(),
        log_file_mode: args.log_file_mode,
    };
    if common::run(output, runtime, tracing, func).is_none() {
        std::process::exit(EXIT_TRANSFER_FAILED);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size_parsing() {
        assert_eq!(parse_buffer_size("128KiB"), Ok(128 * 1024));
        assert_eq!(parse_buffer_size("4096"), Ok(4096));
        assert!(parse_buffer_size("0").is_err());
        assert!(parse_buffer_size("lots").is_err());
    }

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_classic_tool() {
        let args = Args::try_parse_from(["nw", "receive"]).unwrap();
        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, "4200");
        assert!(!args.overwrite);
        assert_eq!(args.mode, Some(Mode::Receive));
        assert_eq!(args.path, None);
        assert_eq!(args.log_file_mode, 0o600);
    }

    #[test]
    fn port_is_kept_verbatim() {
        // validated at bind/dial time, not by the parser
        let args = Args::try_parse_from(["nw", "--port", "a", "send", "in.bin"]).unwrap();
        assert_eq!(args.port, "a");
        assert_eq!(args.path.as_deref(), Some(std::path::Path::new("in.bin")));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["nw", "fetch"]).is_err());
    }
}
