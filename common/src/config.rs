//! Configuration types for runtime and execution settings

/// Runtime configuration for tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads (0 = number of CPU cores)
    pub max_workers: usize,
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress error output
    pub quiet: bool,
    /// Verbosity level: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE
    pub verbose: u8,
    /// Print summary statistics at the end
    pub print_summary: bool,
}

impl OutputConfig {
    /// Default filter directive for the configured verbosity.
    #[must_use]
    pub fn level(&self) -> &'static str {
        match self.verbose {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Default permissions of a newly created log file
pub const DEFAULT_LOG_FILE_MODE: u32 = 0o600;

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Append log lines to this file instead of stderr
    pub log_file: Option<std::path::PathBuf>,
    /// Permission bits used when the log file has to be created
    pub log_file_mode: u32,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_file_mode: DEFAULT_LOG_FILE_MODE,
        }
    }
}

/// Parses an octal permission string such as `600` or `0o644`.
pub fn parse_file_mode(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8).map_err(|e| format!("invalid file mode {s:?}: {e}"))?;
    if mode > 0o7777 {
        return Err(format!("invalid file mode {s:?}: out of range"));
    }
    Ok(mode)
}
