use crossterm::{ExecutableCommand, cursor, terminal};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

pub struct Logger {
    start_time: Instant,
    quiet: bool,
    debug: AtomicBool,
    // Serializes writes so concurrent tasks never interleave half lines.
    line: Mutex<String>,
}

pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl Logger {
    #[must_use]
    pub fn new(quiet: bool, debug: bool) -> Self {
        Self {
            start_time: Instant::now(),
            quiet,
            debug: AtomicBool::new(debug),
            line: Mutex::new(String::new()),
        }
    }

    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn clear_current_line(&self) {
        let mut stdout = io::stdout();
        let _ = stdout.execute(cursor::MoveToColumn(0));
        let _ = stdout.execute(terminal::Clear(terminal::ClearType::CurrentLine));
        let _ = stdout.flush();
    }

    pub fn update_line(&self, message: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut line) = self.line.lock() {
            self.clear_current_line();
            print!("{message}");
            let _ = io::stdout().flush();
            *line = message.to_string();
        }
    }

    pub fn finish_line(&self, message: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut line) = self.line.lock() {
            self.clear_current_line();
            println!("{message}");
            line.clear();
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if self.quiet && !matches!(level, LogLevel::Error) {
            return;
        }
        if matches!(level, LogLevel::Debug) && !self.debug_enabled() {
            return;
        }

        let (prefix, colored_message) = match level {
            LogLevel::Info => (
                "depot".bright_cyan().bold().to_string(),
                message.white().to_string(),
            ),
            LogLevel::Success => (
                "✓".bright_green().bold().to_string(),
                message.bright_green().to_string(),
            ),
            LogLevel::Warning => (
                "⚠".bright_yellow().bold().to_string(),
                message.bright_yellow().to_string(),
            ),
            LogLevel::Error => (
                "✗".bright_red().bold().to_string(),
                message.bright_red().to_string(),
            ),
            LogLevel::Debug => (
                "•".bright_black().bold().to_string(),
                message.bright_black().to_string(),
            ),
        };

        if let Ok(mut line) = self.line.lock() {
            if !line.is_empty() {
                self.clear_current_line();
                line.clear();
            }
            if matches!(level, LogLevel::Error) {
                eprintln!("{prefix} {colored_message}");
            } else {
                println!("{prefix} {colored_message}");
            }
        }
    }

    pub fn finish(&self, message: &str) {
        let time_str = format_elapsed(self.elapsed());

        let final_message = format!(
            "{} {} {}",
            "✓".bright_green().bold(),
            message.bright_green(),
            format!("[{time_str}]").bright_black()
        );

        self.finish_line(&final_message);
    }

    pub fn progress(&self, message: &str, current: usize, total: usize) {
        if self.quiet {
            return;
        }

        let spinners = ["◐", "◓", "◑", "◒"];
        let spinner = spinners.get(current % spinners.len()).unwrap_or(&"◐");

        let progress_text = if total > 0 {
            format!(
                "{} {} ({}/{})",
                spinner.bright_cyan(),
                message.bright_white(),
                current.to_string().bright_cyan().bold(),
                total.to_string().bright_white()
            )
        } else {
            format!("{} {}", spinner.bright_cyan(), message.bright_white())
        };

        self.update_line(&progress_text);
    }

    pub fn status(&self, message: &str) {
        if self.quiet {
            return;
        }

        let status_msg = format!("{} {}", "◦".bright_cyan(), message.bright_white());
        self.update_line(&status_msg);
    }
}

/// Milliseconds below one second, otherwise seconds with two decimals.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_millis() < 1000 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Installs the process logger. Later calls are ignored apart from the debug flag.
pub fn init_logger(quiet: bool, debug: bool) {
    if LOGGER.set(Logger::new(quiet, debug)).is_err() {
        get_logger().set_debug(debug);
    }
}

fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(false, false))
}

pub fn status(message: &str) {
    get_logger().status(message);
}

pub fn info(message: &str) {
    get_logger().log(LogLevel::Info, message);
}

pub fn success(message: &str) {
    get_logger().log(LogLevel::Success, message);
}

pub fn warn(message: &str) {
    get_logger().log(LogLevel::Warning, message);
}

pub fn error(message: &str) {
    get_logger().log(LogLevel::Error, message);
}

pub fn debug(message: &str) {
    get_logger().log(LogLevel::Debug, message);
}

pub fn progress(message: &str, current: usize, total: usize) {
    get_logger().progress(message, current, total);
}

pub fn finish(message: &str) {
    get_logger().finish(message);
}

pub fn finish_line(message: &str) {
    get_logger().finish_line(message);
}
