use parking_lot::Mutex;
use std::io::stderr;
use std::io::stdout;
use std::io::Stderr;
use std::io::Stdout;
use std::io::Write;
use std::sync::Arc;

use super::LogLevel;

#[derive(Clone)]
pub struct LoggerOptions {
  pub log_level: LogLevel,
  pub is_stdout_machine_readable: bool,
}

#[derive(Clone)]
pub struct Logger {
  output_lock: Arc<Mutex<LoggerState>>,
  log_level: LogLevel,
  is_stdout_machine_readable: bool,
}

struct LoggerState {
  std_out: Stdout,
  std_err: Stderr,
}

impl Logger {
  pub fn new(options: &LoggerOptions) -> Self {
    Logger {
      output_lock: Arc::new(Mutex::new(LoggerState {
        std_out: stdout(),
        std_err: stderr(),
      })),
      log_level: options.log_level,
      is_stdout_machine_readable: options.is_stdout_machine_readable,
    }
  }

  #[inline]
  pub fn log_level(&self) -> LogLevel {
    self.log_level
  }

  pub fn log(&self, text: &str) {
    if self.log_level > LogLevel::Info || self.is_stdout_machine_readable {
      return;
    }
    let mut state = self.output_lock.lock();
    inner_log(&mut state, true, text);
  }

  pub fn log_machine_readable(&self, text: &str) {
    let mut state = self.output_lock.lock();
    inner_log(&mut state, true, text);
  }

  pub fn log_stderr(&self, text: &str) {
    if self.log_level == LogLevel::Silent {
      return;
    }
    let mut state = self.output_lock.lock();
    inner_log(&mut state, false, text);
  }
}

fn inner_log(state: &mut LoggerState, is_std_out: bool, text: &str) {
  let mut output_text = text.to_string();
  // only add a newline if the logged text does not end with one
  if !output_text.ends_with('\n') {
    output_text.push('\n');
  }

  // a closed pipe shouldn't take down the process
  if is_std_out {
    let _ = write!(state.std_out, "{}", output_text);
    let _ = state.std_out.flush();
  } else {
    let _ = write!(state.std_err, "{}", output_text);
    let _ = state.std_err.flush();
  }
}
