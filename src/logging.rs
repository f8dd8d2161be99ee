use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "coursedeck=info,tower_http=info";

/// Log to stderr, and to a daily rolling file under `log_dir` when given.
/// Keep the returned guard alive for the life of the process so the file writer flushes.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
  let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

  match log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok()) {
    Some(dir) => {
      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "coursedeck.log"));
      tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
      Some(guard)
    }
    None => {
      tracing_subscriber::registry().with(filter).with(stderr).init();
      None
    }
  }
}
