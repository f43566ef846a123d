//! 日志基础设施
//!
//! 控制台输出人类可读日志，同时向日志目录下的 `app.log` 追加 JSON 记录，
//! 每行一条：`{timestamp, level, message, context}`。

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fs2::FileExt;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "app.log";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// 日志初始化配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志目录
    pub log_dir: PathBuf,
    /// 日志文件名
    pub file_name: String,
}

impl LogConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file_name: LOG_FILE_NAME.to_string(),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }
}

/// 日志实际写入的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    ConsoleOnly,
}

/// 持有后台写线程；drop 时刷新剩余日志
pub struct LoggingGuard {
    pub sink: LogSink,
    _worker: Option<WorkerGuard>,
}

/// 创建日志目录，并尝试放宽权限（失败忽略）
pub fn ensure_log_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o777));
    }

    Ok(())
}

/// 初始化全局日志，进程内只生效一次
///
/// 日志目录或文件不可用时退化为仅控制台输出，不会中断启动。
pub fn init_logging(config: &LogConfig) -> LoggingGuard {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return LoggingGuard {
            sink: LogSink::ConsoleOnly,
            _worker: None,
        };
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt_layer::layer().with_writer(io::stdout).with_ansi(true);

    let file_writer = ensure_log_dir(&config.log_dir)
        .and_then(|_| SafeFileWriter::new(config.file_path()));

    match file_writer {
        Ok(writer) => {
            let (non_blocking, guard) = NonBlockingBuilder::default().lossy(false).finish(writer);
            let file = fmt_layer::layer()
                .event_format(JsonRecordFormat)
                .with_writer(non_blocking)
                .with_ansi(false);

            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .try_init();

            LoggingGuard {
                sink: LogSink::File(config.file_path()),
                _worker: Some(guard),
            }
        }
        Err(err) => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .try_init();

            tracing::warn!(
                log_dir = %config.log_dir.display(),
                error = %err,
                "log file unavailable, logging to console only"
            );

            LoggingGuard {
                sink: LogSink::ConsoleOnly,
                _worker: None,
            }
        }
    }
}

/// 多写者安全的追加文件写入器
///
/// 每次写入先取进程内互斥锁（同一文件句柄上的 flock 不区分线程），
/// 再取排他文件锁（区分进程），保证一条记录完整落盘，不与其他写者交错。
pub struct SafeFileWriter {
    file: Arc<Mutex<File>>,
}

impl SafeFileWriter {
    pub fn new(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl Write for SafeFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        file.lock_exclusive()?;
        let result = file.write_all(buf).map(|_| buf.len());
        let _ = FileExt::unlock(&*file);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        file.flush()
    }
}

impl Clone for SafeFileWriter {
    fn clone(&self) -> Self {
        Self {
            file: Arc::clone(&self.file),
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SafeFileWriter {
    type Writer = SafeFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    timestamp: String,
    level: &'a str,
    message: String,
    context: Map<String, Value>,
}

/// 单行 JSON 事件格式
pub struct JsonRecordFormat;

impl<S, N> FormatEvent<S, N> for JsonRecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        use std::fmt::Write as _;

        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: event.metadata().level().as_str(),
            message: visitor.message.unwrap_or_default(),
            context: visitor.fields,
        };

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_lines<F: FnOnce()>(emit: F) -> Vec<Value> {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(
            fmt_layer::layer()
                .event_format(JsonRecordFormat)
                .with_writer(captured.clone()),
        );
        tracing::subscriber::with_default(subscriber, emit);

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_record_has_message_level_and_context() {
        let lines = capture_lines(|| {
            tracing::info!(uuid = "abc-123", count = 3_u64, "user created");
        });

        assert_eq!(lines.len(), 1);
        let record = &lines[0];
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["message"], "user created");
        assert_eq!(record["context"]["uuid"], "abc-123");
        assert_eq!(record["context"]["count"], 3);
        assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_event_without_fields_has_empty_context() {
        let lines = capture_lines(|| tracing::warn!("nothing here"));

        assert_eq!(lines[0]["level"], "WARN");
        assert_eq!(lines[0]["context"], serde_json::json!({}));
    }

    #[test]
    fn test_safe_file_writer_appends_whole_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(LOG_FILE_NAME);

        let mut first = SafeFileWriter::new(path.clone()).unwrap();
        let mut second = first.clone();
        first.write_all(b"{\"n\":1}\n").unwrap();
        second.write_all(b"{\"n\":2}\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["{\"n\":1}", "{\"n\":2}"]);
    }

    #[test]
    fn test_concurrent_writers_never_interleave_records() {
        const THREADS: usize = 8;
        const EVENTS: usize = 200;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let writer = SafeFileWriter::new(path.clone()).unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|thread| {
                let writer = writer.clone();
                std::thread::spawn(move || {
                    let subscriber = tracing_subscriber::registry().with(
                        fmt_layer::layer()
                            .event_format(JsonRecordFormat)
                            .with_writer(writer),
                    );
                    tracing::subscriber::with_default(subscriber, || {
                        for event in 0..EVENTS {
                            tracing::info!(
                                thread = thread as u64,
                                event = event as u64,
                                padding = %"x".repeat(512),
                                "concurrent record"
                            );
                        }
                    });
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), THREADS * EVENTS);
        for thread in 0..THREADS as u64 {
            let count = records
                .iter()
                .filter(|r| r["context"]["thread"] == thread)
                .count();
            assert_eq!(count, EVENTS);
        }
        assert!(records.iter().all(|r| r["message"] == "concurrent record"));
    }

    #[test]
    fn test_ensure_log_dir_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");

        ensure_log_dir(&target).unwrap();
        ensure_log_dir(&target).unwrap();

        assert!(target.is_dir());
    }
}
