//! 日志模块 - 提供结构化日志、事件追踪和耗时记录
//!
//! 特性：
//! - 支持人类可读、紧凑和 JSON 三种格式
//! - 每个入站事件一个请求 ID
//! - 凭据脱敏
//! - 补全调用耗时记录

use std::fmt;
use std::time::Instant;
use tracing::{field, Event, Level, Subscriber};
use tracing_subscriber::{
    field::RecordFields,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields, FormattedFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

/// 日志格式类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// 人类可读格式（带颜色）
    Pretty,
    /// 紧凑单行格式
    Compact,
    /// JSON 结构化格式
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// 是否启用颜色（仅 Pretty 格式有效）
    pub enable_color: bool,
    pub show_target: bool,
    pub show_time: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            enable_color: true,
            show_target: true,
            show_time: true,
        }
    }
}

impl LogConfig {
    pub fn with_format(format: LogFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - `RUST_LOG`: 日志级别过滤（如 `info`, `debug`, `warn,alya_relay=trace`）
pub fn init(config: LogConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .event_format(PrettyFormatter::new(config.clone()))
                .fmt_fields(PrettyFields);
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(config.show_target)
                .with_ansi(config.enable_color);
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(config.show_target)
                .with_current_span(true)
                .with_span_list(true);
            subscriber.with(fmt_layer).init();
        }
    }
}

/// 单个入站事件的追踪上下文
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub start_time: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 创建带有请求 ID 的 span
#[macro_export]
macro_rules! request_span {
    ($ctx:expr) => {
        tracing::info_span!(
            "event",
            request_id = %$ctx.request_id,
        )
    };
}

/// 性能计时器 - drop 时记录执行时间
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            target: "metrics",
            operation = %self.name,
            elapsed_ms = %format!("{:.2}", elapsed_ms),
            "operation completed"
        );
    }
}

/// 敏感信息脱敏工具
pub struct Sanitizer;

impl Sanitizer {
    /// 脱敏 API 密钥 - 只保留前 8 位和后 4 位
    pub fn api_key(key: &str) -> String {
        if key.len() <= 16 || !key.is_ascii() {
            return "***".to_string();
        }
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    }

    /// 脱敏机器人令牌 - 只保留冒号前的机器人 ID
    pub fn bot_token(token: &str) -> String {
        match token.split_once(':') {
            Some((bot_id, _)) if !bot_id.is_empty() => format!("{}:***", bot_id),
            _ => "***TOKEN***".to_string(),
        }
    }
}

/// 人类可读格式器
///
/// 输出形如 `时间 [INFO] target event{request_id=...}: 消息 key=value`
pub struct PrettyFormatter {
    config: LogConfig,
}

impl PrettyFormatter {
    pub fn new(config: LogConfig) -> Self {
        Self { config }
    }
}

fn level_label(level: Level, color: bool) -> String {
    if !color {
        return format!("[{}]", level);
    }
    let code = match level {
        Level::ERROR => 31,
        Level::WARN => 33,
        Level::INFO => 32,
        Level::DEBUG => 34,
        Level::TRACE => 35,
    };
    format!("\x1b[{}m[{}]\x1b[0m", code, level)
}

impl<S, N> FormatEvent<S, N> for PrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        if self.config.show_time {
            write!(writer, "{} ", chrono::Local::now().to_rfc3339())?;
        }
        write!(writer, "{} ", level_label(*meta.level(), self.config.enable_color))?;
        if self.config.show_target {
            write!(writer, "{} ", meta.target())?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                let fields = extensions
                    .get::<FormattedFields<N>>()
                    .map(|f| f.fields.trim_start())
                    .unwrap_or_default();
                if fields.is_empty() {
                    write!(writer, "{}: ", span.name())?;
                } else {
                    write!(writer, "{}{{{}}}: ", span.name(), fields)?;
                }
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// 字段格式化：`message` 原样输出，其余字段输出为 ` key=value`
pub struct PrettyFields;

impl FormatFields<'_> for PrettyFields {
    fn format_fields<R: RecordFields>(&self, writer: Writer<'_>, fields: R) -> fmt::Result {
        let mut visitor = FieldVisitor {
            writer,
            result: Ok(()),
        };
        fields.record(&mut visitor);
        visitor.result
    }
}

struct FieldVisitor<'a> {
    writer: Writer<'a>,
    result: fmt::Result,
}

impl FieldVisitor<'_> {
    fn write(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if self.result.is_err() {
            return;
        }
        self.result = if name == "message" {
            self.writer.write_fmt(value)
        } else {
            write!(self.writer, " {}={}", name, value)
        };
    }
}

impl field::Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &field::Field, value: &str) {
        self.write(field.name(), format_args!("{}", value));
    }

    fn record_debug(&mut self, field: &field::Field, value: &dyn fmt::Debug) {
        self.write(field.name(), format_args!("{:?}", value));
    }
}
