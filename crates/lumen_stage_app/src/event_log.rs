// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event log overlay - stage transitions and diagnostics as they happen.

use std::collections::VecDeque;
use std::sync::mpsc;

/// A tracing event captured by the [`EventLogBridge`] layer.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// The log level.
    pub level: LogLevel,
    /// The formatted message, including structured fields.
    pub message: String,
    /// Module path the event came from.
    pub target: String,
}

/// A `tracing_subscriber::Layer` that forwards events over an `mpsc` channel
/// so the [`EventLogPanel`] can display them.
pub struct EventLogBridge {
    sender: mpsc::Sender<LogEvent>,
}

impl EventLogBridge {
    /// Create a new bridge and return `(layer, receiver)`.
    pub fn new() -> (Self, mpsc::Receiver<LogEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl<S> tracing_subscriber::Layer<S> for EventLogBridge
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = LogLevel::from(*event.metadata().level());

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let _ = self.sender.send(LogEvent {
            level,
            message: visitor.finish(),
            target: event.metadata().target().to_string(),
        });
    }
}

/// Collects the `message` field first, then any other fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (true, true) => "(empty)".to_string(),
            (true, false) => self.fields.join(" "),
            (false, true) => self.message,
            (false, false) => format!("{} [{}]", self.message, self.fields.join(" ")),
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

/// Log level for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

impl LogLevel {
    fn short_name(&self) -> &'static str {
        match self {
            Self::Trace => "T",
            Self::Debug => "D",
            Self::Info => "I",
            Self::Warn => "W",
            Self::Error => "E",
        }
    }

    fn color(&self) -> egui::Color32 {
        match self {
            Self::Trace => egui::Color32::from_rgb(100, 100, 100),
            Self::Debug => egui::Color32::from_rgb(150, 150, 150),
            Self::Info => egui::Color32::from_rgb(200, 200, 200),
            Self::Warn => egui::Color32::from_rgb(255, 200, 80),
            Self::Error => egui::Color32::from_rgb(255, 100, 100),
        }
    }
}

/// A log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub count: u32, // For collapsed duplicate messages
}

/// Floating event log window, toggled with F12
pub struct EventLogPanel {
    /// Receiver for tracing events
    receiver: Option<mpsc::Receiver<LogEvent>>,
    /// Log entries, oldest first
    pub entries: VecDeque<LogEntry>,
    /// Maximum entries to keep
    pub max_entries: usize,
    /// Minimum log level to show
    pub min_level: LogLevel,
    /// Whether the window is open
    pub open: bool,
}

impl EventLogPanel {
    /// Create a panel wired to an optional tracing receiver.
    pub fn new(receiver: Option<mpsc::Receiver<LogEvent>>) -> Self {
        Self {
            receiver,
            entries: VecDeque::new(),
            max_entries: 500,
            min_level: LogLevel::Debug,
            open: false,
        }
    }

    /// Append an entry, collapsing a repeat of the previous message
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        if let Some(last) = self.entries.back_mut() {
            if last.level == level && last.message == message {
                last.count += 1;
                return;
            }
        }

        self.entries.push_back(LogEntry {
            level,
            message,
            count: 1,
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Drain pending tracing events into the log
    pub fn drain(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        while let Ok(event) = receiver.try_recv() {
            if event.target.starts_with("lumen_stage") {
                self.push(event.level, event.message);
            }
        }
        self.receiver = Some(receiver);
    }

    /// Show the window if open
    pub fn show(&mut self, ctx: &egui::Context) {
        self.drain();
        if !self.open {
            return;
        }

        let mut open = self.open;
        egui::Window::new("Stage Events")
            .open(&mut open)
            .default_width(460.0)
            .default_height(260.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Level:");
                    for level in [LogLevel::Trace, LogLevel::Debug, LogLevel::Info, LogLevel::Warn] {
                        ui.selectable_value(&mut self.min_level, level, level.short_name());
                    }
                    if ui.button("Clear").clicked() {
                        self.entries.clear();
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for entry in self.entries.iter().filter(|e| e.level >= self.min_level) {
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(entry.level.short_name())
                                        .monospace()
                                        .color(entry.level.color()),
                                );
                                ui.label(egui::RichText::new(&entry.message).color(entry.level.color()));
                                if entry.count > 1 {
                                    ui.label(egui::RichText::new(format!("x{}", entry.count)).weak());
                                }
                            });
                        }
                    });
            });
        self.open = open;
    }
}
