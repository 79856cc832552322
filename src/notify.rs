use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
    Success,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
            Level::Success => "SUCCESS",
        })
    }
}

pub trait Sink {
    fn write_line(&self, level: Level, message: &str) -> io::Result<()>;
}

/// INFO and SUCCESS go to stdout, ERROR to stderr.
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn write_line(&self, level: Level, message: &str) -> io::Result<()> {
        match level {
            Level::Error => writeln!(io::stderr().lock(), "[{}] {}", level, message),
            _ => writeln!(io::stdout().lock(), "[{}] {}", level, message),
        }
    }
}

pub struct FileSink {
    file: File,
}

impl FileSink {
    /// Opens `path` for appending, creating it and its directory if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileSink { file })
    }
}

impl Sink for FileSink {
    fn write_line(&self, level: Level, message: &str) -> io::Result<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(&self.file, "{} [{}] {}", now, level, message)
    }
}

/// Fans status lines out to every configured sink. With no sinks it is silent.
#[derive(Default)]
pub struct Notifier {
    sinks: Vec<Box<dyn Sink>>,
}

impl Notifier {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Notifier { sinks }
    }

    pub fn add(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn notify(&self, level: Level, message: &str) {
        for sink in &self.sinks {
            if let Err(e) = sink.write_line(level, message) {
                log::warn!("unable to write status line: {}", e);
            }
        }
    }

    pub fn info(&self, message: &str) {
        self.notify(Level::Info, message)
    }

    pub fn error(&self, message: &str) {
        self.notify(Level::Error, message)
    }

    pub fn success(&self, message: &str) {
        self.notify(Level::Success, message)
    }
}
