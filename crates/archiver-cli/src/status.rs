use std::fmt;

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    fn tag(&self) -> &'static str {
        match self {
            StatusLevel::Info => "ℹ️",
            StatusLevel::Success => "✅",
            StatusLevel::Warning => "⏳",
            StatusLevel::Error => "❌",
        }
    }
}

/// One status line: a level plus the message, shown verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }

    pub fn colored(&self) -> String {
        let line = format!("{} {}", self.level.tag(), self.message);
        match self.level {
            StatusLevel::Info => line.cyan().to_string(),
            StatusLevel::Success => line.green().to_string(),
            StatusLevel::Warning => line.yellow().to_string(),
            StatusLevel::Error => line.red().to_string(),
        }
    }

    pub fn print(&self) {
        match self.level {
            StatusLevel::Error => eprintln!("{}", self.colored()),
            _ => println!("{}", self.colored()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.tag(), self.message)
    }
}

/// What a command hands back: the status line and an optional body for stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: Option<Status>,
    pub body: Option<String>,
}

impl Report {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            status: None,
            body: Some(body.into()),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn print(&self) {
        if let Some(body) = &self.body {
            println!("{}", body);
        }
        if let Some(status) = &self.status {
            status.print();
        }
    }
}
