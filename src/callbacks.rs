//! Reporting channel
//!
//! Everything worth telling the user (an update that was applied, a fetch
//! that failed, a dirty cache) goes through one [`Reporter`]. Nothing in this
//! crate prints directly or aborts the host process.

use std::fmt;
use std::sync::Mutex;

use crate::logging::*;

/// How serious a report is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
	/// Something changed, nothing went wrong
	Info,
	/// The cache is usable but could not be brought up to date
	Warning,
	/// The cache is unavailable
	Error,
}

/// A single formatted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
	pub severity: Severity,
	pub message: String,
}

impl Report {
	pub fn info(message: impl Into<String>) -> Self {
		Report { severity: Severity::Info, message: message.into() }
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Report { severity: Severity::Warning, message: message.into() }
	}

	pub fn error(message: impl Into<String>) -> Self {
		Report { severity: Severity::Error, message: message.into() }
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.severity {
			Severity::Info => write!(f, "{}", self.message),
			Severity::Warning => write!(f, "WARNING: {}", self.message),
			Severity::Error => write!(f, "ERROR: {}", self.message),
		}
	}
}

/// Sink for reports
pub trait Reporter: Send + Sync {
	fn report(&self, report: Report);
}

impl<F> Reporter for F
where
	F: Fn(Report) + Send + Sync,
{
	fn report(&self, report: Report) {
		self(report)
	}
}

/// Discards every report
pub struct NoReporter;

impl Reporter for NoReporter {
	fn report(&self, _report: Report) {}
}

/// Forwards reports to `tracing`
pub struct TracingReporter;

impl Reporter for TracingReporter {
	fn report(&self, report: Report) {
		match report.severity {
			Severity::Info => info!("{}", report.message),
			Severity::Warning => warn!("{}", report.message),
			Severity::Error => error!("{}", report.message),
		}
	}
}

/// Keeps every report, optionally forwarding to tracing as well
#[derive(Default)]
pub struct CollectingReporter {
	reports: Mutex<Vec<Report>>,
	forward: bool,
}

impl CollectingReporter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Collect and also log through [`TracingReporter`]
	pub fn forwarding() -> Self {
		CollectingReporter { reports: Mutex::new(Vec::new()), forward: true }
	}

	/// Reports received so far
	pub fn reports(&self) -> Vec<Report> {
		match self.reports.lock() {
			Ok(reports) => reports.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	/// Most severe report received, if any
	pub fn worst(&self) -> Option<Severity> {
		self.reports().iter().map(|r| r.severity).max()
	}
}

impl Reporter for CollectingReporter {
	fn report(&self, report: Report) {
		if self.forward {
			TracingReporter.report(report.clone());
		}
		match self.reports.lock() {
			Ok(mut reports) => reports.push(report),
			Err(poisoned) => poisoned.into_inner().push(report),
		}
	}
}


// vim: ts=4
