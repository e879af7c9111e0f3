use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::MappingError;
use crate::types::CorrectnessLevel;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MappingSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (mapping aborted).
    Error,
    /// Critical error (I/O or document serialization failures).
    Critical,
}

impl MappingSeverity {
    /// Severity of an error that aborted a mapping call.
    pub fn for_error(e: &MappingError) -> Self {
        match e {
            MappingError::Io(_) => MappingSeverity::Critical,
            MappingError::Xlsx(err) => {
                if error_chain_contains_io(err) {
                    MappingSeverity::Critical
                } else {
                    MappingSeverity::Error
                }
            }
            MappingError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => MappingSeverity::Critical,
                _ => MappingSeverity::Error,
            },
            #[cfg(feature = "excel")]
            MappingError::Excel(_) => MappingSeverity::Error,
            MappingError::Json(_)
            | MappingError::SheetNotFound { .. }
            | MappingError::HeaderNotFound { .. }
            | MappingError::InvalidAddress { .. } => MappingSeverity::Error,
            MappingError::CellCoercion { .. } => MappingSeverity::Warning,
        }
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

/// Context about a mapping attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingContext {
    /// Sheet name, or the requested fragment when no sheet matched.
    pub sheet: String,
    pub strict: bool,
}

/// Stats reported when a mapping call completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingStats {
    /// Records returned as OK.
    pub records: usize,
    /// Aggregated validation level.
    pub level: CorrectnessLevel,
    /// Cells that failed lenient coercion.
    pub flagged_cells: usize,
}

/// Observer interface for mapping outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait MappingObserver: Send + Sync {
    /// Called when mapping completes, whatever the validation level.
    fn on_success(&self, _ctx: &MappingContext, _stats: MappingStats) {}

    /// Called when mapping aborts.
    fn on_failure(&self, _ctx: &MappingContext, _severity: MappingSeverity, _error: &MappingError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &MappingContext, severity: MappingSeverity, error: &MappingError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn MappingObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn MappingObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl MappingObserver for CompositeObserver {
    fn on_success(&self, ctx: &MappingContext, stats: MappingStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &MappingContext, severity: MappingSeverity, error: &MappingError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &MappingContext, severity: MappingSeverity, error: &MappingError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs mapping events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl MappingObserver for TracingObserver {
    fn on_success(&self, ctx: &MappingContext, stats: MappingStats) {
        info!(
            sheet = %ctx.sheet,
            records = stats.records,
            level = %stats.level,
            flagged = stats.flagged_cells,
            "sheet mapped"
        );
    }

    fn on_failure(&self, ctx: &MappingContext, severity: MappingSeverity, error: &MappingError) {
        warn!(sheet = %ctx.sheet, ?severity, strict = ctx.strict, err = %error, "mapping failed");
    }

    fn on_alert(&self, ctx: &MappingContext, severity: MappingSeverity, error: &MappingError) {
        error!(sheet = %ctx.sheet, ?severity, strict = ctx.strict, err = %error, "mapping alert");
    }
}
