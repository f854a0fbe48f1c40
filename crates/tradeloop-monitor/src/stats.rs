//! Running totals over tick reports.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::info;
use tradeloop_engine::{ExecutionAction, Stage, SymbolOutcome, TickReport};

const DEFAULT_RECENT: usize = 20;

/// Counters accumulated from every [`TickReport`] of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub strategy_name: String,
    pub ticks: usize,
    pub idle: usize,
    pub neutral: usize,
    pub submitted: usize,
    pub skipped: usize,
    pub closed: usize,
    pub failures: BTreeMap<Stage, usize>,
    /// Most recent trade and failure messages, oldest first
    pub recent: VecDeque<String>,
    #[serde(skip)]
    recent_limit: usize,
}

impl RunStats {
    pub fn new(strategy_name: impl Into<String>) -> Self {
        Self::with_recent_limit(strategy_name, DEFAULT_RECENT)
    }

    pub fn with_recent_limit(strategy_name: impl Into<String>, limit: usize) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            ticks: 0,
            idle: 0,
            neutral: 0,
            submitted: 0,
            skipped: 0,
            closed: 0,
            failures: BTreeMap::new(),
            recent: VecDeque::with_capacity(limit),
            recent_limit: limit,
        }
    }

    /// Fold one tick's outcomes into the totals.
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        for (symbol, outcome) in &report.outcomes {
            match outcome {
                SymbolOutcome::Idle => self.idle += 1,
                SymbolOutcome::Neutral => self.neutral += 1,
                SymbolOutcome::Executed(execution) => {
                    self.closed += execution.closed.len();
                    match &execution.action {
                        ExecutionAction::Submitted { ticket, request } => {
                            self.submitted += 1;
                            self.remember(format!(
                                "{} {} {} {} lots at {} (ticket {})",
                                symbol,
                                request.side,
                                request.kind,
                                request.lots,
                                request.price,
                                ticket
                            ));
                        }
                        ExecutionAction::Skipped { .. } => self.skipped += 1,
                    }
                }
                SymbolOutcome::Failed { stage, error } => {
                    *self.failures.entry(*stage).or_insert(0) += 1;
                    self.remember(format!("{} failed at {}: {}", symbol, stage, error));
                }
            }
        }
    }

    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    /// Emit the totals as one info event.
    pub fn log_summary(&self) {
        info!(
            strategy = %self.strategy_name,
            ticks = self.ticks,
            submitted = self.submitted,
            skipped = self.skipped,
            closed = self.closed,
            failures = self.total_failures(),
            "Run summary"
        );
    }

    fn remember(&mut self, message: String) {
        if self.recent_limit == 0 {
            return;
        }
        if self.recent.len() == self.recent_limit {
            self.recent.pop_front();
        }
        self.recent.push_back(message);
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy:   {}", self.strategy_name)?;
        writeln!(f, "Ticks:      {}", self.ticks)?;
        writeln!(f, "Idle:       {}", self.idle)?;
        writeln!(f, "Neutral:    {}", self.neutral)?;
        writeln!(f, "Submitted:  {}", self.submitted)?;
        writeln!(f, "Skipped:    {}", self.skipped)?;
        writeln!(f, "Closed:     {}", self.closed)?;
        write!(f, "Failures:   {}", self.total_failures())?;
        for (stage, count) in &self.failures {
            write!(f, "\n  {}: {}", stage, count)?;
        }
        Ok(())
    }
}
