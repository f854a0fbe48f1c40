//! Per-tick orchestration across the configured symbols.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};
use tradeloop_core::{
    BoundaryState, BrokerClient, DedupLog, EngineError, EngineResult, HookContext,
    MarketDataProvider, StrategyHooks,
};

use crate::boundary::BoundaryClock;
use crate::config::EngineConfig;
use crate::executor::{ExecutionOutcome, TradeExecutor};
use crate::pipeline::SignalPipeline;
use crate::reconciler::OrderReconciler;

/// Step of a symbol's chain at which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Reconcile,
    Boundary,
    Signal,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Reconcile => write!(f, "reconcile"),
            Stage::Boundary => write!(f, "boundary"),
            Stage::Signal => write!(f, "signal"),
            Stage::Execute => write!(f, "execute"),
        }
    }
}

/// How one symbol's processing ended on a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SymbolOutcome {
    /// No new candle; signals were not evaluated
    Idle,
    /// Evaluated, no trade wanted
    Neutral,
    /// A signal reached the executor
    Executed(ExecutionOutcome),
    /// The chain failed and was abandoned for this tick
    Failed { stage: Stage, error: String },
}

/// Per-symbol outcomes of one tick, in configuration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub outcomes: Vec<(String, SymbolOutcome)>,
}

impl TickReport {
    pub fn outcome(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, SymbolOutcome::Failed { .. }))
            .count()
    }

    /// Outcomes that reached the executor.
    pub fn executions(&self) -> impl Iterator<Item = (&str, &ExecutionOutcome)> {
        self.outcomes.iter().filter_map(|(symbol, outcome)| match outcome {
            SymbolOutcome::Executed(execution) => Some((symbol.as_str(), execution)),
            _ => None,
        })
    }
}

/// One strategy instance: owns its boundary state and log-once cache and
/// drives the per-symbol chain on every tick.
pub struct TickOrchestrator {
    config: EngineConfig,
    market: Arc<dyn MarketDataProvider>,
    broker: Arc<dyn BrokerClient>,
    hooks: Box<dyn StrategyHooks>,
    clock: BoundaryClock,
    log: DedupLog,
    reconciler: OrderReconciler,
    pipeline: SignalPipeline,
    executor: TradeExecutor,
}

impl TickOrchestrator {
    /// Create an orchestrator, validating `config`.
    pub fn new(
        config: EngineConfig,
        market: Arc<dyn MarketDataProvider>,
        broker: Arc<dyn BrokerClient>,
        hooks: Box<dyn StrategyHooks>,
    ) -> EngineResult<Self> {
        config.validate()?;

        info!(
            strategy = hooks.name(),
            market = market.name(),
            broker = broker.name(),
            timeframe = %config.timeframe,
            symbols = ?config.symbols,
            "Strategy instance created"
        );

        Ok(Self {
            clock: BoundaryClock::new(config.eval_once_per_candle, config.max_day_scan_bars),
            log: DedupLog::new(),
            reconciler: OrderReconciler::new(),
            pipeline: SignalPipeline::new(),
            executor: TradeExecutor::new(
                config.close_on_opposing_signal,
                config.entry_slippage,
                config.close_slippage,
            ),
            config,
            market,
            broker,
            hooks,
        })
    }

    /// Run the strategy's `init` hook.
    pub fn init(&mut self) -> EngineResult<()> {
        debug!(strategy = self.hooks.name(), "init called");
        let mut ctx = HookContext {
            market: self.market.as_ref(),
            timeframe: self.config.timeframe,
            log: &mut self.log,
        };
        self.hooks.init(&mut ctx).map_err(|e| {
            error!(error = %e, "Strategy init failed");
            e
        })
    }

    /// Run the strategy's `destroy` hook.
    pub fn deinit(&mut self) -> EngineResult<()> {
        debug!(strategy = self.hooks.name(), "deinit called");
        let mut ctx = HookContext {
            market: self.market.as_ref(),
            timeframe: self.config.timeframe,
            log: &mut self.log,
        };
        self.hooks.destroy(&mut ctx).map_err(|e| {
            error!(error = %e, "Strategy deinit failed");
            e
        })
    }

    /// Process one tick for every configured symbol.
    ///
    /// A failing symbol is logged and skipped; it never stops the symbols
    /// after it.
    pub fn on_tick(&mut self) -> TickReport {
        let symbols = self.config.symbols.clone();
        let mut report = TickReport::default();

        for symbol in symbols {
            let outcome = match self.process_symbol(&symbol) {
                Ok(outcome) => outcome,
                Err((stage, e)) => {
                    error!(symbol = %symbol, %stage, error = %e, "Symbol processing failed");
                    SymbolOutcome::Failed {
                        stage,
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push((symbol, outcome));
        }

        report
    }

    fn process_symbol(&mut self, symbol: &str) -> Result<SymbolOutcome, (Stage, EngineError)> {
        let Self {
            config,
            market,
            broker,
            hooks,
            clock,
            log,
            reconciler,
            pipeline,
            executor,
        } = self;
        let mut ctx = HookContext {
            market: market.as_ref(),
            timeframe: config.timeframe,
            log,
        };

        reconciler
            .reconcile(broker.as_ref(), hooks.as_mut(), &mut ctx, symbol)
            .map_err(|e| (Stage::Reconcile, e))?;

        let proceed = clock
            .check(symbol, &mut ctx, hooks.as_mut())
            .map_err(|e| (Stage::Boundary, e))?;
        if !proceed {
            return Ok(SymbolOutcome::Idle);
        }

        let signal = pipeline
            .run(hooks.as_mut(), &mut ctx, symbol)
            .map_err(|e| (Stage::Signal, e))?;
        if signal.is_neutral() {
            return Ok(SymbolOutcome::Neutral);
        }

        info!(symbol, %signal, "Signal generated");
        let outcome = executor
            .execute(broker.as_ref(), hooks.as_ref(), &ctx, symbol, &signal)
            .map_err(|e| (Stage::Execute, e))?;
        Ok(SymbolOutcome::Executed(outcome))
    }

    /// Boundary state for `symbol` on the configured timeframe.
    pub fn boundary_state(&self, symbol: &str) -> Option<&BoundaryState> {
        self.clock.state(symbol, self.config.timeframe)
    }

    pub fn dedup_log(&self) -> &DedupLog {
        &self.log
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &str {
        self.hooks.name()
    }
}

impl fmt::Debug for TickOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickOrchestrator")
            .field("strategy", &self.hooks.name())
            .field("market", &self.market.name())
            .field("broker", &self.broker.name())
            .field("config", &self.config)
            .finish()
    }
}
