//! Report output port trait.

use crate::domain::config::StrategyConfig;
use crate::domain::error::XsmomError;
use crate::domain::pipeline::BacktestRun;
use std::path::Path;

/// Port for persisting a finished backtest run.
pub trait ReportPort {
    fn write(
        &self,
        run: &BacktestRun,
        config: &StrategyConfig,
        output_dir: &Path,
    ) -> Result<(), XsmomError>;
}
