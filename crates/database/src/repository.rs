use crate::DbError;
use chrono::{DateTime, Utc};
use core_types::{Candle, Trade};
use scenario::Scenario;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A persisted scenario row, as listed for a portfolio.
#[derive(Debug, Clone)]
pub struct StoredScenario {
    pub scenario: Scenario,
    pub portfolio_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches all closed trades for a portfolio, ordered by exit time.
    ///
    /// The provenance fields (`exit_reason`, costs) are simulation-only and
    /// never present on recorded history.
    pub async fn get_trades_for_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<Trade>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT trade_id, instrument, direction, entry_time, exit_time,
                   entry_price, exit_price, stop_price, contracts, pnl,
                   initial_risk, r_multiple, outcome
            FROM trades
            WHERE portfolio_id = $1
            ORDER BY exit_time ASC
            "#,
        )
        .bind(portfolio_id)
        .fetch_all(&self.pool)
        .await?;

        let trades = rows
            .into_iter()
            .map(|row| {
                let direction: String = row.get("direction");
                let outcome: String = row.get("outcome");
                let contracts: i32 = row.get("contracts");
                Ok(Trade {
                    trade_id: row.get("trade_id"),
                    instrument: row.get("instrument"),
                    direction: direction
                        .parse()
                        .map_err(|e| DbError::DecodeError(format!("{e}")))?,
                    entry_time: row.get("entry_time"),
                    exit_time: row.get("exit_time"),
                    entry_price: row.get("entry_price"),
                    exit_price: row.get("exit_price"),
                    stop_price: row.get("stop_price"),
                    contracts: contracts.max(1) as u32,
                    pnl: row.get("pnl"),
                    initial_risk: row.get("initial_risk"),
                    r_multiple: row.get("r_multiple"),
                    outcome: outcome
                        .parse()
                        .map_err(|e| DbError::DecodeError(format!("{e}")))?,
                    exit_reason: None,
                    slippage_cost: None,
                    commission_cost: None,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(trades)
    }

    /// Fetches the full candle series for an instrument, ordered by time.
    pub async fn get_candles(&self, instrument: &str) -> Result<Vec<Candle>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT instrument, ts, open, high, low, close, volume
            FROM candles
            WHERE instrument = $1
            ORDER BY ts ASC
            "#,
        )
        .bind(instrument)
        .fetch_all(&self.pool)
        .await?;

        let candles = rows
            .into_iter()
            .map(|row| Candle {
                instrument: row.get("instrument"),
                timestamp: row.get("ts"),
                open: row.get("open"),
                high: row.get("high"),
                low: row.get("low"),
                close: row.get("close"),
                volume: row.get("volume"),
            })
            .collect();

        Ok(candles)
    }

    /// Persists a scenario run. Parameters, metrics, and the modified trade
    /// set are stored as JSONB documents; the stored state is opaque to the
    /// engines.
    pub async fn save_scenario(
        &self,
        portfolio_id: Uuid,
        scenario: &Scenario,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO scenarios (scenario_id, portfolio_id, name, is_baseline, params, metrics, trades)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (scenario_id) DO NOTHING
            "#,
        )
        .bind(scenario.scenario_id)
        .bind(portfolio_id)
        .bind(&scenario.name)
        .bind(scenario.is_baseline)
        .bind(serde_json::to_value(&scenario.params)?)
        .bind(serde_json::to_value(&scenario.metrics)?)
        .bind(serde_json::to_value(&scenario.trades)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists previously persisted scenarios for a portfolio, oldest first.
    pub async fn list_scenarios(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<StoredScenario>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT scenario_id, portfolio_id, name, is_baseline, params, metrics, trades, created_at
            FROM scenarios
            WHERE portfolio_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(portfolio_id)
        .fetch_all(&self.pool)
        .await?;

        let scenarios = rows
            .into_iter()
            .map(|row| {
                let params: serde_json::Value = row.get("params");
                let metrics: serde_json::Value = row.get("metrics");
                let trades: serde_json::Value = row.get("trades");
                Ok(StoredScenario {
                    scenario: Scenario {
                        scenario_id: row.get("scenario_id"),
                        name: row.get("name"),
                        is_baseline: row.get("is_baseline"),
                        params: serde_json::from_value(params)?,
                        trades: serde_json::from_value(trades)?,
                        metrics: serde_json::from_value(metrics)?,
                    },
                    portfolio_id: row.get("portfolio_id"),
                    created_at: row.get("created_at"),
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(scenarios)
    }
}
