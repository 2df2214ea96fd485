use auth::{ApiCredentials, AuthError};
use bargain::{BalanceUnit, Bargain, BargainConfig, CloseOutcome, PriceKind};
use binance_rest::{BinanceAdapter, BinanceRestClient, BinanceRestError};
use bitmex_rest::{BitmexAdapter, BitmexRestClient, BitmexRestError, BitmexSettings};
use common::{Environment, Venue};
use execution_core::{ExchangeAdapter, ExecutionError, OrderStatus};
use kraken::KrakenAdapter;
use metrics::create_metrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

const USAGE: &str = "usage: runner <command> [args]

commands:
  position                      current position
  orders                        open orders
  executions [clOrdID]          execution history, oldest first
  delta                         portfolio delta over BARGAIN_CONTRACTS
  balance                       balance in venue units, XBT (XBt margin only) and USD
  price <kind>                  spread | index | index-live | last-buy | last-sell |
                                maker-buy | maker-sell | mark | mid | ref-delta | <field>
  cancel-all                    cancel every open order
  close [qty]                   close the position, keeping qty
  status <clOrdID> <status>     New | PartiallyFilled | Filled | Canceled | Triggered

exit status: 0 ok, 1 failed, 75 transient venue failure (safe to retry)";

/// Exit status of a failure the venue may not repeat (EX_TEMPFAIL).
const EXIT_RETRYABLE: i32 = 75;

#[derive(Debug, Error)]
enum RunnerError {
    #[error("{0}")]
    Usage(String),

    #[error("credentials: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Binance(#[from] BinanceRestError),

    #[error(transparent)]
    Bitmex(#[from] BitmexRestError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}

impl RunnerError {
    /// True when the venue failure is transient and the command can be rerun.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Binance(e) => e.is_retryable(),
            Self::Bitmex(e) => e.is_retryable(),
            Self::Execution(ExecutionError::Venue { source, .. }) => {
                if let Some(e) = source.downcast_ref::<BinanceRestError>() {
                    e.is_retryable()
                } else if let Some(e) = source.downcast_ref::<BitmexRestError>() {
                    e.is_retryable()
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Position,
    Orders,
    Executions(Option<String>),
    Delta,
    Balance,
    Price(PriceKind),
    CancelAll,
    Close(Option<Decimal>),
    Status(String, OrderStatus),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, RunnerError> {
        let usage = |msg: &str| RunnerError::Usage(format!("{}\n\n{}", msg, USAGE));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["position"] => Ok(Self::Position),
            ["orders"] => Ok(Self::Orders),
            ["executions"] => Ok(Self::Executions(None)),
            ["executions", id] => Ok(Self::Executions(Some(id.to_string()))),
            ["delta"] => Ok(Self::Delta),
            ["balance"] => Ok(Self::Balance),
            ["price", kind] => kind
                .parse()
                .map(Self::Price)
                .map_err(|e| usage(&e.to_string())),
            ["cancel-all"] => Ok(Self::CancelAll),
            ["close"] => Ok(Self::Close(None)),
            ["close", qty] => qty
                .parse::<Decimal>()
                .map(|q| Self::Close(Some(q)))
                .map_err(|_| usage(&format!("invalid quantity '{}'", qty))),
            ["status", id, status] => match OrderStatus::from_venue_str(status) {
                OrderStatus::Unknown => Err(usage(&format!("invalid status '{}'", status))),
                status => Ok(Self::Status(id.to_string(), status)),
            },
            [] => Err(usage("missing command")),
            [cmd, ..] => Err(usage(&format!("invalid command '{}'", cmd))),
        }
    }
}

async fn connect(
    venue: Venue,
    environment: Environment,
    config: &BargainConfig,
) -> Result<Arc<dyn ExchangeAdapter>, RunnerError> {
    let adapter: Arc<dyn ExchangeAdapter> = match venue {
        Venue::Binance => {
            let client = BinanceRestClient::new(ApiCredentials::from_env(venue)?, environment)?;
            Arc::new(BinanceAdapter::connect(client, config.symbol.clone()).await?)
        }
        Venue::Bitmex => {
            let settings =
                BitmexSettings::from_env().with_order_id_prefix(config.order_id_prefix.clone());
            let client = BitmexRestClient::new(
                ApiCredentials::from_env(venue)?,
                environment,
                settings.timeout,
            )?;
            Arc::new(BitmexAdapter::new(client, config.symbol.clone(), settings))
        }
        Venue::Kraken => Arc::new(KrakenAdapter::new(config.symbol.clone())),
    };
    Ok(adapter)
}

async fn execute(bargain: &Bargain, command: Command) -> Result<(), RunnerError> {
    match command {
        Command::Position => {
            let position = bargain
                .adapter()
                .get_position(&bargain.config().symbol)
                .await?;
            println!("{}", serde_json::to_string_pretty(&position)?);
        }
        Command::Orders => {
            println!("{}", serde_json::to_string_pretty(&bargain.open_orders().await?)?);
        }
        Command::Executions(id) => {
            for record in bargain.execution(id.as_deref()).await? {
                println!(
                    "{} | {} | {} | {}",
                    record.transact_time, record.client_order_id, record.order_id, record.ord_status
                );
            }
        }
        Command::Delta => {
            println!("{}", serde_json::to_string_pretty(&bargain.portfolio_delta().await?)?);
        }
        Command::Balance => {
            println!("native: {}", bargain.balance(&BalanceUnit::Native).await?);
            match bargain.balance(&BalanceUnit::Xbt).await {
                Ok(xbt) => println!("xbt:    {}", xbt),
                Err(ExecutionError::Unsupported { .. }) => {}
                Err(e) => return Err(e.into()),
            }
            println!(
                "usd:    {}",
                bargain.balance(&BalanceUnit::Usd(PriceKind::Mid)).await?
            );
        }
        Command::Price(kind) => {
            println!("{}: {}", kind, bargain.price(&kind).await?);
        }
        Command::CancelAll => {
            let cancelled = bargain.cancel_all_orders().await?;
            println!("{}", if cancelled { "cancelled" } else { "nothing to cancel" });
        }
        Command::Close(qty) => match bargain.cancel_and_close(qty).await? {
            CloseOutcome::Placed(ack) => println!("{}", serde_json::to_string_pretty(&ack)?),
            CloseOutcome::NoOp => println!("no position"),
        },
        Command::Status(id, status) => {
            let reached = bargain.order_reached_status(&id, status).await?;
            let ever = bargain.order_had_status(&id, status).await?;
            println!(
                "{} ({}): reached {} = {}, ever {} = {}",
                id,
                bargain.source_key(&id),
                status,
                reached,
                status,
                ever
            );
        }
    }
    Ok(())
}

async fn run() -> Result<(), RunnerError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let venue = Venue::from_env();
    let environment = Environment::from_env();
    let config = BargainConfig::from_env();

    info!(
        venue = %venue,
        environment = %environment,
        symbol = %config.symbol,
        command = ?command,
        "Starting"
    );

    let metrics = create_metrics();
    let adapter = connect(venue, environment, &config).await?;
    let bargain = Bargain::new(adapter, config).with_metrics(metrics.clone());

    let result = execute(&bargain, command).await;

    let snapshot = metrics.snapshot();
    if snapshot.needs_attention() {
        println!("\n{}", snapshot);
    }
    result
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    common::init_logging();

    if let Err(e) = run().await {
        let retryable = e.is_retryable();
        match &e {
            RunnerError::Usage(msg) => eprintln!("{}", msg),
            other => error!(error = %other, retryable, "Command failed"),
        }
        std::process::exit(if retryable { EXIT_RETRYABLE } else { 1 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use execution_core::Side;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&args(&["position"])).unwrap(), Command::Position);
        assert_eq!(
            Command::parse(&args(&["executions", "mlk_A-S_C"])).unwrap(),
            Command::Executions(Some("mlk_A-S_C".into()))
        );
        assert_eq!(
            Command::parse(&args(&["price", "maker-sell"])).unwrap(),
            Command::Price(PriceKind::MarketMaker(Side::Sell))
        );
        assert_eq!(
            Command::parse(&args(&["close", "25"])).unwrap(),
            Command::Close(Some(Decimal::from(25)))
        );
        assert_eq!(
            Command::parse(&args(&["status", "mlk_A-S_C", "Filled"])).unwrap(),
            Command::Status("mlk_A-S_C".into(), OrderStatus::Filled)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Command::parse(&[]), Err(RunnerError::Usage(_))));
        assert!(matches!(
            Command::parse(&args(&["close", "lots"])),
            Err(RunnerError::Usage(_))
        ));
        assert!(matches!(
            Command::parse(&args(&["status", "x", "Sleeping"])),
            Err(RunnerError::Usage(_))
        ));
        assert!(matches!(
            Command::parse(&args(&["launch"])),
            Err(RunnerError::Usage(_))
        ));
    }

    #[test]
    fn test_retryable_venue_failures() {
        let overloaded = BitmexRestError::ApiError {
            status: 503,
            name: "HTTPError".into(),
            message: "The system is currently overloaded".into(),
        };
        assert!(RunnerError::Execution(overloaded.into()).is_retryable());

        let busy = BinanceRestError::ApiError {
            code: -1001,
            message: "Internal error".into(),
        };
        assert!(RunnerError::Binance(busy).is_retryable());

        assert!(!RunnerError::Execution(BinanceRestError::OrderNotFound.into()).is_retryable());
        assert!(!RunnerError::Execution(ExecutionError::InvalidOrder("qty".into())).is_retryable());
        assert!(!RunnerError::Usage("usage".into()).is_retryable());
    }
}
