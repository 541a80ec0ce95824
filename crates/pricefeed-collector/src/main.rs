//! Standalone daily price collector CLI.

use clap::{Parser, Subcommand};
use pricefeed_collector::config::{CollectorConfig, DaemonConfig};
use pricefeed_collector::{build_pipeline, CollectorError, Pipeline, StoreMode};
use pricefeed_core::{init_logging, parse_symbol_list, LogSettings};
use pricefeed_data::PgPriceWriter;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "pricefeed-collector")]
#[command(about = "Daily equity price collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 일별 시세 1회 수집 후 심볼별 결과를 JSON으로 출력
    Run {
        /// 특정 심볼만 수집 (쉼표로 구분, 예: "AAPL,MSFT")
        #[arg(long)]
        symbols: Option<String>,

        /// DB에 쓰지 않고 메모리 저장소 사용
        #[arg(long)]
        dry_run: bool,
    },

    /// stock_prices 테이블 생성
    Migrate,

    /// 데몬 모드: 주기적으로 수집 실행
    Daemon {
        /// DB에 쓰지 않고 메모리 저장소 사용
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_logging(&LogSettings::from_env(&cli.log_level))?;

    tracing::info!("PriceFeed Collector 시작");

    let CollectorConfig {
        database,
        provider,
        symbols,
        ingest,
        daemon,
    } = CollectorConfig::from_env()?;
    tracing::debug!(symbols = ?symbols, "설정 로드 완료");

    match cli.command {
        Commands::Run {
            symbols: override_symbols,
            dry_run,
        } => {
            let symbols = match override_symbols {
                Some(list) => parse_symbol_list(&list)?,
                None => symbols,
            };

            let pipeline = build_pipeline(provider, &database, &ingest, store_mode(dry_run)).await?;

            let cancel = CancellationToken::new();
            let watcher = spawn_ctrl_c_watcher(cancel.clone());

            let report = pipeline.run_once(&symbols, &cancel).await;
            watcher.abort();
            pipeline.shutdown().await;

            let report = report?;
            report.summary.log_summary("일별 시세 수집");
            println!("{}", serde_json::to_string_pretty(&report.results)?);
        }
        Commands::Migrate => {
            let writer = PgPriceWriter::connect(&database.url, database.max_connections).await?;
            writer.ensure_schema().await?;
            pricefeed_data::PriceSink::close(&writer).await;
        }
        Commands::Daemon { dry_run } => {
            let pipeline = build_pipeline(provider, &database, &ingest, store_mode(dry_run)).await?;
            run_daemon(&pipeline, &symbols, &daemon).await;
            pipeline.shutdown().await;
        }
    }

    tracing::info!("PriceFeed Collector 종료");

    Ok(())
}

fn store_mode(dry_run: bool) -> StoreMode {
    if dry_run {
        StoreMode::DryRun
    } else {
        StoreMode::Postgres
    }
}

/// Ctrl-C 수신 시 토큰을 취소합니다. 진행 중인 심볼은 끝까지 처리됩니다.
fn spawn_ctrl_c_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("종료 신호 수신, 남은 심볼 조회 중단");
            cancel.cancel();
        }
    })
}

async fn run_daemon(pipeline: &Pipeline, symbols: &[String], daemon: &DaemonConfig) {
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}분) ===",
        daemon.interval_minutes
    );

    let shutdown = CancellationToken::new();
    let watcher = spawn_ctrl_c_watcher(shutdown.clone());

    let mut interval = tokio::time::interval(daemon.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = interval.tick() => {
                match pipeline.run_once(symbols, &shutdown).await {
                    Ok(report) => report.summary.log_summary("일별 시세 수집"),
                    Err(CollectorError::Config(msg)) => {
                        tracing::error!("설정 에러로 데몬 종료: {}", msg);
                        break;
                    }
                    Err(e) => tracing::error!("수집 실패: {}", e),
                }

                tracing::info!(
                    "=== 수집 완료, 다음 실행: {}분 후 ===",
                    daemon.interval_minutes
                );
            }
        }
    }

    watcher.abort();
}
