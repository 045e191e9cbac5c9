use anyhow::Context;
use clap::Parser;
use price_board::config::Command;
use price_board::domain::model::Location;
use price_board::utils::error::{ErrorSeverity, PriceBoardError};
use price_board::utils::logger;
use price_board::{App, CliConfig, FilePreferenceStore, HttpPriceApi};
use std::io::Write;

fn report(e: &PriceBoardError) {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &PriceBoardError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 1,     // 請求或輸入錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

async fn run<W: Write>(
    app: &App<HttpPriceApi, FilePreferenceStore>,
    command: Command,
    out: &mut W,
) -> price_board::Result<()> {
    match command {
        Command::Browse(args) => app.browse(&args, out).await,
        Command::Watch(args) => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            app.watch(&args, input, out).await
        }
        Command::Submit(args) => app.submit(&args, out).await,
        Command::Show { id } => app.show(&id, out).await,
        Command::Pending => app.pending(out).await,
        Command::Approve { id } => app.approve(&id, out).await,
        Command::Reject { id } => app.reject(&id, out).await,
        Command::Categories { add } => app.categories(add.as_deref(), out).await,
        Command::Countries => app.countries(out).await,
        Command::Currencies { set } => app.currencies(set.as_deref(), out).await,
        Command::Convert { amount, from, to } => {
            app.convert(amount, &from, to.as_deref(), out).await
        }
        Command::Location {
            city: Some(city),
            country,
            country_code,
            suggested_currency,
            ..
        } => {
            let location = Location {
                country: country.unwrap_or_default(),
                country_code: country_code.unwrap_or_default().to_ascii_uppercase(),
                city,
                suggested_currency: suggested_currency.map(|c| c.to_ascii_uppercase()),
            };
            app.set_location(&location, out).await
        }
        Command::Location { refresh, .. } => app.location(refresh, out).await,
        Command::Health => app.health(out).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 驗證配置
    let loaded = cli
        .settings()
        .and_then(|settings| Ok((settings, cli.currency_override()?)));
    let (settings, currency_override) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            tracing::error!("❌ Configuration validation failed: {}", e);
            report(&e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if settings.json_logs {
        logger::init_json_logger(settings.verbose);
    } else {
        logger::init_cli_logger(settings.verbose);
    }

    tracing::info!("🚀 Starting price-board against {}", settings.api_base_url);
    tracing::debug!(
        "Page size {}, data dir {}, auth token {}",
        settings.page_size,
        settings.data_dir.display(),
        if settings.auth_token.is_some() { "set" } else { "not set" }
    );

    let api = HttpPriceApi::from_config(&settings).context("failed to build HTTP client")?;
    let store = FilePreferenceStore::new(settings.data_dir.clone());
    let app = App::new(api, store, settings).with_currency_override(currency_override);

    let mut stdout = std::io::stdout();
    let result = run(&app, cli.command, &mut stdout).await;
    stdout.flush().context("failed to flush output")?;

    if let Err(e) = result {
        report(&e);
        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}
