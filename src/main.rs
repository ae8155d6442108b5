//! shipfee - quote parcels and look up destinations from the terminal.
//!
//! Commands:
//!   quote     - Price a parcel: quote <country> <weight-kg> <cost> [--json]
//!   search    - Rank destinations for a query: search <query> [--json]
//!   countries - List destinations with their delivery estimates
//!   info      - Show where rates came from and any sheet problems
//!   config    - Show or change stored settings
//!   version   - Print the version

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use shipping_fee_estimator::{
    domain::{format_currency, popular_countries, Currency},
    util::{
        config::{self, AppConfig, RatesSource},
        logging,
        version::{version_label, APP_NAME},
    },
    App,
};

type CmdResult = Result<(), Box<dyn Error>>;

fn main() -> ExitCode {
    let stored = match config::load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Ignoring unreadable config: {err}");
            AppConfig::default()
        }
    };
    let config = stored.clone().with_env_overrides();

    logging::init(config.log_filter.as_deref());

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "version" | "--version" | "-v" => {
            println!("{APP_NAME} {}", version_label());
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "config" => cmd_config(stored, &args[2..]),
        cmd @ ("quote" | "search" | "countries" | "info") => match App::bootstrap(&config) {
            Ok(app) => match cmd {
                "quote" => cmd_quote(&app, &args[2..]),
                "search" => cmd_search(&app, &args[2..]),
                "countries" => cmd_countries(&app),
                _ => cmd_info(&app, &config),
            },
            Err(err) => Err(err.into()),
        },
        cmd => {
            print_usage();
            Err(format!("unknown command: {cmd}").into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!("{APP_NAME} {}", version_label());
    println!();
    println!("Usage:");
    println!("  shipfee quote <country> <weight-kg> <cost> [--json]");
    println!("  shipfee search <query> [--json]");
    println!("  shipfee countries");
    println!("  shipfee info");
    println!("  shipfee config [--rates <path>] [--pinyin <path>] [--log <filter>]");
    println!("  shipfee version");
}

fn split_json_flag(args: &[String]) -> (Vec<&str>, bool) {
    let json = args.iter().any(|arg| arg == "--json");
    let positional = args
        .iter()
        .filter(|arg| arg.as_str() != "--json")
        .map(String::as_str)
        .collect();
    (positional, json)
}

fn cmd_quote(app: &App, args: &[String]) -> CmdResult {
    let (positional, json) = split_json_flag(args);
    let [country, weight, cost] = positional.as_slice() else {
        return Err("usage: shipfee quote <country> <weight-kg> <cost> [--json]".into());
    };

    let result = app.quote_text(country, weight, cost)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for line in result.details() {
        println!("{:<18} {}", line.label, line.value);
    }
    println!();
    println!("{:<18} {}", "Shipping", format_currency(result.shipping_fee, Currency::Primary));
    println!(
        "{:<18} {} ({})",
        "Profit",
        format_currency(result.profit.amount, Currency::Primary),
        result.profit.tier.label()
    );
    println!("{:<18} {}", "Total", format_currency(result.total_primary, Currency::Primary));
    println!(
        "{:<18} {}",
        "Total (USD)",
        format_currency(result.total_secondary, Currency::Secondary)
    );
    Ok(())
}

fn cmd_search(app: &App, args: &[String]) -> CmdResult {
    let (positional, json) = split_json_flag(args);
    let query = positional.join(" ");
    let hits = app.search(&query);

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matching destination");
        return Ok(());
    }
    for hit in hits {
        println!("{:>3}  {}  ({})", hit.score, hit.name, hit.transit_time);
    }
    Ok(())
}

fn cmd_countries(app: &App) -> CmdResult {
    let snapshot = app.snapshot();
    let popular = popular_countries(&snapshot.table);
    if !popular.is_empty() {
        println!("Popular: {}", popular.join(", "));
        println!();
    }

    let mut names: Vec<_> = snapshot.table.countries().collect();
    names.sort_by(|a, b| a.name.cmp(&b.name));
    for country in names {
        let max = country
            .max_weight()
            .map(|kg| format!("≤ {kg} KG"))
            .unwrap_or_else(|| "no bands".to_string());
        println!("{}  {}  {}", country.name, country.transit_time, max);
    }
    Ok(())
}

fn cmd_info(app: &App, config: &AppConfig) -> CmdResult {
    let snapshot = app.snapshot();
    let source = match config.rates_source() {
        RatesSource::File(path) => path.display().to_string(),
        RatesSource::Embedded => "bundled".to_string(),
    };

    println!("Rates source:   {source}");
    println!("Data version:   {}", snapshot.version);
    println!(
        "Last updated:   {}",
        snapshot.last_updated_label().unwrap_or_else(|| "unknown".to_string())
    );
    println!("Loaded:         {} ago", snapshot.age_string());
    println!("Destinations:   {}", snapshot.table.len());
    println!("Exchange rate:  1 USD = {} CNY", snapshot.table.exchange_rate());
    println!("Pinyin codes:   {}", app.matcher().phonetic().len());

    if !snapshot.issues.is_empty() {
        println!();
        println!("Skipped sheet entries:");
        for issue in &snapshot.issues {
            println!("  - {issue}");
        }
    }
    Ok(())
}

fn cmd_config(mut stored: AppConfig, args: &[String]) -> CmdResult {
    let mut changed = false;
    let mut rest = args.iter();
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .ok_or_else(|| format!("{flag} needs a value"))?
            .clone();
        match flag.as_str() {
            "--rates" => stored.rates_path = Some(PathBuf::from(value)),
            "--pinyin" => stored.phonetic_path = Some(PathBuf::from(value)),
            "--log" => stored.log_filter = Some(value),
            other => return Err(format!("unknown config option: {other}").into()),
        }
        changed = true;
    }

    if changed {
        let path = config::save_config(&stored)?;
        println!("Saved {}", path.display());
    }

    let show = |path: &Option<PathBuf>| {
        path.as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "bundled".to_string())
    };
    println!("rates:  {}", show(&stored.rates_path));
    println!("pinyin: {}", show(&stored.phonetic_path));
    println!("log:    {}", stored.log_filter.as_deref().unwrap_or(logging::DEFAULT_FILTER));
    Ok(())
}
