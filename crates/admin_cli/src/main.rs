use std::{error::Error, io::Write};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{BatchReport, Engine, ItemOutcome, Money, Period, Settlement};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "lockfin_admin")]
#[command(about = "Admin utilities for Lockfin (operators, settlement runs)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./lockfin.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Operator(Operator),
    Settlements(Settlements),
    /// Print the dashboard figures.
    Overview,
}

#[derive(Args, Debug)]
struct Operator {
    #[command(subcommand)]
    command: OperatorCommand,
}

#[derive(Subcommand, Debug)]
enum OperatorCommand {
    Create(OperatorCreateArgs),
}

#[derive(Args, Debug)]
struct OperatorCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long, default_value = "admin")]
    role: String,
}

#[derive(Args, Debug)]
struct Settlements {
    #[command(subcommand)]
    command: SettlementsCommand,
}

#[derive(Subcommand, Debug)]
enum SettlementsCommand {
    /// Create settlements for every eligible target over an inclusive period.
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetKind {
    Merchant,
    Distributor,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, value_enum)]
    kind: TargetKind,
    /// First day of the period (YYYY-MM-DD).
    #[arg(long)]
    start: NaiveDate,
    /// Last day of the period, inclusive (YYYY-MM-DD).
    #[arg(long)]
    end: NaiveDate,
    /// Operator id recorded on the created settlements.
    #[arg(long)]
    operator: i64,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Operator password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Operator password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts, operator not created".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_report(report: &BatchReport<Settlement>) {
    for item in &report.items {
        match &item.outcome {
            ItemOutcome::Done(settlement) => println!(
                "created {} for target {}: {} ({} items)",
                settlement.settlement_no,
                item.id,
                Money::new(settlement.actual_amount_minor),
                settlement.item_count
            ),
            ItemOutcome::Skipped(reason) => {
                println!("skipped target {}: {}", item.id, reason.as_str())
            }
            ItemOutcome::Failed { kind, message } => {
                eprintln!("failed target {}: {} ({message})", item.id, kind.as_str())
            }
        }
    }
    println!(
        "{} created, {} skipped, {} failed",
        report.succeeded().count(),
        report.skipped_ids().len(),
        report.failed_ids().len()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Operator(Operator {
            command: OperatorCommand::Create(args),
        }) => {
            let password = prompt_new_password()?;
            let operator = engine
                .create_operator(&args.username, &password, &args.role)
                .await?;
            println!("created operator: {} (#{})", operator.username, operator.id);
        }
        Command::Settlements(Settlements {
            command: SettlementsCommand::Generate(args),
        }) => {
            let period = Period::new(args.start, args.end)?;
            let report = match args.kind {
                TargetKind::Merchant => {
                    engine
                        .generate_merchant_settlements(period, args.operator)
                        .await?
                }
                TargetKind::Distributor => {
                    engine
                        .generate_distributor_settlements(period, args.operator)
                        .await?
                }
            };
            print_report(&report);
            if !report.failed_ids().is_empty() {
                std::process::exit(1);
            }
        }
        Command::Overview => {
            let overview = engine.overview(Utc::now()).await?;
            println!("today revenue:        {}", Money::new(overview.today_revenue_minor));
            println!("month revenue:        {}", Money::new(overview.month_revenue_minor));
            println!("last month revenue:   {}", Money::new(overview.last_month_revenue_minor));
            println!("growth:               {:.2}%", overview.growth_rate);
            println!("total revenue:        {}", Money::new(overview.total_revenue_minor));
            println!("total refunds:        {}", Money::new(overview.total_refund_minor));
            println!("total commission:     {}", Money::new(overview.total_commission_minor));
            println!("net profit:           {}", Money::new(overview.net_profit_minor));
            println!(
                "pending withdrawals:  {} ({})",
                overview.pending_withdrawal_count,
                Money::new(overview.pending_withdrawal_amount_minor)
            );
            println!("pending settlements:  {}", overview.pending_settlement_count);
        }
    }

    Ok(())
}
