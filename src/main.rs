use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use account_forest::{
    transaction_filename, ChartError, DecimalScheme, Forest, Side, SignConvention, Transaction,
};

/// Characters not allowed in report names; reports become file names.
const FORBIDDEN_NAME_CHARS: &str = "<>:\"/\\|?*";

#[derive(Parser)]
#[command(about = "Interactive chart-of-accounts manager", version)]
struct Cli {
    /// Chart file; the transaction log lives next to it
    #[arg(long, default_value = "accounts.txt")]
    file: PathBuf,

    /// Directory account reports are written into
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    fs::create_dir_all(&cli.reports_dir).with_context(|| {
        format!(
            "cannot create report directory {}",
            cli.reports_dir.display()
        )
    })?;
    let mut forest = load_or_empty(&cli.file)?;
    run_menu(&mut forest, &cli)?;
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("account_forest=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// A chart file that does not exist yet is an empty chart; anything else
/// that fails to load is a real startup error.
fn load_or_empty(path: &Path) -> anyhow::Result<Forest> {
    match Forest::build_from_file(path, DecimalScheme::default(), SignConvention::default()) {
        Ok(forest) => Ok(forest),
        Err(ChartError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Ok(Forest::new()),
        Err(err) => {
            Err(err).with_context(|| format!("cannot load chart from {}", path.display()))
        }
    }
}

fn run_menu(forest: &mut Forest, cli: &Cli) -> io::Result<()> {
    loop {
        println!();
        println!("1) Add account");
        println!("2) Apply transaction");
        println!("3) Write account report");
        println!("4) Delete transaction");
        println!("5) Display chart");
        println!("6) Find account");
        println!("0) Exit");
        let Some(choice) = read_line("Choice: ")? else {
            break;
        };
        let keep_going = match choice.as_str() {
            "1" => add_account(forest, &cli.file)?,
            "2" => apply_transaction(forest, &cli.file)?,
            "3" => write_report(forest, &cli.reports_dir)?,
            "4" => delete_transaction(forest, &cli.file)?,
            "5" => {
                display_chart(forest);
                true
            }
            "6" => find_account(forest)?,
            "0" => false,
            _ => {
                println!("Unknown choice.");
                true
            }
        };
        if !keep_going {
            break;
        }
    }
    Ok(())
}

fn add_account(forest: &mut Forest, chart_path: &Path) -> io::Result<bool> {
    let Some(number) = prompt_account_number()? else {
        return Ok(false);
    };
    let Some(description) = read_line("Description: ")? else {
        return Ok(false);
    };
    let Some(balance) = prompt_decimal("Initial balance: ")? else {
        return Ok(false);
    };
    match forest.add_account_with_file(number, description, balance, chart_path) {
        Ok(true) => println!("Account {number} added."),
        Ok(false) => println!("Account {number} added, but the chart could not be saved."),
        Err(err) => println!("Cannot add account: {err}"),
    }
    Ok(true)
}

fn apply_transaction(forest: &mut Forest, chart_path: &Path) -> io::Result<bool> {
    let Some(number) = prompt_account_number()? else {
        return Ok(false);
    };
    let Some(amount) = prompt_amount()? else {
        return Ok(false);
    };
    let Some(side) = prompt_side()? else {
        return Ok(false);
    };
    let txn = match Transaction::new(amount, side) {
        Ok(txn) => txn,
        Err(err) => {
            println!("Cannot apply transaction: {err}");
            return Ok(true);
        }
    };
    match forest.add_transaction(number, txn) {
        Ok(()) => match save_all(forest, chart_path) {
            Ok(()) => println!("Transaction applied."),
            Err(err) => println!("Transaction applied, but saving failed: {err}"),
        },
        Err(err) => println!("Cannot apply transaction: {err}"),
    }
    Ok(true)
}

fn write_report(forest: &Forest, reports_dir: &Path) -> io::Result<bool> {
    let Some(number) = prompt_account_number()? else {
        return Ok(false);
    };
    let Some(name) = prompt_report_name()? else {
        return Ok(false);
    };
    let path = reports_dir.join(format!("{name}.txt"));
    match forest.report(number) {
        Ok(text) => match fs::write(&path, text) {
            Ok(()) => println!("Report written to {}.", path.display()),
            Err(err) => println!("Cannot write {}: {err}", path.display()),
        },
        Err(err) => println!("Cannot create report: {err}"),
    }
    Ok(true)
}

fn delete_transaction(forest: &mut Forest, chart_path: &Path) -> io::Result<bool> {
    let Some(number) = prompt_account_number()? else {
        return Ok(false);
    };
    let count = match forest.find_account(number) {
        Some(node) => {
            for (index, txn) in node.account().transactions().iter().enumerate() {
                println!("Index {index}: {txn}");
            }
            node.account().transactions().len()
        }
        None => {
            println!("Account {number} not found.");
            return Ok(true);
        }
    };
    if count == 0 {
        println!("Account {number} has no transactions.");
        return Ok(true);
    }
    let Some(index) = prompt_index()? else {
        return Ok(false);
    };
    match forest.delete_transaction(number, index) {
        Ok(()) => match save_all(forest, chart_path) {
            Ok(()) => println!("Transaction deleted."),
            Err(err) => println!("Transaction deleted, but saving failed: {err}"),
        },
        Err(err) => println!("Cannot delete transaction: {err}"),
    }
    Ok(true)
}

fn display_chart(forest: &Forest) {
    if forest.is_empty() {
        println!("The chart is empty.");
    } else {
        print!("{forest}");
    }
}

fn find_account(forest: &Forest) -> io::Result<bool> {
    let Some(number) = prompt_account_number()? else {
        return Ok(false);
    };
    match forest.find_account(number) {
        Some(node) => {
            let account = node.account();
            println!(
                "{} {} {:.2}",
                account.number(),
                account.description(),
                account.balance()
            );
        }
        None => println!("Account {number} not found."),
    }
    Ok(true)
}

fn save_all(forest: &Forest, chart_path: &Path) -> io::Result<()> {
    forest.save_to_file(chart_path)?;
    forest.save_transactions(transaction_filename(chart_path))
}

/// Prompts once; `None` means stdin is closed and the program should wind
/// down instead of spinning on an empty reader.
fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_account_number() -> io::Result<Option<u32>> {
    loop {
        let Some(text) = read_line("Account number: ")? else {
            return Ok(None);
        };
        match text.parse::<u32>() {
            Ok(number) if number > 0 => return Ok(Some(number)),
            _ => println!("Enter a positive whole number."),
        }
    }
}

fn prompt_decimal(prompt: &str) -> io::Result<Option<Decimal>> {
    loop {
        let Some(text) = read_line(prompt)? else {
            return Ok(None);
        };
        match text.parse::<Decimal>() {
            Ok(value) => return Ok(Some(value)),
            Err(_) => println!("Enter a decimal amount, like 125.50."),
        }
    }
}

fn prompt_amount() -> io::Result<Option<Decimal>> {
    loop {
        let Some(amount) = prompt_decimal("Amount: ")? else {
            return Ok(None);
        };
        if amount.is_zero() {
            println!("Amount must not be zero.");
        } else {
            return Ok(Some(amount));
        }
    }
}

fn prompt_side() -> io::Result<Option<Side>> {
    loop {
        let Some(text) = read_line("Debit or credit [D/C]: ")? else {
            return Ok(None);
        };
        let mut chars = text.chars();
        match (chars.next().and_then(Side::from_code), chars.next()) {
            (Some(side), None) => return Ok(Some(side)),
            _ => println!("Enter D or C."),
        }
    }
}

fn prompt_index() -> io::Result<Option<usize>> {
    loop {
        let Some(text) = read_line("Transaction index: ")? else {
            return Ok(None);
        };
        match text.parse::<usize>() {
            Ok(index) => return Ok(Some(index)),
            Err(_) => println!("Enter a transaction index from the list."),
        }
    }
}

fn prompt_report_name() -> io::Result<Option<String>> {
    loop {
        let Some(name) = read_line("Report name: ")? else {
            return Ok(None);
        };
        if name.is_empty() {
            println!("Report name must not be empty.");
        } else if name.chars().any(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
            println!("Report name must not contain any of {FORBIDDEN_NAME_CHARS}");
        } else {
            return Ok(Some(name));
        }
    }
}
