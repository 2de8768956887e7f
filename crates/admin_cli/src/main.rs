use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{AccountPatch, CategoryType, Engine, Money, NewCategory};
use migration::MigratorTrait;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub username: String,
        pub password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Shared categories created by `category seed`.
const SYSTEM_CATEGORIES: &[(CategoryType, &str, &str)] = &[
    (CategoryType::Expense, "Food & Dining", "utensils"),
    (CategoryType::Expense, "Transport", "bus"),
    (CategoryType::Expense, "Shopping", "bag"),
    (CategoryType::Expense, "Housing", "home"),
    (CategoryType::Expense, "Utilities", "bolt"),
    (CategoryType::Expense, "Entertainment", "film"),
    (CategoryType::Expense, "Health", "heart"),
    (CategoryType::Expense, "Education", "book"),
    (CategoryType::Expense, "Other", "dots"),
    (CategoryType::Income, "Salary", "briefcase"),
    (CategoryType::Income, "Bonus", "gift"),
    (CategoryType::Income, "Investment", "chart"),
    (CategoryType::Income, "Other", "dots"),
];

#[derive(Parser, Debug)]
#[command(name = "pocketledger_admin")]
#[command(about = "Admin utilities for PocketLedger (users, system categories, balance repair)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./pocketledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Category(Category),
    Account(Account),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Create the default system categories that are missing.
    Seed,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Rebuild every balance of a user from the transaction history.
    Recompute(RecomputeArgs),
    /// Overwrite one balance by hand.
    Correct(CorrectArgs),
}

#[derive(Args, Debug)]
struct RecomputeArgs {
    #[arg(long)]
    user_id: i64,
}

#[derive(Args, Debug)]
struct CorrectArgs {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    account_id: i64,
    /// New balance as a decimal, e.g. `1250.00` or `-30,5`.
    #[arg(long, allow_hyphen_values = true)]
    balance: Money,
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

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = prompt_password("Password: ")?;
        if first.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        if first == prompt_password("Confirm password: ")? {
            return Ok(first);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn create_user(
    db: &DatabaseConnection,
    args: UserCreateArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if users::Entity::find()
        .filter(users::Column::Username.eq(args.username.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        eprintln!("user already exists: {}", args.username);
        std::process::exit(1);
    }

    let password = prompt_password_twice()?;
    let user = users::ActiveModel {
        username: Set(args.username.clone()),
        password: Set(password),
        ..Default::default()
    };
    let result = users::Entity::insert(user).exec(db).await?;

    println!("created user: {} (id {})", args.username, result.last_insert_id);
    Ok(())
}

async fn seed_categories(engine: &Engine) -> Result<(), Box<dyn Error + Send + Sync>> {
    let existing = engine.system_categories(None).await?;
    let mut created = 0;
    for (order, (kind, name, icon)) in SYSTEM_CATEGORIES.iter().enumerate() {
        if existing.iter().any(|c| c.kind == *kind && c.name == *name) {
            continue;
        }
        let cmd = NewCategory::new(*kind, *name)
            .icon(*icon)
            .display_order(i32::try_from(order)?);
        engine.create_system_category(cmd).await?;
        created += 1;
    }
    println!("created {created} system categories");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => create_user(&db, args).await?,
        Command::Category(Category {
            command: CategoryCommand::Seed,
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            seed_categories(&engine).await?;
        }
        Command::Account(Account {
            command: AccountCommand::Recompute(args),
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            for account in engine.recompute_balances(args.user_id).await? {
                println!(
                    "{:>6}  {:<24} {}",
                    account.id,
                    account.name,
                    Money::new(account.balance)
                );
            }
        }
        Command::Account(Account {
            command: AccountCommand::Correct(args),
        }) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            let patch = AccountPatch::new().balance(args.balance.minor());
            let account = engine
                .update_account(args.user_id, args.account_id, patch)
                .await?;
            println!(
                "balance of {} set to {}",
                account.name,
                Money::new(account.balance)
            );
        }
    }

    Ok(())
}
