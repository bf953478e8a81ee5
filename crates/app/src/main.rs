use std::fmt;
use std::sync::Arc;

use quiz_core::model::{QuizDefinition, SessionStatus, SubmitTrigger};
use services::{
    AppServices, Clock, EngineConfig, QuizApiConfig, SessionCommand, SessionError,
    SessionOutcome, SessionSnapshot, StaticEntitlement, SubmitReceipt,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingQuizId,
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingQuizId => write!(f, "--quiz-id is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run     --quiz-id <id> [--db <sqlite_url>] [--premium]");
    eprintln!(
        "  cargo run -p app -- results --quiz-id <id> [--db <sqlite_url>] [--days <n>] [--limit <n>] [--json]"
    );
    eprintln!("  cargo run -p storage --bin seed -- --sample   # load quizzes into the database");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  --days 30 --limit 20");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_PREMIUM, QUIZ_LOG");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_KEY          # fetch quizzes from a remote service");
    eprintln!("  QUIZ_SLOW_LOAD_MS, QUIZ_TICK_MS, QUIZ_DEFAULT_DURATION_SECS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Results,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "results" => Some(Self::Results),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    quiz_id: String,
    premium: bool,
    days: u32,
    limit: u32,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut premium = std::env::var("QUIZ_PREMIUM")
            .ok()
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));
        let mut quiz_id = None;
        let mut days = 30;
        let mut limit = 20;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--quiz-id" => quiz_id = Some(require_value(args, "--quiz-id")?),
                "--premium" => premium = true,
                "--days" => days = parse_number(require_value(args, "--days")?, "--days")?,
                "--limit" => limit = parse_number(require_value(args, "--limit")?, "--limit")?,
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            quiz_id: quiz_id.ok_or(ArgsError::MissingQuizId)?,
            premium,
            days,
            limit,
            json,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

//
// ─── INTERACTIVE SESSION ───────────────────────────────────────────────────────
//

fn load_error_message(err: &SessionError) -> String {
    match err {
        SessionError::InvalidQuizId(_) | SessionError::NotFound(_) => {
            "Quiz not found. Check the quiz id and try again.".into()
        }
        SessionError::NotEntitled(_) => {
            "This quiz requires a premium subscription. Upgrade to unlock it.".into()
        }
        SessionError::Malformed { .. } => "This quiz could not be opened: its data is invalid.".into(),
        SessionError::Unavailable(_) => {
            "The quiz service is unavailable right now. Please try again later.".into()
        }
        other => other.to_string(),
    }
}

fn render(quiz: &QuizDefinition, snap: &SessionSnapshot) {
    let Some(question) = quiz.question_at(snap.current_index) else {
        return;
    };
    let (mm, ss) = snap.remaining_mm_ss();
    println!();
    println!(
        "[{mm:02}:{ss:02}] {}  question {}/{}  answered {}/{}",
        quiz.title(),
        snap.current_index + 1,
        snap.total,
        snap.answered_count,
        snap.total
    );
    let palette: String = snap
        .answered
        .iter()
        .enumerate()
        .map(|(i, answered)| match (i == snap.current_index, answered) {
            (true, _) => '>',
            (false, true) => '#',
            (false, false) => '.',
        })
        .collect();
    println!("  {palette}");
    println!("{}", question.text());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
    if let Some(err) = &snap.last_error {
        println!("! {err}");
    }
    println!("[1-9] answer  [n]ext  [p]rev  [g <n>] go to  [s]ubmit  [q]uit");
}

fn print_receipt(receipt: &SubmitReceipt) {
    let result = &receipt.result;
    println!();
    if result.trigger() == SubmitTrigger::Expired {
        println!("Time's up! Your quiz was submitted automatically.");
    } else {
        println!("Quiz submitted.");
    }
    println!(
        "Score: {}/{} correct ({}%)",
        result.correct(),
        result.total(),
        result.percentage()
    );
    println!(
        "Attempted: {}  Skipped: {}",
        result.attempted(),
        result.skipped()
    );
    match receipt.result_id {
        Some(id) => println!("Saved as result #{id}."),
        None => println!("Warning: the result could not be saved."),
    }
}

/// Maps one line of input to a command. `Err` carries a message for the user.
fn parse_input(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let cmd = match head {
        "n" | "next" => SessionCommand::Next,
        "p" | "prev" => SessionCommand::Previous,
        "q" | "quit" => SessionCommand::Leave,
        "s" | "submit" => SessionCommand::Submit,
        "g" | "goto" => {
            let n: usize = parts
                .next()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| "usage: g <question number>".to_string())?;
            SessionCommand::GoTo(n - 1)
        }
        digits => {
            let n: usize = digits
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("unknown input: {line}"))?;
            SessionCommand::SelectCurrent(n - 1)
        }
    };
    Ok(Some(cmd))
}

async fn run_session(services: &AppServices, quiz_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = services.engine();

    tracing::debug!(quiz_id, "opening quiz");
    println!("Loading quiz...");
    let session = match engine
        .start_session_with_progress(quiz_id, || {
            println!("This is taking longer than usual. Still loading...");
        })
        .await
    {
        Ok(session) => session,
        Err(err) => {
            println!("{}", load_error_message(&err));
            return Err(err.into());
        }
    };

    let quiz = Arc::clone(session.quiz());
    let (driver, mut snapshots) = engine.driver(session);
    let (tx, rx) = mpsc::channel(16);
    let mut driver_task = tokio::spawn(driver.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut confirming = false;
    let mut needs_render = true;
    let mut watching = true;
    let mut stdin_open = true;

    let outcome = loop {
        tokio::select! {
            biased;
            joined = &mut driver_task => break joined?,
            changed = snapshots.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                    continue;
                }
                let snap = snapshots.borrow_and_update().clone();
                if snap.status != SessionStatus::Running {
                    continue;
                }
                if needs_render {
                    render(&quiz, &snap);
                    needs_render = false;
                } else if matches!(snap.remaining_secs, 60 | 10) {
                    println!("{} seconds left.", snap.remaining_secs);
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    let _ = tx.send(SessionCommand::Leave).await;
                    continue;
                };

                if confirming {
                    confirming = false;
                    if matches!(line.trim(), "y" | "yes") {
                        let _ = tx.send(SessionCommand::Submit).await;
                    } else {
                        println!("Submission cancelled.");
                        let snap = snapshots.borrow().clone();
                        render(&quiz, &snap);
                    }
                    continue;
                }

                match parse_input(&line) {
                    Ok(Some(SessionCommand::Submit)) => {
                        let unanswered = snapshots.borrow().unanswered_count();
                        if unanswered > 0 {
                            println!("{unanswered} question(s) unanswered.");
                        }
                        println!("Submit now? [y/N]");
                        confirming = true;
                    }
                    Ok(Some(cmd)) => {
                        needs_render = true;
                        let _ = tx.send(cmd).await;
                    }
                    Ok(None) => {}
                    Err(msg) => println!("{msg}"),
                }
            }
        }
    };

    match outcome {
        SessionOutcome::Completed(receipt) => {
            print_receipt(&receipt);
            Ok(())
        }
        SessionOutcome::Abandoned => {
            println!("Left the quiz. Nothing was saved.");
            Ok(())
        }
        SessionOutcome::Failed(err) => Err(err.into()),
    }
}

async fn list_results(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = services
        .history()
        .list_recent(&args.quiz_id, i64::from(args.days), args.limit)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("No results for {} in the last {} days.", args.quiz_id, args.days);
        return Ok(());
    }
    for item in &items {
        println!(
            "#{:<5} {}  {:>3}%  {}/{} correct  {} skipped  ({})",
            item.id,
            item.submitted_at.format("%Y-%m-%d %H:%M"),
            item.percentage,
            item.correct,
            item.total,
            item.skipped,
            item.trigger.as_str()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::system(),
        EngineConfig::from_env(),
        Arc::new(StaticEntitlement(parsed.premium)),
        QuizApiConfig::from_env(),
    )
    .await?;

    match cmd {
        Command::Run => run_session(&services, &parsed.quiz_id).await,
        Command::Results => list_results(&services, &parsed).await,
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_input() {
        assert_eq!(parse_input("2").unwrap(), Some(SessionCommand::SelectCurrent(1)));
        assert_eq!(parse_input(" n ").unwrap(), Some(SessionCommand::Next));
        assert_eq!(parse_input("g 3").unwrap(), Some(SessionCommand::GoTo(2)));
        assert_eq!(parse_input("").unwrap(), None);
        assert!(parse_input("0").is_err());
        assert!(parse_input("g").is_err());
        assert!(parse_input("maybe").is_err());
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/dev.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/dev.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn results_args_need_quiz_id() {
        let mut args = vec!["--days".to_string(), "7".to_string()].into_iter();
        assert!(matches!(Args::parse(&mut args), Err(ArgsError::MissingQuizId)));

        let mut args = vec!["--quiz-id".to_string(), "algebra".to_string(), "--json".to_string()]
            .into_iter();
        let parsed = Args::parse(&mut args).unwrap();
        assert_eq!(parsed.quiz_id, "algebra");
        assert!(parsed.json);
        assert_eq!(parsed.limit, 20);
    }

    #[test]
    fn negative_days_are_rejected() {
        let mut args = ["--quiz-id", "algebra", "--days", "-3"].map(String::from).into_iter();
        assert!(matches!(
            Args::parse(&mut args),
            Err(ArgsError::InvalidNumber { flag: "--days", .. })
        ));
    }
}
