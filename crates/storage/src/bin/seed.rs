use std::fmt;
use std::path::PathBuf;

use quiz_core::model::raw::normalize_quiz;
use quiz_core::model::{DEFAULT_DURATION_SECS, QuizId};
use serde_json::{Value, json};
use storage::repository::{QuizRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    files: Vec<PathBuf>,
    quiz_id: Option<QuizId>,
    sample: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuizId { raw: String },
    IdWithManyFiles,
    NothingToSeed,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --id value: {raw}"),
            ArgsError::IdWithManyFiles => write!(f, "--id can only be used with a single --file"),
            ArgsError::NothingToSeed => write!(f, "nothing to seed: pass --file or --sample"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut files = Vec::new();
        let mut quiz_id = None;
        let mut sample = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--file" => {
                    files.push(PathBuf::from(require_value(&mut args, "--file")?));
                }
                "--id" => {
                    let value = require_value(&mut args, "--id")?;
                    quiz_id = Some(
                        QuizId::new(value.clone())
                            .map_err(|_| ArgsError::InvalidQuizId { raw: value })?,
                    );
                }
                "--sample" => sample = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if quiz_id.is_some() && files.len() > 1 {
            return Err(ArgsError::IdWithManyFiles);
        }
        if files.is_empty() && !sample {
            return Err(ArgsError::NothingToSeed);
        }

        Ok(Self {
            db_url,
            files,
            quiz_id,
            sample,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --file <path>             Quiz JSON document to import (repeatable)");
    eprintln!("  --id <quiz_id>            Override the id of a single imported quiz");
    eprintln!("  --sample                  Also import the built-in `sample` quiz");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL");
}

fn sample_quiz() -> Value {
    json!({
        "id": "sample",
        "title": "Warm-up",
        "duration": 2,
        "questions": [
            { "question": "What is 2 + 2?", "options": ["3", "4", "5"], "correctIndex": 1 },
            { "question": "Which planet is closest to the sun?",
              "options": ["Venus", "Mercury", "Mars"], "answer": "Mercury" },
            { "question": "How many sides does a hexagon have?",
              "options": ["5", "6", "8"], "correctIndex": "1" }
        ]
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut records = Vec::new();
    for path in &args.files {
        let text = std::fs::read_to_string(path)?;
        let body: Value = serde_json::from_str(&text)?;
        records.push(QuizRecord::from_json(args.quiz_id.clone(), body)?);
    }
    if args.sample {
        records.push(QuizRecord::from_json(None, sample_quiz())?);
    }

    // Refuse to store anything a session could not load.
    for record in &records {
        normalize_quiz(record.header.id.clone(), &record.body, DEFAULT_DURATION_SECS)?;
    }

    let storage = Storage::sqlite(&args.db_url).await?;
    for record in &records {
        storage.quizzes.upsert_quiz(record).await?;
        println!(
            "Seeded quiz {} ({}){}",
            record.header.id,
            record.header.title,
            if record.header.requires_entitlement {
                " [premium]"
            } else {
                ""
            }
        );
    }

    println!("Seeded {} quizzes into {}", records.len(), args.db_url);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
