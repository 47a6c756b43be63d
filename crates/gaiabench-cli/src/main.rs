use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gaiabench_core::{
    fetch_attachment, is_correct, report, AppConfig, Catalog, JsonlFileSource, LlmClient,
    Orchestrator, Reviewed, Session, StoreCatalogSource,
};
use gaiabench_store::ObjectStore;
use gaiabench_types::{Outcome, TaskRecord};

#[derive(Debug, Parser)]
#[command(name = "gaiabench", about = "Review GAIA benchmark tasks against a hosted model")]
struct Cli {
    /// YAML config file; defaults plus environment variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive review session over the task catalog
    Review(ReviewArgs),
    /// Scrape the dataset listing page and mirror its files into the object store
    Ingest(IngestArgs),
}

#[derive(Debug, Clone, Parser)]
struct ReviewArgs {
    /// Load the catalog from a local JSONL file instead of the object store
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
struct IngestArgs {
    /// Override the dataset listing page URL
    #[arg(long)]
    listing_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaiabench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).await?;
    match cli.command {
        Commands::Review(args) => review(config, args).await,
        Commands::Ingest(args) => ingest(config, args).await,
    }
}

async fn ingest(mut config: AppConfig, args: IngestArgs) -> Result<()> {
    if let Some(url) = args.listing_url {
        config.ingest.listing_url = url;
    }
    let store = ObjectStore::new(&config.store)?;
    let report = gaiabench_core::ingest::run(&config.ingest, &store).await?;
    println!(
        "Found {} file(s): {} uploaded, {} failed.",
        report.found, report.uploaded, report.failed
    );
    Ok(())
}

async fn review(config: AppConfig, args: ReviewArgs) -> Result<()> {
    let store = Arc::new(ObjectStore::new(&config.store)?);
    let catalog = match &args.data {
        Some(path) => Catalog::load(&JsonlFileSource::new(path)).await?,
        None => Catalog::load(&StoreCatalogSource::new(store.clone())).await?,
    };
    ensure!(!catalog.is_empty(), "catalog is empty");

    let orchestrator = Orchestrator::new(Arc::new(LlmClient::new(config.llm.clone())));
    let mut session = Session::new();
    let first = catalog.tasks()[0].task_id.clone();
    session.select(&catalog, &first)?;

    println!("GAIA Dataset Model Evaluation Tool");
    println!("{} test case(s) loaded. Type 'help' for commands.\n", catalog.len());
    show_task(&catalog, &session);

    let stdin = io::stdin();
    loop {
        print!("gaiabench> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => {}
            "help" => print_help(),
            "list" => list_tasks(&catalog, &session),
            "select" => {
                if let Err(err) = select_task(&catalog, &mut session, rest.trim()) {
                    println!("Error: {err:#}");
                } else {
                    show_task(&catalog, &session);
                }
            }
            "show" => show_task(&catalog, &session),
            "ask" => ask(&catalog, &mut session, &orchestrator, &store).await,
            "steps" => re_evaluate(&catalog, &mut session, &orchestrator, &store, &stdin).await,
            "assign" => assign(&catalog, &mut session, rest.trim()),
            "feedback" => feedback(&catalog, &mut session, rest.trim()),
            "summary" => println!("{}", report::render_summary(&catalog, &session)),
            "report" => write_report(&catalog, &session, rest.trim()).await,
            "quit" | "exit" => break,
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "Commands:\n  \
         list                  enumerate test cases\n  \
         select <n|task-id>    switch to a test case\n  \
         show                  display the current test case\n  \
         ask                   query the model with the annotator steps\n  \
         steps                 edit the steps and re-query (moderated)\n  \
         assign <as-is|with-steps|inconclusive>\n  \
         feedback <text>       record free-text feedback\n  \
         summary               summary table and charts\n  \
         report <path>         write an HTML report\n  \
         quit"
    );
}

fn list_tasks(catalog: &Catalog, session: &Session) {
    for (idx, task) in catalog.tasks().iter().enumerate() {
        let status = session
            .outcome_of(&task.task_id)
            .map(|o| o.to_string())
            .unwrap_or_else(|| "Untested".to_string());
        let marker = if session.selected() == Some(task.task_id.as_str()) { "*" } else { " " };
        println!("{marker}{}. {} [Level {}] {}", idx + 1, task.task_id, task.level, status);
    }
}

fn select_task(catalog: &Catalog, session: &mut Session, arg: &str) -> Result<()> {
    ensure!(!arg.is_empty(), "usage: select <n|task-id>");
    // Accept either the 1-based list position or a task id.
    let task_id = match arg.parse::<usize>() {
        Ok(n) if n >= 1 && n <= catalog.len() => catalog.tasks()[n - 1].task_id.clone(),
        _ => arg.to_string(),
    };
    session.select(catalog, &task_id)
}

fn current<'a>(catalog: &'a Catalog, session: &Session) -> Option<&'a TaskRecord> {
    session.selected().and_then(|id| catalog.get(id))
}

fn show_task(catalog: &Catalog, session: &Session) {
    let Some(task) = current(catalog, session) else {
        println!("No test case selected.");
        return;
    };
    println!("Test Case: {}", task.task_id);
    println!("Question: {}", task.question);
    println!("Expected Final Answer: {}", task.final_answer);
    if let Some(file_name) = &task.file_name {
        println!("Attached File: {file_name}");
    }
    if let Some(answer) = session.answer() {
        println!("Model Answer: {answer}");
    }
    if let Some(revised) = session.revised_answer() {
        println!("Revised Model Answer: {revised}");
    }
}

async fn attachment(store: &ObjectStore, task: &TaskRecord) -> Option<String> {
    match &task.file_name {
        Some(file_name) => Some(fetch_attachment(store, file_name).await),
        None => None,
    }
}

async fn ask(
    catalog: &Catalog,
    session: &mut Session,
    orchestrator: &Orchestrator,
    store: &ObjectStore,
) {
    let Some(task) = current(catalog, session) else {
        println!("No test case selected.");
        return;
    };
    let file_content = attachment(store, task).await;
    match orchestrator
        .query(&task.question, task.annotator_steps(), file_content.as_deref())
        .await
    {
        Ok(answer) => {
            let correct = is_correct(&answer, &task.final_answer);
            println!("Model Answer: {answer}");
            println!("Is the model's answer correct? {}", if correct { "Yes" } else { "No" });
            session.set_answer(answer);
        }
        Err(err) => println!("Error: {err:#}"),
    }
}

async fn re_evaluate(
    catalog: &Catalog,
    session: &mut Session,
    orchestrator: &Orchestrator,
    store: &ObjectStore,
    stdin: &io::Stdin,
) {
    let Some(task) = current(catalog, session) else {
        println!("No test case selected.");
        return;
    };
    println!("Current annotator steps:\n{}", task.annotator_steps());
    println!("Enter modified steps; finish with a single '.' on its own line:");
    let mut steps = String::new();
    loop {
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line.trim_end() == "." => break,
            Ok(_) => steps.push_str(&line),
            Err(err) => {
                println!("Error: {err}");
                return;
            }
        }
    }
    let steps = steps.trim_end();

    let file_content = attachment(store, task).await;
    match orchestrator
        .moderate_and_query(&task.question, steps, file_content.as_deref())
        .await
    {
        Ok(reviewed) => {
            let verdict = revised_verdict(&reviewed, &task.final_answer);
            let text = reviewed.into_text();
            println!("Revised Model Answer: {text}");
            match verdict {
                Some(true) => println!("The revised answer is correct."),
                Some(false) => println!("The revised answer is still incorrect."),
                None => {}
            }
            session.set_revised_answer(text);
        }
        Err(err) => println!("Error: {err:#}"),
    }
}

/// Correctness of a moderated re-query. A rejected request carries no model
/// answer, so there is no verdict to print.
fn revised_verdict(reviewed: &Reviewed, expected: &str) -> Option<bool> {
    match reviewed {
        Reviewed::Rejected => None,
        Reviewed::Answer(answer) => Some(is_correct(answer, expected)),
    }
}

fn parse_outcome(arg: &str) -> Option<Outcome> {
    match arg.to_lowercase().replace(' ', "-").as_str() {
        "as-is" | "asis" => Some(Outcome::AsIs),
        "with-steps" | "withsteps" => Some(Outcome::WithSteps),
        "inconclusive" => Some(Outcome::Inconclusive),
        _ => None,
    }
}

fn assign(catalog: &Catalog, session: &mut Session, arg: &str) {
    let Some(task_id) = session.selected().map(str::to_string) else {
        println!("No test case selected.");
        return;
    };
    let Some(outcome) = parse_outcome(arg) else {
        println!("usage: assign <as-is|with-steps|inconclusive>");
        return;
    };
    match session.record_outcome(catalog, &task_id, outcome) {
        Ok(()) => println!("Test case {task_id} marked as '{outcome}'."),
        Err(err) => println!("Error: {err:#}"),
    }
}

fn feedback(catalog: &Catalog, session: &mut Session, text: &str) {
    let Some(task_id) = session.selected().map(str::to_string) else {
        println!("No test case selected.");
        return;
    };
    if text.is_empty() {
        println!("usage: feedback <text>");
        return;
    }
    match session.record_feedback(catalog, &task_id, text) {
        Ok(()) => println!("Thank you for your feedback!"),
        Err(err) => println!("Error: {err:#}"),
    }
}

async fn write_report(catalog: &Catalog, session: &Session, path: &str) {
    if path.is_empty() {
        println!("usage: report <path>");
        return;
    }
    let html = report::generate_html_report(catalog, session);
    match tokio::fs::write(path, html).await {
        Ok(()) => println!("Report written to {path}."),
        Err(err) => println!("Error: {err}"),
    }
}
