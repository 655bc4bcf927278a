use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use quiz_core::model::QuizSettings;
use services::{Clock, DisplayState, Highlight, Phase, QuizEngine, SessionController};
use storage::{HostConnection, HostRecord, InMemoryHost, WindowGraph};

mod bank;

#[derive(Debug, Parser)]
#[command(name = "quiz", version, about = "Resumable multiple-choice quiz")]
struct Args {
    /// Run without a host: progress is neither saved nor reported
    #[arg(long)]
    standalone: bool,

    /// JSON file holding the simulated host's committed data between launches
    #[arg(long, env = "QUIZ_HOST_STATE", default_value = "quiz-host.json")]
    host_state: PathBuf,

    /// Minimum percentage that counts as a pass
    #[arg(
        long,
        env = "QUIZ_PASSING_PERCENT",
        default_value_t = QuizSettings::DEFAULT_PASSING_PERCENTAGE
    )]
    passing_percent: u8,

    /// How long answer feedback stays on screen
    #[arg(long, env = "QUIZ_FEEDBACK_DELAY_MS", default_value_t = 1500)]
    feedback_delay_ms: u64,

    /// Seed for option shuffling
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn settings(&self) -> Result<QuizSettings, quiz_core::Error> {
        Ok(QuizSettings::new(
            self.passing_percent,
            Duration::from_millis(self.feedback_delay_ms),
            QuizSettings::DEFAULT_SUSPEND_DATA_LIMIT,
        )?)
    }
}

fn load_record(path: &Path) -> Result<HostRecord, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(HostRecord::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn save_record(path: &Path, record: &HostRecord) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Lay out an LMS page with the content in a frame, and look for the host
/// from the content's point of view.
fn connect(lms_host: Option<&InMemoryHost>) -> HostConnection {
    let mut graph = WindowGraph::new();
    let lms = graph.add_window();
    if let Some(host) = lms_host {
        graph.attach_api(lms, Arc::new(host.clone()));
    }
    let content = graph.add_frame(lms);

    let mut connection = HostConnection::new();
    connection.discover(&graph, content);
    connection
}

fn render(state: &DisplayState) {
    match state.phase {
        Phase::Loading => {}
        Phase::Start => {
            println!();
            println!("{} questions. Press Enter to begin, or type `quit`.", state.total_questions);
        }
        Phase::Quizzing => render_question(state),
        Phase::Results => render_results(state),
    }
}

fn render_question(state: &DisplayState) {
    let (Some(text), Some(options)) = (&state.question_text, &state.options) else {
        return;
    };
    println!();
    println!(
        "Question {} of {}   score {}",
        state.question_number, state.total_questions, state.score
    );
    println!("{text}");
    for (position, option) in options.iter().enumerate() {
        let marker = match option.highlight {
            Some(Highlight::Correct) => "[+]",
            Some(Highlight::Incorrect) => "[x]",
            None => "[ ]",
        };
        match &option.image {
            Some(image) => println!("  {marker} {}. {} ({image})", position + 1, option.label),
            None => println!("  {marker} {}. {}", position + 1, option.label),
        }
    }
    match &state.feedback {
        Some(feedback) if feedback.correct => println!("Correct!"),
        Some(_) => println!("Not quite."),
        None => println!("Pick 1-4:"),
    }
}

fn render_results(state: &DisplayState) {
    let Some(outcome) = &state.outcome else {
        return;
    };
    println!();
    println!(
        "You scored {}/{} ({}%) in {}s: {}",
        outcome.score,
        outcome.total,
        outcome.percentage,
        outcome.elapsed_seconds,
        if outcome.passed { "passed" } else { "not passed" }
    );
    println!("Type `retry` to try again or `quit` to leave.");
}

async fn wait_for_transition(controller: &mut SessionController, clock: Clock) {
    while let Some(due) = controller.next_due() {
        let wait = (due - clock.now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;
        controller.poll();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = args.settings()?;

    let lms_host = if args.standalone {
        None
    } else {
        Some(InMemoryHost::from_record(load_record(&args.host_state)?))
    };
    let connection = connect(lms_host.as_ref());

    let bank = bank::sample_bank()?;
    let engine = match args.seed {
        Some(seed) => QuizEngine::with_seed(bank, seed)?,
        None => QuizEngine::new(bank)?,
    };

    let clock = Clock::system();
    let mut controller = SessionController::new(engine, connection, settings, clock);
    controller.start();
    render(&controller.display_state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") {
            break;
        }
        match controller.phase() {
            Phase::Start => {
                if input.is_empty() || input.eq_ignore_ascii_case("begin") {
                    controller.on_begin();
                }
            }
            Phase::Quizzing => match input.parse::<usize>() {
                Ok(choice @ 1..) => match controller.on_select_option(choice - 1) {
                    Ok(Some(_)) => {
                        render(&controller.display_state());
                        wait_for_transition(&mut controller, clock).await;
                    }
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                },
                _ => println!("Pick 1-4:"),
            },
            Phase::Results => {
                if input.eq_ignore_ascii_case("retry") {
                    controller.on_retry();
                }
            }
            Phase::Loading => {}
        }
        render(&controller.display_state());
    }

    controller.shutdown();
    if let Some(host) = lms_host {
        save_record(&args.host_state, &host.record(clock.now()))?;
        info!(path = %args.host_state.display(), "host data saved");
    } else {
        info!("standalone run, nothing was saved");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        // binary glue: report once and exit
        eprintln!("{err}");
        std::process::exit(2);
    }
}
