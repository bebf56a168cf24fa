use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use crate::core::memory::SelectionMemory;
use crate::core::recommender::{Prompter, RecommendationInput, Recommender};
use crate::models::ConstraintField;

const QUIT_WORDS: &[&str] = &["quit", "exit", "q"];

/// Line-oriented console shared by the REPL and the fill-missing prompts
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
            out: io::stdout(),
        }
    }

    /// Print `prompt` and read one line; `None` on end of input
    pub async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.flush().await?;
        self.lines.next_line().await
    }

    pub async fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for Console {
    async fn ask(&mut self, field: ConstraintField, question: &str) -> Option<String> {
        match self.read_line(&format!("{} ", question)).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(field = field.as_str(), "Could not read answer: {}", e);
                None
            }
        }
    }
}

pub fn is_quit(input: &str) -> bool {
    let input = input.trim();
    QUIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Answer one free-text request, asking for missing details
pub async fn ask_once(
    recommender: &Recommender,
    memory: &mut SelectionMemory,
    console: &mut Console,
    query: &str,
) -> io::Result<()> {
    let result = recommender
        .recommend(
            RecommendationInput::FreeText(query.to_string()),
            memory,
            Some(&mut *console as &mut dyn Prompter),
        )
        .await;

    match result {
        Ok(recommendation) => console.print(&format!("\n{}\n", recommendation.text)).await,
        Err(e) => console.print(&format!("Error: {}\n", e)).await,
    }
}

/// Read requests until `quit`, `exit`, `q` or end of input
///
/// Selection memory carries over between requests in the session.
pub async fn run_repl(recommender: &Recommender, memory: &mut SelectionMemory) -> io::Result<()> {
    let mut console = Console::new();
    console
        .print("Lunza - location-aware lunch recommendations\nType 'quit' to exit\n")
        .await?;

    while let Some(line) = console.read_line("You: ").await? {
        if is_quit(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        ask_once(recommender, memory, &mut console, &line).await?;
    }

    console.print("Goodbye!").await
}
