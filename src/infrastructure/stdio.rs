//! Stdin-backed operator prompt.

use crate::ports::prompt_port::OperatorPrompt;
use std::io::{BufRead, Write};

pub struct StdinPrompt;

impl OperatorPrompt for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        print!("{question}");
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        // EOF or unreadable input defaults to "no".
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }
}
