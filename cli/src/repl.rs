//! Interactive REPL loop: read stdin, run one agent turn, print the streamed
//! reply, repeat until EOF or quit.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use weft::{Agent, AgentError, TokenChunk};

const BANNER: &str = "\
weft: a tool-using chat agent
Tools: calculator, get_current_datetime, count_words, reverse_text
Commands: /reset clears history, /quit or /exit leaves";

/// Runs the REPL loop: prompt, read line, run agent, print, repeat.
///
/// Exits on EOF (Ctrl+D) or `quit`/`exit`/`/quit`/`/exit`. On turn error,
/// prints to stderr and continues with the history intact.
pub async fn run_repl_loop(
    agent: &mut Agent,
    model: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{BANNER}");
    println!("Model: {model}\n");

    let mut reader = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = match reader.next_line().await? {
            None => break,
            Some(s) => s,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_quit_command(line) {
            break;
        }
        if is_reset_command(line) {
            agent.reset();
            println!("[Conversation history cleared]\n");
            continue;
        }

        print!("Agent: ");
        std::io::stdout().flush()?;
        match stream_turn(agent, line).await {
            Ok(_) => println!(),
            Err(e) => {
                println!();
                eprintln!("[Error] {e}");
            }
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}

/// Runs a single turn and prints the streamed reply.
pub async fn run_one_turn(agent: &mut Agent, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    stream_turn(agent, text).await?;
    println!();
    Ok(())
}

/// Streams one turn to stdout, returning the full reply text.
async fn stream_turn(agent: &mut Agent, text: &str) -> Result<String, AgentError> {
    let (tx, mut rx) = mpsc::channel::<TokenChunk>(128);
    let printer = async move {
        while let Some(chunk) = rx.recv().await {
            print!("{}", chunk.text);
            let _ = std::io::stdout().flush();
        }
    };
    let (reply, ()) = tokio::join!(agent.chat_stream(text, tx), printer);
    reply
}

fn is_quit_command(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    matches!(lower.as_str(), "quit" | "exit" | "/quit" | "/exit")
}

fn is_reset_command(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("/reset")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_quit_command_matches_expected_tokens() {
        assert!(is_quit_command("quit"));
        assert!(is_quit_command(" EXIT "));
        assert!(is_quit_command("/quit"));
        assert!(is_quit_command("/exit"));
        assert!(!is_quit_command("continue"));
        assert!(!is_quit_command("/reset"));
    }

    #[test]
    fn is_reset_command_matches_only_the_reset_token() {
        assert!(is_reset_command("/reset"));
        assert!(is_reset_command(" /RESET "));
        assert!(!is_reset_command("reset"));
        assert!(!is_reset_command("/quit"));
    }
}
