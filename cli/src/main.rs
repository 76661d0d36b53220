//! weft command line: one-shot or interactive chat with the tool-using agent.
//!
//! Reads `OPENAI_API_KEY` from the environment (or `.env`). With a message
//! argument it runs a single turn and exits; without one it starts the REPL.

mod logging;
mod repl;

use clap::Parser;
use weft::{Agent, AgentConfig, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_MODEL};

/// Chat with a tool-using agent from the terminal.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Chat with a tool-using agent from the terminal")]
struct Args {
    /// Message for a single one-shot turn (or pass it as positional words)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Positional words: the one-shot message when -m/--message is not used
    #[arg(trailing_var_arg = true, value_name = "MESSAGE")]
    rest: Vec<String>,

    /// Model identifier
    #[arg(long, env = "AGENT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum tool rounds per turn
    #[arg(long, env = "AGENT_MAX_TOOL_ROUNDS", default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    max_tool_rounds: u32,

    /// Sampling temperature (0-2)
    #[arg(long)]
    temperature: Option<f32>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = logging::init() {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!(
                "[Error] No OpenAI API key found. Set the OPENAI_API_KEY environment variable."
            );
            std::process::exit(1);
        }
    };

    let mut config = AgentConfig::new(api_key)
        .with_model(args.model.clone())
        .with_max_tool_rounds(args.max_tool_rounds);
    if let Some(temperature) = args.temperature {
        config = config.with_temperature(temperature);
    }

    let mut agent = match Agent::new(config) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("[Error] {e}");
            std::process::exit(1);
        }
    };

    let message = args.message.or_else(|| {
        if args.rest.is_empty() {
            None
        } else {
            Some(args.rest.join(" "))
        }
    });

    let result = match message {
        Some(message) => repl::run_one_turn(&mut agent, &message).await,
        None => repl::run_repl_loop(&mut agent, &args.model).await,
    };

    if let Err(e) = result {
        eprintln!("[Error] {e}");
        std::process::exit(1);
    }
}
