use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ghostwriter-agent",
    about = "Natural-language assistant for the Ghostwriter reporting platform",
    long_about = "Natural-language assistant for the Ghostwriter reporting platform.\n\nWith no subcommand, prompts are read from stdin one per line and continue the same conversation.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one request and print the answer
    Ask {
        /// Request text; every remaining word belongs to it
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Invoke one tool directly and print its JSON result
    Tool {
        name: String,
        /// JSON arguments, `{}` when omitted
        args: Option<String>,
    },
    /// Print the workflow guidance document
    Workflow,
}
