//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Generate an essay, have it reviewed, and revise it with the feedback.
#[derive(Debug, Parser)]
#[command(name = "essayflow", version, about, long_about = None)]
pub struct Cli {
    /// The essay prompt; multiple words are joined with spaces
    #[arg(required = true, value_name = "PROMPT")]
    pub prompt: Vec<String>,

    /// Language for the essay (e.g. "English", "Spanish", "French")
    #[arg(short, long)]
    pub language: Option<String>,

    /// Directory for generated files (overrides OUTPUT_DIR)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// The prompt words joined into a single topic.
    pub fn topic(&self) -> String {
        self.prompt.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_words_are_joined() {
        let cli = Cli::parse_from(["essayflow", "The", "future", "of", "AI", "-l", "French"]);
        assert_eq!(cli.topic(), "The future of AI");
        assert_eq!(cli.language.as_deref(), Some("French"));
        assert!(cli.output_dir.is_none());
    }

    #[test]
    fn test_prompt_is_required() {
        assert!(Cli::try_parse_from(["essayflow", "--language", "German"]).is_err());
    }

    #[test]
    fn test_language_requires_value() {
        assert!(Cli::try_parse_from(["essayflow", "topic", "--language"]).is_err());
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::parse_from(["essayflow", "-vv", "topic"]);
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["essayflow", "-v", "-q", "topic"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
