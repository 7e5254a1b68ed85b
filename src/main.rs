use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::json;
use std::env;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use textpipe::args::ArgumentPipeline;
use textpipe::config::{ConfigLoader, TextpipeConfig};
use textpipe::preprocessor::TextPreprocessor;

const USAGE: &str = "usage: textpipe <args|filter> [config file]

Reads messages from stdin, one per line, and prints one JSON object per line.
  args    parse each line as a command, or as bare arguments without a prefix
  filter  normalize each line for moderation filters

The config file may also be given with TEXTPIPE_CONFIG.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Args,
    Filter,
}

impl Mode {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "args" => Some(Self::Args),
            "filter" => Some(Self::Filter),
            _ => None,
        }
    }
}

enum Processor {
    Args(ArgumentPipeline),
    Filter(TextPreprocessor),
}

impl Processor {
    fn new(mode: Mode, config: &TextpipeConfig) -> Self {
        match mode {
            Mode::Args => Self::Args(config.pipeline()),
            Mode::Filter => Self::Filter(config.preprocessor()),
        }
    }

    fn process(&mut self, line: &str) -> serde_json::Value {
        match self {
            Self::Args(pipeline) => match pipeline.parse_command(line) {
                Some(command) => json!({
                    "prefix": command.prefix,
                    "command": command.name,
                    "output": command.args.parser_output(),
                }),
                None => json!({
                    "command": null,
                    "output": pipeline.parse_arguments(line).parser_output(),
                }),
            },
            Self::Filter(preprocessor) => {
                let output = preprocessor.run(line);
                json!({
                    "normalized": output.to_display_string(),
                    "output": output,
                })
            }
        }
    }
}

async fn load_config(path: Option<String>) -> Result<TextpipeConfig> {
    match path {
        Some(path) => ConfigLoader::load(&path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None => {
            info!("No config file given, using defaults");
            Ok(TextpipeConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut cli_args = env::args().skip(1);
    let Some(mode) = cli_args.next().as_deref().and_then(Mode::parse) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let config_path = cli_args.next().or_else(|| env::var("TEXTPIPE_CONFIG").ok());

    info!("Starting textpipe v{} in {:?} mode", textpipe::VERSION, mode);
    let config = load_config(config_path).await?;
    let mut processor = Processor::new(mode, &config);

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut count = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let value = processor.process(&line);
        let mut encoded = serde_json::to_string(&value)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        count += 1;
    }
    stdout.flush().await?;

    debug!("Processed {} lines", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::parse("args"), Some(Mode::Args));
        assert_eq!(Mode::parse("filter"), Some(Mode::Filter));
        assert_eq!(Mode::parse("serve"), None);
    }

    #[test]
    fn test_args_mode_output() {
        let mut processor = Processor::new(Mode::Args, &TextpipeConfig::default());

        let value = processor.process("!Greet \"big world\" now");
        assert_eq!(value["command"], "greet");
        assert_eq!(value["prefix"], "!");
        assert_eq!(value["output"]["ordered"][0]["value"], "big world");
        assert_eq!(value["output"]["ordered"][1]["value"], "now");

        let value = processor.process("no prefix here");
        assert!(value["command"].is_null());
        assert_eq!(value["output"]["ordered"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_filter_mode_output() {
        let mut processor = Processor::new(Mode::Filter, &TextpipeConfig::default());
        let value = processor.process("H3LLO");
        assert_eq!(value["normalized"], "hello");
        assert_eq!(value["output"]["original_indices"], json!([0, 1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn test_load_config() {
        assert_eq!(load_config(None).await.unwrap(), TextpipeConfig::default());

        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("textpipe.yaml");
        tokio::fs::write(&path, "args:\n  prefixes: [\"?\"]\n").await.unwrap();
        let config = load_config(Some(path.display().to_string())).await.unwrap();
        assert_eq!(config.args.prefixes, ["?"]);

        let error = load_config(Some("missing.toml".to_string())).await.unwrap_err();
        assert!(error.to_string().contains("missing.toml"));
    }
}
