use std::process::ExitCode;

use rs_markov_core::{MarkovConfig, MultiOrderIndex, Synthesizer};

/// Usage: rs-markov-exemple [--config markov.toml] <file 1> <file 2> ... <file n>
///
/// Prints one generated sentence per input file.
fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1).peekable();

    // Optional configuration file, defaults otherwise
    let config = if args.peek().is_some_and(|a| a == "--config") {
        args.next();
        let path = args.next().ok_or("--config expects a file path")?;
        MarkovConfig::load(path)?
    } else {
        MarkovConfig::load_or_default("markov.toml")?
    };

    let files: Vec<String> = args.collect();
    if files.is_empty() {
        eprintln!("Usage: rs-markov-exemple [--config markov.toml] <file> ...");
        return Ok(ExitCode::FAILURE);
    }

    // Each file gets its own index, built at the configured order
    let mut failed = false;
    for file in &files {
        let sentence = MultiOrderIndex::from_file(file, config.effective_order(), config.cache).and_then(|index| {
            Synthesizer::new(&index)
                .with_jitter(config.jitter)
                .generate_sentence(config.min_sentence_length, config.max_attempts)
        });

        match sentence {
            Ok(sentence) => println!("{sentence}"),
            Err(e) => {
                log::warn!("{file}: {e}");
                eprintln!("{file}: {e}");
                failed = true;
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
