/// Chain Trainer — learns a word chain from a text file and saves it as RON.
///
/// Usage: chain_trainer --input <file.txt> --output <chain.ron> [--order <n>]
use std::path::PathBuf;
use std::process;

use markov_chains::core::store::save_chain;
use markov_chains::core::text::train_sentences;

const USAGE: &str = "Usage: chain_trainer --input <file.txt> --output <chain.ron> [--order <n>]";

struct Options {
    input: PathBuf,
    output: PathBuf,
    order: usize,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let (mut input, mut output, mut order) = (None, None, 2);

    while let Some(flag) = args.next() {
        let mut value = || args.next().ok_or(format!("{} needs a value", flag));
        match flag.as_str() {
            "--input" => input = Some(PathBuf::from(value()?)),
            "--output" => output = Some(PathBuf::from(value()?)),
            "--order" => {
                order = value()?
                    .parse()
                    .map_err(|_| "--order must be a positive integer".to_string())?
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(Options {
        input: input.ok_or("--input is required")?,
        output: output.ok_or("--output is required")?,
        order,
    })
}

fn run(options: &Options) -> Result<(), String> {
    let text = std::fs::read_to_string(&options.input)
        .map_err(|e| format!("reading '{}': {}", options.input.display(), e))?;
    let chain = train_sentences(&text, options.order).map_err(|e| e.to_string())?;

    let transitions: usize = chain.states().map(|(_, weights)| weights.len()).sum();
    println!("{}: {} transitions", chain, transitions);

    save_chain(&chain, &options.output).map_err(|e| e.to_string())?;
    println!("saved to '{}'", options.output.display());
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }

    let result = parse_args(args.into_iter()).and_then(|options| run(&options));
    if let Err(message) = result {
        eprintln!("Error: {}", message);
        eprintln!("{}", USAGE);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_flags_with_default_order() {
        let options = parse_args(args(&["--input", "in.txt", "--output", "out.ron"])).unwrap();
        assert_eq!(options.input, PathBuf::from("in.txt"));
        assert_eq!(options.output, PathBuf::from("out.ron"));
        assert_eq!(options.order, 2);
    }

    #[test]
    fn rejects_missing_or_bad_values() {
        assert!(parse_args(args(&["--output", "out.ron"])).is_err());
        assert!(parse_args(args(&["--input"])).is_err());
        assert!(parse_args(args(&["--input", "a", "--output", "b", "--order", "x"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
