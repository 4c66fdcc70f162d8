/// Chain Walk — generates sentences from a trained chain.
///
/// Usage: chain_walk --model <chain.ron> [--seed <n>] [--start <words>] [--max <n>] [--count <n>]
///
/// `--start` takes space-separated words; generation begins at a state that
/// contains them, or at the sentence start when none does.
use std::process;

use markov_chains::core::chain::Chain;
use markov_chains::core::sampler::RngDraw;
use markov_chains::core::store::load_chain;
use markov_chains::core::text::{
    reassemble_tokens, sentence_start, tokenize, walk_sentence, SENTENCE_START,
};
use markov_chains::core::walker::Walker;

const USAGE: &str =
    "Usage: chain_walk --model <chain.ron> [--seed <n>] [--start <words>] [--max <n>] [--count <n>]";

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("{}", USAGE);
        return;
    }

    let mut model_path = None;
    let mut seed: Option<u64> = None;
    let mut start_words: Option<String> = None;
    let mut max_tokens = 60usize;
    let mut count = 1usize;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--model" if i + 1 < args.len() => {
                i += 1;
                model_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            "--start" if i + 1 < args.len() => {
                i += 1;
                start_words = Some(args[i].clone());
            }
            "--max" if i + 1 < args.len() => {
                i += 1;
                max_tokens = args[i].parse().unwrap_or(60);
            }
            "--count" if i + 1 < args.len() => {
                i += 1;
                count = args[i].parse().unwrap_or(1);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let model_path = model_path.unwrap_or_else(|| {
        eprintln!("Error: --model is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let chain: Chain<String> = load_chain(std::path::Path::new(&model_path)).unwrap_or_else(|e| {
        eprintln!("Error loading chain from '{}': {}", model_path, e);
        process::exit(1);
    });

    let start = pick_start(&chain, start_words.as_deref());
    let draw = match seed {
        Some(seed) => RngDraw::seeded(seed),
        None => RngDraw::from_entropy(),
    };

    let mut walker = Walker::new_or_random(&chain, draw, Some(start.as_slice())).unwrap_or_else(|e| {
        eprintln!("Error starting walk: {}", e);
        process::exit(1);
    });

    for n in 0..count {
        if n > 0 && walker.reset(&sentence_start(chain.order())).is_err() {
            walker.reset_random();
        }
        let mut tokens: Vec<String> = walker
            .state()
            .iter()
            .filter(|token| token.as_str() != SENTENCE_START)
            .cloned()
            .collect();
        tokens.extend(walk_sentence(&mut walker, max_tokens));
        println!("{}", reassemble_tokens(&tokens));
    }
}

/// First state containing the requested words, else the sentence start.
fn pick_start(chain: &Chain<String>, words: Option<&str>) -> Vec<String> {
    let fallback = sentence_start(chain.order());
    let Some(words) = words else {
        return fallback;
    };

    let query = tokenize(words);
    match chain.search(&query).first() {
        Some(state) => state.to_vec(),
        None => {
            log::warn!("no state contains '{}', starting a new sentence", words);
            fallback
        }
    }
}
