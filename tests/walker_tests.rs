/// Walker integration tests — generation over trained chains.

use markov_chains::core::chain::Chain;
use markov_chains::core::error::MarkovError;
use markov_chains::core::sampler::RngDraw;
use markov_chains::core::store::{load_chain, save_chain};
use markov_chains::core::text::{
    reassemble_tokens, sentence_start, train_sentences, walk_sentence, SENTENCE_END,
};
use markov_chains::core::walker::{Phase, Walker};

fn lighthouse(order: usize) -> Chain<String> {
    let text = std::fs::read_to_string("tests/fixtures/corpus.txt").unwrap();
    train_sentences(&text, order).unwrap()
}

#[test]
fn generated_transitions_exist_in_chain() {
    let chain = lighthouse(2);
    let mut walker = Walker::new(&chain, RngDraw::seeded(42), Some(&sentence_start(2)[..])).unwrap();

    let mut state = sentence_start(2);
    while let Ok(token) = walker.advance() {
        let weights = chain.get(&state).unwrap();
        assert!(weights.contains(&token), "{:?} never followed {:?}", token, state);
        state.remove(0);
        state.push(token);
    }

    // Every sentence ends with the end marker, which has no continuation.
    assert_eq!(state.last().map(String::as_str), Some(SENTENCE_END));
    assert_eq!(walker.phase(), Phase::Exhausted);
}

#[test]
fn same_seed_same_sentences() {
    let chain = lighthouse(2);
    let start = sentence_start(2);

    let generate = |seed| {
        let mut walker = chain.walker().seed(seed).start(&start).build().unwrap();
        let mut sentences = Vec::new();
        for _ in 0..5 {
            sentences.push(reassemble_tokens(&walk_sentence(&mut walker, 80)));
            walker.reset(&start).unwrap();
        }
        sentences
    };

    assert_eq!(generate(7), generate(7));
    assert!(generate(7).iter().all(|s| !s.is_empty()));
}

#[test]
fn heaviest_branch_replays_unambiguous_corpus() {
    let words: Vec<&str> = "one two three four five six seven".split_whitespace().collect();
    let chain = Chain::from_corpus_with(words.iter().copied(), 2, ["", ""]).unwrap();
    let walker = Walker::new(&chain, || 0.999_999, Some(&["", ""][..])).unwrap();

    let replay: Vec<&str> = walker.collect();
    assert_eq!(replay, words);
}

#[test]
fn cyclic_chain_walks_without_end() {
    let chain = Chain::from_corpus("a b c a b c a".split_whitespace(), 1).unwrap();
    let walker = chain.walker().seed(5).build().unwrap();
    let tokens: Vec<&str> = walker.take(500).collect();
    assert_eq!(tokens.len(), 500);
}

#[test]
fn unknown_start_and_exhaustion_are_errors() {
    let chain = lighthouse(2);
    let bogus = vec!["no".to_string(), "such".to_string()];
    assert!(matches!(
        Walker::new(&chain, RngDraw::seeded(1), Some(&bogus[..])),
        Err(MarkovError::UnknownStartState)
    ));

    let mut walker = Walker::new_or_random(&chain, RngDraw::seeded(1), Some(&bogus[..])).unwrap();
    while walker.advance().is_ok() {}
    assert!(matches!(walker.advance(), Err(MarkovError::Exhausted)));
}

#[test]
fn saved_chain_walks_identically() {
    let chain = lighthouse(3);
    let path = std::env::temp_dir().join("markov_chains_walker_test.ron");
    save_chain(&chain, &path).unwrap();
    let loaded: Chain<String> = load_chain(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let start = sentence_start(3);
    for (state, weights) in chain.states() {
        assert_eq!(loaded.get(state), Some(weights));
    }

    let mut original = Walker::new(&chain, || 0.999_999, Some(&start[..])).unwrap();
    let mut reloaded = Walker::new(&loaded, || 0.999_999, Some(&start[..])).unwrap();
    assert_eq!(
        walk_sentence(&mut original, 80),
        walk_sentence(&mut reloaded, 80)
    );
}
