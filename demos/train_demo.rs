use bytebpe::BasicTokenizer;
use env_logger::Env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let text = "aaabdaaabac";

    let mut tokenizer = BasicTokenizer::new();
    tokenizer.train(text, 256 + 3, true)?;

    println!("Learned merges:");
    for (pair, tok) in tokenizer.merge_history() {
        println!("  ({}, {}) -> {tok}", pair.0, pair.1);
    }

    let tokens = tokenizer.encode(text)?;
    println!("\nEncoded {text:?}: {tokens:?}");
    println!("Decoded: {:?}", tokenizer.decode(&tokens)?);

    Ok(())
}
