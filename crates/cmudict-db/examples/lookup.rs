use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cmudict_db::{CmuDict, LoadMode};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let dict_path = args.next().map(PathBuf::from).context(
        "usage: cargo run -p cmudict-db --example lookup -- <dict-file> <word>...",
    )?;
    let words: Vec<String> = args.collect();
    if words.is_empty() {
        bail!("usage: cargo run -p cmudict-db --example lookup -- <dict-file> <word>...");
    }

    let dict = CmuDict::load_with_mode(&dict_path, LoadMode::Mmap)
        .with_context(|| format!("loading dictionary from {}", dict_path.display()))?;

    println!("Dictionary: {}", dict_path.display());
    println!("Headwords     : {}", dict.word_count());
    println!("Pronunciations: {}", dict.pronunciation_count());

    for word in words {
        let prons = dict.pronunciations(&word);
        if prons.is_empty() {
            println!("\n{word}: not found");
            continue;
        }
        println!("\n{word}:");
        for p in prons {
            println!(
                "  ({}) {:<24} syllables={} stress={} rhyme={}",
                p.variant,
                p.phones,
                p.syllable_count(),
                p.stresses(),
                p.rhyming_part()
            );
        }
    }

    Ok(())
}
