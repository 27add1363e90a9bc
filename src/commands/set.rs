use super::Context;
use crate::prompt::{self, StdinSelector};
use anyhow::{bail, Context as _};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use zeroize::Zeroizing;

const LOWER_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"~!@#$%^&*()_+-={}|[]:<>?,./";

const GENERATED_LENGTH: usize = 10;
const GENERATED_DIGITS: usize = 3;
const GENERATED_SYMBOLS: usize = 2;

/// Where the new field value comes from
pub enum ValueSource {
    Literal(String),
    Generate,
    /// Hidden prompt
    Prompt,
    /// One line of standard input
    Stdin,
}

impl ValueSource {
    fn read(self) -> anyhow::Result<Zeroizing<String>> {
        let value = match self {
            ValueSource::Literal(value) => value,
            ValueSource::Generate => generate_password(),
            ValueSource::Prompt => prompt::secret("Value: ")?,
            ValueSource::Stdin => {
                let mut line = String::new();
                std::io::stdin()
                    .read_line(&mut line)
                    .context("Couldn't read the value from stdin")?;
                line.trim_end_matches(['\r', '\n']).to_string()
            }
        };
        Ok(Zeroizing::new(value))
    }
}

/// Set one field and print the stored value
pub fn set(ctx: &Context, query: &str, pointer: &str, source: ValueSource) -> anyhow::Result<()> {
    let session = ctx.open_session()?;
    let mut selector = StdinSelector::new(session.config().select_attempts);
    let resolved = session.resolve(query, &mut selector)?;

    let value = source.read()?;
    if value.is_empty() {
        bail!("Refusing to store an empty value");
    }

    session
        .documents()
        .set_field(&resolved.relative, pointer, &value, session.master_key())
        .with_context(|| format!("Couldn't set {pointer} in {}", resolved.relative.display()))?;

    println!("{}", value.as_str());
    Ok(())
}

/// Random password of letters with a fixed number of digits and symbols
pub fn generate_password() -> String {
    let mut rng = OsRng;
    let letters = GENERATED_LENGTH - GENERATED_DIGITS - GENERATED_SYMBOLS;

    let mut chars: Vec<u8> = Vec::with_capacity(GENERATED_LENGTH);
    for _ in 0..letters {
        let alphabet = if rng.gen_bool(0.5) {
            LOWER_LETTERS
        } else {
            UPPER_LETTERS
        };
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    for _ in 0..GENERATED_DIGITS {
        chars.push(DIGITS[rng.gen_range(0..DIGITS.len())]);
    }
    for _ in 0..GENERATED_SYMBOLS {
        chars.push(SYMBOLS[rng.gen_range(0..SYMBOLS.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
