//! Built-in template + fill-word prompt generator.

use std::collections::HashSet;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::RngExt;

use crate::protocol::LastLashMode;

use super::{LastLashPrompt, PromptSource};

const TEMPLATES: &[&str] = &[
    "The worst thing to say during {}",
    "A rejected name for {}",
    "The real reason {} was cancelled",
    "What your dog thinks about {}",
    "A terrible slogan for {}",
    "The most embarrassing thing to bring to {}",
    "What grandma secretly does during {}",
    "A surprising ingredient in {}",
    "The title of a straight-to-DVD movie about {}",
    "The least popular merit badge: {}",
    "What aliens would confiscate first: {}",
    "A bad time to start thinking about {}",
    "The sequel nobody asked for: {}",
    "What you'd find under the couch at {}",
    "An unfortunate autocorrect of {}",
];

const FILL_WORDS: &[&str] = &[
    "a wedding",
    "a job interview",
    "the company picnic",
    "karaoke night",
    "a first date",
    "jury duty",
    "the gym",
    "a magic show",
    "tax season",
    "the school play",
    "a yard sale",
    "the renaissance fair",
    "grandpa's birthday",
    "a silent retreat",
    "the dentist",
    "a haunted house",
    "the farmers market",
    "hot yoga",
    "a pirate cruise",
    "band practice",
    "the petting zoo",
    "a cooking class",
    "the office holiday party",
    "little league tryouts",
];

const PLAIN_PROMPTS: &[&str] = &[
    "The worst superpower to have",
    "A terrible name for a boat",
    "Something you should never microwave",
    "The secret ingredient in hospital food",
    "A bad thing to yell at a funeral",
    "The worst thing to find in your shoe",
    "A rejected flavor of sparkling water",
    "What robots dream about",
    "The eleventh commandment",
    "A terrible theme for a birthday party",
    "Something you shouldn't whisper to a horse",
    "The worst opening line for a speech",
    "An item that should never be glittery",
    "A strange thing to keep in your glovebox",
    "The worst fortune cookie fortune",
    "What cats are actually plotting",
    "A bad name for a retirement home",
    "Something you'd regret buying in bulk",
    "The worst sound to wake up to",
    "A questionable pizza topping",
];

const THEME_TEMPLATES: &[&str] = &[
    "The worst thing about {theme}",
    "A little-known fact about {theme}",
    "What nobody admits about {theme}",
    "The best-kept secret of {theme}",
    "A terrible mascot for {theme}",
    "If {theme} had a warning label, it would say",
];

const FLASHBACK_SETUPS: &[&str] = &[
    "The town had never seen a storm like this, and then the mayor said...",
    "Everyone clapped as the cake rolled in, until it started to move...",
    "The time capsule was supposed to stay buried for a century, but inside we found...",
    "The substitute teacher wrote just one sentence on the board...",
    "Halfway up the mountain, the guide stopped and whispered...",
    "The lights went out at the aquarium, and that's when...",
    "Grandma's recipe book fell open to the forbidden page...",
];

const WORD_LASH_INSTRUCTIONS: &str = "Write a phrase whose words start with these letters, in order";
const ACRO_LASH_INSTRUCTIONS: &str = "Expand this acronym, one word per letter";
const FLASHBACK_INSTRUCTIONS: &str = "Finish the story";

/// Letters skewed toward word-friendly starts.
const LETTER_POOL: &[u8] = b"ABCDEFGHJKLMNPRSTW";

/// Zero-dependency prompt source backed by compiled-in banks.
#[derive(Debug, Default)]
pub struct LocalPromptSource;

impl LocalPromptSource {
    pub fn new() -> Self {
        Self
    }

    fn one_prompt(theme: Option<&str>) -> String {
        let mut rng = rand::rng();
        if let Some(theme) = theme {
            // Themed games still mix in the general banks
            if rng.random_range(0..3) == 0 {
                if let Some(template) = THEME_TEMPLATES.choose(&mut rng) {
                    return template.replace("{theme}", theme);
                }
            }
        }
        if rng.random_range(0..2) == 0 {
            if let Some(text) = PLAIN_PROMPTS.choose(&mut rng) {
                return (*text).to_string();
            }
        }
        let template = TEMPLATES.choose(&mut rng).copied().unwrap_or("{}");
        let word = FILL_WORDS.choose(&mut rng).copied().unwrap_or("a mystery");
        template.replacen("{}", word, 1)
    }

    pub(super) fn last_lash_for_mode(
        &self,
        mode: LastLashMode,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> LastLashPrompt {
        let mut rng = rand::rng();
        match mode {
            LastLashMode::Flashback => {
                let mut prompt = FLASHBACK_SETUPS
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or("And then, out of nowhere...")
                    .to_string();
                if seen.contains(&prompt) {
                    prompt = Self::one_prompt(theme) + "...";
                }
                seen.insert(prompt.clone());
                self.flashback_with_prompt(prompt)
            }
            LastLashMode::WordLash => {
                let letters = pick_letters(3);
                let prompt = format!(
                    "{}: {}",
                    WORD_LASH_INSTRUCTIONS,
                    format_letters(&letters)
                );
                seen.insert(prompt.clone());
                LastLashPrompt {
                    prompt,
                    mode,
                    letters: Some(letters),
                    instructions: Some(WORD_LASH_INSTRUCTIONS.to_string()),
                }
            }
            LastLashMode::AcroLash => {
                let count = rand::rng().random_range(3..=5);
                let letters = pick_letters(count);
                let prompt = format!(
                    "What does {} stand for?",
                    letters.iter().collect::<String>()
                );
                seen.insert(prompt.clone());
                LastLashPrompt {
                    prompt,
                    mode,
                    letters: Some(letters),
                    instructions: Some(ACRO_LASH_INSTRUCTIONS.to_string()),
                }
            }
        }
    }

    pub(super) fn flashback_with_prompt(&self, prompt: String) -> LastLashPrompt {
        LastLashPrompt {
            prompt,
            mode: LastLashMode::Flashback,
            letters: None,
            instructions: Some(FLASHBACK_INSTRUCTIONS.to_string()),
        }
    }
}

#[async_trait]
impl PromptSource for LocalPromptSource {
    async fn generate_prompts(
        &self,
        count: usize,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> Vec<String> {
        let mut batch = Vec::with_capacity(count);
        let mut attempts = 0usize;
        while batch.len() < count {
            let mut candidate = Self::one_prompt(theme);
            attempts += 1;
            // Bank exhaustion safety valve: suffix a variant number rather
            // than ever returning a short batch
            if attempts > 50 * count.max(1) && seen.contains(&candidate) {
                candidate = format!("{candidate} (part {attempts})");
            }
            if seen.insert(candidate.clone()) {
                batch.push(candidate);
            }
        }
        batch
    }

    async fn generate_last_lash(
        &self,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> LastLashPrompt {
        self.last_lash_for_mode(pick_last_lash_mode(), seen, theme)
    }
}

pub(super) fn pick_last_lash_mode() -> LastLashMode {
    match rand::rng().random_range(0..3) {
        0 => LastLashMode::Flashback,
        1 => LastLashMode::WordLash,
        _ => LastLashMode::AcroLash,
    }
}

/// Pick uppercase letters with no two consecutive identical.
fn pick_letters(count: usize) -> Vec<char> {
    let mut rng = rand::rng();
    let mut letters: Vec<char> = Vec::with_capacity(count);
    while letters.len() < count {
        let idx = rng.random_range(0..LETTER_POOL.len());
        // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
        // always within [0, len).
        #[allow(clippy::indexing_slicing)]
        let letter = LETTER_POOL[idx] as char;
        if letters.last() == Some(&letter) {
            continue;
        }
        letters.push(letter);
    }
    letters
}

fn format_letters(letters: &[char]) -> String {
    letters
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
