// vocabulary.rs - Claude Code の画面表示で使われる語彙と記号

use std::collections::HashSet;
use std::sync::OnceLock;

use anyhow::{bail, Result};
use ccstate_shared::VocabularySettings;

/// スピナー記号（ステータス行の先頭に表示される）
pub const SPINNER_GLYPHS: &[char] = &['·', '✢', '✳', '✶', '✻', '✽'];

/// 入力プロンプトのキャレット
pub const PROMPT_CARET: char = '❯';

/// 区切り線を構成する罫線文字
pub const SEPARATOR_CHARS: &[char] = &['─', '━', '╌', '╍', '═'];

/// plan mode のフッター記号
pub const PLAN_MODE_GLYPH: &str = "⏸";

/// accept edits mode のフッター記号
pub const ACCEPT_EDITS_GLYPH: &str = "⏵⏵";

/// 完了を示す過去分詞（"✻ Cogitated for 1m 56s" など）
pub const COMPLETED_WORDS: &[&str] = &[
    "Baked", "Brewed", "Churned", "Cogitated", "Cooked", "Crunched", "Sautéed", "Worked",
];

/// 文字列として現れたら対話待ちと判断するプロンプト（この順で照合）
pub const INTERACTIVE_PROMPTS: &[&str] = &[
    "Should I proceed?",
    "Do you want to proceed?",
    "Would you like to proceed?",
    "Would you like to proceed with this plan?",
    "Proceed with this plan?",
    "Ready to submit your answers?",
];

/// 処理中に表示される動名詞
pub const PROCESSING_WORDS: &[&str] = &[
    "Accomplishing", "Actioning", "Actualizing", "Adding", "Architecting",
    "Baking", "Beaming", "Beboppin'", "Befuddling", "Billowing", "Blanching",
    "Bloviating", "Boogieing", "Boondoggling", "Booping", "Bootstrapping",
    "Brewing", "Burrowing", "Calculating", "Canoodling", "Caramelizing",
    "Cascading", "Catapulting", "Cerebrating", "Channeling", "Channelling",
    "Choreographing", "Churning", "Clauding", "Coalescing", "Cogitating",
    "Combobulating", "Composing", "Computing", "Concocting", "Considering",
    "Contemplating", "Cooking", "Crafting", "Creating", "Crunching",
    "Crystallizing", "Cultivating", "Deciphering", "Deliberating",
    "Determining", "Dilly-dallying", "Discombobulating", "Doing", "Doodling",
    "Drizzling", "Ebbing", "Effecting", "Elucidating", "Embellishing",
    "Enchanting", "Envisioning", "Evaporating", "Fermenting",
    "Fiddle-faddling", "Finagling", "Flambéing", "Flibbertigibbeting",
    "Flowing", "Flummoxing", "Fluttering", "Forging", "Forming", "Frolicking",
    "Frosting", "Gallivanting", "Galloping", "Garnishing", "Generating",
    "Germinating", "Gitifying", "Grooving", "Gusting", "Harmonizing",
    "Hashing", "Hatching", "Herding", "Honking", "Hullaballooing",
    "Hyperspacing", "Ideating", "Imagining", "Improvising", "Incubating",
    "Inferring", "Infusing", "Ionizing", "Jitterbugging", "Julienning",
    "Kneading", "Leavening", "Levitating", "Lollygagging", "Manifesting",
    "Marinating", "Meandering", "Metamorphosing", "Misting", "Moonwalking",
    "Moseying", "Mulling", "Mustering", "Musing", "Nebulizing", "Nesting",
    "Newspapering", "Noodling", "Nucleating", "Orbiting", "Orchestrating",
    "Osmosing", "Perambulating", "Percolating", "Perusing", "Philosophising",
    "Photosynthesizing", "Pollinating", "Pondering", "Pontificating",
    "Pouncing", "Precipitating", "Prestidigitating", "Processing",
    "Proofing", "Propagating", "Puttering", "Puzzling", "Quantumizing",
    "Razzle-dazzling", "Razzmatazzing", "Recombobulating", "Reticulating",
    "Roosting", "Ruminating", "Sautéing", "Scampering", "Schlepping",
    "Scurrying", "Seasoning", "Shenaniganing", "Shimmying", "Simmering",
    "Skedaddling", "Sketching", "Slithering", "Smooshing", "Sock-hopping",
    "Spelunking", "Spinning", "Sprouting", "Stewing", "Sublimating",
    "Swirling", "Swooping", "Symbioting", "Synthesizing", "Tempering",
    "Thinking", "Thundering", "Tinkering", "Tomfoolering", "Topsy-turvying",
    "Transfiguring", "Transmuting", "Twisting", "Undulating", "Unfurling",
    "Unravelling", "Vibing", "Waddling", "Wandering", "Warping",
    "Whatchamacalliting", "Whirlpooling", "Whirring", "Whisking", "Wibbling",
    "Working", "Wrangling", "Writing", "Zesting", "Zigzagging",
];

/// 状態分類に使う語彙一式
///
/// 既定値は Claude Code の表示に合わせたもの。設定ファイルから単語や
/// プロンプトを追加できるが、処理中語と完了語は常に重複しない。
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    processing_words: HashSet<String>,
    completed_words: HashSet<String>,
    interactive_prompts: Vec<String>,
}

impl Vocabulary {
    /// Claude Code の既定語彙（プロセス内で一度だけ構築）
    pub fn claude() -> &'static Vocabulary {
        static DEFAULT: OnceLock<Vocabulary> = OnceLock::new();
        DEFAULT.get_or_init(|| Vocabulary {
            processing_words: PROCESSING_WORDS.iter().map(|w| w.to_string()).collect(),
            completed_words: COMPLETED_WORDS.iter().map(|w| w.to_string()).collect(),
            interactive_prompts: INTERACTIVE_PROMPTS.iter().map(|p| p.to_string()).collect(),
        })
    }

    /// 既定語彙に設定の追加分を加えたもの
    pub fn with_extras(settings: &VocabularySettings) -> Result<Self> {
        let mut vocab = Self::claude().clone();

        for word in &settings.extra_processing_words {
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            if vocab.completed_words.contains(word) {
                bail!("'{word}' is already a completed word and cannot be a processing word");
            }
            vocab.processing_words.insert(word.to_string());
        }

        for word in &settings.extra_completed_words {
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            if vocab.processing_words.contains(word) {
                bail!("'{word}' is already a processing word and cannot be a completed word");
            }
            vocab.completed_words.insert(word.to_string());
        }

        for prompt in &settings.extra_prompts {
            let prompt = prompt.trim();
            if !prompt.is_empty() && !vocab.interactive_prompts.iter().any(|p| p == prompt) {
                vocab.interactive_prompts.push(prompt.to_string());
            }
        }

        Ok(vocab)
    }

    pub fn is_processing_word(&self, word: &str) -> bool {
        self.processing_words.contains(word)
    }

    pub fn is_completed_word(&self, word: &str) -> bool {
        self.completed_words.contains(word)
    }

    /// 行に含まれる最初の既知プロンプト（リスト順）
    pub fn find_prompt(&self, line: &str) -> Option<&str> {
        self.interactive_prompts
            .iter()
            .find(|p| line.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn interactive_prompts(&self) -> &[String] {
        &self.interactive_prompts
    }
}

pub fn is_spinner_glyph(c: char) -> bool {
    SPINNER_GLYPHS.contains(&c)
}

pub fn is_separator_char(c: char) -> bool {
    SEPARATOR_CHARS.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sets_are_disjoint() {
        let vocab = Vocabulary::claude();
        for word in COMPLETED_WORDS {
            assert!(vocab.is_completed_word(word));
            assert!(!vocab.is_processing_word(word), "{word} in both sets");
        }
        assert_eq!(vocab.processing_words.len(), PROCESSING_WORDS.len());
    }

    #[test]
    fn test_find_prompt_uses_list_order() {
        let vocab = Vocabulary::claude();
        // 両方を含む場合は先に並んでいる方
        assert_eq!(
            vocab.find_prompt("Proceed with this plan? Should I proceed?"),
            Some("Should I proceed?")
        );
        assert_eq!(
            vocab.find_prompt("Would you like to proceed with this plan?"),
            Some("Would you like to proceed with this plan?")
        );
        assert_eq!(
            vocab.find_prompt("  Do you want to proceed?  "),
            Some("Do you want to proceed?")
        );
        assert_eq!(vocab.find_prompt("should i proceed?"), None);
    }

    #[test]
    fn test_with_extras() {
        let settings = VocabularySettings {
            extra_processing_words: vec!["Deliberating".to_string(), "Yak-shaving".to_string()],
            extra_completed_words: vec!["Simmered".to_string()],
            extra_prompts: vec!["Apply this patch?".to_string(), "Should I proceed?".to_string()],
        };
        let vocab = Vocabulary::with_extras(&settings).unwrap();

        assert!(vocab.is_processing_word("Yak-shaving"));
        assert!(vocab.is_completed_word("Simmered"));
        assert_eq!(vocab.find_prompt("Apply this patch?"), Some("Apply this patch?"));
        // 重複したプロンプトは追加されない
        assert_eq!(vocab.interactive_prompts().len(), INTERACTIVE_PROMPTS.len() + 1);
        // 既定語彙は変化しない
        assert!(!Vocabulary::claude().is_processing_word("Yak-shaving"));
    }

    #[test]
    fn test_with_extras_rejects_overlap() {
        let settings = VocabularySettings {
            extra_completed_words: vec!["Thinking".to_string()],
            ..Default::default()
        };
        assert!(Vocabulary::with_extras(&settings).is_err());

        let settings = VocabularySettings {
            extra_processing_words: vec!["Baked".to_string()],
            ..Default::default()
        };
        assert!(Vocabulary::with_extras(&settings).is_err());
    }

    #[test]
    fn test_glyph_helpers() {
        assert!(is_spinner_glyph('✻'));
        assert!(!is_spinner_glyph('*'));
        assert!(is_separator_char('╌'));
        assert!(!is_separator_char('-'));
    }
}
