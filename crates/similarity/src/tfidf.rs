use crate::backend::SimilarityBackend;
use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern compiles"));

// scikit-learn's ENGLISH_STOP_WORDS.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
        "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
        "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
        "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
        "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
        "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg",
        "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
        "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
        "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty",
        "found", "four", "from", "front", "full", "further", "get", "give", "go", "had", "has",
        "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
        "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred",
        "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself",
        "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
        "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
        "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
        "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
        "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
        "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
        "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem",
        "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
        "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
        "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
        "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
        "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
        "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus",
        "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
        "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
        "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
        "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
        "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
        "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Lexical backend: TF-IDF vectors over the claim plus the candidate batch, cosine scored.
///
/// The vocabulary and document frequencies are rebuilt for every batch, so scores are
/// relative to the batch they were computed in.
#[derive(Clone, Debug)]
pub struct TfidfBackend {
    stop_words: bool,
}

impl Default for TfidfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfBackend {
    pub fn new() -> Self {
        Self { stop_words: true }
    }

    /// Keep English stop words in the vocabulary.
    pub fn with_stop_words_kept() -> Self {
        Self { stop_words: false }
    }

    pub(crate) fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words || !STOP_WORDS.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Cosine similarity of `claim` against each candidate.
    pub fn similarities(&self, claim: &str, candidates: &[String]) -> Vec<f32> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let docs: Vec<Vec<String>> = std::iter::once(claim)
            .chain(candidates.iter().map(String::as_str))
            .map(|text| self.tokenize(text))
            .collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in &docs {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let n = docs.len() as f32;
        let vectors: Vec<HashMap<&str, f32>> = docs
            .iter()
            .map(|tokens| {
                let mut weights: HashMap<&str, f32> = HashMap::new();
                for token in tokens {
                    *weights.entry(token.as_str()).or_insert(0.0) += 1.0;
                }
                for (token, weight) in &mut weights {
                    let df = *doc_freq.get(token).unwrap_or(&0) as f32;
                    *weight *= smooth_idf(n, df);
                }
                normalize(&mut weights);
                weights
            })
            .collect();

        let Some((claim_vec, candidate_vecs)) = vectors.split_first() else {
            return vec![0.0; candidates.len()];
        };
        candidate_vecs
            .iter()
            .map(|candidate| sparse_dot(claim_vec, candidate))
            .collect()
    }
}

#[async_trait]
impl SimilarityBackend for TfidfBackend {
    fn name(&self) -> &str {
        "tfidf"
    }

    async fn score(&self, claim: &str, candidates: &[String]) -> Result<Vec<f32>> {
        Ok(self.similarities(claim, candidates))
    }
}

fn smooth_idf(n: f32, df: f32) -> f32 {
    ((1.0 + n) / (1.0 + df)).ln() + 1.0
}

fn normalize(weights: &mut HashMap<&str, f32>) {
    let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for weight in weights.values_mut() {
        *weight /= norm;
    }
}

// Both vectors are already L2-normalised, so the dot product is the cosine.
fn sparse_dot(a: &HashMap<&str, f32>, b: &HashMap<&str, f32>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(token, wa)| large.get(token).map(|wb| wa * wb))
        .sum::<f32>()
        .clamp(0.0, 1.0)
}
