// Leaderboard reporting over snapshot artifacts.
// Parses per-record benchmark CSV text and picks the best model for every metric.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::cache::{CacheEntry, SnapshotCache};

/// Step whose training loss is reported.
pub const LOSS_STEP: u64 = 2000;

/// Benchmarks shown in reports, in display order.
pub const BENCHMARKS: [&str; 12] = [
    "ARC Challenge",
    "ARC Easy",
    "BoolQ",
    "FDA",
    "HellaSwag",
    "LAMBDA OpenAI",
    "OpenBookQA",
    "PIQA",
    "Social IQA",
    "SQuAD Completion",
    "SWDE",
    "WinoGrande",
];

/// A parsed benchmark cell.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// The numeric value, if finite. NaN cells count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

/// Map a raw CSV header to its display name.
pub fn normalize_column_name(raw: &str) -> String {
    let clean = raw.trim().to_lowercase();
    let known = match clean.as_str() {
        "arc_challenge" | "arc challenge" => Some("ARC Challenge"),
        "arc_easy" | "arc easy" => Some("ARC Easy"),
        "boolq" => Some("BoolQ"),
        "fda" => Some("FDA"),
        "hellaswag" => Some("HellaSwag"),
        "lambada_openai" | "lambda openai" => Some("LAMBDA OpenAI"),
        "openbookqa" => Some("OpenBookQA"),
        "piqa" => Some("PIQA"),
        "social_iqa" | "social iqa" => Some("Social IQA"),
        "squad_completion" | "squad completion" => Some("SQuAD Completion"),
        "swde" => Some("SWDE"),
        "winogrande" => Some("WinoGrande"),
        "average" => Some("Average"),
        _ => None,
    };
    match known {
        Some(name) => name.to_string(),
        None => title_case(raw.trim()),
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn csv_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Parse a two-line CSV (headers, values) of benchmark results.
///
/// The first column holds the model name and is skipped, as is any column
/// headed `model` or with an empty header.
pub fn parse_test_results(text: &str) -> BTreeMap<String, MetricValue> {
    let lines = csv_lines(text);
    let mut results = BTreeMap::new();
    if lines.len() < 2 {
        return results;
    }

    let headers = lines[0].split(',').map(str::trim);
    let values = lines[1].split(',').map(str::trim);
    for (i, (header, value)) in headers.zip(values).enumerate() {
        if i == 0 || header.is_empty() || header.eq_ignore_ascii_case("model") {
            continue;
        }
        let parsed = match value.parse::<f64>() {
            Ok(n) => MetricValue::Number(n),
            Err(_) => MetricValue::Text(value.to_string()),
        };
        results.insert(normalize_column_name(header), parsed);
    }
    results
}

/// Training loss at exactly `step`, from a two-line CSV (steps, losses).
pub fn loss_at_step(train: &str, step: u64) -> Option<f64> {
    let lines = csv_lines(train);
    if lines.len() < 2 {
        return None;
    }

    let steps = lines[0].split(',').skip(1).map(str::trim);
    let losses = lines[1].split(',').skip(1).map(str::trim);
    steps
        .zip(losses)
        .find(|(s, _)| s.parse::<u64>().ok() == Some(step))
        .and_then(|(_, loss)| loss.parse().ok())
}

/// One model's row in the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub index: u64,
    pub name: String,
    pub parent: Option<String>,
    pub score: Option<f64>,
    pub loss: Option<f64>,
    pub test_mean: Option<f64>,
    pub benchmarks: BTreeMap<String, MetricValue>,
}

impl LeaderboardRow {
    pub fn from_entry(entry: &CacheEntry) -> Self {
        let benchmarks = parse_test_results(&entry.test);

        let numeric: Vec<f64> = BENCHMARKS
            .iter()
            .filter_map(|b| benchmarks.get(*b).and_then(MetricValue::as_f64))
            .collect();
        let test_mean = if !numeric.is_empty() {
            Some(numeric.iter().sum::<f64>() / numeric.len() as f64)
        } else {
            benchmarks.get("Average").and_then(MetricValue::as_f64)
        };

        let parent = entry.parent.as_ref().and_then(|p| match p {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        Self {
            index: entry.index,
            name: entry.name.clone(),
            parent,
            score: entry.score_value(),
            loss: loss_at_step(&entry.train, LOSS_STEP),
            test_mean,
            benchmarks,
        }
    }

    pub fn benchmark(&self, name: &str) -> Option<f64> {
        self.benchmarks.get(name).and_then(MetricValue::as_f64)
    }
}

/// Rows for every named record in the snapshot.
pub fn leaderboard(cache: &SnapshotCache) -> Vec<LeaderboardRow> {
    cache
        .results
        .iter()
        .filter(|e| !e.name.is_empty())
        .map(LeaderboardRow::from_entry)
        .collect()
}

/// Leaderboard ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Index,
    #[default]
    Score,
    Loss,
    TestMean,
}

impl SortKey {
    pub fn title(&self) -> &'static str {
        match self {
            SortKey::Index => "Index",
            SortKey::Score => "Score",
            SortKey::Loss => "Loss",
            SortKey::TestMean => "Test mean",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortKey::Index => SortKey::Score,
            SortKey::Score => SortKey::Loss,
            SortKey::Loss => SortKey::TestMean,
            SortKey::TestMean => SortKey::Index,
        }
    }
}

/// Order `a` before `b` when it is better; missing or non-finite values
/// always sort last.
fn better_first(a: Option<f64>, b: Option<f64>, lower_is_better: bool) -> Ordering {
    match (a.filter(|v| v.is_finite()), b.filter(|v| v.is_finite())) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if lower_is_better { ord } else { ord.reverse() }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_rows(rows: &mut [LeaderboardRow], key: SortKey) {
    match key {
        SortKey::Index => rows.sort_by_key(|r| r.index),
        SortKey::Score => rows.sort_by(|a, b| better_first(a.score, b.score, false)),
        SortKey::Loss => rows.sort_by(|a, b| better_first(a.loss, b.loss, true)),
        SortKey::TestMean => rows.sort_by(|a, b| better_first(a.test_mean, b.test_mean, false)),
    }
}

/// Best value of one metric across the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMetric {
    pub metric: String,
    pub value: f64,
    pub model: String,
    pub lower_is_better: bool,
}

impl BestMetric {
    pub fn formatted_value(&self) -> String {
        if self.metric == "Score" {
            format!("{:.6}", self.value)
        } else {
            format!("{:.4}", self.value)
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.lower_is_better { "↓" } else { "↑" }
    }
}

fn best_of(
    metric: &str,
    rows: &[LeaderboardRow],
    lower_is_better: bool,
    get: impl Fn(&LeaderboardRow) -> Option<f64>,
) -> Option<BestMetric> {
    rows.iter()
        .filter_map(|r| get(r).filter(|v| v.is_finite()).map(|v| (v, r)))
        .min_by(|(a, _), (b, _)| better_first(Some(*a), Some(*b), lower_is_better))
        .map(|(value, row)| BestMetric {
            metric: metric.to_string(),
            value,
            model: row.name.clone(),
            lower_is_better,
        })
}

/// Best model per metric: Score, Loss (lower is better), Test mean, then
/// each benchmark. Metrics with no numeric values are omitted.
pub fn best_per_metric(rows: &[LeaderboardRow]) -> Vec<BestMetric> {
    let mut best = Vec::new();
    best.extend(best_of("Score", rows, false, |r| r.score));
    best.extend(best_of("Loss", rows, true, |r| r.loss));
    best.extend(best_of("Test mean", rows, false, |r| r.test_mean));
    for bench in BENCHMARKS {
        best.extend(best_of(bench, rows, false, |r| r.benchmark(bench)));
    }
    best
}
