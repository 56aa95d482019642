// Draft recommendations.
//
// The `Recommender` trait is the seam; `RandomRecommender` fills it with
// template text and shuffled candidates so the front-end has something to
// show. It makes no attempt at prediction quality.

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::catalog::Entity;
use crate::draft::{Action, DraftState, EntityId, Team};

/// Maximum number of suggestions in one analysis.
pub const MAX_SUGGESTIONS: usize = 5;

// ---------------------------------------------------------------------------
// Analysis types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Danger,
    Warning,
    Info,
}

impl Severity {
    pub fn display_str(&self) -> &'static str {
        match self {
            Severity::Danger => "DANGER",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub entity_id: EntityId,
    pub score: u32,
    pub win_rate: f64,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Ranked best first; scores never increase down the list.
    pub suggestions: Vec<Suggestion>,
    /// Projected win rate for the acting team, in percent.
    pub projected_win_rate: f64,
    pub warnings: Vec<Warning>,
    pub insights: Vec<String>,
}

impl Analysis {
    pub fn top(&self) -> Option<&Suggestion> {
        self.suggestions.first()
    }
}

/// Text language for narratives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Map a catalog locale tag (e.g. "zh_CN") to a narrative language.
    pub fn from_locale(locale: &str) -> Self {
        if locale.to_ascii_lowercase().starts_with("zh") {
            Language::Zh
        } else {
            Language::En
        }
    }
}

/// Which sides the automated controller drafts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerScope {
    #[default]
    Off,
    Blue,
    Red,
    Both,
}

impl ControllerScope {
    pub fn from_str_scope(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Some(ControllerScope::Off),
            "blue" | "a" => Some(ControllerScope::Blue),
            "red" | "b" => Some(ControllerScope::Red),
            "both" => Some(ControllerScope::Both),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            ControllerScope::Off => "off",
            ControllerScope::Blue => "blue",
            ControllerScope::Red => "red",
            ControllerScope::Both => "both",
        }
    }

    pub fn covers(&self, team: Team) -> bool {
        matches!(
            (self, team),
            (ControllerScope::Both, _)
                | (ControllerScope::Blue, Team::Blue)
                | (ControllerScope::Red, Team::Red)
        )
    }
}

impl fmt::Display for ControllerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Recommender trait
// ---------------------------------------------------------------------------

/// Produces an analysis for the pending step of a draft.
///
/// Implementations must return a non-empty suggestion list whenever
/// `available` is non-empty, ranked with non-increasing scores, and a
/// projected win rate within `[0, 100]`.
pub trait Recommender: Send {
    fn recommend(
        &mut self,
        draft: &DraftState,
        available: &[&Entity],
        action: Action,
        team: Team,
    ) -> Analysis;
}

// ---------------------------------------------------------------------------
// Random implementation
// ---------------------------------------------------------------------------

const BAN_REASONS_EN: &[&str] = &[
    "High priority pick in current meta, deny enemy team",
    "Strong counter to our current composition",
    "Enemy team likely to prioritize this champion",
    "Removes a flex pick option from enemy",
    "High win rate champion, worth banning",
];

const BAN_REASONS_ZH: &[&str] = &[
    "当前版本高优先级选择，禁用以防敌方拿到",
    "对我方当前阵容有强克制效果",
    "敌方队伍可能优先选择此英雄",
    "移除敌方的灵活选择空间",
    "高胜率英雄，值得禁用",
];

const PICK_REASONS_EN: &[&str] = &[
    "High synergy with current team composition",
    "Strong counter to enemy picks",
    "Flexible pick that fits multiple roles",
    "High win rate in current meta",
    "Denies enemy a priority pick while strengthening our comp",
    "Provides CC chain with existing picks",
    "Adds AP damage to balance team damage profile",
    "Strong frontline to protect carries",
    "Excellent engage tool for teamfights",
    "Safe blind pick with few counters",
];

const PICK_REASONS_ZH: &[&str] = &[
    "与当前阵容协同效果出色",
    "对敌方已选英雄有强力克制",
    "灵活选择，可适应多个位置",
    "当前版本高胜率英雄",
    "抢选以阻止敌方获得优先选择",
    "与已有英雄形成控制链",
    "提供AP伤害，平衡队伍输出类型",
    "强力前排，保护后排输出",
    "优秀的团战开团工具",
    "安全的盲选，反制较少",
];

const WARNINGS_EN: &[(Severity, &str)] = &[
    (Severity::Warning, "Team lacks AP damage, consider AP pick"),
    (Severity::Warning, "No frontline yet, need tank or bruiser"),
    (Severity::Warning, "Lacking crowd control for teamfights"),
    (Severity::Danger, "Top lane constraints: limited options remaining"),
    (Severity::Info, "Enemy comp is poke-heavy, consider hard engage"),
    (Severity::Warning, "Team is full AD, enemy can stack armor"),
];

const WARNINGS_ZH: &[(Severity, &str)] = &[
    (Severity::Warning, "队伍缺少AP伤害，考虑选择法师"),
    (Severity::Warning, "尚无前排，需要坦克或战士"),
    (Severity::Warning, "团战控制不足"),
    (Severity::Danger, "上路选择受限：剩余选项有限"),
    (Severity::Info, "敌方阵容偏消耗，考虑硬开团"),
    (Severity::Warning, "队伍全AD，敌方可堆护甲"),
];

const INSIGHTS_EN: &[&str] = &[
    "Red side has first pick advantage in phase 2",
    "Blue side can secure power pick with next selection",
    "Current draft favors scaling, consider early game pressure",
    "Enemy comp is teamfight-oriented, consider split-push strategy",
];

const INSIGHTS_ZH: &[&str] = &[
    "红方在第二阶段有先选优势",
    "蓝方下一次选择可抢到强势英雄",
    "当前阵容偏后期，考虑前期压制",
    "敌方阵容偏团战，可考虑分推战术",
];

/// Shuffles the available entities and decorates the first few with
/// template narratives.
pub struct RandomRecommender {
    rng: StdRng,
    language: Language,
}

impl RandomRecommender {
    pub fn new(language: Language) -> Self {
        RandomRecommender {
            rng: StdRng::from_entropy(),
            language,
        }
    }

    /// Deterministic output for a given seed.
    pub fn with_seed(seed: u64, language: Language) -> Self {
        RandomRecommender {
            rng: StdRng::seed_from_u64(seed),
            language,
        }
    }

    fn reasons(&self, action: Action) -> &'static [&'static str] {
        match (action, self.language) {
            (Action::Ban, Language::En) => BAN_REASONS_EN,
            (Action::Ban, Language::Zh) => BAN_REASONS_ZH,
            (Action::Pick, Language::En) => PICK_REASONS_EN,
            (Action::Pick, Language::Zh) => PICK_REASONS_ZH,
        }
    }

    fn warnings(&mut self, total_picks: usize) -> Vec<Warning> {
        let templates = match self.language {
            Language::En => WARNINGS_EN,
            Language::Zh => WARNINGS_ZH,
        };
        let count = match total_picks {
            0..=1 => 0,
            2..=3 => usize::from(self.rng.gen_bool(0.5)),
            _ => usize::from(self.rng.gen_bool(0.5)) + usize::from(self.rng.gen_bool(0.4)),
        };
        templates
            .choose_multiple(&mut self.rng, count)
            .map(|(severity, message)| Warning {
                severity: *severity,
                message: (*message).to_string(),
            })
            .collect()
    }

    fn insights(&mut self, total_picks: usize) -> Vec<String> {
        let templates = match self.language {
            Language::En => INSIGHTS_EN,
            Language::Zh => INSIGHTS_ZH,
        };
        let count = match total_picks {
            0 => 0,
            1..=2 => usize::from(self.rng.gen_bool(0.6)),
            _ => usize::from(self.rng.gen_bool(0.6)) + usize::from(self.rng.gen_bool(0.5)),
        };
        templates
            .choose_multiple(&mut self.rng, count)
            .map(|s| (*s).to_string())
            .collect()
    }
}

impl Recommender for RandomRecommender {
    fn recommend(
        &mut self,
        draft: &DraftState,
        available: &[&Entity],
        action: Action,
        team: Team,
    ) -> Analysis {
        let candidates: Vec<&Entity> = available
            .choose_multiple(&mut self.rng, MAX_SUGGESTIONS)
            .copied()
            .collect();

        let mut win_rates: Vec<f64> = (0..candidates.len())
            .map(|rank| 60.0 - 3.0 * rank as f64 + f64::from(self.rng.gen_range(-3..=3)))
            .collect();
        win_rates.sort_by(|a, b| b.total_cmp(a));

        let reasons = self.reasons(action);
        let suggestions = candidates
            .iter()
            .zip(win_rates)
            .enumerate()
            .map(|(rank, (entity, win_rate))| Suggestion {
                entity_id: entity.id.clone(),
                score: 100 - 10 * rank as u32,
                win_rate,
                narrative: reasons[self.rng.gen_range(0..reasons.len())].to_string(),
            })
            .collect();

        let total_picks = draft.picked(Team::Blue).len() + draft.picked(Team::Red).len();
        let side_bias = match team {
            Team::Blue => 2.0,
            Team::Red => -2.0,
        };
        let projected_win_rate =
            (50.0 + f64::from(self.rng.gen_range(-5..5)) + side_bias).clamp(35.0, 65.0);

        Analysis {
            suggestions,
            projected_win_rate,
            warnings: self.warnings(total_picks),
            insights: self.insights(total_picks),
        }
    }
}
