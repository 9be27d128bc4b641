use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Constants ──────────────────────────────────────────────────────────

pub const TBD: &str = "TBD";
pub const BYE_LABEL: &str = "BYE";
pub const DEFAULT_BEST_OF: u32 = 1;

pub type ParticipantId = Uuid;
pub type MatchId = Uuid;

// ── Generation settings ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMode {
    #[default]
    AsEntered,
    Random,
}

/// Where byes land when the field is padded to a power of two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ByeMode {
    /// Byes are appended after the last entrant and pairing follows list order.
    #[default]
    #[serde(alias = "auto")]
    #[value(alias = "auto")]
    End,
    /// Standard seed placement (1 vs N, 2 vs N-1, ...), so byes go to the top seeds.
    Seeded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    #[default]
    #[serde(alias = "single_elim")]
    #[value(alias = "single-elim")]
    Single,
    RoundRobin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchDefaults {
    pub time: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    pub best_of: u32,
    pub third_place: bool,
    pub bye_mode: ByeMode,
    pub double_round: bool,
    pub defaults: MatchDefaults,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            best_of: DEFAULT_BEST_OF,
            third_place: false,
            bye_mode: ByeMode::End,
            double_round: false,
            defaults: MatchDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub win: i32,
    pub draw: i32,
    pub loss: i32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self { win: 3, draw: 1, loss: 0 }
    }
}

// ── Entrants ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub seed: u32,
    #[serde(default)]
    pub bye: bool,
}

impl Participant {
    pub fn bye(seed: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: BYE_LABEL.to_string(),
            seed,
            bye: true,
        }
    }

    /// Snapshot of this participant as it sits in a match slot.
    pub fn contestant(&self) -> Contestant {
        Contestant {
            id: self.id,
            name: self.name.clone(),
            seed: Some(self.seed),
            bye: self.bye,
            score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contestant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub seed: Option<u32>,
    #[serde(default)]
    pub bye: bool,
    #[serde(default)]
    pub score: Option<u32>,
}

// ── Slots and links ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner,
    Loser,
}

/// Which earlier match feeds a slot, and whether it sends its winner or its loser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source: MatchId,
    pub outcome: Outcome,
}

impl Link {
    pub fn winner_of(source: MatchId) -> Self {
        Self { source, outcome: Outcome::Winner }
    }

    pub fn loser_of(source: MatchId) -> Self {
        Self { source, outcome: Outcome::Loser }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    pub source: MatchId,
    pub outcome: Outcome,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Slot {
    #[default]
    Empty,
    Concrete(Contestant),
    Pending(Placeholder),
}

impl Slot {
    pub fn pending(link: Link) -> Self {
        Slot::Pending(Placeholder {
            source: link.source,
            outcome: link.outcome,
            name: TBD.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn contestant(&self) -> Option<&Contestant> {
        match self {
            Slot::Concrete(contestant) => Some(contestant),
            _ => None,
        }
    }

    pub fn contestant_mut(&mut self) -> Option<&mut Contestant> {
        match self {
            Slot::Concrete(contestant) => Some(contestant),
            _ => None,
        }
    }

    pub fn concrete_id(&self) -> Option<ParticipantId> {
        self.contestant().map(|c| c.id)
    }

    pub fn is_bye(&self) -> bool {
        self.contestant().map(|c| c.bye).unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        match self {
            Slot::Empty => TBD,
            Slot::Concrete(contestant) => &contestant.name,
            Slot::Pending(placeholder) => &placeholder.name,
        }
    }

    pub fn score(&self) -> Option<u32> {
        self.contestant().and_then(|c| c.score)
    }
}

// ── Matches ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Empty,
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    pub index: u32,
    #[serde(default)]
    pub third_place: bool,
    pub a: Slot,
    pub b: Slot,
    #[serde(default)]
    pub links: [Option<Link>; 2],
    pub winner: Option<ParticipantId>,
    #[serde(default)]
    pub winner_name: Option<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub auto: bool,
    #[serde(default)]
    pub draw: bool,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    pub best_of: u32,
}

impl Match {
    pub fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    pub fn link(&self, side: Side) -> Option<Link> {
        match side {
            Side::A => self.links[0],
            Side::B => self.links[1],
        }
    }

    pub fn is_linked(&self) -> bool {
        self.links.iter().any(Option::is_some)
    }

    /// Side whose concrete contestant has the given id.
    pub fn side_of(&self, id: ParticipantId) -> Option<Side> {
        if self.a.concrete_id() == Some(id) {
            Some(Side::A)
        } else if self.b.concrete_id() == Some(id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn winner_side(&self) -> Option<Side> {
        self.winner.and_then(|id| self.side_of(id))
    }

    pub fn winner_contestant(&self) -> Option<&Contestant> {
        self.winner_side().and_then(|side| self.slot(side).contestant())
    }

    /// The other slot of a decided match. `None` when undecided, drawn, or the loser slot is not concrete.
    pub fn loser_contestant(&self) -> Option<&Contestant> {
        if self.draw {
            return None;
        }
        let side = self.winner_side()?;
        self.slot(side.other()).contestant()
    }

    pub fn refresh_status(&mut self) {
        self.status = if self.winner.is_some() || self.draw {
            MatchStatus::Completed
        } else if self.a.is_empty() && self.b.is_empty() {
            MatchStatus::Empty
        } else {
            MatchStatus::Pending
        };
    }

    /// Drop any recorded result and both scores.
    pub fn reset_result(&mut self) {
        self.winner = None;
        self.winner_name = None;
        self.draw = false;
        self.auto = false;
        for slot in [&mut self.a, &mut self.b] {
            if let Some(contestant) = slot.contestant_mut() {
                contestant.score = None;
            }
        }
        self.refresh_status();
    }

    pub fn set_winner(&mut self, side: Side, auto: bool) {
        let Some((id, name)) = self.slot(side).contestant().map(|c| (c.id, c.name.clone())) else {
            return;
        };
        self.winner = Some(id);
        self.winner_name = Some(name);
        self.draw = false;
        self.auto = auto;
        self.refresh_status();
    }
}

// ── Bracket ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub format: BracketFormat,
    pub rounds: u32,
    pub size: usize,
    pub matches: Vec<Match>,
}

// ── Config types ───────────────────────────────────────────────────────

pub const DEFAULT_STATE_PATH: &str = "bracket.json";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_SERVE_ADDR: &str = "127.0.0.1:17890";

/// Settings read from `bracket-tool.json`. Empty strings fall back to the
/// environment first, then to the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub state_path: String,
    pub log_dir: String,
    pub log_filter: String,
    pub title: String,
    pub format: BracketFormat,
    pub seeding: SeedingMode,
    pub best_of: u32,
    pub third_place: bool,
    pub bye_mode: ByeMode,
    pub double_round: bool,
    pub defaults: MatchDefaults,
    pub points: PointsConfig,
    pub serve_addr: String,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_path: String::new(),
            log_dir: String::new(),
            log_filter: String::new(),
            title: "Tournament".to_string(),
            format: BracketFormat::Single,
            seeding: SeedingMode::AsEntered,
            best_of: DEFAULT_BEST_OF,
            third_place: false,
            bye_mode: ByeMode::End,
            double_round: false,
            defaults: MatchDefaults::default(),
            points: PointsConfig::default(),
            serve_addr: String::new(),
            static_dir: String::new(),
        }
    }
}

impl AppConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            best_of: self.best_of.max(1),
            third_place: self.third_place,
            bye_mode: self.bye_mode,
            double_round: self.double_round,
            defaults: self.defaults.clone(),
        }
    }
}
