use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(ClassroomId);

/// Lessons per school day; lesson numbers run `1..=LESSONS_PER_DAY`.
pub const LESSONS_PER_DAY: u8 = 7;
pub const DAYS_PER_WEEK: usize = 5;
pub const SLOTS_PER_WEEK: usize = DAYS_PER_WEEK * LESSONS_PER_DAY as usize;

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; DAYS_PER_WEEK] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn weekdays() -> Vec<DayOfWeek> {
        Self::ALL.to_vec()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scheduling unit: one lesson number on one weekday.
///
/// Ordering is chronological (day first, then lesson number).
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, PartialOrd, Ord,
)]
pub struct TimeSlot {
    pub day: DayOfWeek,
    pub lesson: u8,
}

impl TimeSlot {
    pub fn new(day: DayOfWeek, lesson: u8) -> Option<Self> {
        let slot = Self { day, lesson };
        slot.is_valid().then_some(slot)
    }

    pub fn is_valid(&self) -> bool {
        (1..=LESSONS_PER_DAY).contains(&self.lesson)
    }

    /// Dense index in `0..SLOTS_PER_WEEK`. Only meaningful for valid slots.
    pub fn index(&self) -> usize {
        self.day.index() * LESSONS_PER_DAY as usize + (self.lesson as usize - 1)
    }

    pub fn from_index(i: usize) -> Self {
        let per_day = LESSONS_PER_DAY as usize;
        Self {
            day: DayOfWeek::ALL[i / per_day],
            lesson: (i % per_day) as u8 + 1,
        }
    }

    /// Every slot of the week in chronological order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..SLOTS_PER_WEEK).map(TimeSlot::from_index)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.day, self.lesson)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Classroom {
    pub number: ClassroomId,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub floor: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub name: TeacherId,
    #[serde(default = "DayOfWeek::weekdays")]
    pub available_days: Vec<DayOfWeek>,
    #[serde(default)]
    pub home_classroom: Option<ClassroomId>,
}

impl Teacher {
    pub fn is_available(&self, day: DayOfWeek) -> bool {
        self.available_days.contains(&day)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    #[default]
    Mandatory,
    Elective,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub kind: SubjectKind,
    pub hours_per_week: u32,
    pub teacher: TeacherId,
    pub classes: Vec<String>,
}

impl Subject {
    /// The class or group a placed lesson of this subject is recorded under.
    pub fn primary_class(&self) -> Option<&str> {
        self.classes.first().map(String::as_str)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub subject: String,
    pub teacher: TeacherId,
    pub class_or_group: String,
    #[serde(default)]
    pub classroom: Option<ClassroomId>,
    pub slot: TimeSlot,
    #[serde(default)]
    pub exam_practice: bool,
}

/// Reference data the pipeline works against.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    #[serde(default)]
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricWeights {
    #[serde(default = "default_gap_weight")]
    pub teacher_gaps: f64,
    #[serde(default = "default_gap_weight")]
    pub class_gaps: f64,
    #[serde(default = "default_load_weight")]
    pub daily_load: f64,
    #[serde(default = "default_gap_weight")]
    pub hard_timing: f64,
}

fn default_gap_weight() -> f64 {
    4.0
}
fn default_load_weight() -> f64 {
    3.0
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            teacher_gaps: default_gap_weight(),
            class_gaps: default_gap_weight(),
            daily_load: default_load_weight(),
            hard_timing: default_gap_weight(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeParams {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_chains")]
    pub chains: u32,
    #[serde(default = "default_swap_attempts")]
    pub swap_attempts: u32,
}

fn default_max_iterations() -> u32 {
    1000
}
fn default_cooling_rate() -> f64 {
    0.995
}
fn default_initial_temperature() -> f64 {
    100.0
}
fn default_chains() -> u32 {
    1
}
fn default_swap_attempts() -> u32 {
    64
}

impl Default for OptimizeParams {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            cooling_rate: default_cooling_rate(),
            initial_temperature: default_initial_temperature(),
            seed: 0,
            chains: default_chains(),
            swap_attempts: default_swap_attempts(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    /// Keywords marking a subject as hard; `None` uses the built-in list.
    #[serde(default)]
    pub hard_subjects: Option<Vec<String>>,
    #[serde(default)]
    pub weights: MetricWeights,
    #[serde(default)]
    pub optimize: OptimizeParams,
    #[serde(default = "default_run_optimizer")]
    pub run_optimizer: bool,
}

fn default_run_optimizer() -> bool {
    true
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            hard_subjects: None,
            weights: MetricWeights::default(),
            optimize: OptimizeParams::default(),
            run_optimizer: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEnvelope {
    pub instance: Instance,
    /// Lessons already placed by the exam-practice phase.
    #[serde(default)]
    pub base: Vec<Lesson>,
    /// Slots the mandatory placer must never write into.
    #[serde(default)]
    pub reserved: Vec<TimeSlot>,
    #[serde(default)]
    pub params: GenerateParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct Shortfall {
    pub subject: String,
    pub class: String,
    pub placed: u32,
    pub required: u32,
}

impl Shortfall {
    pub fn missing(&self) -> u32 {
        self.required.saturating_sub(self.placed)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct PlacementReport {
    pub placed: u32,
    pub required: u32,
    pub shortfalls: Vec<Shortfall>,
}

impl PlacementReport {
    /// Share of required mandatory hours actually placed, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.required == 0 {
            return 100.0;
        }
        self.placed as f64 / self.required as f64 * 100.0
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct BestPoint {
    pub iteration: u32,
    pub metric: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStats {
    pub initial_metric: f64,
    pub final_metric: f64,
    pub iterations: u32,
    pub improvements: u32,
    pub accepted_worse: u32,
    pub skipped: u32,
    pub chains: u32,
    pub best_chain: u32,
    pub best_history: Vec<BestPoint>,
}

impl OptimizationStats {
    pub fn improvement_pct(&self) -> f64 {
        if self.initial_metric <= 0.0 {
            return 0.0;
        }
        (self.initial_metric - self.final_metric) / self.initial_metric * 100.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct DayLoad {
    pub day: DayOfWeek,
    pub lessons: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
pub struct EntityGaps {
    pub name: String,
    pub gaps: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub total_lessons: u32,
    pub exam_practice_lessons: u32,
    pub mandatory_lessons: u32,
    pub teacher_gaps: u32,
    pub class_gaps: u32,
    pub daily_load: Vec<DayLoad>,
    pub load_stddev: f64,
    pub bad_timing: u32,
    pub metric: f64,
    pub worst_teachers: Vec<EntityGaps>,
    /// Mandatory placement success in percent; only known after a generate run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_rate: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerateStatus {
    Solved,
    Partial,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    pub status: GenerateStatus,
    pub lessons: Vec<Lesson>,
    pub placement: PlacementReport,
    #[serde(default)]
    pub optimization: Option<OptimizationStats>,
    pub quality: QualityReport,
}
