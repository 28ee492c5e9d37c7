//! Multiplier tables and the closed enumerations that index them
//!
//! Every lookup falls back to `1.0` when a label is missing from the table,
//! so a sparse catalog never makes an estimate fail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Project difficulty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl Complexity {
    pub const ALL: [Complexity; 4] = [
        Complexity::Low,
        Complexity::Medium,
        Complexity::High,
        Complexity::VeryHigh,
    ];

    /// Human-facing name of the difficulty level
    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Low => "simple",
            Complexity::Medium => "standard",
            Complexity::High => "advanced",
            Complexity::VeryHigh => "expert",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High => write!(f, "high"),
            Complexity::VeryHigh => write!(f, "very_high"),
        }
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            "very_high" => Ok(Complexity::VeryHigh),
            _ => Err(format!("Unknown complexity: {}", s)),
        }
    }
}

/// Delivery schedule pressure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    Short,
    #[default]
    Normal,
    Long,
}

impl Duration {
    pub const ALL: [Duration; 3] = [Duration::Short, Duration::Normal, Duration::Long];
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duration::Short => write!(f, "short"),
            Duration::Normal => write!(f, "normal"),
            Duration::Long => write!(f, "long"),
        }
    }
}

impl FromStr for Duration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "short" => Ok(Duration::Short),
            "normal" => Ok(Duration::Normal),
            "long" => Ok(Duration::Long),
            _ => Err(format!("Unknown duration: {}", s)),
        }
    }
}

/// Greenfield build or port of an existing system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevType {
    #[default]
    New,
    Porting,
}

impl DevType {
    pub const ALL: [DevType; 2] = [DevType::New, DevType::Porting];
}

impl fmt::Display for DevType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevType::New => write!(f, "new"),
            DevType::Porting => write!(f, "porting"),
        }
    }
}

impl FromStr for DevType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "new" => Ok(DevType::New),
            "porting" => Ok(DevType::Porting),
            _ => Err(format!("Unknown dev type: {}", s)),
        }
    }
}

/// Delivery platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    WebB2e,
    WebB2c,
    Mobile,
    All,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::WebB2e,
        Platform::WebB2c,
        Platform::Mobile,
        Platform::All,
    ];
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::WebB2e => write!(f, "web_b2e"),
            Platform::WebB2c => write!(f, "web_b2c"),
            Platform::Mobile => write!(f, "mobile"),
            Platform::All => write!(f, "all"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "web_b2e" => Ok(Platform::WebB2e),
            "web_b2c" => Ok(Platform::WebB2c),
            "mobile" => Ok(Platform::Mobile),
            "all" => Ok(Platform::All),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Caller's confidence in the vendor-phase scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::Low, Confidence::Medium, Confidence::High];
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(format!("Unknown confidence: {}", s)),
        }
    }
}

/// Lowercase and fold `-`/space to `_` so `Very-High` parses as `very_high`
fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Design and development sub-multipliers for a dev type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevTypeFactors {
    #[serde(default = "one")]
    pub design: f64,
    #[serde(default = "one")]
    pub dev: f64,
}

impl Default for DevTypeFactors {
    fn default() -> Self {
        Self {
            design: 1.0,
            dev: 1.0,
        }
    }
}

/// Confidence-driven policy for vendor-phase items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    /// Multiplier on the vendor point cost
    #[serde(default)]
    pub cost_multiplier: BTreeMap<Confidence, f64>,

    /// ± fraction around the vendor point cost
    #[serde(default)]
    pub variance: BTreeMap<Confidence, f64>,
}

impl ConfidencePolicy {
    pub fn cost_multiplier(&self, confidence: Confidence) -> f64 {
        self.cost_multiplier.get(&confidence).copied().unwrap_or(1.0)
    }

    pub fn variance(&self, confidence: Confidence) -> f64 {
        self.variance.get(&confidence).copied().unwrap_or(0.0)
    }
}

/// Presentation band around the point price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub low: f64,
    pub high: f64,
}

impl Default for DisplayRange {
    fn default() -> Self {
        Self { low: 0.9, high: 1.2 }
    }
}

/// All multiplier dimensions of a catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierSet {
    #[serde(default)]
    pub difficulty: BTreeMap<Complexity, f64>,

    #[serde(default)]
    pub duration: BTreeMap<Duration, f64>,

    #[serde(default)]
    pub dev_type: BTreeMap<DevType, DevTypeFactors>,

    #[serde(default)]
    pub platform: BTreeMap<Platform, f64>,

    /// Constant risk buffer applied to every price
    #[serde(default = "one")]
    pub buffer: f64,

    #[serde(default)]
    pub confidence: ConfidencePolicy,

    #[serde(default)]
    pub display_range: DisplayRange,
}

fn one() -> f64 {
    1.0
}

impl MultiplierSet {
    pub fn difficulty(&self, complexity: Complexity) -> f64 {
        self.difficulty.get(&complexity).copied().unwrap_or(1.0)
    }

    pub fn duration(&self, duration: Duration) -> f64 {
        self.duration.get(&duration).copied().unwrap_or(1.0)
    }

    pub fn dev_type(&self, dev_type: DevType) -> DevTypeFactors {
        self.dev_type.get(&dev_type).copied().unwrap_or_default()
    }

    pub fn platform(&self, platform: Platform) -> f64 {
        self.platform.get(&platform).copied().unwrap_or(1.0)
    }

    /// Every scalar in the set, labelled, for validation and listing
    pub fn scalars(&self) -> Vec<(String, f64)> {
        let mut out = Vec::new();
        for (k, v) in &self.difficulty {
            out.push((format!("difficulty.{}", k), *v));
        }
        for (k, v) in &self.duration {
            out.push((format!("duration.{}", k), *v));
        }
        for (k, v) in &self.dev_type {
            out.push((format!("dev_type.{}.design", k), v.design));
            out.push((format!("dev_type.{}.dev", k), v.dev));
        }
        for (k, v) in &self.platform {
            out.push((format!("platform.{}", k), *v));
        }
        out.push(("buffer".to_string(), self.buffer));
        for (k, v) in &self.confidence.cost_multiplier {
            out.push((format!("confidence.cost_multiplier.{}", k), *v));
        }
        out
    }
}

impl Default for MultiplierSet {
    fn default() -> Self {
        Self {
            difficulty: BTreeMap::new(),
            duration: BTreeMap::new(),
            dev_type: BTreeMap::new(),
            platform: BTreeMap::new(),
            buffer: 1.0,
            confidence: ConfidencePolicy::default(),
            display_range: DisplayRange::default(),
        }
    }
}
