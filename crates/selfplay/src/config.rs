/// How credit assignment decides which side made a recorded step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActorAttribution {
    /// Alternate by position in the pass-free step list, black on even indices
    #[default]
    StepParity,
    /// Use the player stored on each step
    RecordedPlayer,
}

/// Configuration for a single self-play episode
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Maximum number of recorded moves before the episode is cut off
    pub max_steps: usize,

    /// Actor attribution used when assigning terminal rewards to steps
    pub attribution: ActorAttribution,
}

impl SelfPlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_attribution(mut self, attribution: ActorAttribution) -> Self {
        self.attribution = attribution;
        self
    }
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            max_steps: 60,
            attribution: ActorAttribution::StepParity,
        }
    }
}

/// Configuration for the training loop
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Number of self-play episodes (one parameter update each)
    pub episodes: u32,

    /// Log progress every this many episodes; 0 disables progress lines
    pub log_interval: u32,
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_episodes(mut self, episodes: u32) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_log_interval(mut self, interval: u32) -> Self {
        self.log_interval = interval.max(1);
        self
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 50_000,
            log_interval: 100,
        }
    }
}
