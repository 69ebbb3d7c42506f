pub mod generate_roster;

pub use generate_roster::{
    CancellationFlag, GenerateRoster, GenerationOutcome, NoStrictRatioCache, StrictRatioProvider,
};
