use thiserror::Error;

use crate::species::TrophicRank;

/// Configuration invariant violations. These indicate a setup or caller bug
/// and are surfaced to the caller instead of being patched over.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("species '{0}' has no registered population")]
    UnknownSpecies(String),
    #[error("species '{species}' is listed under {level} but has no population")]
    MissingPopulation { level: String, species: String },
    #[error(
        "registry names {registered} species but levels hold {species} species and {populations} populations"
    )]
    RegistryMismatch {
        registered: usize,
        species: usize,
        populations: usize,
    },
    #[error("species '{0}' is already registered")]
    DuplicateSpecies(String),
    #[error("population tracks '{population}' but was registered for species '{species}'")]
    PopulationKeyMismatch { species: String, population: String },
    #[error("trophic level {0:?} is not part of this ecosystem")]
    UnknownLevel(TrophicRank),
    #[error("no disaster is awaiting a response")]
    NoPendingDisaster,
    #[error("disaster '{disaster}' has no response action #{index}")]
    UnknownAction { disaster: String, index: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
