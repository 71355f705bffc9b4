use crate::timestamp::Timestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: Timestamp,
    pub consumption: f64,
    pub production: f64,
}
