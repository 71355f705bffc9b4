use super::Observation;

/// An observation together with the calendar features derived from its
/// timestamp.
///
/// `day_of_year` is carried along but nothing downstream reads it; the
/// regression only uses `hour`.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyFeatures {
    pub observation: Observation,
    pub hour: u8,
    pub day_of_year: u16,
}
