use crate::{GigError, Result};
use serde::{Deserialize, Serialize};

/// A single job listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gig {
    pub id: u64,
    pub work_title: String,
    pub name: String,
    pub mobile: String,
    pub wage: u32,
    pub time: String,
    pub workers_required: u32,
    pub current_workers: u32,
    /// Only voice bookings carry a location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Gig {
    /// Create a gig with the default staffing of one open slot
    pub fn new(
        id: u64,
        work_title: impl Into<String>,
        name: impl Into<String>,
        mobile: impl Into<String>,
        wage: u32,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id,
            work_title: work_title.into(),
            name: name.into(),
            mobile: mobile.into(),
            wage,
            time: time.into(),
            workers_required: 1,
            current_workers: 0,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// One-line summary as shown in the listing
    pub fn summary(&self) -> String {
        format!("{} | ₹{} | {}", self.name, self.wage, self.time)
    }
}

/// Raw fields from the manual posting form
#[derive(Debug, Clone, Default)]
pub struct GigForm {
    pub name: String,
    pub mobile: String,
    pub work_title: String,
    pub wage: String,
    pub time: String,
}

impl GigForm {
    /// Validate the form and turn it into a gig with the given id
    pub fn into_gig(self, id: u64) -> Result<Gig> {
        let required = [
            ("name", &self.name),
            ("mobile", &self.mobile),
            ("service", &self.work_title),
            ("wage", &self.wage),
            ("time", &self.time),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(GigError::InvalidForm(format!("{} is required", field)));
            }
        }

        let wage = self
            .wage
            .trim()
            .parse::<u32>()
            .map_err(|_| GigError::InvalidForm(format!("wage '{}' is not a number", self.wage)))?;

        Ok(Gig::new(
            id,
            self.work_title.trim(),
            self.name.trim(),
            self.mobile.trim(),
            wage,
            self.time.trim(),
        ))
    }
}
