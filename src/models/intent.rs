use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallIntent {
    EndCall,
    SchedulingRelated,
    FreeForm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedContact {
    pub name: Option<String>,
    pub email: Option<String>,
}
