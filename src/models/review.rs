// src/models/review.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FOOD_NAME: &str = "foodName";
pub const RATING: &str = "rating";
pub const DATE: &str = "date";
pub const USER_EMAIL: &str = "userEmail";

/// Fields a review edit may overwrite. Anything else in the body is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub food_name: Option<Value>,
    pub restaurant_name: Option<Value>,
    pub location: Option<Value>,
    pub rating: Option<Value>,
    pub review_text: Option<Value>,
    pub food_image: Option<Value>,
}

impl ReviewUpdate {
    /// Build the `$set` document. All six fields are always written; a field
    /// missing from the body is set to null.
    pub fn into_set(self) -> Map<String, Value> {
        let fields = [
            (FOOD_NAME, self.food_name),
            ("restaurantName", self.restaurant_name),
            ("location", self.location),
            (RATING, self.rating),
            ("reviewText", self.review_text),
            ("foodImage", self.food_image),
        ];

        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.unwrap_or(Value::Null)))
            .collect()
    }
}
