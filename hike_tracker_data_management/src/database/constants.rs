pub const HIKES_TABLE_NAME: &str = "Hikes";
pub const HIKE_ID: &str = "hike_id";
pub const START_TIME: &str = "start_time";
pub const END_TIME: &str = "end_time";
pub const DISTANCE_KM: &str = "distance_km";
pub const ELAPSED_SECONDS: &str = "elapsed_seconds";
pub const DURATION: &str = "duration";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const DIFFICULTY: &str = "difficulty";
pub const PHOTO_REF: &str = "photo_ref";
pub const PATH: &str = "path";
