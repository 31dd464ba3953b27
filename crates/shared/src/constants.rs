pub const APP_NAME: &str = "Reclaim";

// Limits
pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 120;
pub const MIN_DESCRIPTION_LENGTH: usize = 10;
pub const MAX_DESCRIPTION_LENGTH: usize = 4000;
pub const MAX_CATEGORY_LENGTH: usize = 60;
pub const MAX_LOCATION_LENGTH: usize = 200;
pub const MAX_MESSAGE_LENGTH: usize = 4000;

pub const ITEM_TYPE_LOST: &str = "lost";
pub const ITEM_TYPE_FOUND: &str = "found";
pub const ITEM_STATUS_ACTIVE: &str = "active";
pub const ITEM_STATUS_RESOLVED: &str = "resolved";
