use crate::constants::*;

pub fn validate_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();
    if trimmed.len() < MIN_TITLE_LENGTH {
        return Err(format!(
            "Title must be at least {} characters",
            MIN_TITLE_LENGTH
        ));
    }
    if trimmed.len() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), String> {
    let trimmed = description.trim();
    if trimmed.len() < MIN_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description must be at least {} characters",
            MIN_DESCRIPTION_LENGTH
        ));
    }
    if trimmed.len() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err("Category is required".into());
    }
    if trimmed.len() > MAX_CATEGORY_LENGTH {
        return Err(format!(
            "Category must be at most {} characters",
            MAX_CATEGORY_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_item_type(item_type: &str) -> Result<(), String> {
    if item_type != ITEM_TYPE_LOST && item_type != ITEM_TYPE_FOUND {
        return Err("Type must be either \"lost\" or \"found\"".into());
    }
    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), String> {
    if location.len() > MAX_LOCATION_LENGTH {
        return Err(format!(
            "Location must be at most {} characters",
            MAX_LOCATION_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_message_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Message content is required".into());
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err("Message too long".into());
    }
    Ok(())
}
