use super::ApiError;

pub fn validate_movie_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid movie ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Parses the optional `genre` query parameter. Blank counts as absent.
pub fn parse_genre_filter(genre: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(raw) = genre.map(str::trim).filter(|g| !g.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(ApiError::validation(format!(
            "Invalid genre ID: {raw}. Genre must be a positive integer"
        ))),
    }
}

pub fn validate_search_query(query: Option<&str>) -> Result<&str, ApiError> {
    let trimmed = query.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Query is required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_movie_id() {
        assert!(validate_movie_id(1).is_ok());
        assert!(validate_movie_id(603).is_ok());
        assert!(validate_movie_id(0).is_err());
        assert!(validate_movie_id(-1).is_err());
    }

    #[test]
    fn test_parse_genre_filter() {
        assert_eq!(parse_genre_filter(None).unwrap(), None);
        assert_eq!(parse_genre_filter(Some("  ")).unwrap(), None);
        assert_eq!(parse_genre_filter(Some("28")).unwrap(), Some(28));
        assert!(parse_genre_filter(Some("action")).is_err());
        assert!(parse_genre_filter(Some("0")).is_err());
        assert!(parse_genre_filter(Some("-5")).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query(Some("  batman ")).unwrap(), "batman");
        assert!(validate_search_query(Some("   ")).is_err());
        assert!(validate_search_query(None).is_err());
    }
}
