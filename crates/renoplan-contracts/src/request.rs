use thiserror::Error;

/// Errors that cross the pipeline boundary. Per-provider image failures do
/// not appear here: the image chain absorbs them and reports absence as a
/// normal outcome instead.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("renovation request is empty")]
    EmptyRequest,
    #[error("plan generation failed: {0:#}")]
    Generation(#[from] anyhow::Error),
    #[error("failed writing run artifacts: {0:#}")]
    Artifact(#[source] anyhow::Error),
}

/// Rejects empty or whitespace-only input before the pipeline starts.
/// Returns the trimmed request on success.
pub fn validate_request(raw: &str) -> Result<&str, PlanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlanError::EmptyRequest);
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(validate_request(""), Err(PlanError::EmptyRequest)));
    }

    #[test]
    fn whitespace_only_input_is_rejected() {
        assert!(matches!(
            validate_request("  \n\t  "),
            Err(PlanError::EmptyRequest)
        ));
    }

    #[test]
    fn valid_input_is_trimmed() {
        let request = validate_request("  repaint the hallway  ").expect("valid");
        assert_eq!(request, "repaint the hallway");
    }
}
