use crate::errors::StageError;
use crate::model::{GradingRequest, MAX_SAMPLE_COUNT, MIN_SAMPLE_COUNT};

/// Reject malformed requests before any judge call. All problems are
/// reported together.
pub fn validate_request(request: &GradingRequest) -> Result<(), StageError> {
    let mut problems = Vec::new();

    for (name, value) in [
        ("topic", &request.topic),
        ("content", &request.submission_content),
        ("rubric", &request.rubric),
    ] {
        if value.trim().is_empty() {
            problems.push(format!("'{}' is required and must not be empty", name));
        }
    }

    if !(MIN_SAMPLE_COUNT..=MAX_SAMPLE_COUNT).contains(&request.sample_count) {
        problems.push(format!(
            "'sampleCount' must be between {} and {}, got {}",
            MIN_SAMPLE_COUNT, MAX_SAMPLE_COUNT, request.sample_count
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(StageError::invalid_input(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GradingRequest {
        GradingRequest::new("topic", "essay", "rubric")
    }

    #[test]
    fn accepts_bounds() {
        assert!(validate_request(&valid().with_sample_count(10)).is_ok());
        assert!(validate_request(&valid().with_sample_count(100)).is_ok());
        assert!(validate_request(&valid()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_counts() {
        for n in [0, 5, 9, 101, 150] {
            let err = validate_request(&valid().with_sample_count(n)).unwrap_err();
            assert!(err.to_string().contains("sampleCount"), "n={}", n);
        }
    }

    #[test]
    fn reports_every_blank_field() {
        let req = GradingRequest::new("  ", "", "rubric").with_sample_count(5);
        let msg = validate_request(&req).unwrap_err().to_string();
        assert!(msg.contains("'topic'"));
        assert!(msg.contains("'content'"));
        assert!(!msg.contains("'rubric'"));
        assert!(msg.contains("sampleCount"));
    }
}
