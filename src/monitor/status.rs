const SUCCESS_STATUSES: [&str; 2] = ["fixed", "success"];
const PENDING_STATUSES: [&str; 7] = [
    "running",
    "retried",
    "not_run",
    "queued",
    "scheduled",
    "not_running",
    "no_tests",
];
const FAILURE_STATUSES: [&str; 4] = ["canceled", "infrastructure_fail", "timedout", "failed"];

/// Severity bucket of a build or step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    /// Success bucket
    Green,
    /// Pending bucket
    Yellow,
    /// Failure bucket
    Red,
    /// Any status outside the known buckets
    Blue,
}

/// Classify a status string. Matching is exact and case-sensitive.
pub fn classify(status: &str) -> StatusColor {
    if SUCCESS_STATUSES.contains(&status) {
        StatusColor::Green
    } else if PENDING_STATUSES.contains(&status) {
        StatusColor::Yellow
    } else if FAILURE_STATUSES.contains(&status) {
        StatusColor::Red
    } else {
        StatusColor::Blue
    }
}

/// "infrastructure_fail" -> "Infrastructure fail"
pub fn humanize(status: &str) -> String {
    let spaced = status.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_status_maps_to_its_bucket() {
        for status in SUCCESS_STATUSES {
            assert_eq!(classify(status), StatusColor::Green, "{status}");
        }
        for status in PENDING_STATUSES {
            assert_eq!(classify(status), StatusColor::Yellow, "{status}");
        }
        for status in FAILURE_STATUSES {
            assert_eq!(classify(status), StatusColor::Red, "{status}");
        }
    }

    #[test]
    fn test_unknown_statuses_fall_through_to_blue() {
        for status in ["", "Success", "FAILED", "weird", "not run", "success "] {
            assert_eq!(classify(status), StatusColor::Blue, "{status:?}");
        }
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("not_run"), "Not run");
        assert_eq!(humanize("infrastructure_fail"), "Infrastructure fail");
        assert_eq!(humanize("success"), "Success");
        assert_eq!(humanize(""), "");
    }
}
