//! Milestone progression.

/// Outcome of one continue-story turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Normalized position in `[0, 1]`
    pub progress: f64,
    /// New current milestone, when it moved
    pub next_milestone: Option<String>,
    /// The final milestone was just achieved; an ending is due
    pub reached_end: bool,
}

/// Compute progress for one turn.
///
/// `progress` is the index of the current milestone divided by the number of
/// milestones. Achieving a milestone moves to the next one; achieving the last
/// one yields `1` and asks for an ending. Once a story is concluded every
/// further turn reports `1` and no second ending is requested, so progress
/// never moves backwards.
///
/// An unknown or missing current milestone counts as the first one. A story
/// without milestones stays at `0`.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::advance;
///
/// let milestones = vec!["a".to_string(), "b".to_string(), "c".to_string()];
///
/// let step = advance(&milestones, Some("b"), true, false);
/// assert_eq!(step.next_milestone.as_deref(), Some("c"));
/// assert!((step.progress - 2.0 / 3.0).abs() < f64::EPSILON);
///
/// let last = advance(&milestones, Some("c"), true, false);
/// assert_eq!(last.progress, 1.0);
/// assert!(last.reached_end);
/// ```
pub fn advance(
    milestones: &[String],
    current: Option<&str>,
    achieved: bool,
    concluded: bool,
) -> ProgressUpdate {
    if concluded {
        return ProgressUpdate {
            progress: 1.0,
            next_milestone: None,
            reached_end: false,
        };
    }

    let total = milestones.len();
    if total == 0 {
        return ProgressUpdate {
            progress: 0.0,
            next_milestone: None,
            reached_end: false,
        };
    }

    let index = current
        .and_then(|c| milestones.iter().position(|m| m == c))
        .unwrap_or(0);

    if achieved && index + 1 == total {
        ProgressUpdate {
            progress: 1.0,
            next_milestone: None,
            reached_end: true,
        }
    } else if achieved {
        ProgressUpdate {
            progress: (index + 1) as f64 / total as f64,
            next_milestone: Some(milestones[index + 1].clone()),
            reached_end: false,
        }
    } else {
        ProgressUpdate {
            progress: index as f64 / total as f64,
            next_milestone: None,
            reached_end: false,
        }
    }
}
