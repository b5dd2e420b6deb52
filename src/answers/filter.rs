//! Calendar-day filtering of answers

use chrono::NaiveDate;

use super::models::Answer;

/// Answers logged on exactly `date`, in their original order.
///
/// `None` means no filter and yields every answer.
pub fn filter_by_date(answers: &[Answer], date: Option<NaiveDate>) -> Vec<&Answer> {
    match date {
        Some(day) => answers.iter().filter(|a| a.created_on == day).collect(),
        None => answers.iter().collect(),
    }
}
