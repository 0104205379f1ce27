//! Pure batch transforms.
//!
//! Every function borrows its input and returns a new batch; none of them
//! touch the store or any shared state.

use crate::core::powers::PowerTable;
use crate::domain::model::{Age, Contact};
use crate::utils::error::{ContactError, Result};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Contacts whose `status` equals `status` exactly, in input order.
pub fn select_by_status(contacts: &[Contact], status: &str) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|c| c.status == status)
        .cloned()
        .collect()
}

pub fn annotate_location(contacts: &[Contact], new_location: &str) -> Vec<Contact> {
    contacts
        .iter()
        .map(|c| Contact {
            location: new_location.to_string(),
            ..c.clone()
        })
        .collect()
}

pub fn select_by_title(contacts: &[Contact], allowed_titles: &HashSet<String>) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|c| allowed_titles.contains(&c.title))
        .cloned()
        .collect()
}

/// Applies the table entry for each contact's title. Titles without an entry pass through.
pub fn annotate_powers(contacts: &[Contact], table: &PowerTable) -> Vec<Contact> {
    contacts
        .iter()
        .map(|c| match table.annotation_for(&c.title) {
            Some(annotation) => annotation.apply(c.clone()),
            None => c.clone(),
        })
        .collect()
}

pub fn exclude_unknown_age(contacts: &[Contact]) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|c| !c.age.is_unknown())
        .cloned()
        .collect()
}

/// Sets `birth_year = reference_year - age`.
///
/// Unknown ages must be excluded beforehand. Any contact without a usable
/// numeric age fails the whole batch with `InvalidAge`.
pub fn annotate_birth_year(contacts: &[Contact], reference_year: i32) -> Result<Vec<Contact>> {
    contacts
        .iter()
        .map(|c| {
            let years = match &c.age {
                Age::Years(years) => *years,
                Age::Unknown => {
                    return Err(invalid_age(c, "age is Unknown; exclude unknown ages first"))
                }
                Age::Invalid(raw) => {
                    return Err(invalid_age(
                        c,
                        &format!("{} is not a non-negative integer", raw),
                    ))
                }
            };
            if i64::from(years) > i64::from(reference_year) {
                return Err(invalid_age(
                    c,
                    &format!("age {} exceeds reference year {}", years, reference_year),
                ));
            }
            Ok(Contact {
                birth_year: Some((i64::from(reference_year) - i64::from(years)).to_string()),
                ..c.clone()
            })
        })
        .collect()
}

fn invalid_age(contact: &Contact, reason: &str) -> ContactError {
    ContactError::InvalidAge {
        contact: contact.display_name(),
        reason: reason.to_string(),
    }
}

/// The contact with the earliest birth year. Ties keep the first in input order.
pub fn reduce_oldest(contacts: &[Contact]) -> Result<Contact> {
    let mut oldest: Option<(i64, &Contact)> = None;

    for contact in contacts {
        let year = contact
            .birth_year
            .as_deref()
            .and_then(|y| y.trim().parse::<i64>().ok())
            .ok_or_else(|| invalid_age(contact, "birthYear is missing or not numeric"))?;

        match oldest {
            Some((best, _)) if year >= best => {}
            _ => oldest = Some((year, contact)),
        }
    }

    oldest
        .map(|(_, contact)| contact.clone())
        .ok_or_else(|| ContactError::EmptyBatch {
            operation: "reduce_oldest".to_string(),
        })
}

/// Stable sort by title, then age, into a new vector.
///
/// Titles compare case-insensitively, with lowercase ahead of uppercase when
/// they differ only in case. Ages sort numerically; `Unknown` follows every
/// numeric age and malformed ages come last, ordered by their raw text.
pub fn sort_by_title_then_age(contacts: &[Contact]) -> Vec<Contact> {
    let mut sorted = contacts.to_vec();
    sorted.sort_by(|a, b| {
        compare_titles(&a.title, &b.title).then_with(|| compare_ages(&a.age, &b.age))
    });
    sorted
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn compare_ages(a: &Age, b: &Age) -> Ordering {
    fn rank(age: &Age) -> u8 {
        match age {
            Age::Years(_) => 0,
            Age::Unknown => 1,
            Age::Invalid(_) => 2,
        }
    }

    match (a, b) {
        (Age::Years(x), Age::Years(y)) => x.cmp(y),
        (Age::Invalid(x), Age::Invalid(y)) => x.to_string().cmp(&y.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}
