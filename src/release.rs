//! Release planning logic
//!
//! Everything here is pure and synchronous: which versions qualify as
//! release targets, the candidate release-number sequence, which custom
//! fields get prompted and how operator answers map back into the
//! create-issue payload. Network and prompting stay in `app`/`ui`.

use chrono::{Datelike, Duration, NaiveDate};

use crate::redmine::{
    CustomField, CustomFieldValue, FieldFormat, Issue, Membership, NewIssue, Version,
};

/// Versions are offered as release targets when their due date falls within
/// this many days before today.
const ELIGIBILITY_WINDOW_DAYS: i64 = 30;

/// How many weeks ahead of the current ISO week release numbers are generated.
const WEEK_SPAN: u32 = 30;

/// Sequence numbers per week run from 1 to this value inclusive.
const MAX_SEQUENCE: u32 = 14;

/// Prompts with more options than this get a searchable prompt instead of a
/// plain select.
const SEARCH_THRESHOLD: usize = 10;

/// Filter versions down to release candidates: due date present and within
/// the last 30 days, most-recently-due first. Versions without a due date
/// are ineligible.
pub fn eligible_versions(versions: Vec<Version>, today: NaiveDate) -> Vec<Version> {
    let window_start = today - Duration::days(ELIGIBILITY_WINDOW_DAYS);

    let mut eligible: Vec<Version> = versions
        .into_iter()
        .filter(|version| match version.due_date {
            Some(due) => due >= window_start && due <= today,
            None => false,
        })
        .collect();

    eligible.sort_by(|a, b| b.due_date.cmp(&a.due_date));
    eligible
}

/// Candidate release numbers of the form `{iso-year}.{iso-week + offset}.{n}`
/// for autocomplete matching. Offsets can push the week number past 52/53;
/// the raw sum is kept and never wrapped into the next year.
pub fn release_numbers(today: NaiveDate) -> Vec<String> {
    let iso = today.iso_week();
    let year = iso.year();
    let week = iso.week();

    let mut numbers = Vec::with_capacity((WEEK_SPAN * MAX_SEQUENCE) as usize);
    for offset in 0..WEEK_SPAN {
        for sequence in 1..=MAX_SEQUENCE {
            numbers.push(format!("{}.{}.{}", year, week + offset, sequence));
        }
    }
    numbers
}

/// Which kind of answer a custom field prompt collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Answer is a membership display name, resolved to a user id.
    User,
    /// Answer is one of the field's possible values, submitted verbatim.
    List,
}

/// A custom field the operator will be asked about, with its selectable
/// options already resolved.
#[derive(Debug, Clone)]
pub struct FieldPrompt {
    pub id: u32,
    pub name: String,
    pub kind: PromptKind,
    pub options: Vec<String>,
    pub default: Option<String>,
}

impl FieldPrompt {
    /// Long option lists are easier to navigate with a searchable prompt.
    pub fn wants_search(&self) -> bool {
        self.options.len() > SEARCH_THRESHOLD
    }
}

/// Build the ordered list of custom field prompts for the release wizard.
///
/// Fields outside the allow-list (when one is configured) are skipped, as
/// are formats other than `user`/`list` and fields that end up with no
/// selectable options.
pub fn field_prompts(
    fields: &[CustomField],
    allow: &[u32],
    members: &[Membership],
    current_user: &str,
) -> Vec<FieldPrompt> {
    fields
        .iter()
        .filter(|field| allow.is_empty() || allow.contains(&field.id))
        .filter_map(|field| {
            let (kind, options) = match field.format {
                FieldFormat::User => (PromptKind::User, member_names(members)),
                FieldFormat::List => (
                    PromptKind::List,
                    field
                        .possible_values
                        .iter()
                        .map(|value| value.value.clone())
                        .collect(),
                ),
                FieldFormat::Other => return None,
            };

            if options.is_empty() {
                return None;
            }

            let default = match kind {
                PromptKind::User if options.iter().any(|name| name == current_user) => {
                    Some(current_user.to_string())
                }
                _ => None,
            };

            Some(FieldPrompt {
                id: field.id,
                name: field.name.clone(),
                kind,
                options,
                default,
            })
        })
        .collect()
}

/// Map an operator's answer to the value submitted for the field.
///
/// `user` answers are looked up back to a membership user id; when the
/// lookup misses (stale or renamed membership) the field is dropped rather
/// than failing the whole operation.
pub fn resolve_field(
    prompt: &FieldPrompt,
    answer: &str,
    members: &[Membership],
) -> Option<CustomFieldValue> {
    let value = match prompt.kind {
        PromptKind::User => member_id_by_name(members, answer)?.to_string(),
        PromptKind::List => answer.to_string(),
    };

    Some(CustomFieldValue {
        id: prompt.id,
        value,
    })
}

/// Display names of user-backed memberships, in membership order.
pub fn member_names(members: &[Membership]) -> Vec<String> {
    members
        .iter()
        .filter_map(|membership| membership.user.as_ref())
        .map(|user| user.name.clone())
        .collect()
}

/// Look a membership display name up to its user id.
pub fn member_id_by_name(members: &[Membership], name: &str) -> Option<u32> {
    members
        .iter()
        .filter_map(|membership| membership.user.as_ref())
        .find(|user| user.name == name)
        .map(|user| user.id)
}

/// Substitute the release number into the subject template. The template
/// carries a single `%s` marker; templates without one are used as-is.
pub fn subject_for(template: &str, number: &str) -> String {
    template.replacen("%s", number, 1)
}

/// Client-side post-filter for `release list`: keep everything when `all`
/// is set, otherwise drop issues already in the done status.
pub fn unreleased(issues: Vec<Issue>, done_status_id: u32, all: bool) -> Vec<Issue> {
    if all {
        return issues;
    }

    issues
        .into_iter()
        .filter(|issue| issue.status.id != done_status_id)
        .collect()
}

/// Everything collected during one `release create` run, assembled into the
/// create-issue payload once the operator confirms.
#[derive(Debug, Clone)]
pub struct ReleaseDraft {
    pub number: String,
    pub version: Version,
    pub description: String,
    pub assignee_id: u32,
    pub custom_fields: Vec<CustomFieldValue>,
}

impl ReleaseDraft {
    /// The final issue subject for this draft.
    pub fn subject(&self, template: &str) -> String {
        subject_for(template, &self.number)
    }

    /// Assemble the create-issue request for the configured project/tracker.
    pub fn into_issue(self, project_id: &str, tracker_id: u32, template: &str) -> NewIssue {
        let subject = subject_for(template, &self.number);
        let description = self.description.trim();
        let description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };

        NewIssue {
            project_id: project_id.to_string(),
            tracker_id,
            subject,
            description,
            fixed_version_id: Some(self.version.id),
            assigned_to_id: Some(self.assignee_id),
            custom_fields: self.custom_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redmine::{NamedRef, PossibleValue};
    use std::collections::HashSet;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn version(id: u32, name: &str, due: Option<&str>) -> Version {
        Version {
            id,
            name: name.to_string(),
            due_date: due.map(date),
        }
    }

    fn member(id: u32, name: &str) -> Membership {
        Membership {
            id: id + 100,
            user: Some(NamedRef {
                id,
                name: name.to_string(),
            }),
        }
    }

    fn group_membership() -> Membership {
        Membership { id: 999, user: None }
    }

    fn list_field(id: u32, name: &str, values: &[&str]) -> CustomField {
        CustomField {
            id,
            name: name.to_string(),
            format: FieldFormat::List,
            possible_values: values
                .iter()
                .map(|value| PossibleValue {
                    value: value.to_string(),
                    label: None,
                })
                .collect(),
        }
    }

    fn user_field(id: u32, name: &str) -> CustomField {
        CustomField {
            id,
            name: name.to_string(),
            format: FieldFormat::User,
            possible_values: Vec::new(),
        }
    }

    fn issue(id: u32, status_id: u32) -> Issue {
        Issue {
            id,
            subject: format!("Issue {}", id),
            status: NamedRef {
                id: status_id,
                name: format!("Status {}", status_id),
            },
            assigned_to: None,
            created_on: String::new(),
        }
    }

    #[test]
    fn test_eligible_versions_window_scenario() {
        let versions = vec![
            version(1, "r1", Some("2024-01-01")),
            version(2, "r2", None),
            version(3, "r3", Some("2023-11-01")),
        ];

        let eligible = eligible_versions(versions, date("2024-01-15"));

        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, 1);
    }

    #[test]
    fn test_eligible_versions_boundaries() {
        let today = date("2024-01-31");
        let versions = vec![
            version(1, "today", Some("2024-01-31")),
            version(2, "edge", Some("2024-01-01")),
            version(3, "too-old", Some("2023-12-31")),
            version(4, "future", Some("2024-02-01")),
        ];

        let eligible = eligible_versions(versions, today);
        let ids: Vec<u32> = eligible.iter().map(|v| v.id).collect();

        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_eligible_versions_ordered_most_recent_first() {
        let versions = vec![
            version(1, "a", Some("2024-01-02")),
            version(2, "b", Some("2024-01-09")),
            version(3, "c", Some("2024-01-05")),
        ];

        let eligible = eligible_versions(versions, date("2024-01-10"));
        let ids: Vec<u32> = eligible.iter().map(|v| v.id).collect();

        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_release_numbers_shape() {
        // 2024-01-10 falls in ISO week 2 of 2024
        let numbers = release_numbers(date("2024-01-10"));

        assert_eq!(numbers.len(), 420);
        assert_eq!(numbers[0], "2024.2.1");
        assert!(numbers.contains(&"2024.5.3".to_string()));
        assert!(numbers.iter().all(|n| !n.ends_with(".0")));
        assert!(numbers.iter().all(|n| !n.ends_with(".15")));

        let distinct: HashSet<&String> = numbers.iter().collect();
        assert_eq!(distinct.len(), numbers.len());
    }

    #[test]
    fn test_release_numbers_deterministic() {
        let today = date("2024-06-01");
        assert_eq!(release_numbers(today), release_numbers(today));
    }

    #[test]
    fn test_release_numbers_week_overflow_is_not_wrapped() {
        // 2023-12-25 is ISO week 52; the last offsets run well past week 53
        let numbers = release_numbers(date("2023-12-25"));

        assert_eq!(numbers[0], "2023.52.1");
        assert!(numbers.contains(&"2023.81.14".to_string()));
        assert!(!numbers.iter().any(|n| n.starts_with("2024.")));
    }

    #[test]
    fn test_release_numbers_use_iso_year() {
        // 2024-12-30 already belongs to ISO week 1 of 2025
        let numbers = release_numbers(date("2024-12-30"));

        assert_eq!(numbers[0], "2025.1.1");
    }

    #[test]
    fn test_field_prompts_filters_formats_and_allow_list() {
        let fields = vec![
            list_field(1, "Service", &["Billing", "Vam"]),
            user_field(2, "Reviewer"),
            CustomField {
                id: 3,
                name: "Deadline".to_string(),
                format: FieldFormat::Other,
                possible_values: Vec::new(),
            },
            list_field(4, "Channel", &["web"]),
        ];
        let members = vec![member(10, "Ivan Petrov"), member(11, "Anna Sidorova")];

        let prompts = field_prompts(&fields, &[1, 2, 3], &members, "Anna Sidorova");

        let ids: Vec<u32> = prompts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(prompts[0].kind, PromptKind::List);
        assert_eq!(prompts[0].options, vec!["Billing", "Vam"]);
        assert!(prompts[0].default.is_none());
        assert_eq!(prompts[1].kind, PromptKind::User);
        assert_eq!(prompts[1].default.as_deref(), Some("Anna Sidorova"));
    }

    #[test]
    fn test_field_prompts_empty_allow_list_keeps_all_promptable() {
        let fields = vec![
            list_field(1, "Service", &["Billing"]),
            user_field(2, "Reviewer"),
        ];
        let members = vec![member(10, "Ivan Petrov")];

        let prompts = field_prompts(&fields, &[], &members, "Ivan Petrov");

        assert_eq!(prompts.len(), 2);
    }

    #[test]
    fn test_field_prompts_drops_fields_without_options() {
        let fields = vec![
            list_field(1, "Empty", &[]),
            user_field(2, "Reviewer"),
        ];

        // no user-backed memberships either
        let prompts = field_prompts(&fields, &[], &[group_membership()], "Nobody");

        assert!(prompts.is_empty());
    }

    #[test]
    fn test_field_prompts_default_absent_when_user_not_a_member() {
        let fields = vec![user_field(2, "Reviewer")];
        let members = vec![member(10, "Ivan Petrov")];

        let prompts = field_prompts(&fields, &[], &members, "Boris Godunov");

        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].default.is_none());
    }

    #[test]
    fn test_resolve_field_user_maps_name_to_id() {
        let members = vec![member(10, "Ivan Petrov"), member(11, "Anna Sidorova")];
        let prompt = FieldPrompt {
            id: 5,
            name: "Reviewer".to_string(),
            kind: PromptKind::User,
            options: member_names(&members),
            default: None,
        };

        let resolved = resolve_field(&prompt, "Anna Sidorova", &members).unwrap();

        assert_eq!(resolved.id, 5);
        assert_eq!(resolved.value, "11");
    }

    #[test]
    fn test_resolve_field_user_unknown_name_drops_field() {
        let members = vec![member(10, "Ivan Petrov")];
        let prompt = FieldPrompt {
            id: 5,
            name: "Reviewer".to_string(),
            kind: PromptKind::User,
            options: member_names(&members),
            default: None,
        };

        assert!(resolve_field(&prompt, "Renamed User", &members).is_none());
    }

    #[test]
    fn test_resolve_field_list_passes_value_through() {
        let prompt = FieldPrompt {
            id: 7,
            name: "Service".to_string(),
            kind: PromptKind::List,
            options: vec!["Billing".to_string()],
            default: None,
        };

        let resolved = resolve_field(&prompt, "Billing", &[]).unwrap();

        assert_eq!(resolved.value, "Billing");
    }

    #[test]
    fn test_wants_search_threshold() {
        let mut prompt = FieldPrompt {
            id: 1,
            name: "x".to_string(),
            kind: PromptKind::List,
            options: (0..10).map(|i| i.to_string()).collect(),
            default: None,
        };
        assert!(!prompt.wants_search());

        prompt.options.push("one more".to_string());
        assert!(prompt.wants_search());
    }

    #[test]
    fn test_member_names_skips_group_memberships() {
        let members = vec![member(10, "Ivan Petrov"), group_membership()];

        assert_eq!(member_names(&members), vec!["Ivan Petrov"]);
    }

    #[test]
    fn test_subject_for_templates() {
        assert_eq!(subject_for("Релиз %s", "2024.2.1"), "Релиз 2024.2.1");
        assert_eq!(subject_for("Release %s (hotfix)", "1"), "Release 1 (hotfix)");
        assert_eq!(subject_for("No marker", "1"), "No marker");
        assert_eq!(subject_for("%s and %s", "1"), "1 and %s");
    }

    #[test]
    fn test_unreleased_filters_done_status() {
        let issues = vec![issue(1, 1), issue(2, 2), issue(3, 3)];

        let open = unreleased(issues.clone(), 3, false);
        let ids: Vec<u32> = open.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let all = unreleased(issues, 3, true);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_release_draft_into_issue() {
        let draft = ReleaseDraft {
            number: "2024.2.1".to_string(),
            version: version(42, "sprint-2", Some("2024-01-08")),
            description: "Ships billing fixes".to_string(),
            assignee_id: 10,
            custom_fields: vec![CustomFieldValue {
                id: 5,
                value: "11".to_string(),
            }],
        };

        let issue = draft.into_issue("billing", 7, "Релиз %s");

        assert_eq!(issue.project_id, "billing");
        assert_eq!(issue.tracker_id, 7);
        assert_eq!(issue.subject, "Релиз 2024.2.1");
        assert_eq!(issue.description.as_deref(), Some("Ships billing fixes"));
        assert_eq!(issue.fixed_version_id, Some(42));
        assert_eq!(issue.assigned_to_id, Some(10));
        assert_eq!(issue.custom_fields.len(), 1);
    }

    #[test]
    fn test_release_draft_blank_description_is_omitted() {
        let draft = ReleaseDraft {
            number: "2024.2.1".to_string(),
            version: version(42, "sprint-2", None),
            description: "   \n".to_string(),
            assignee_id: 10,
            custom_fields: Vec::new(),
        };

        let issue = draft.into_issue("1", 7, "Релиз %s");

        assert!(issue.description.is_none());
    }
}
