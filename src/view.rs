//! Derived lead list: search, status filter and sort over the stored leads.

use std::cmp::Ordering;

use crate::types::{Lead, LeadFilters, LeadSort, SortDirection, SortField};

/// Compute the display order of leads.
///
/// `search` is the settled (debounced) search text, which may lag behind
/// `filters.search` while the user is still typing.
pub fn visible_leads(
    leads: &[Lead],
    filters: &LeadFilters,
    sort: &LeadSort,
    search: &str,
) -> Vec<Lead> {
    let needle = search.to_lowercase();

    let mut visible: Vec<Lead> = leads
        .iter()
        .filter(|lead| needle.is_empty() || matches_search(lead, &needle))
        .filter(|lead| filters.status.matches(lead.status))
        .cloned()
        .collect();

    // Stable: ties keep dataset order in both directions.
    visible.sort_by(|a, b| compare_leads(a, b, sort));
    visible
}

/// `needle` must already be lowercase.
fn matches_search(lead: &Lead, needle: &str) -> bool {
    lead.name.to_lowercase().contains(needle) || lead.company.to_lowercase().contains(needle)
}

/// Field comparator with the direction applied inside, so ties stay equal.
pub fn compare_leads(a: &Lead, b: &Lead, sort: &LeadSort) -> Ordering {
    let ordering = match sort.field {
        SortField::Score => a.score.cmp(&b.score),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Company => a.company.to_lowercase().cmp(&b.company.to_lowercase()),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
    };

    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// "3 of 10 leads"
pub fn lead_count_label(visible: usize, total: usize) -> String {
    format!("{} of {} leads", visible, total)
}

/// "1 opportunity" / "4 opportunities"
pub fn opportunity_count_label(count: usize) -> String {
    if count == 1 {
        "1 opportunity".to_string()
    } else {
        format!("{} opportunities", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LeadStatus, StatusFilter};

    fn lead(id: &str, name: &str, company: &str, score: u32, status: LeadStatus) -> Lead {
        Lead {
            id: id.to_string(),
            name: name.to_string(),
            company: company.to_string(),
            email: format!("{}@example.com", id),
            source: "web".to_string(),
            score,
            status,
        }
    }

    fn sample() -> Vec<Lead> {
        vec![
            lead("1", "bob", "Globex", 50, LeadStatus::New),
            lead("2", "Ann", "Acme Corp", 90, LeadStatus::Qualified),
            lead("3", "Carla", "Initech", 70, LeadStatus::Contacted),
            lead("4", "Dan", "ACME Labs", 70, LeadStatus::New),
        ]
    }

    fn ids(leads: &[Lead]) -> Vec<&str> {
        leads.iter().map(|l| l.id.as_str()).collect()
    }

    fn sort(field: SortField, direction: SortDirection) -> LeadSort {
        LeadSort { field, direction }
    }

    #[test]
    fn test_empty_search_returns_everything() {
        let leads = sample();
        let out = visible_leads(&leads, &LeadFilters::default(), &LeadSort::default(), "");
        assert_eq!(out.len(), leads.len());
    }

    #[test]
    fn test_search_matches_name_or_company_case_insensitively() {
        let leads = sample();
        let out = visible_leads(
            &leads,
            &LeadFilters::default(),
            &sort(SortField::Name, SortDirection::Asc),
            "acme",
        );
        assert_eq!(ids(&out), vec!["2", "4"]);

        let out = visible_leads(
            &leads,
            &LeadFilters::default(),
            &sort(SortField::Name, SortDirection::Asc),
            "BOB",
        );
        assert_eq!(ids(&out), vec!["1"]);

        let out = visible_leads(&leads, &LeadFilters::default(), &LeadSort::default(), "zzz");
        assert!(out.is_empty());
    }

    #[test]
    fn test_status_filter_keeps_exactly_matching_leads() {
        let leads = sample();
        let filters = LeadFilters {
            search: String::new(),
            status: StatusFilter::New,
        };
        let out = visible_leads(&leads, &filters, &LeadSort::default(), "");
        assert!(out.iter().all(|l| l.status == LeadStatus::New));
        assert_eq!(
            out.len(),
            leads.iter().filter(|l| l.status == LeadStatus::New).count()
        );
    }

    #[test]
    fn test_score_sort_both_directions() {
        let leads = vec![
            lead("a", "A", "A", 50, LeadStatus::New),
            lead("b", "B", "B", 90, LeadStatus::New),
            lead("c", "C", "C", 70, LeadStatus::New),
        ];
        let filters = LeadFilters::default();

        let desc = visible_leads(&leads, &filters, &sort(SortField::Score, SortDirection::Desc), "");
        assert_eq!(desc.iter().map(|l| l.score).collect::<Vec<_>>(), vec![90, 70, 50]);

        let asc = visible_leads(&leads, &filters, &sort(SortField::Score, SortDirection::Asc), "");
        assert_eq!(asc.iter().map(|l| l.score).collect::<Vec<_>>(), vec![50, 70, 90]);
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let leads = vec![
            lead("1", "bob", "X", 1, LeadStatus::New),
            lead("2", "Ann", "Y", 1, LeadStatus::New),
        ];
        let out = visible_leads(
            &leads,
            &LeadFilters::default(),
            &sort(SortField::Name, SortDirection::Asc),
            "",
        );
        assert_eq!(ids(&out), vec!["2", "1"]);
    }

    #[test]
    fn test_ties_keep_input_order_in_both_directions() {
        let leads = sample();
        let filters = LeadFilters::default();

        let desc = visible_leads(&leads, &filters, &sort(SortField::Score, SortDirection::Desc), "");
        assert_eq!(ids(&desc), vec!["2", "3", "4", "1"]);

        let asc = visible_leads(&leads, &filters, &sort(SortField::Score, SortDirection::Asc), "");
        assert_eq!(ids(&asc), vec!["1", "3", "4", "2"]);
    }

    #[test]
    fn test_status_sort_is_lexicographic() {
        let leads = sample();
        let out = visible_leads(
            &leads,
            &LeadFilters::default(),
            &sort(SortField::Status, SortDirection::Asc),
            "",
        );
        let statuses: Vec<_> = out.iter().map(|l| l.status.as_str()).collect();
        assert_eq!(statuses, vec!["contacted", "new", "new", "qualified"]);
    }

    #[test]
    fn test_count_labels() {
        assert_eq!(lead_count_label(2, 5), "2 of 5 leads");
        assert_eq!(opportunity_count_label(1), "1 opportunity");
        assert_eq!(opportunity_count_label(0), "0 opportunities");
    }
}
