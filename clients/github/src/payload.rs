use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Repo {
    pub stargazers_count: Option<u64>,
}

#[derive(Deserialize, Debug)]
pub struct Stargazer {
    pub starred_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stargazer_page_deserializes_with_and_without_timestamps() {
        let body = r#"[
            { "starred_at": "2025-01-26T12:30:00Z", "user": { "login": "a" } },
            { "user": { "login": "b" } }
        ]"#;
        let page: Vec<Stargazer> = serde_json::from_str(body).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(
            page[0].starred_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 26, 12, 30, 0).unwrap())
        );
        assert_eq!(page[1].starred_at, None);
    }

    #[test]
    fn repo_metadata_tolerates_a_missing_count() {
        let repo: Repo = serde_json::from_str(r#"{ "name": "mise" }"#).unwrap();
        assert_eq!(repo.stargazers_count, None);
        let repo: Repo = serde_json::from_str(r#"{ "stargazers_count": 42 }"#).unwrap();
        assert_eq!(repo.stargazers_count, Some(42));
    }
}
