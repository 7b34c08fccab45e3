use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{
    TALENT_DETAIL_CONCURRENCY, TALENT_MIN_RESULTS, TALENT_RESULT_CAP, TALENT_SEARCH_PAGE_SIZE,
};
use crate::error::{Result, UpstreamError};

const CLIENT_AGENT: &str = concat!("startup-iq/", env!("CARGO_PKG_VERSION"));

/// Skill used when the request names none.
pub const DEFAULT_SKILL: &str = "Developer";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub role: String,
    pub skills: Vec<String>,
    pub bio: String,
    pub avatar: String,
    /// Public profile link. Serialized as `linkedin` for the web client.
    #[serde(rename = "linkedin")]
    pub profile_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    login: String,
    #[serde(default)]
    avatar_url: String,
    #[serde(default)]
    html_url: String,
}

#[derive(Deserialize)]
struct UserDetail {
    name: Option<String>,
    bio: Option<String>,
}

/// GitHub user search filtered to people who publish a full name.
pub struct TalentSearch {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    location: String,
}

impl TalentSearch {
    pub fn new(api_url: &str, token: Option<String>, location: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            location: location.to_string(),
        })
    }

    /// Never fails: upstream errors yield the fallback roster, thin result
    /// sets are padded up to `TALENT_MIN_RESULTS`.
    pub async fn search(&self, skill: &str, page: u32) -> Vec<Candidate> {
        let skill = match skill.trim() {
            "" => DEFAULT_SKILL,
            s => s,
        };

        match self.try_search(skill, page.max(1)).await {
            Ok(mut found) => {
                if found.len() < TALENT_MIN_RESULTS {
                    info!(skill, found = found.len(), "Padding thin talent results");
                    pad_with_fallback(&mut found, skill, &self.location);
                }
                found
            }
            Err(e) => {
                warn!(skill, "Talent search failed, serving fallback roster: {e}");
                fallback_roster(skill, &self.location)
            }
        }
    }

    async fn try_search(&self, skill: &str, page: u32) -> std::result::Result<Vec<Candidate>, UpstreamError> {
        let url = format!("{}/search/users", self.api_url);
        let query = format!("{skill} location:{}", self.location);
        let per_page = TALENT_SEARCH_PAGE_SIZE.to_string();
        let page = page.to_string();
        let resp = self
            .request(&url)
            .query(&[("q", query.as_str()), ("per_page", per_page.as_str()), ("page", page.as_str())])
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(UpstreamError::Quota("GitHub rate limit hit".to_string()))
            }
            other => return Err(UpstreamError::Unavailable(format!("GitHub search returned {other}"))),
        }

        let items = resp
            .json::<SearchResponse>()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?
            .items;
        debug!(skill, hits = items.len(), "GitHub search returned");

        // Details keep search order. Failed lookups and unnamed accounts are
        // skipped without aborting the batch.
        let candidates: Vec<Candidate> = stream::iter(items)
            .map(|item| async move {
                let detail = self.fetch_detail(&item.login).await;
                (item, detail)
            })
            .buffered(TALENT_DETAIL_CONCURRENCY)
            .filter_map(|(item, detail)| async move {
                match detail {
                    Ok(d) => to_candidate(item, d, skill, &self.location),
                    Err(e) => {
                        debug!(login = %item.login, "Skipping candidate: {e}");
                        None
                    }
                }
            })
            .take(TALENT_RESULT_CAP)
            .collect()
            .await;

        Ok(candidates)
    }

    async fn fetch_detail(&self, login: &str) -> std::result::Result<UserDetail, UpstreamError> {
        let url = format!("{}/users/{login}", self.api_url);
        let resp = self.request(&url).send().await?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Unavailable(format!("detail {login} returned {}", resp.status())));
        }
        resp.json::<UserDetail>()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let req = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, CLIENT_AGENT);
        match &self.token {
            Some(token) => req.header(AUTHORIZATION, format!("token {token}")),
            None => req,
        }
    }
}

fn to_candidate(item: SearchItem, detail: UserDetail, skill: &str, location: &str) -> Option<Candidate> {
    let name = detail.name?.trim().to_string();
    if !looks_like_full_name(&name) {
        return None;
    }
    Some(Candidate {
        name,
        role: format!("{skill} Developer"),
        skills: vec![skill.to_string(), location.to_string()],
        bio: detail
            .bio
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "No bio available.".to_string()),
        avatar: item.avatar_url,
        profile_url: item.html_url,
    })
}

/// "Asha Rao" yes, "asharao" or "" no.
pub fn looks_like_full_name(name: &str) -> bool {
    name.trim().contains(' ')
}

pub fn fallback_roster(skill: &str, location: &str) -> Vec<Candidate> {
    const ROSTER: [(&str, &str, &str); 3] = [
        ("Priya Sharma", "priya-sharma", "Full-stack engineer who has shipped two B2B SaaS products."),
        ("Arjun Mehta", "arjun-mehta", "Backend developer focused on payments and distributed systems."),
        ("Neha Iyer", "neha-iyer", "Product-minded engineer with a background in mobile apps."),
    ];
    ROSTER
        .iter()
        .map(|(name, handle, bio)| Candidate {
            name: name.to_string(),
            role: format!("{skill} Developer"),
            skills: vec![skill.to_string(), location.to_string()],
            bio: bio.to_string(),
            avatar: format!("https://ui-avatars.com/api/?name={}", name.replace(' ', "+")),
            profile_url: format!("https://www.linkedin.com/in/{handle}"),
        })
        .collect()
}

fn pad_with_fallback(found: &mut Vec<Candidate>, skill: &str, location: &str) {
    for c in fallback_roster(skill, location) {
        if found.len() >= TALENT_MIN_RESULTS {
            break;
        }
        if !found.iter().any(|f| f.name == c.name) {
            found.push(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Serves `/search/users` with the given logins and `/users/:login` with
    /// `names[login]` as the display name.
    async fn mock_github(search_status: u16, names: Vec<(&'static str, Option<&'static str>)>) -> String {
        let logins: Vec<&'static str> = names.iter().map(|(l, _)| *l).collect();
        let by_login: HashMap<&'static str, Option<&'static str>> = names.into_iter().collect();

        let app = Router::new()
            .route(
                "/search/users",
                get(move |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| {
                    let logins = logins.clone();
                    async move {
                        assert!(headers.contains_key("user-agent"));
                        assert!(q["q"].contains(" location:"), "{:?}", q);
                        let status = AxumStatus::from_u16(search_status).unwrap();
                        let items: Vec<Value> = logins
                            .iter()
                            .map(|l| json!({
                                "login": l,
                                "avatar_url": format!("https://avatars.example/{l}"),
                                "html_url": format!("https://github.com/{l}"),
                            }))
                            .collect();
                        (status, Json(json!({ "items": items })))
                    }
                }),
            )
            .route(
                "/users/:login",
                get(move |Path(login): Path<String>| {
                    let name = by_login.get(login.as_str()).copied().flatten();
                    async move { Json(json!({ "name": name, "bio": null })) }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn search(url: &str) -> TalentSearch {
        search_in(url, "India")
    }

    fn search_in(url: &str, location: &str) -> TalentSearch {
        TalentSearch::new(url, None, location, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn keeps_full_names_in_order() {
        let url = mock_github(
            200,
            vec![
                ("ravi", Some("Ravi Kumar")),
                ("mono", Some("Mononym")),
                ("anon", None),
                ("sara", Some("Sara Thomas")),
                ("dev", Some("Dev Patel")),
            ],
        )
        .await;
        let out = search(&url).search("Rust", 1).await;
        let names: Vec<&str> = out.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ravi Kumar", "Sara Thomas", "Dev Patel"]);
        assert_eq!(out[0].role, "Rust Developer");
        assert_eq!(out[0].bio, "No bio available.");
        assert_eq!(out[0].profile_url, "https://github.com/ravi");
    }

    #[tokio::test]
    async fn thin_results_are_padded() {
        let url = mock_github(200, vec![("ravi", Some("Ravi Kumar")), ("x", Some("x"))]).await;
        let out = search(&url).search("Go", 1).await;
        assert_eq!(out.len(), TALENT_MIN_RESULTS);
        assert_eq!(out[0].name, "Ravi Kumar");
        assert_eq!(out[1].name, "Priya Sharma");
    }

    #[tokio::test]
    async fn result_count_is_capped() {
        let names: Vec<(&'static str, Option<&'static str>)> = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l",
        ]
        .into_iter()
        .map(|l| (l, Some("Full Name")))
        .collect();
        let url = mock_github(200, names).await;
        let out = search(&url).search("ML", 1).await;
        assert_eq!(out.len(), TALENT_RESULT_CAP);
    }

    #[tokio::test]
    async fn rate_limit_serves_fallback_roster() {
        let url = mock_github(403, vec![("ravi", Some("Ravi Kumar"))]).await;
        let out = search(&url).search("", 1).await;
        assert_eq!(out, fallback_roster(DEFAULT_SKILL, "India"));
    }

    #[tokio::test]
    async fn candidates_carry_configured_location() {
        let url = mock_github(200, vec![("wanjiru", Some("Wanjiru Kamau"))]).await;
        let out = search_in(&url, "Nairobi").search("Go", 1).await;
        assert_eq!(out.len(), TALENT_MIN_RESULTS);
        for c in &out {
            assert_eq!(c.skills, vec!["Go".to_string(), "Nairobi".to_string()]);
        }

        let url = mock_github(429, vec![]).await;
        let out = search_in(&url, "Nairobi").search("Go", 1).await;
        assert!(out.iter().all(|c| c.skills[1] == "Nairobi"));
    }

    #[test]
    fn full_name_rule() {
        assert!(looks_like_full_name("Asha Rao"));
        assert!(looks_like_full_name("  Asha  Rao "));
        assert!(!looks_like_full_name("asharao"));
        assert!(!looks_like_full_name("   "));
    }

    #[test]
    fn serializes_profile_as_linkedin() {
        let v = serde_json::to_value(&fallback_roster("Rust", "India")[0]).unwrap();
        assert!(v["linkedin"].as_str().unwrap().contains("linkedin.com"));
        assert_eq!(v["skills"], json!(["Rust", "India"]));
    }
}
