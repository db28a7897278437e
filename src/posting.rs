use serde::{Deserialize, Deserializer};

/// One scraped job listing.
///
/// Field names follow the JobSpy result columns so search-service responses
/// deserialize directly. `search_info` is never part of the response; it is
/// attached once by [`Posting::tagged`] during acquisition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Posting {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub site: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub job_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_posted: Option<String>,
    #[serde(skip)]
    pub search_info: String,
}

/// JobSpy sends `null` for columns it could not fill.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Posting {
    pub fn tagged(self, query: &SearchQuery) -> Self {
        Posting {
            search_info: query.provenance(),
            ..self
        }
    }

    pub fn company_or_empty(&self) -> &str {
        self.company.as_deref().unwrap_or("")
    }

    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// A single (phrase, source, location, language filter) search.
///
/// `index` is the position in the search plan's enumeration order; batches
/// are merged by it so first-wins deduplication does not depend on which
/// request finished first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub index: usize,
    pub term: String,
    pub source: String,
    /// `None` searches worldwide.
    pub location: Option<String>,
    pub filter_language: bool,
    pub results_wanted: usize,
}

impl SearchQuery {
    pub fn provenance(&self) -> String {
        match &self.location {
            Some(country) => format!(
                "scrape_from_country(country='{}', query='{}', source='{}', filter_language={})",
                country,
                self.term,
                self.source,
                if self.filter_language { "True" } else { "False" },
            ),
            None => format!(
                "scrape_worldwide(query='{}', source='{}')",
                self.term, self.source
            ),
        }
    }

    pub fn describe(&self) -> String {
        match &self.location {
            Some(country) => format!("'{}' from {} in {}", self.term, self.source, country),
            None => format!("'{}' from {} worldwide", self.term, self.source),
        }
    }
}
