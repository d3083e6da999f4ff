use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;

/// Population property.
pub const POPULATION: &str = "P1082";
/// "Point in time" qualifier.
pub const POINT_IN_TIME: &str = "P585";

#[derive(Deserialize, Debug)]
pub struct EntitiesResponse {
    #[serde(default)]
    pub entities: IndexMap<String, Entity>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Deserialize, Debug)]
pub struct Entity {
    /// Present when no item matches the title (`""` or `true` by format version).
    pub missing: Option<serde_json::Value>,
    #[serde(default)]
    pub sitelinks: IndexMap<String, Sitelink>,
    #[serde(default)]
    pub claims: IndexMap<String, Vec<Statement>>,
}

#[derive(Deserialize, Debug)]
pub struct Sitelink {
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct Statement {
    pub mainsnak: Snak,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub qualifiers: IndexMap<String, Vec<Snak>>,
}

#[derive(Deserialize, Debug)]
pub struct Snak {
    pub datavalue: Option<DataValue>,
}

#[derive(Deserialize, Debug)]
pub struct DataValue {
    pub value: serde_json::Value,
}

impl Entity {
    /// English Wikipedia title this item was matched on.
    pub fn enwiki_title(&self) -> Option<&str> {
        self.sitelinks.get("enwiki").map(|s| s.title.as_str())
    }

    /// Every non-deprecated population statement carrying a point in time.
    pub fn dated_populations(&self) -> Vec<(u64, NaiveDate)> {
        self.claims
            .get(POPULATION)
            .into_iter()
            .flatten()
            .filter(|st| st.rank != "deprecated")
            .filter_map(|st| {
                let amount = st.mainsnak.datavalue.as_ref()?.value.get("amount")?.as_str()?;
                let time = st
                    .qualifiers
                    .get(POINT_IN_TIME)?
                    .iter()
                    .find_map(|q| q.datavalue.as_ref()?.value.get("time")?.as_str())?;
                Some((parse_amount(amount)?, parse_time(time)?))
            })
            .collect()
    }
}

/// Wikidata quantities are signed decimal strings such as `+2145906`.
pub fn parse_amount(amount: &str) -> Option<u64> {
    let unsigned = amount.strip_prefix('+').unwrap_or(amount);
    if unsigned.starts_with('-') {
        return None;
    }
    unsigned.parse::<u64>().ok().or_else(|| {
        let value: f64 = unsigned.parse().ok()?;
        value.is_finite().then(|| value.round() as u64)
    })
}

/// Wikidata times look like `+2021-01-01T00:00:00Z`; year or month precision
/// writes `00` for the unknown parts, which are read as `01`.
pub fn parse_time(time: &str) -> Option<NaiveDate> {
    let date = time.strip_prefix('+')?.split('T').next()?;
    let mut parts = date.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month.max(1), day.max(1))
}
