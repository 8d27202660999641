// src/config.rs

use anyhow::{Context, Result};
use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fmt, fs,
    marker::PhantomData,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::error::ConfigError;
use crate::process::reshape::Layout;
use crate::schema::{ColumnType, RawTableSchema, TableSchema};

/// Job read from `params.json` when no other name is given.
pub const DEFAULT_JOB: &str = "ic3";

/// The one report table that is published as a single column group.
pub const AGE_GROUP_TABLE: &str = "ic3__victims_by_age_group";

const YEAR_PLACEHOLDER: &str = "{year}";

/// What the orchestrator does with a non-quality error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the error and abandon every remaining (year, state, table).
    #[default]
    AbortAll,
    /// Log the error, drop the failing unit and carry on.
    SkipUnit,
}

/// Job section exactly as written in the params file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJob {
    pub url: String,
    pub local_folder_path: PathBuf,
    #[serde(deserialize_with = "ordered_map")]
    pub tables: Vec<(String, String)>,
    pub years: Vec<u32>,
    #[serde(alias = "df_dtype", deserialize_with = "ordered_map")]
    pub dtype: Vec<(String, RawTableSchema)>,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default = "default_as_is_tables")]
    pub as_is_tables: Vec<String>,
    #[serde(default)]
    pub raw_html_dir: Option<PathBuf>,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("ic3.log")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_as_is_tables() -> Vec<String> {
    vec![AGE_GROUP_TABLE.to_string()]
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParamsDoc {
    Wrapped { jobs: HashMap<String, RawJob> },
    Bare(RawJob),
}

/// One destination table: how to find it, how to reshape it, what it casts to.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub id: String,
    pub matcher: Regex,
    pub layout: Layout,
    pub schema: TableSchema,
}

/// Validated, immutable job configuration.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub url: String,
    pub local_folder_path: PathBuf,
    pub tables: Vec<TableSpec>,
    pub years: Vec<u32>,
    pub log_file: PathBuf,
    pub timeout: Duration,
    pub on_error: ErrorPolicy,
    pub raw_html_dir: Option<PathBuf>,
}

impl JobConfig {
    pub fn from_raw(raw: RawJob) -> Result<Self, ConfigError> {
        if !raw.url.contains(YEAR_PLACEHOLDER) {
            return Err(ConfigError::MissingYearPlaceholder(raw.url));
        }
        let first_year = *raw.years.first().ok_or(ConfigError::NoYears)?;
        Url::parse(&render_url(&raw.url, first_year))?;
        if raw.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }

        let mut schemas: HashMap<String, RawTableSchema> = raw.dtype.into_iter().collect();
        let mut tables = Vec::with_capacity(raw.tables.len());
        for (id, match_text) in raw.tables {
            let matcher = Regex::new(&match_text).map_err(|source| ConfigError::BadMatchText {
                table: id.clone(),
                source,
            })?;
            let raw_schema = schemas
                .remove(&id)
                .ok_or_else(|| ConfigError::MissingSchema(id.clone()))?;
            let schema = parse_schema(&id, raw_schema)?;
            let layout = if raw.as_is_tables.contains(&id) {
                Layout::AsIs
            } else {
                Layout::Paired
            };
            tables.push(TableSpec {
                id,
                matcher,
                layout,
                schema,
            });
        }

        Ok(Self {
            url: raw.url,
            local_folder_path: raw.local_folder_path,
            tables,
            years: raw.years,
            log_file: raw.log_file,
            timeout: Duration::from_secs(raw.timeout_secs),
            on_error: raw.on_error,
            raw_html_dir: raw.raw_html_dir,
        })
    }

    /// The report URL for `year`.
    pub fn url_for(&self, year: u32) -> String {
        render_url(&self.url, year)
    }
}

pub(crate) fn render_url(template: &str, year: u32) -> String {
    template.replace(YEAR_PLACEHOLDER, &year.to_string())
}

fn parse_schema(table: &str, raw: RawTableSchema) -> Result<TableSchema, ConfigError> {
    let columns = raw
        .0
        .into_iter()
        .map(|(column, ty)| {
            ty.parse::<ColumnType>()
                .map(|parsed| (column.clone(), parsed))
                .map_err(|ty| ConfigError::UnknownType {
                    table: table.to_string(),
                    column,
                    ty,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TableSchema::new(columns))
}

/// Parse a params document (JSON, or YAML when `yaml` is set) and select `job`.
pub fn parse_params(text: &str, yaml: bool, job: &str) -> Result<JobConfig> {
    let doc: ParamsDoc = if yaml {
        serde_yaml::from_str(text).context("parsing YAML params")?
    } else {
        serde_json::from_str(text).context("parsing JSON params")?
    };
    let raw = match doc {
        ParamsDoc::Wrapped { mut jobs } => jobs
            .remove(job)
            .ok_or_else(|| ConfigError::UnknownJob(job.to_string()))?,
        ParamsDoc::Bare(raw) => raw,
    };
    Ok(JobConfig::from_raw(raw)?)
}

/// Read the params file at `path`; the format follows the extension.
pub fn load_params<P: AsRef<Path>>(path: P, job: &str) -> Result<JobConfig> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("reading params {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    parse_params(&text, yaml, job).with_context(|| format!("loading job {job:?} from {}", path.display()))
}

/// Deserialize a map into `(key, value)` pairs, keeping document order.
pub(crate) fn ordered_map<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                out.push((key, value));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}
