use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::artifact::{
    parse_overrides_js, parse_overrides_toml, parse_range, serialize_published, serialize_range,
};
use crate::calendar::{CalendarData, CalendarRange, OverrideDoc};
use crate::config::{Config, expand_tilde};
use crate::error::CalendarError;
use crate::merge::merge;

const EXAMPLE_STATUSES: &str = "calendar-statuses.example.js";

const PAGE: &str = "calendar.html";
/// Stands in for the published data file name inside the page.
const DATA_FILE_PLACEHOLDER: &str = "{{data_file}}";

/// Page files shipped with every deployment.
const ASSETS: [(&str, &str); 3] = [
    (PAGE, include_str!("../assets/calendar.html")),
    ("calendar.css", include_str!("../assets/calendar.css")),
    ("calendar.js", include_str!("../assets/calendar.js")),
];

const EXAMPLE_STATUSES_TEXT: &str = include_str!("../assets/calendar-statuses.example.js");

/// A deployed calendar directory and the files inside it.
#[derive(Debug, Clone)]
pub struct Site {
    pub dest: PathBuf,
    pub dates_path: PathBuf,
    pub statuses_path: PathBuf,
    pub statuses_toml_path: PathBuf,
    pub data_path: PathBuf,
    data_file: String,
    assets_dir: Option<PathBuf>,
}

impl Site {
    pub fn new(cfg: &Config, dest: &Path) -> Self {
        let name = |key: &str, default: &str| cfg.get(key).unwrap_or_else(|| default.to_string());

        let statuses_path = dest.join(name("site.statuses", "calendar-statuses.js"));
        let statuses_toml_path = statuses_path.with_extension("toml");
        let data_file = name("site.data", "calendar-data.js");
        let site = Self {
            dest: dest.to_path_buf(),
            dates_path: dest.join(name("site.dates", "calendar-dates.js")),
            statuses_path,
            statuses_toml_path,
            data_path: dest.join(&data_file),
            data_file,
            assets_dir: cfg.get("assets.dir").map(|dir| expand_tilde(Path::new(&dir))),
        };
        debug!(?site, "resolved site layout");
        site
    }

    /// Writes the generated range, the page assets and, if missing, a starter override
    /// document. An existing override document is never touched.
    #[tracing::instrument(skip(self, range), fields(dest = %self.dest.display()))]
    pub fn deploy(&self, range: &CalendarRange) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dest)
            .with_context(|| format!("failed to create {}", self.dest.display()))?;

        write_atomic(&self.dates_path, &serialize_range(range))
            .with_context(|| format!("failed to write {}", self.dates_path.display()))?;

        for (name, embedded) in ASSETS {
            let contents = match &self.assets_dir {
                Some(dir) => {
                    let source = dir.join(name);
                    fs::read_to_string(&source)
                        .with_context(|| format!("failed to read {}", source.display()))?
                }
                None => embedded.to_string(),
            };
            let contents = if name == PAGE {
                render_page(&contents, &self.data_file)
            } else {
                contents
            };

            let target = self.dest.join(name);
            write_atomic(&target, &contents)
                .with_context(|| format!("failed to write {}", target.display()))?;
        }

        if self.statuses_path.exists() || self.statuses_toml_path.exists() {
            debug!("keeping existing override document");
        } else {
            let starter = match &self.assets_dir {
                Some(dir) => {
                    let source = dir.join(EXAMPLE_STATUSES);
                    fs::read_to_string(&source)
                        .with_context(|| format!("failed to read {}", source.display()))?
                }
                None => EXAMPLE_STATUSES_TEXT.to_string(),
            };
            fs::write(&self.statuses_path, starter)
                .with_context(|| format!("failed to write {}", self.statuses_path.display()))?;
            info!(file = %self.statuses_path.display(), "seeded override document");
        }

        info!(
            dates = %self.dates_path.display(),
            days = range.days.len(),
            "deployed calendar"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn load_range(&self) -> anyhow::Result<CalendarRange> {
        let text = fs::read_to_string(&self.dates_path).with_context(|| {
            format!(
                "failed to read {} (run generate first)",
                self.dates_path.display()
            )
        })?;
        parse_range(&text).with_context(|| format!("failed parsing {}", self.dates_path.display()))
    }

    /// The TOML document wins when both exist; no document at all means no overrides.
    #[tracing::instrument(skip(self))]
    pub fn load_overrides(&self) -> anyhow::Result<OverrideDoc> {
        if self.statuses_toml_path.exists() {
            let path = &self.statuses_toml_path;
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return parse_overrides_toml(&text)
                .with_context(|| format!("failed parsing {}", path.display()));
        }

        if self.statuses_path.exists() {
            let path = &self.statuses_path;
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return parse_overrides_js(&text)
                .with_context(|| format!("failed parsing {}", path.display()));
        }

        debug!("no override document; using empty one");
        Ok(OverrideDoc::default())
    }

    pub fn calendar(&self) -> anyhow::Result<CalendarData> {
        let range = self.load_range()?;
        let overrides = self.load_overrides()?;
        Ok(merge(&range, &overrides))
    }

    /// Merges the current override document into the deployed range and writes the result
    /// for the page.
    #[tracing::instrument(skip(self), fields(dest = %self.dest.display()))]
    pub fn publish(&self) -> anyhow::Result<CalendarData> {
        let data = self.calendar()?;
        write_atomic(&self.data_path, &serialize_published(&data)?)
            .with_context(|| format!("failed to write {}", self.data_path.display()))?;
        info!(file = %self.data_path.display(), days = data.days.len(), "published calendar");
        Ok(data)
    }
}

/// Points the page's data script at the configured file name.
fn render_page(template: &str, data_file: &str) -> String {
    let src = data_file
        .replace('\\', "/")
        .replace('&', "&amp;")
        .replace('"', "&quot;");
    template.replace(DATA_FILE_PLACEHOLDER, &src)
}

/// Expands `~` and makes the destination absolute.
pub fn resolve_dest(raw: &str) -> anyhow::Result<PathBuf> {
    let expanded = expand_tilde(Path::new(raw));
    std::path::absolute(&expanded)
        .with_context(|| format!("failed to resolve destination {raw}"))
}

/// The destination itself may be missing, its parent may not.
pub fn validate_dest(dest: &Path) -> Result<(), CalendarError> {
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            Err(CalendarError::DestinationUnavailable {
                parent: parent.to_path_buf(),
            })
        }
        _ => Ok(()),
    }
}

#[tracing::instrument(skip(contents))]
fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    debug!(file = %path.display(), bytes = contents.len(), "writing atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{render_page, resolve_dest, validate_dest};
    use crate::error::CalendarError;

    #[test]
    fn page_loads_configured_data_file() {
        let page = render_page(include_str!("../assets/calendar.html"), "published.js");
        assert!(page.contains(r#"<script src="published.js"></script>"#));
        assert!(!page.contains("{{"));

        let quoted = render_page(r#"<script src="{{data_file}}">"#, r#"out\a"b&c.js"#);
        assert_eq!(quoted, r#"<script src="out/a&quot;b&amp;c.js">"#);
    }

    #[test]
    fn rejects_missing_parent() {
        let err = validate_dest(Path::new("/nonexistent/parent/calendar")).expect_err("missing");
        assert_eq!(
            err,
            CalendarError::DestinationUnavailable {
                parent: Path::new("/nonexistent/parent").to_path_buf(),
            }
        );
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn accepts_new_dir_under_existing_parent() {
        let parent = std::env::temp_dir();
        assert!(validate_dest(&parent.join("new-calendar")).is_ok());
        assert!(validate_dest(&parent).is_ok());
    }

    #[test]
    fn expands_home_directory() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(
            resolve_dest("~/calendars/adar").expect("resolve"),
            home.join("calendars").join("adar")
        );
        assert_eq!(resolve_dest("~").expect("resolve"), home);
    }

    #[test]
    fn makes_relative_paths_absolute() {
        let resolved = resolve_dest("some/calendar").expect("resolve");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/calendar"));
    }
}
